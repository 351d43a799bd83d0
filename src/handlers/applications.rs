// src/handlers/applications.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::application::{CreateApplicationPayload, UpdateApplicationPayload},
};

// GET /api/applications
#[utoipa::path(
    get,
    path = "/api/applications",
    tag = "Applications",
    responses(
        (status = 200, description = "Lista de aplicações com o agregado completo"),
        (status = 401, description = "Não autenticado")
    ),
    security(("api_jwt" = []))
)]
pub async fn index(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let applications = app_state.application_service.list().await?;

    Ok(Json(json!({
        "success": true,
        "applications": applications,
    })))
}

// GET /api/applications/{id}
#[utoipa::path(
    get,
    path = "/api/applications/{id}",
    tag = "Applications",
    params(("id" = i64, Path, description = "ID da aplicação")),
    responses(
        (status = 200, description = "Aplicação com nasabah, job, documentos e financing request"),
        (status = 404, description = "Aplicação não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn show(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let application = app_state.application_service.get(id).await?;

    Ok(Json(json!({
        "success": true,
        "application": application,
    })))
}

// POST /api/applications
#[utoipa::path(
    post,
    path = "/api/applications",
    tag = "Applications",
    request_body = CreateApplicationPayload,
    responses(
        (status = 201, description = "Agregado criado por inteiro"),
        (status = 409, description = "NIK/telefone/email de nasabah já registrado"),
        (status = 422, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn store(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreateApplicationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let application = app_state.application_service.create(&payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Application created successfully!",
            "application": application,
        })),
    ))
}

// PUT /api/applications/{id}
#[utoipa::path(
    put,
    path = "/api/applications/{id}",
    tag = "Applications",
    params(("id" = i64, Path, description = "ID da aplicação")),
    request_body = UpdateApplicationPayload,
    responses(
        (status = 200, description = "Agregado atualizado"),
        (status = 404, description = "Aplicação (ou job/financing request) não encontrada"),
        (status = 422, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn update(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateApplicationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let application = app_state.application_service.update(id, &payload).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Application updated successfully!",
        "application": application,
    })))
}

// DELETE /api/applications/{id}
#[utoipa::path(
    delete,
    path = "/api/applications/{id}",
    tag = "Applications",
    params(("id" = i64, Path, description = "ID da aplicação")),
    responses(
        (status = 200, description = "Agregado removido por inteiro"),
        (status = 404, description = "Aplicação não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn destroy(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.application_service.delete(id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Application and related data deleted successfully!",
    })))
}
