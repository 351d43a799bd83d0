use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Todas as falhas da aplicação convergem para cá e viram o envelope
// `{"success": false, ...}` na resposta HTTP.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation errors")]
    ValidationError(#[from] validator::ValidationErrors),

    // Violação de unicidade em campos de usuário (email/username).
    // Os testes da API esperam 422 com o campo na chave `errors`.
    #[error("The {0} has already been taken")]
    UniqueField(&'static str),

    #[error("Unauthenticated.")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Current password is incorrect")]
    CurrentPasswordIncorrect,

    #[error("User not found")]
    UserNotFound,

    #[error("Application not found")]
    ApplicationNotFound,

    #[error("Job record not found for this application")]
    JobNotFound,

    #[error("Financing request not found for this application")]
    FinancingRequestNotFound,

    // Unicidade de dados do agregado (nik, no_hp, email, no_aplikasi)
    #[error("{0}")]
    UniqueConstraintViolation(String),

    // Variante para erros de banco de dados
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Internal server error: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// Achata os erros do `validator` em caminhos exatos de campo
// ("nasabah.nama", "documents[0].name"), inclusive os aninhados.
fn flatten_validation_errors(
    errors: &ValidationErrors,
    prefix: &str,
    out: &mut HashMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                out.insert(path, messages);
            }
            ValidationErrorsKind::Struct(nested) => {
                flatten_validation_errors(nested, &path, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_validation_errors(nested, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                flatten_validation_errors(errors, "", &mut details);
                let body = Json(json!({
                    "success": false,
                    "message": "Validation errors",
                    "errors": details,
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AppError::UniqueField(field) => {
                let mut details = HashMap::new();
                details.insert(
                    field.to_string(),
                    vec![format!("The {field} has already been taken.")],
                );
                let body = Json(json!({
                    "success": false,
                    "message": "Validation errors",
                    "errors": details,
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "Unauthenticated."),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AppError::CurrentPasswordIncorrect => {
                (StatusCode::UNAUTHORIZED, "Current password is incorrect")
            }
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            AppError::ApplicationNotFound => (StatusCode::NOT_FOUND, "Application not found"),
            AppError::JobNotFound => (
                StatusCode::NOT_FOUND,
                "Job record not found for this application",
            ),
            AppError::FinancingRequestNotFound => (
                StatusCode::NOT_FOUND,
                "Financing request not found for this application",
            ),
            AppError::UniqueConstraintViolation(message) => {
                let body = Json(json!({ "success": false, "message": message }));
                return (StatusCode::CONFLICT, body).into_response();
            }

            // Todos os outros erros viram 500. O `tracing` loga o detalhe
            // completo; a resposta leva o detalhe no campo `error`.
            e => {
                tracing::error!("Erro interno do servidor: {}", e);
                let body = Json(json!({
                    "success": false,
                    "message": "Operation failed",
                    "error": e.to_string(),
                }));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "success": false, "message": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn not_found_maps_to_404_with_envelope() {
        let response = AppError::ApplicationNotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Application not found");
    }

    #[tokio::test]
    async fn invalid_token_maps_to_401() {
        let response = AppError::InvalidToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Unauthenticated.");
    }

    #[tokio::test]
    async fn unique_violation_maps_to_409() {
        let response =
            AppError::UniqueConstraintViolation("NIK '123' already registered".into())
                .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "NIK '123' already registered");
    }

    #[tokio::test]
    async fn database_error_maps_to_500_with_detail() {
        let response = AppError::DatabaseError(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Operation failed");
        assert!(body["error"].as_str().unwrap().contains("Database error"));
    }

    #[derive(Validate)]
    struct Inner {
        #[validate(length(min = 1, message = "required"))]
        nama: String,
    }

    #[derive(Validate)]
    struct Outer {
        #[validate(nested)]
        nasabah: Inner,
    }

    #[tokio::test]
    async fn nested_validation_errors_keep_field_paths() {
        let payload = Outer {
            nasabah: Inner { nama: String::new() },
        };
        let err = payload.validate().unwrap_err();

        let response = AppError::ValidationError(err).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"]["nasabah.nama"][0], "required");
    }

    #[tokio::test]
    async fn unique_field_reports_422_keyed_by_field() {
        let response = AppError::UniqueField("email").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(
            body["errors"]["email"][0],
            "The email has already been taken."
        );
    }
}
