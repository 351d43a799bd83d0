// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::profile,
        handlers::auth::update_profile,
        handlers::auth::change_password,

        // --- Applications ---
        handlers::applications::index,
        handlers::applications::show,
        handlers::applications::store,
        handlers::applications::update,
        handlers::applications::destroy,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::UpdateProfilePayload,
            models::auth::ChangePasswordPayload,

            // --- Applications ---
            models::application::Gender,
            models::application::MaritalStatus,
            models::application::Nasabah,
            models::application::Job,
            models::application::Application,
            models::application::Document,
            models::application::FinancingRequest,
            models::application::ApplicationDetail,
            models::application::NasabahPayload,
            models::application::JobPayload,
            models::application::DocumentPayload,
            models::application::FinancingRequestPayload,
            models::application::CreateApplicationPayload,
            models::application::UpdateNasabahPayload,
            models::application::UpdateJobPayload,
            models::application::DocumentChecklistPayload,
            models::application::UpdateFinancingRequestPayload,
            models::application::UpdateApplicationPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Applications", description = "Intake de Aplicações de Financiamento")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
