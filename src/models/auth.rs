// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// Representa um usuário (agente) vindo do banco de dados
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUserPayload {
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    pub name: String,

    #[validate(length(min = 3, max = 255, message = "The username must be at least 3 characters."))]
    pub username: String,

    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,

    #[validate(length(min = 6, max = 20, message = "The phone must be between 6 and 20 characters."))]
    pub phone: String,

    #[validate(length(min = 6, message = "The password must be at least 6 characters."))]
    pub password: String,

    #[validate(must_match(other = "password", message = "The password confirmation does not match."))]
    pub password_confirmation: String,
}

// Dados para login.
// O campo se chama `email` mas aceita email OU username.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(length(min = 1, message = "The email field is required."))]
    pub email: String,

    #[validate(length(min = 6, message = "The password must be at least 6 characters."))]
    pub password: String,
}

// Atualização parcial do perfil: só os campos presentes são gravados
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfilePayload {
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    pub name: Option<String>,

    #[validate(length(min = 3, max = 255, message = "The username must be at least 3 characters."))]
    pub username: Option<String>,

    #[validate(email(message = "The email must be a valid email address."))]
    pub email: Option<String>,

    #[validate(length(min = 6, max = 20, message = "The phone must be between 6 and 20 characters."))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordPayload {
    #[validate(length(min = 1, message = "The current password field is required."))]
    pub current_password: String,

    #[validate(length(min = 6, message = "The new password must be at least 6 characters."))]
    pub new_password: String,

    #[validate(must_match(other = "new_password", message = "The new password confirmation does not match."))]
    pub new_password_confirmation: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,   // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_requires_matching_confirmation() {
        let payload = RegisterUserPayload {
            name: "Test User".into(),
            username: "testuser".into(),
            email: "testuser@example.com".into(),
            phone: "1234567890".into(),
            password: "password".into(),
            password_confirmation: "different".into(),
        };

        let errors = payload.validate().unwrap_err();
        assert!(errors.errors().contains_key("password_confirmation"));
    }

    #[test]
    fn register_rejects_invalid_email() {
        let payload = RegisterUserPayload {
            name: "Test User".into(),
            username: "testuser".into(),
            email: "not-an-email".into(),
            phone: "1234567890".into(),
            password: "password".into(),
            password_confirmation: "password".into(),
        };

        let errors = payload.validate().unwrap_err();
        assert!(errors.errors().contains_key("email"));
    }

    #[test]
    fn update_profile_accepts_partial_payload() {
        let payload = UpdateProfilePayload {
            name: Some("Updated User".into()),
            username: None,
            email: None,
            phone: None,
        };

        assert!(payload.validate().is_ok());
    }
}
