// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{
        ChangePasswordPayload, Claims, RegisterUserPayload, UpdateProfilePayload, User,
    },
};

// Validade do token em segundos (7 dias)
const TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
}

// O bcrypt é pesado: roda fora do executor async
async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {e}"))?
        .map_err(AppError::from)
}

async fn verify_password(password: String, password_hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {e}"))?
        .map_err(AppError::from)
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String) -> Self {
        Self {
            user_repo,
            jwt_secret,
        }
    }

    pub async fn register_user(&self, payload: &RegisterUserPayload) -> Result<User, AppError> {
        let password_hash = hash_password(payload.password.clone()).await?;

        let user = self
            .user_repo
            .create_user(
                &payload.name,
                &payload.username,
                &payload.email,
                &payload.phone,
                &password_hash,
            )
            .await?;

        tracing::info!("✅ Usuário {} registrado", user.username);
        Ok(user)
    }

    // O identificador pode ser o email ou o username
    pub async fn login_user(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<(String, i64), AppError> {
        let user = self
            .user_repo
            .find_by_identifier(identifier)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let is_password_valid =
            verify_password(password.to_owned(), user.password_hash.clone()).await?;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(user.id)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_token(token)?;

        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        payload: &UpdateProfilePayload,
    ) -> Result<User, AppError> {
        self.user_repo.update_profile(user_id, payload).await
    }

    pub async fn change_password(
        &self,
        user_id: i64,
        payload: &ChangePasswordPayload,
    ) -> Result<(), AppError> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let current_is_valid = verify_password(
            payload.current_password.clone(),
            user.password_hash.clone(),
        )
        .await?;

        if !current_is_valid {
            return Err(AppError::CurrentPasswordIncorrect);
        }

        let new_hash = hash_password(payload.new_password.clone()).await?;
        self.user_repo.update_password(user_id, &new_hash).await
    }

    // Retorna o token e a validade em segundos (o `expires_in` da resposta)
    fn create_token(&self, user_id: i64) -> Result<(String, i64), AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::seconds(TOKEN_TTL_SECS);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?;

        Ok((token, TOKEN_TTL_SECS))
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPool;

    // connect_lazy não abre conexão nenhuma: dá para montar o serviço
    // e exercitar o caminho do JWT sem banco.
    fn service() -> AuthService {
        let pool = PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        AuthService::new(UserRepository::new(pool), "test-secret".to_string())
    }

    #[tokio::test]
    async fn issued_tokens_decode_back_to_the_same_subject() {
        let auth = service();

        let (token, expires_in) = auth.create_token(42).unwrap();
        assert_eq!(expires_in, TOKEN_TTL_SECS);

        let claims = auth.decode_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn tokens_signed_with_another_secret_are_rejected() {
        let auth = service();
        let other = {
            let pool = PgPool::connect_lazy("postgres://localhost/unused").unwrap();
            AuthService::new(UserRepository::new(pool), "other-secret".to_string())
        };

        let (token, _) = other.create_token(42).unwrap();
        assert!(matches!(
            auth.decode_token(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn garbage_tokens_are_rejected() {
        let auth = service();
        assert!(matches!(
            auth.decode_token("not-a-jwt"),
            Err(AppError::InvalidToken)
        ));
    }
}
