// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{ApplicationRepository, UserRepository},
    services::{application_service::ApplicationService, auth::AuthService},
};

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub application_service: ApplicationService,
}

impl AppState {
    // Carrega as configurações e monta o gráfico de dependências.
    // Se a configuração falhar, a aplicação não deve iniciar.
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let application_repo = ApplicationRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo, jwt_secret);
        let application_service = ApplicationService::new(application_repo, db_pool.clone());

        Ok(Self {
            db_pool,
            auth_service,
            application_service,
        })
    }
}
