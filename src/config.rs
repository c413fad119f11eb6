// src/config.rs

use std::{env, sync::Arc, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{PgRemoteDataService, UserRepository},
    services::{auth::AuthService, authz_service::AccessPolicy, crm_service::CrmService},
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub auth_service: AuthService,
    pub crm_service: CrmService,
    // Imutável depois do boot; os guards só leem.
    pub policy: Arc<AccessPolicy>,
}

impl AppState {
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
        let auth_service = AuthService::new(user_repo, jwt_secret.clone());

        let remote = Arc::new(PgRemoteDataService::new(db_pool.clone()));
        let crm_service = CrmService::new(remote);

        let policy = Arc::new(AccessPolicy::builtin());

        Ok(Self {
            db_pool,
            jwt_secret,
            auth_service,
            crm_service,
            policy,
        })
    }
}
