use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use crate::accounts::repo::{AccountStore, PgAccountStore};
use crate::accounts::service::IdentityService;
use crate::auth::jwt::TokenKeys;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub identity: IdentityService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Ok(Self::from_parts(db, config))
    }

    pub fn from_parts(db: PgPool, config: Arc<AppConfig>) -> Self {
        let store: Arc<dyn AccountStore> = Arc::new(PgAccountStore::new(db.clone()));
        let identity = IdentityService::new(store, TokenKeys::from_config(&config.jwt));
        Self {
            db,
            config,
            identity,
        }
    }
}
