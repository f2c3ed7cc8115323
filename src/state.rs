use std::sync::Arc;

use anyhow::Context;
use tracing::warn;

use crate::config::{AppConfig, StoreKind};
use crate::db;
use crate::users::{memory::MemoryUserRepository, repo::PgUserRepository, repo::UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let users = match config.store {
            StoreKind::Postgres => {
                let db_config = config
                    .database
                    .as_ref()
                    .context("DATABASE_URL is required for the postgres store")?;
                let pool = db::connect(db_config).await?;
                db::migrate(&pool).await;
                Arc::new(PgUserRepository::new(pool)) as Arc<dyn UserRepository>
            }
            StoreKind::Memory => {
                warn!("using in-memory user store; accounts are lost on restart");
                Arc::new(MemoryUserRepository::default()) as Arc<dyn UserRepository>
            }
        };

        Ok(Self::from_parts(users, Arc::new(config)))
    }

    pub fn from_parts(users: Arc<dyn UserRepository>, config: Arc<AppConfig>) -> Self {
        Self { users, config }
    }

    pub fn in_memory() -> Self {
        Self::from_parts(
            Arc::new(MemoryUserRepository::default()),
            Arc::new(AppConfig::in_memory()),
        )
    }
}
