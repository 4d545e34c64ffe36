use crate::auth::jwt::JwtKeys;
use crate::config::AppConfig;
use crate::store::{memory::MemoryStore, postgres::PgStore, UserStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub jwt: JwtKeys,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Production wiring: env config, Postgres store, schema migration.
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let jwt = JwtKeys::new(&config.jwt)?;
        let store = Arc::new(PgStore::connect(&config.database_url).await?) as Arc<dyn UserStore>;
        Ok(Self { store, jwt, config })
    }

    pub fn from_parts(store: Arc<dyn UserStore>, config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let jwt = JwtKeys::new(&config.jwt)?;
        Ok(Self { store, jwt, config })
    }

    /// State over the in-memory store; what the tests run against.
    pub fn in_memory(config: AppConfig) -> anyhow::Result<Self> {
        Self::from_parts(Arc::new(MemoryStore::new()), Arc::new(config))
    }
}
