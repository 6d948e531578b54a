use crate::config::AppConfig;
use crate::users::repo::{PgUserStore, UserStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn init(config: AppConfig) -> Self {
        let store = Arc::new(PgUserStore::connect_lazy(&config.db)) as Arc<dyn UserStore>;
        tracing::info!(
            host = %config.db.host,
            port = config.db.port,
            database = %config.db.name,
            "user store configured"
        );
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn from_parts(store: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }
}
