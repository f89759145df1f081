use crate::config::AppConfig;
use crate::notifications::notifier::{Notifier, PgNotifier};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;

        let notifier = Arc::new(PgNotifier::new(db.clone())) as Arc<dyn Notifier>;

        Ok(Self {
            db,
            config,
            notifier,
        })
    }
}
