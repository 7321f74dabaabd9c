use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::ai::client::{CompletionClient, OpenAiClient};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub ai: Arc<dyn CompletionClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let options = SqliteConnectOptions::from_str(&config.database_url)
            .context("parse DATABASE_URL")?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);
        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("connect to database")?;

        let ai = Arc::new(OpenAiClient::new(config.openai.clone())) as Arc<dyn CompletionClient>;

        Ok(Self { db, config, ai })
    }

    #[cfg(test)]
    pub(crate) async fn fake() -> Self {
        use crate::ai::client::CompletionRequest;
        use crate::ai::error::AiError;
        use crate::config::OpenAiConfig;

        struct CannedAi;

        #[async_trait::async_trait]
        impl CompletionClient for CannedAi {
            async fn complete(&self, _req: CompletionRequest) -> Result<String, AiError> {
                Ok("{}".to_string())
            }
        }

        let db = test_pool().await;
        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            openai: OpenAiConfig {
                api_key: Some("test".into()),
                base_url: "http://localhost".into(),
                model: "test-model".into(),
                vision_model: "test-vision-model".into(),
            },
        });
        Self {
            db,
            config,
            ai: Arc::new(CannedAi),
        }
    }
}

/// In-memory database with the schema applied. A single connection keeps
/// every query in the test on the same memory store.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("memory database url")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("connect to in-memory database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("apply migrations");
    pool
}
