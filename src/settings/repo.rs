use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::types::Theme;

/// Per-installation app settings. One canonical value assembled from the
/// key/value `settings` table; unknown or unreadable entries fall back to
/// the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub notify_days_before: Vec<i64>,
    pub daily_summary: bool,
    pub currency: String,
    pub theme: Theme,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            notify_days_before: vec![3, 1, 0],
            daily_summary: true,
            currency: "MXN".to_string(),
            theme: Theme::System,
        }
    }
}

/// Partial update; only supplied fields are written.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SettingsUpdate {
    pub notify_days_before: Option<Vec<i64>>,
    pub daily_summary: Option<bool>,
    pub currency: Option<String>,
    pub theme: Option<Theme>,
}

pub async fn get_settings(db: &SqlitePool) -> anyhow::Result<AppSettings> {
    let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
        .fetch_all(db)
        .await?;

    let mut settings = AppSettings::default();
    for (key, value) in rows {
        match key.as_str() {
            "notify_days_before" => {
                if let Ok(v) = serde_json::from_str(&value) {
                    settings.notify_days_before = v;
                }
            }
            "daily_summary" => {
                if let Ok(v) = serde_json::from_str(&value) {
                    settings.daily_summary = v;
                }
            }
            "currency" => {
                if let Ok(v) = serde_json::from_str(&value) {
                    settings.currency = v;
                }
            }
            "theme" => {
                if let Ok(v) = serde_json::from_str(&value) {
                    settings.theme = v;
                }
            }
            _ => {}
        }
    }
    Ok(settings)
}

pub async fn update_settings(db: &SqlitePool, update: &SettingsUpdate) -> anyhow::Result<AppSettings> {
    let mut entries: Vec<(&str, String)> = Vec::new();
    if let Some(v) = &update.notify_days_before {
        entries.push(("notify_days_before", serde_json::to_string(v)?));
    }
    if let Some(v) = update.daily_summary {
        entries.push(("daily_summary", serde_json::to_string(&v)?));
    }
    if let Some(v) = &update.currency {
        entries.push(("currency", serde_json::to_string(v)?));
    }
    if let Some(v) = update.theme {
        entries.push(("theme", serde_json::to_string(&v)?));
    }

    let mut tx = db.begin().await?;
    for (key, value) in entries {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    get_settings(db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_pool;

    #[tokio::test]
    async fn empty_store_yields_the_defaults() {
        let db = test_pool().await;
        let settings = get_settings(&db).await.unwrap();
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.notify_days_before, vec![3, 1, 0]);
        assert_eq!(settings.currency, "MXN");
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields_at_their_defaults() {
        let db = test_pool().await;
        let update = SettingsUpdate {
            currency: Some("USD".to_string()),
            ..Default::default()
        };
        let settings = update_settings(&db, &update).await.unwrap();
        assert_eq!(settings.currency, "USD");
        assert!(settings.daily_summary);
        assert_eq!(settings.theme, Theme::System);
    }

    #[tokio::test]
    async fn updates_round_trip_and_overwrite() {
        let db = test_pool().await;
        let update = SettingsUpdate {
            notify_days_before: Some(vec![7, 1]),
            daily_summary: Some(false),
            theme: Some(Theme::Dark),
            ..Default::default()
        };
        update_settings(&db, &update).await.unwrap();

        let again = SettingsUpdate {
            theme: Some(Theme::Light),
            ..Default::default()
        };
        let settings = update_settings(&db, &again).await.unwrap();
        assert_eq!(settings.notify_days_before, vec![7, 1]);
        assert!(!settings.daily_summary);
        assert_eq!(settings.theme, Theme::Light);
    }

    #[tokio::test]
    async fn unreadable_values_fall_back_to_defaults() {
        let db = test_pool().await;
        sqlx::query("INSERT INTO settings (key, value) VALUES ('daily_summary', 'maybe')")
            .execute(&db)
            .await
            .unwrap();
        let settings = get_settings(&db).await.unwrap();
        assert!(settings.daily_summary);
    }
}
