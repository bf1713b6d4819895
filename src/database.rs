use crate::settings::*;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to create storage directory: {0}")]
    StorageCreation(#[from] std::io::Error),
    #[error("SQLite error: {0}")]
    Sqlite(String),
    #[error("Failed to encode settings: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl From<tokio_rusqlite::Error> for DatabaseError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        DatabaseError::Sqlite(err.to_string())
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        DatabaseError::Sqlite(err.to_string())
    }
}

const DATABASE_FILE: &str = "redmine_issue_graph.db";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS settings (
        project_id TEXT NOT NULL PRIMARY KEY,
        version INTEGER NOT NULL,
        payload TEXT NOT NULL,
        updated_at DATETIME NOT NULL
    );
    CREATE TABLE IF NOT EXISTS presets (
        id TEXT NOT NULL PRIMARY KEY,
        name TEXT NOT NULL,
        payload TEXT NOT NULL,
        created_at DATETIME NOT NULL
    );";

pub struct Database {
    connection: tokio_rusqlite::Connection,
}

impl Database {
    pub async fn new(storage_dir: &Path) -> Result<Self, DatabaseError> {
        if !storage_dir.exists() {
            fs::create_dir_all(storage_dir)?;
        }
        let connection = tokio_rusqlite::Connection::open(storage_dir.join(DATABASE_FILE)).await?;
        let db = Database { connection };
        db._init_database().await?;
        Ok(db)
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self, DatabaseError> {
        let connection = tokio_rusqlite::Connection::open_in_memory().await?;
        let db = Database { connection };
        db._init_database().await?;
        Ok(db)
    }

    async fn _init_database(&self) -> Result<(), DatabaseError> {
        self.connection
            .call(|conn| {
                conn.execute_batch(SCHEMA)
                    .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await?;
        Ok(())
    }

    /// Stored settings of a project. Rows from another settings version or with
    /// an unreadable payload count as absent.
    pub async fn load_settings(&self, project_id: &str) -> Result<Option<UserSettings>, DatabaseError> {
        let query = "SELECT version, payload FROM settings WHERE project_id = ?";
        let project = project_id.to_string();

        let row = self
            .connection
            .call(move |conn| {
                let mut stmt = conn
                    .prepare_cached(query)
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                let mut rows = stmt
                    .query_map([project.as_str()], |row| {
                        Ok((row.get::<_, u32>("version")?, row.get::<_, String>("payload")?))
                    })
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                rows.next()
                    .transpose()
                    .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await?;

        let Some((version, payload)) = row else {
            return Ok(None);
        };
        if version != SETTINGS_VERSION {
            tracing::info!(project_id, version, "Ignoring settings from another version");
            return Ok(None);
        }
        match serde_json::from_str::<UserSettings>(&payload) {
            Ok(settings) if settings.version == SETTINGS_VERSION => Ok(Some(settings)),
            Ok(_) => Ok(None),
            Err(error) => {
                tracing::warn!(project_id, %error, "Stored settings are unreadable");
                Ok(None)
            }
        }
    }

    pub async fn save_settings(&self, project_id: &str, settings: &UserSettings) -> Result<(), DatabaseError> {
        let query = "
            INSERT INTO settings (project_id, version, payload, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(project_id) DO UPDATE SET
                version = excluded.version,
                payload = excluded.payload,
                updated_at = excluded.updated_at
        ";
        let project = project_id.to_string();
        let version = settings.version;
        let payload = serde_json::to_string(settings)?;
        let timestamp = chrono::Utc::now().to_rfc3339();

        self.connection
            .call(move |conn| {
                conn.execute(query, (project.as_str(), version, payload.as_str(), timestamp.as_str()))
                    .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await?;
        Ok(())
    }

    pub async fn list_presets(&self) -> Result<Vec<Preset>, DatabaseError> {
        const QUERY: &str = r#"
            SELECT
                id,
                name,
                payload
            FROM presets
            ORDER BY CAST(id AS INTEGER)
        "#;

        let rows = self
            .connection
            .call(|conn| {
                let mut stmt = conn
                    .prepare_cached(QUERY)
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, String>("id")?,
                            row.get::<_, String>("name")?,
                            row.get::<_, String>("payload")?,
                        ))
                    })
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                rows.collect::<Result<Vec<_>, _>>()
                    .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await?;

        let presets = rows
            .into_iter()
            .filter_map(|(id, name, payload)| match serde_json::from_str(&payload) {
                Ok(settings) => Some(Preset { id, name, settings }),
                Err(error) => {
                    tracing::warn!(preset_id = %id, %error, "Skipping unreadable preset");
                    None
                }
            })
            .collect();
        Ok(presets)
    }

    pub async fn insert_preset(&self, name: &str, settings: &ChartSettings) -> Result<Preset, DatabaseError> {
        let query = "
            INSERT INTO presets (id, name, payload, created_at)
            VALUES (?, ?, ?, ?)
        ";
        let latest_query = "SELECT COALESCE(MAX(CAST(id AS INTEGER)), 0) FROM presets";
        let now = chrono::Utc::now();
        let millis = now.timestamp_millis();
        let preset_name = name.to_string();
        let payload = serde_json::to_string(settings)?;
        let timestamp = now.to_rfc3339();

        // Ids are creation milliseconds, bumped past the latest id on collision.
        let id = self
            .connection
            .call(move |conn| {
                let latest: i64 = conn
                    .query_row(latest_query, [], |row| row.get(0))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                let id = millis.max(latest + 1).to_string();
                conn.execute(query, (id.as_str(), preset_name.as_str(), payload.as_str(), timestamp.as_str()))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(id)
            })
            .await?;

        Ok(Preset {
            id,
            name: name.to_string(),
            settings: settings.clone(),
        })
    }

    /// Returns whether a preset was removed.
    pub async fn delete_preset(&self, preset_id: &str) -> Result<bool, DatabaseError> {
        let query = "DELETE FROM presets WHERE id = ?";
        let id = preset_id.to_string();

        let removed = self
            .connection
            .call(move |conn| {
                conn.execute(query, [id.as_str()])
                    .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn settings_round_trip_per_project() {
        let db = Database::open_in_memory().await.unwrap();
        let mut chart = ChartSettings::default();
        chart.hide_weekends = true;

        db.save_settings("europe", &UserSettings::new(chart.clone())).await.unwrap();

        let loaded = db.load_settings("europe").await.unwrap().unwrap();
        assert_eq!(loaded.chart, chart);
        assert!(db.load_settings("asia").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn saving_twice_replaces_settings() {
        let db = Database::open_in_memory().await.unwrap();
        let mut chart = ChartSettings::default();
        db.save_settings("europe", &UserSettings::new(chart.clone())).await.unwrap();

        chart.weekly_mode = true;
        db.save_settings("europe", &UserSettings::new(chart)).await.unwrap();

        assert!(db.load_settings("europe").await.unwrap().unwrap().chart.weekly_mode);
    }

    #[tokio::test]
    async fn other_versions_are_ignored() {
        let db = Database::open_in_memory().await.unwrap();
        let mut settings = UserSettings::default();
        settings.version = SETTINGS_VERSION + 1;

        db.save_settings("europe", &settings).await.unwrap();

        assert!(db.load_settings("europe").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn presets_created_back_to_back_get_distinct_ids() {
        let db = Database::open_in_memory().await.unwrap();
        let settings = ChartSettings::default();

        let mut ids = Vec::new();
        for name in ["A", "B", "C", "D"] {
            ids.push(db.insert_preset(name, &settings).await.unwrap().id);
        }

        let listed: Vec<String> = db.list_presets().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(listed, ids);
        assert!(ids.windows(2).all(|pair| pair[0].parse::<i64>().unwrap() < pair[1].parse::<i64>().unwrap()));
    }

    #[tokio::test]
    async fn presets_can_be_listed_and_deleted() {
        let db = Database::open_in_memory().await.unwrap();
        let preset = db.insert_preset("Weekly QA", &ChartSettings::default()).await.unwrap();

        let presets = db.list_presets().await.unwrap();
        assert_eq!(presets, vec![preset.clone()]);

        assert!(db.delete_preset(&preset.id).await.unwrap());
        assert!(!db.delete_preset(&preset.id).await.unwrap());
        assert!(db.list_presets().await.unwrap().is_empty());
    }
}
