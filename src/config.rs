use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
}

#[derive(Clone)]
pub struct Config {
    pub bind_addr: String,
    pub log_level: String,
    pub storage_dir: PathBuf,
    pub refresh_interval_secs: u64,
    pub redmine: RedmineConfig,
}

#[derive(Clone)]
pub struct RedmineConfig {
    pub base_url: String,
    pub api_key: String,
    pub projects: Vec<String>,
    pub issue_query: String,
    pub available_filters_path: Option<PathBuf>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("storage_dir", &self.storage_dir)
            .field("refresh_interval_secs", &self.refresh_interval_secs)
            .field("redmine", &self.redmine)
            .finish()
    }
}

impl fmt::Debug for RedmineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedmineConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***REDACTED***")
            .field("projects", &self.projects)
            .field("issue_query", &self.issue_query)
            .field("available_filters_path", &self.available_filters_path)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var("REDMINE_BASE_URL").map_err(|_| ConfigError::Missing("REDMINE_BASE_URL"))?;

        Ok(Self {
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8080"),
            log_level: env_or("RUST_LOG", "info"),
            storage_dir: PathBuf::from(env_or("STORAGE_DIR", "storage")),
            refresh_interval_secs: env_or_parse("REFRESH_INTERVAL_SECS", 600_u64),
            redmine: RedmineConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key: env_or("REDMINE_API_KEY", ""),
                projects: parse_list(&env_or("REDMINE_PROJECTS", "")),
                issue_query: env_or("REDMINE_ISSUE_QUERY", ""),
                available_filters_path: env::var("REDMINE_AVAILABLE_FILTERS")
                    .ok()
                    .filter(|path| !path.trim().is_empty())
                    .map(PathBuf::from),
            },
        })
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Failed to parse env var, using default");
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
