use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    /// Explicit database file. Desktop builds fall back to the app data dir.
    pub database_path: Option<PathBuf>,
    pub sites: Vec<String>,
    pub log_filter: String,
    pub export_lines_per_page: usize,
}

impl Config {
    /// Reads the environment. Install the subscriber first (see
    /// [`log_filter`]) or the warnings about bad values go nowhere.
    pub fn load() -> Self {
        let database_path = match var("HACCP_DB_PATH") {
            Some(path) => Some(PathBuf::from(path)),
            None => {
                info!("HACCP_DB_PATH not set, using the app data directory");
                None
            }
        };

        Self {
            database_path,
            sites: parse_sites(&try_load("HACCP_SITES", "Main Kitchen".to_string())),
            log_filter: log_filter(),
            export_lines_per_page: try_load("HACCP_EXPORT_LINES", 40),
        }
    }
}

/// `HACCP_LOG`, read without logging so it can seed the subscriber.
pub fn log_filter() -> String {
    var("HACCP_LOG").unwrap_or_else(|| "info".to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            sites: vec!["Main Kitchen".to_string()],
            log_filter: "info".to_string(),
            export_lines_per_page: 40,
        }
    }
}

pub fn parse_sites(raw: &str) -> Vec<String> {
    let sites: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if sites.is_empty() {
        warn!("No sites configured, using default");
        return vec!["Main Kitchen".to_string()];
    }
    sites
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

pub(crate) fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = var(key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };

    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value: {e}, using default: {default}");
        default
    })
}
