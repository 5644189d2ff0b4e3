//! Process configuration read from the environment

use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = lookup("LOTTO_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(home).join(".super-lotto").join("lotto.db")
            },
            PathBuf::from,
        );

        let port = match lookup("LOTTO_PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Invalid LOTTO_PORT, using default");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        Self { db_path, port }
    }
}
