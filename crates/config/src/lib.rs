//! Process configuration, read once from the environment at startup.
//!
//! | variable | default |
//! |---|---|
//! | `COMPANY_CUT` | `0.1` |
//! | `DATABASE_URL` | sqlite file in the asset directory |
//! | `HOST` | `127.0.0.1` |
//! | `BACKEND_PORT` / `PORT` | `3000` |

use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_COMPANY_CUT: f64 = 0.1;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

const COMPANY_CUT_ENV: &str = "COMPANY_CUT";
const DATABASE_URL_ENV: &str = "DATABASE_URL";
const HOST_ENV: &str = "HOST";
const PORT_ENVS: [&str; 2] = ["BACKEND_PORT", "PORT"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("COMPANY_CUT must be a number between 0 and 1, got {0:?}")]
    InvalidCompanyCut(String),
    #[error("{name} must be a port number, got {value:?}")]
    InvalidPort { name: &'static str, value: String },
    #[error("Failed to resolve asset directory: {0}")]
    AssetDir(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub company_cut: f64,
    pub database_url: String,
    pub host: String,
    pub port: u16,
}

/// Loads `.env` from the working directory if present.
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!("Failed to load .env: {err}"),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let company_cut = match read(COMPANY_CUT_ENV) {
            Some(raw) => parse_company_cut(&raw)?,
            None => DEFAULT_COMPANY_CUT,
        };

        let database_url = match read(DATABASE_URL_ENV) {
            Some(url) => url,
            None => utils::assets::default_database_url()?,
        };

        let host = read(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());

        let mut port = DEFAULT_PORT;
        for name in PORT_ENVS {
            if let Some(raw) = read(name) {
                port = raw
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidPort { name, value: raw })?;
                break;
            }
        }

        Ok(Self {
            company_cut,
            database_url,
            host,
            port,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_company_cut(raw: &str) -> Result<f64, ConfigError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && (0.0..=1.0).contains(&value) => Ok(value),
        _ => Err(ConfigError::InvalidCompanyCut(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[("DATABASE_URL", "sqlite::memory:")]).unwrap();
        assert_eq!(config.company_cut, DEFAULT_COMPANY_CUT);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://guild@localhost/guild"),
            ("COMPANY_CUT", " 0.25 "),
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("BACKEND_PORT", "9090"),
        ])
        .unwrap();
        assert_eq!(config.company_cut, 0.25);
        assert_eq!(config.database_url, "postgres://guild@localhost/guild");
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn rejects_out_of_range_company_cut() {
        for raw in ["1.5", "-0.1", "NaN", "ten percent"] {
            let err = config_from(&[("DATABASE_URL", "sqlite::memory:"), ("COMPANY_CUT", raw)])
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidCompanyCut(_)), "{raw}");
        }
    }

    #[test]
    fn rejects_bad_port() {
        let err = config_from(&[("DATABASE_URL", "sqlite::memory:"), ("PORT", "70000")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { name: "PORT", .. }));
    }

    #[test]
    fn default_database_lives_in_asset_dir() {
        let temp = test_support::temp_root("config");
        let _guard = test_support::AssetDirGuard::new(temp.path());

        let config = config_from(&[]).unwrap();

        assert!(config.database_url.starts_with("sqlite://"));
        assert!(
            config
                .database_url
                .contains(&*temp.path().to_string_lossy())
        );
    }
}
