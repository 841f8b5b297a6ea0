// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Server configuration, read from the environment (and an optional `.env` file).
//!
//! | Variable | Default |
//! |---|---|
//! | `TASKTALLY_BACKEND` | `sqlite` (or `local`) |
//! | `TASKTALLY_DATABASE_URL` | `sqlite://database/sqlite.db` |
//! | `TASKTALLY_DATA_FILE` | `database/tasks.json` |
//! | `TASKTALLY_ADDR` | `0.0.0.0:3000` |
use anyhow::{bail, Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_DB_URL: &str = "sqlite://database/sqlite.db";
pub const DEFAULT_DATA_FILE: &str = "database/tasks.json";
pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Where tasks and status history are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Sqlite { database_url: String },
    Local { data_file: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend: Backend,
    pub addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let backend = match get("TASKTALLY_BACKEND").as_deref().map(str::trim) {
            None | Some("sqlite") => Backend::Sqlite {
                database_url: get("TASKTALLY_DATABASE_URL")
                    .unwrap_or_else(|| DEFAULT_DB_URL.to_string()),
            },
            Some("local") => Backend::Local {
                data_file: get("TASKTALLY_DATA_FILE")
                    .unwrap_or_else(|| DEFAULT_DATA_FILE.to_string())
                    .into(),
            },
            Some(other) => bail!("Unknown TASKTALLY_BACKEND '{other}', expected 'sqlite' or 'local'"),
        };

        let addr = get("TASKTALLY_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr
            .trim()
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid TASKTALLY_ADDR '{addr}'"))?;

        Ok(Self { backend, addr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(
            config.backend,
            Backend::Sqlite {
                database_url: DEFAULT_DB_URL.to_string()
            }
        );
        assert_eq!(config.addr, "0.0.0.0:3000".parse().unwrap());
    }

    #[test]
    fn test_local_backend() {
        let config = config_from(&[
            ("TASKTALLY_BACKEND", "local"),
            ("TASKTALLY_DATA_FILE", "/tmp/tally.json"),
            ("TASKTALLY_ADDR", "127.0.0.1:8080"),
        ])
        .unwrap();

        assert_eq!(
            config.backend,
            Backend::Local {
                data_file: PathBuf::from("/tmp/tally.json")
            }
        );
        assert_eq!(config.addr.port(), 8080);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_from(&[("TASKTALLY_BACKEND", "postgres")]).is_err());
        assert!(config_from(&[("TASKTALLY_ADDR", "not-an-address")]).is_err());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config_from(&[("TASKTALLY_BACKEND", " "), ("TASKTALLY_ADDR", "")]).unwrap();
        assert!(matches!(config.backend, Backend::Sqlite { .. }));
        assert_eq!(config.addr.port(), 3000);
    }
}
