//! Connection settings resolution.
//!
//! # Responsibility
//! - Resolve host/credentials from explicit values, the process environment,
//!   or a `.env` file.
//!
//! # Invariants
//! - Host, user and database are required; password may be empty.
//! - The password never appears in `Debug` output.
//!
//! | Variable            | Required | Default |
//! |---------------------|----------|---------|
//! | `DATABASE_HOST`     | yes      |         |
//! | `DATABASE_PORT`     | no       | 3306    |
//! | `DATABASE_USERNAME` | yes      |         |
//! | `DATABASE_PASSWORD` | no       | empty   |
//! | `DATABASE_NAME`     | yes      |         |

use super::{DbError, DbResult};
use log::{debug, warn};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::path::Path;

pub const ENV_HOST: &str = "DATABASE_HOST";
pub const ENV_PORT: &str = "DATABASE_PORT";
pub const ENV_USERNAME: &str = "DATABASE_USERNAME";
pub const ENV_PASSWORD: &str = "DATABASE_PASSWORD";
pub const ENV_DATABASE: &str = "DATABASE_NAME";
/// When set, `.env` files are not consulted by [`ConnectionConfig::from_env`].
pub const ENV_APP_ENV: &str = "APP_ENV";

pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Resolved settings for one database connection.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl ConnectionConfig {
    /// Explicit settings on the default MySQL port.
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_MYSQL_PORT,
            user: user.into(),
            password: password.into(),
            database: database.into(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Resolves settings through an arbitrary key lookup.
    ///
    /// Blank values count as missing for required keys.
    pub fn from_lookup<F>(lookup: F) -> DbResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> DbResult<String> {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| DbError::Config(format!("missing environment variable `{key}`")))
        };

        let port = match lookup(ENV_PORT).filter(|value| !value.trim().is_empty()) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                DbError::Config(format!("`{ENV_PORT}` must be a port number, got `{raw}`"))
            })?,
            None => DEFAULT_MYSQL_PORT,
        };

        Ok(Self {
            host: required(ENV_HOST)?,
            port,
            user: required(ENV_USERNAME)?,
            password: lookup(ENV_PASSWORD).unwrap_or_default(),
            database: required(ENV_DATABASE)?,
        })
    }

    /// Resolves settings from the process environment.
    ///
    /// # Side effects
    /// - Unless `APP_ENV` is set, loads a `.env` file from the working
    ///   directory or one of its parents into the process environment.
    ///   A missing file is not an error.
    pub fn from_env() -> DbResult<Self> {
        if std::env::var_os(ENV_APP_ENV).is_none() {
            match dotenvy::dotenv() {
                Ok(path) => debug!(
                    "event=config_load module=db status=ok source=dotenv path={}",
                    path.display()
                ),
                Err(err) if err.not_found() => {
                    debug!("event=config_load module=db status=skip source=dotenv reason=not_found")
                }
                Err(err) => {
                    warn!(
                        "event=config_load module=db status=error source=dotenv error={}",
                        err
                    );
                    return Err(DbError::Config(format!("failed to load .env file: {err}")));
                }
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings from one `.env` file only.
    ///
    /// The process environment is neither read nor modified.
    pub fn from_env_file(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let entries = dotenvy::from_path_iter(path).map_err(|err| {
            DbError::Config(format!("failed to read `{}`: {err}", path.display()))
        })?;

        let mut values = HashMap::new();
        for entry in entries {
            let (key, value) = entry.map_err(|err| {
                DbError::Config(format!("failed to parse `{}`: {err}", path.display()))
            })?;
            values.insert(key, value);
        }

        Self::from_lookup(|key| values.get(key).cloned())
    }
}

impl Debug for ConnectionConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{ConnectionConfig, DEFAULT_MYSQL_PORT};
    use crate::db::DbError;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn from_lookup_reads_all_fields() {
        let config = ConnectionConfig::from_lookup(lookup_from(&[
            ("DATABASE_HOST", "db.internal"),
            ("DATABASE_PORT", "3307"),
            ("DATABASE_USERNAME", "search"),
            ("DATABASE_PASSWORD", "secret"),
            ("DATABASE_NAME", "catalog"),
        ]))
        .unwrap();

        assert_eq!(
            config,
            ConnectionConfig::new("db.internal", "search", "secret", "catalog").with_port(3307)
        );
    }

    #[test]
    fn from_lookup_defaults_port_and_password() {
        let config = ConnectionConfig::from_lookup(lookup_from(&[
            ("DATABASE_HOST", "localhost"),
            ("DATABASE_USERNAME", "root"),
            ("DATABASE_NAME", "test"),
        ]))
        .unwrap();

        assert_eq!(config.port, DEFAULT_MYSQL_PORT);
        assert!(config.password.is_empty());
    }

    #[test]
    fn from_lookup_rejects_missing_or_blank_required_values() {
        let err = ConnectionConfig::from_lookup(lookup_from(&[
            ("DATABASE_HOST", "  "),
            ("DATABASE_USERNAME", "root"),
            ("DATABASE_NAME", "test"),
        ]))
        .unwrap_err();
        assert!(matches!(err, DbError::Config(ref message) if message.contains("DATABASE_HOST")));

        let err = ConnectionConfig::from_lookup(lookup_from(&[
            ("DATABASE_HOST", "localhost"),
            ("DATABASE_USERNAME", "root"),
        ]))
        .unwrap_err();
        assert!(matches!(err, DbError::Config(ref message) if message.contains("DATABASE_NAME")));
    }

    #[test]
    fn from_lookup_rejects_invalid_port() {
        let err = ConnectionConfig::from_lookup(lookup_from(&[
            ("DATABASE_HOST", "localhost"),
            ("DATABASE_PORT", "not-a-port"),
            ("DATABASE_USERNAME", "root"),
            ("DATABASE_NAME", "test"),
        ]))
        .unwrap_err();
        assert!(matches!(err, DbError::Config(ref message) if message.contains("DATABASE_PORT")));
    }

    #[test]
    fn debug_output_redacts_password() {
        let config = ConnectionConfig::new("localhost", "root", "hunter2", "test");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
