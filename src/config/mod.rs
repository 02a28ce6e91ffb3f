//! Runtime configuration. The only externally configurable setting is the
//! listening port, read from `PORT`. See `original_source/pkg/server/server.go`'s
//! `WithEnvPort`.

use std::env;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 6379;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config { port: DEFAULT_PORT }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid PORT value {0:?}: not a valid port number")]
    InvalidPort(String),
}

impl Config {
    /// Reads `PORT` from the environment, falling back to [`DEFAULT_PORT`]
    /// when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map(|port| Config { port })
                .map_err(|_| ConfigError::InvalidPort(raw)),
            Err(env::VarError::NotPresent) => Ok(Config::default()),
            Err(env::VarError::NotUnicode(raw)) => {
                Err(ConfigError::InvalidPort(raw.to_string_lossy().into_owned()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_6379() {
        assert_eq!(Config::default().port, 6379);
    }

    #[test]
    fn rejects_non_numeric_port() {
        assert!(matches!(
            "not-a-port".parse::<u16>().map(|port| Config { port }),
            Err(_)
        ));
    }
}
