//! Layered configuration for the feedback backend
//!
//! Sources, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config`)
//! 3. `FEEDBACK_*` environment variables (e.g. `FEEDBACK_SECRET_KEY`)

use crate::auth::MAX_TOKEN_TTL_MINUTES;
use crate::error::{FeedbackError, Result};
use directories::ProjectDirs;
use rand::RngCore;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "FEEDBACK";

/// Runtime configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Address the HTTP API binds to
    pub bind_addr: String,
    /// HMAC key for access tokens
    pub secret_key: Option<String>,
    /// Access token lifetime
    pub access_token_expire_minutes: i64,
    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,
    /// Maximum pooled database connections
    pub pool_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            bind_addr: "127.0.0.1:8000".to_string(),
            secret_key: None,
            access_token_expire_minutes: 30,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            pool_size: 16,
        }
    }
}

/// Default database location under the platform data directory
pub fn default_database_path() -> PathBuf {
    ProjectDirs::from("com", "feedback-backend", "feedback-backend")
        .map(|dirs| dirs.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
        .join("feedback.db")
}

impl AppConfig {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            debug!("Loading configuration file: {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: AppConfig = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.bind_addr.parse::<SocketAddr>().is_err() {
            return Err(FeedbackError::Validation(format!(
                "bind_addr must be a socket address, got '{}'",
                self.bind_addr
            )));
        }

        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(FeedbackError::Validation(format!(
                "bcrypt_cost must be between 4 and 31, got {}",
                self.bcrypt_cost
            )));
        }

        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&self.access_token_expire_minutes) {
            return Err(FeedbackError::Validation(format!(
                "access_token_expire_minutes must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_MINUTES, self.access_token_expire_minutes
            )));
        }

        if self.pool_size == 0 {
            return Err(FeedbackError::Validation(
                "pool_size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Parsed bind address (validated in `validate`)
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_addr.parse().map_err(|e| {
            FeedbackError::Validation(format!("Invalid address '{}': {}", self.bind_addr, e))
        })
    }

    /// Token signing key; a random per-process key when none is configured
    pub fn signing_key(&self) -> String {
        match self.secret_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => {
                warn!(
                    "{}_SECRET_KEY not set, using a random key; tokens will not survive a restart",
                    ENV_PREFIX
                );
                let mut bytes = [0u8; 32];
                rand::thread_rng().fill_bytes(&mut bytes);
                bytes.iter().map(|b| format!("{:02x}", b)).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::io::Write;

    fn clear_env() {
        for key in [
            "FEEDBACK_DATABASE_PATH",
            "FEEDBACK_BIND_ADDR",
            "FEEDBACK_SECRET_KEY",
            "FEEDBACK_ACCESS_TOKEN_EXPIRE_MINUTES",
            "FEEDBACK_BCRYPT_COST",
            "FEEDBACK_POOL_SIZE",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8000");
        assert_eq!(config.access_token_expire_minutes, 30);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert!(config.secret_key.is_none());
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "bind_addr = \"0.0.0.0:9000\"").unwrap();
        writeln!(file, "bcrypt_cost = 6").unwrap();

        env::set_var("FEEDBACK_BCRYPT_COST", "5");
        let config = AppConfig::load(Some(file.path())).unwrap();
        clear_env();

        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.bcrypt_cost, 5);
    }

    #[test]
    #[serial]
    fn test_invalid_values_rejected() {
        clear_env();
        env::set_var("FEEDBACK_BCRYPT_COST", "2");
        let result = AppConfig::load(None);
        clear_env();
        assert!(matches!(result, Err(FeedbackError::Validation(_))));

        let config = AppConfig {
            bind_addr: "not-an-address".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_token_expiry_upper_bound() {
        clear_env();
        env::set_var("FEEDBACK_ACCESS_TOKEN_EXPIRE_MINUTES", i64::MAX.to_string());
        let result = AppConfig::load(None);
        clear_env();
        assert!(matches!(result, Err(FeedbackError::Validation(_))));

        let config = AppConfig {
            access_token_expire_minutes: MAX_TOKEN_TTL_MINUTES,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = AppConfig {
            access_token_expire_minutes: MAX_TOKEN_TTL_MINUTES + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_signing_key() {
        let config = AppConfig {
            secret_key: Some("s3cret".to_string()),
            ..Default::default()
        };
        assert_eq!(config.signing_key(), "s3cret");

        let config = AppConfig {
            secret_key: Some("   ".to_string()),
            ..Default::default()
        };
        let generated = config.signing_key();
        assert_eq!(generated.len(), 64);
        assert_ne!(generated, config.signing_key());
    }
}
