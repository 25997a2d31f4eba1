//! Configuration module for webtopay-server.
//!
//! Handles loading configuration from TOML files and CLI arguments, and
//! reading the gateway's public key.

pub mod file;
pub mod runtime;

use crate::config::file::{FileConfig, SignatureConfig};
use crate::config::runtime::{CallbackSignChecker, RuntimeConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use webtopay_sdk::{CallbackValidator, HmacSignChecker, RsaSignChecker};

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to read public key {path:?}: {source}")]
    PublicKeyError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub listen: SocketAddr,
    pub runtime: RuntimeConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Load the signature key and build the callback validator
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        self.validate(&file_config)?;
        self.build_loaded_config(file_config)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if config.project.id.to_project_id().as_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "project id must not be empty".to_string(),
            ));
        }

        let field = match &config.signature {
            SignatureConfig::Rsa { field, .. } => field,
            SignatureConfig::Hmac { secret, field } => {
                if secret.is_empty() {
                    return Err(ConfigError::ValidationError(
                        "hmac secret must not be empty".to_string(),
                    ));
                }
                field
            }
        };
        if field.is_empty() || field == webtopay_sdk::DATA_FIELD {
            return Err(ConfigError::ValidationError(format!(
                "invalid signature field {field:?}"
            )));
        }

        for field in config.callback.expected_fields.keys() {
            if field.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "expected field names must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn build_loaded_config(&self, file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
        let sign_checker = self.build_sign_checker(file_config.signature)?;
        let validator = CallbackValidator::new(file_config.project.id.to_project_id(), sign_checker);

        Ok(LoadedConfig {
            listen: file_config.server.listen,
            runtime: RuntimeConfig {
                validator,
                expected_fields: file_config.callback.expected_fields,
            },
        })
    }

    fn build_sign_checker(
        &self,
        signature: SignatureConfig,
    ) -> Result<CallbackSignChecker, ConfigError> {
        match signature {
            SignatureConfig::Rsa {
                public_key_path,
                field,
            } => {
                let path = self.resolve(&public_key_path);
                let key = std::fs::read(&path).map_err(|source| ConfigError::PublicKeyError {
                    path: path.clone(),
                    source,
                })?;
                if key.is_empty() {
                    return Err(ConfigError::ValidationError(format!(
                        "public key {path:?} is empty"
                    )));
                }
                tracing::debug!(?path, sign_field = %field, "loaded gateway public key");
                Ok(CallbackSignChecker::Rsa(
                    RsaSignChecker::new(key).with_sign_field(field),
                ))
            }
            SignatureConfig::Hmac { secret, field } => Ok(CallbackSignChecker::Hmac(
                HmacSignChecker::new(secret.as_bytes()).with_sign_field(field),
            )),
        }
    }

    /// Relative key paths are taken from the config file's directory.
    fn resolve(&self, path: &Path) -> PathBuf {
        match self.config_path.parent() {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}
