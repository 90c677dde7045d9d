//! Startup configuration.
//!
//! Everything has a built-in default. A `sellerdesk.json` file in the working
//! directory, when present, overrides any subset of the fields.

use crate::credentials::{
    Authenticator, CredentialEntry, CredentialTable, HashedCredentialTable, default_credentials,
};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

pub const CONFIG_FILE: &str = "sellerdesk.json";
const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP server listens on
    pub bind: String,

    /// Largest accepted request body, uploads included
    pub max_upload_bytes: usize,

    /// Keep only argon2 hashes of the secrets in memory
    pub hash_secrets: bool,

    /// Login table; exactly one entry must be the admin
    pub credentials: Vec<CredentialEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            hash_secrets: false,
            credentials: default_credentials(),
        }
    }
}

impl AppConfig {
    /// Load [`CONFIG_FILE`] from the working directory, or the defaults when
    /// it does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("{} not found, using built-in defaults", path.display());
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("loaded configuration from {}", path.display());
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        CredentialTable::from_entries(&self.credentials).map(|_| ())
    }

    /// Build the authenticator selected by `hash_secrets`.
    pub fn authenticator(&self) -> Result<Arc<dyn Authenticator>, ConfigError> {
        let table = CredentialTable::from_entries(&self.credentials)?;
        if self.hash_secrets {
            log::info!("hashing {} configured secrets", self.credentials.len());
            Ok(Arc::new(HashedCredentialTable::from_table(&table)?))
        } else {
            log::warn!("credentials are compared in plain text; set hash_secrets for production");
            Ok(Arc::new(table))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.bind, "127.0.0.1:3000");
        assert_eq!(config.max_upload_bytes, 200 * 1024 * 1024);
        assert!(!config.hash_secrets);
        assert_eq!(config.credentials, default_credentials());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AppConfig::from_json(r#"{ "bind": "0.0.0.0:8080" }"#).unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.credentials, default_credentials());
    }

    #[test]
    fn test_custom_credentials() {
        let config = AppConfig::from_json(
            r#"{
                "credentials": [
                    { "identifier": "boss", "secret": "s3cret", "is_admin": true },
                    { "identifier": "clerk", "secret": "pw" }
                ]
            }"#,
        )
        .unwrap();

        let auth = config.authenticator().unwrap();
        assert!(auth.verify("clerk", "pw"));
        assert_eq!(auth.admin_identifier(), "boss");
    }

    #[test]
    fn test_invalid_json_and_tables() {
        assert!(matches!(
            AppConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            AppConfig::from_json(r#"{ "credentials": [] }"#),
            Err(ConfigError::NoCredentials)
        ));
        assert!(matches!(
            AppConfig::from_json(
                r#"{ "credentials": [ { "identifier": "a", "secret": "b" } ] }"#
            ),
            Err(ConfigError::AdminCount(0))
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_from(Path::new("does/not/exist/sellerdesk.json")).unwrap();
        assert_eq!(config.bind, "127.0.0.1:3000");
    }

    #[test]
    fn test_hashed_authenticator() {
        let config = AppConfig {
            hash_secrets: true,
            ..AppConfig::default()
        };
        let auth = config.authenticator().unwrap();
        assert!(auth.verify("Globalite", "LalitaYadav"));
        assert!(!auth.verify("Globalite", "LalitaYadav "));
    }
}
