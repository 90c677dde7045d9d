//! Credential table and the `Authenticator` seam.
//!
//! The default table compares secrets in plain text with an exact, case
//! sensitive match. `HashedCredentialTable` offers the same behavior on top of
//! argon2 hashes and is selected with the `hash_secrets` config option.

use crate::error::ConfigError;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One configured login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialEntry {
    /// User identifier typed into the login form
    pub identifier: String,

    /// Secret in plain text
    pub secret: String,

    /// Whether this is the designated admin identifier
    #[serde(default)]
    pub is_admin: bool,
}

impl CredentialEntry {
    pub fn new(identifier: &str, secret: &str, is_admin: bool) -> Self {
        Self {
            identifier: identifier.to_string(),
            secret: secret.to_string(),
            is_admin,
        }
    }
}

/// Public view of a configured login, without its secret.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Account {
    pub identifier: String,
    pub is_admin: bool,
}

impl Account {
    pub fn role(&self) -> &'static str {
        if self.is_admin { "Admin" } else { "Sub User" }
    }
}

/// Built-in logins used when no config file overrides them.
pub fn default_credentials() -> Vec<CredentialEntry> {
    vec![
        CredentialEntry::new("Globalite", "LalitaYadav", true),
        CredentialEntry::new("User", "Kuber", false),
    ]
}

/// Checks a submitted identifier/secret pair.
pub trait Authenticator: Send + Sync {
    /// True when `identifier` exists and `secret` matches it exactly.
    fn verify(&self, identifier: &str, secret: &str) -> bool;

    /// The single identifier whose login carries admin rights.
    fn admin_identifier(&self) -> &str;

    /// All configured logins in configuration order.
    fn accounts(&self) -> Vec<Account>;
}

/// Plaintext credential table.
#[derive(Debug, Clone)]
pub struct CredentialTable {
    secrets: HashMap<String, String>,
    order: Vec<String>,
    admin: String,
}

impl CredentialTable {
    /// Build a table, rejecting duplicate identifiers and anything other than
    /// exactly one admin entry.
    pub fn from_entries(entries: &[CredentialEntry]) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::NoCredentials);
        }

        let mut seen = HashSet::new();
        for entry in entries {
            if !seen.insert(entry.identifier.as_str()) {
                return Err(ConfigError::DuplicateIdentifier(entry.identifier.clone()));
            }
        }

        let admins: Vec<&CredentialEntry> = entries.iter().filter(|e| e.is_admin).collect();
        if admins.len() != 1 {
            return Err(ConfigError::AdminCount(admins.len()));
        }
        let admin = admins[0].identifier.clone();

        Ok(Self {
            secrets: entries
                .iter()
                .map(|e| (e.identifier.clone(), e.secret.clone()))
                .collect(),
            order: entries.iter().map(|e| e.identifier.clone()).collect(),
            admin,
        })
    }

    fn ordered_accounts(order: &[String], admin: &str) -> Vec<Account> {
        order
            .iter()
            .map(|identifier| Account {
                identifier: identifier.clone(),
                is_admin: identifier == admin,
            })
            .collect()
    }
}

impl Authenticator for CredentialTable {
    fn verify(&self, identifier: &str, secret: &str) -> bool {
        match self.secrets.get(identifier) {
            Some(stored) => stored == secret,
            None => false,
        }
    }

    fn admin_identifier(&self) -> &str {
        &self.admin
    }

    fn accounts(&self) -> Vec<Account> {
        Self::ordered_accounts(&self.order, &self.admin)
    }
}

/// Credential table that only keeps argon2 hashes of the secrets.
pub struct HashedCredentialTable {
    hashes: HashMap<String, String>,
    order: Vec<String>,
    admin: String,
}

impl HashedCredentialTable {
    /// Hash every secret of `table` with a fresh salt.
    pub fn from_table(table: &CredentialTable) -> Result<Self, ConfigError> {
        let mut hashes = HashMap::new();
        for identifier in &table.order {
            let secret = table
                .secrets
                .get(identifier)
                .ok_or_else(|| ConfigError::Hashing(identifier.clone()))?;
            let hash =
                hash_secret(secret).map_err(|_| ConfigError::Hashing(identifier.clone()))?;
            hashes.insert(identifier.clone(), hash);
        }

        Ok(Self {
            hashes,
            order: table.order.clone(),
            admin: table.admin.clone(),
        })
    }
}

impl Authenticator for HashedCredentialTable {
    fn verify(&self, identifier: &str, secret: &str) -> bool {
        let Some(stored) = self.hashes.get(identifier) else {
            return false;
        };
        let parsed_hash = match PasswordHash::new(stored) {
            Ok(hash) => hash,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn admin_identifier(&self) -> &str {
        &self.admin
    }

    fn accounts(&self) -> Vec<Account> {
        CredentialTable::ordered_accounts(&self.order, &self.admin)
    }
}

/// Hash a secret using Argon2id.
fn hash_secret(secret: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}
