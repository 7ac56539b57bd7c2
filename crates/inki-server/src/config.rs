//! Server configuration and trust anchor resolution
//!
//! The configuration document names every user the server accepts keys for,
//! along with the armored OpenPGP public keys allowed to sign for them, as
//! exported by `gpg --armor --export`:
//!
//! ```yaml
//! port: 3000
//! users:
//!   - name: alice
//!     keyring: |
//!       -----BEGIN PGP PUBLIC KEY BLOCK-----
//!       ...
//!       -----END PGP PUBLIC KEY BLOCK-----
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;
use tracing::{info, warn};

use inki_core::{PublicIdentity, TrustAnchor};

/// Port the server listens on when none is configured
pub const DEFAULT_PORT: u16 = 3000;

/// Errors loading the configuration document
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// One user and the keyring trusted to sign for them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    pub name: String,
    /// One or more armored `PGP PUBLIC KEY BLOCK`s
    #[serde(default)]
    pub keyring: String,
}

/// Top-level configuration document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub users: Vec<UserConfig>,

    /// Seconds between expired-key sweeps; sweeping is off when unset
    #[serde(default)]
    pub sweep_interval_secs: Option<u64>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            users: Vec::new(),
            sweep_interval_secs: None,
        }
    }
}

impl ServerConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load the document at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_yaml(&text)?;
        info!(
            path = %path.display(),
            users = config.users.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load `path` if given, falling back to defaults when it is absent or
    /// unreadable. A file that exists but does not parse is still an error.
    pub fn load_or_default(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            warn!("No configuration file specified, using defaults");
            return Ok(Self::default());
        };

        match Self::load(path) {
            Err(ConfigError::Io { path, source }) => {
                warn!(path = %path, error = %source, "Could not read configuration file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn user(&self, name: &str) -> Option<&UserConfig> {
        self.users.iter().find(|u| u.name == name)
    }
}

/// Reasons a trust anchor could not be produced
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("User '{0}' is not configured")]
    UnknownUser(String),

    #[error("Keyring for user '{user}' is misconfigured: {reason}")]
    Misconfigured { user: String, reason: String },
}

/// Source of the trust anchor for each user
#[async_trait]
pub trait TrustAnchorResolver: Send + Sync {
    async fn resolve(&self, user: &str) -> Result<TrustAnchor, ResolveError>;
}

/// Resolver backed by the `users` table of a [`ServerConfig`].
///
/// Keyrings are parsed on every call so a reload takes effect immediately.
#[derive(Debug, Default)]
pub struct ConfigResolver {
    users: RwLock<Vec<UserConfig>>,
}

impl ConfigResolver {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            users: RwLock::new(config.users.clone()),
        }
    }

    /// Replace the user table
    pub fn reload(&self, config: &ServerConfig) {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        *users = config.users.clone();
        info!(users = users.len(), "Reloaded trust anchors");
    }

    fn keyring(&self, user: &str) -> Option<String> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        users
            .iter()
            .find(|u| u.name == user)
            .map(|u| u.keyring.clone())
    }
}

#[async_trait]
impl TrustAnchorResolver for ConfigResolver {
    async fn resolve(&self, user: &str) -> Result<TrustAnchor, ResolveError> {
        let keyring = self
            .keyring(user)
            .ok_or_else(|| ResolveError::UnknownUser(user.to_string()))?;

        let identities =
            PublicIdentity::parse_keyring(&keyring).map_err(|e| ResolveError::Misconfigured {
                user: user.to_string(),
                reason: e.to_string(),
            })?;

        Ok(TrustAnchor::new(identities))
    }
}
