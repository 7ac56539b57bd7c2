//! Host agent support
//!
//! An agent runs on each SSH host (typically as sshd's
//! `AuthorizedKeysCommand`) and prints the keys the server currently holds
//! for the connecting user. Before doing so it can run a list of shell
//! checks; if any fails, no keys are printed.

use serde::Deserialize;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

use crate::client::KeyClient;
use crate::error::{ClientError, Result};

/// Server used when the agent config names none
pub const DEFAULT_SERVER: &str = "http://localhost:3000";

/// Agent configuration document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_server")]
    pub server: String,

    /// Shell commands that must all succeed before keys are served
    #[serde(default)]
    pub checks: Vec<String>,
}

fn default_server() -> String {
    DEFAULT_SERVER.to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            checks: Vec::new(),
        }
    }
}

impl AgentConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Load `path`, or fall back to defaults when it cannot be read
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_yaml(&text),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "No agent configuration, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn client(&self) -> KeyClient {
        KeyClient::new(self.server.clone())
    }

    /// Run every check with `bash -c`, stopping at the first failure
    pub fn run_checks(&self) -> Result<()> {
        for check in &self.checks {
            let status = Command::new("bash")
                .arg("-c")
                .arg(check)
                .status()
                .map_err(|_| ClientError::CheckFailed {
                    command: check.clone(),
                    code: None,
                })?;

            if !status.success() {
                return Err(ClientError::CheckFailed {
                    command: check.clone(),
                    code: status.code(),
                });
            }
            debug!(check = %check, "Check passed");
        }
        Ok(())
    }

    /// Run the checks, then fetch `user`'s authorized keys
    pub async fn authorized_keys(&self, user: &str) -> Result<String> {
        self.run_checks()?;
        self.client().authorized_keys(user, false).await
    }
}
