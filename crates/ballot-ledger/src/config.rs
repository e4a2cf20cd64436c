use std::path::Path;

use serde::{Deserialize, Serialize};

use ballot_types::Identity;

use crate::error::LedgerError;

/// Configuration for a single ledger instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Initial admin identity (the deployer).
    pub admin: Identity,
    /// Record a hash-linked receipt for every committed mutating call.
    pub journal: bool,
    /// Emit a warning when a caller supplies a sequence value lower than one
    /// already observed. The call is still applied.
    pub warn_on_seq_regression: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            admin: Identity::from_label("admin"),
            journal: true,
            warn_on_seq_regression: true,
        }
    }
}

impl LedgerConfig {
    /// Default configuration administered by `admin`.
    pub fn with_admin(admin: Identity) -> Self {
        Self {
            admin,
            ..Default::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, LedgerError> {
        toml::from_str(text).map_err(|e| LedgerError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| LedgerError::Io(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, LedgerError> {
        toml::to_string(self).map_err(|e| LedgerError::Config(e.to_string()))
    }
}
