//! Local storage configuration

use serde::Deserialize;
use std::path::PathBuf;

/// Where subscriptions live when no database is configured
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// YAML state file. Unset means a process-local in-memory store.
    pub state_file: Option<PathBuf>,
}
