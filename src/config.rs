//! Runner configuration loading.
//!
//! The configuration file names the database to operate on, the ordered
//! list of plugin modules whose registrations build the task tree, and an
//! open-ended parameter map forwarded to every step through the
//! [`RunContext`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::context::{RunContext, DEFAULT_DATABASE};
use crate::error::{CadenceError, Result};

/// Parsed runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Database alias the run operates on.
    #[serde(default = "default_database")]
    pub database: String,

    /// Ordered plugin module identifiers handed to the loader.
    #[serde(default)]
    pub modules: Vec<String>,

    /// Named parameters forwarded to every step.
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            modules: Vec::new(),
            params: HashMap::new(),
        }
    }
}

impl RunnerConfig {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|_| CadenceError::ConfigNotFound {
            path: path.to_path_buf(),
        })?;
        serde_yaml::from_str(&content).map_err(|e| CadenceError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Build the run context for this configuration.
    pub fn context(&self, cluster: i64) -> RunContext {
        let mut ctx = RunContext::new()
            .with_database(&self.database)
            .with_cluster(cluster);
        ctx.params = self.params.clone();
        ctx
    }
}
