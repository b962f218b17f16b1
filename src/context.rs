//! Run context shared by every step in a run.

use std::collections::HashMap;

/// Database alias used when none is selected.
pub const DEFAULT_DATABASE: &str = "default";

/// Cluster filter value meaning "all clusters".
pub const ALL_CLUSTERS: i64 = -1;

/// Context forwarded unmodified to every step's weight, execute, and
/// describe call.
///
/// The context is shared by all lanes of a run without synchronization, so
/// steps receive it by shared reference and must not mutate it.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Database alias the run operates on.
    pub database: String,
    /// Cluster/shard filter; [`ALL_CLUSTERS`] selects everything.
    pub cluster: i64,
    /// Open-ended named parameters.
    pub params: HashMap<String, serde_json::Value>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    /// Create a context for the default database with no cluster filter.
    pub fn new() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            cluster: ALL_CLUSTERS,
            params: HashMap::new(),
        }
    }

    /// Set the database alias.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the cluster filter.
    pub fn with_cluster(mut self, cluster: i64) -> Self {
        self.cluster = cluster;
        self
    }

    /// Add a named parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Look up a named parameter.
    pub fn param(&self, key: &str) -> Option<&serde_json::Value> {
        self.params.get(key)
    }
}
