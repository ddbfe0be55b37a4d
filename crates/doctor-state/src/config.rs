//! Connection settings for a remote SurrealDB instance.

/// Configuration for a SurrealDB WebSocket connection
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// WebSocket endpoint URL (e.g., "wss://xxx.aws-use1.surrealdb.cloud")
    pub endpoint: String,
    pub username: String,
    pub password: String,
    /// Namespace (default: "doctor")
    pub namespace: String,
    /// Database name (default: "main")
    pub database: String,
    /// Root user (true) or database user (false)
    pub is_root: bool,
}

impl StoreConfig {
    /// Configuration for a database user with default namespace/database
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            namespace: "doctor".to_string(),
            database: "main".to_string(),
            is_root: false,
        }
    }

    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    pub fn with_database(mut self, db: impl Into<String>) -> Self {
        self.database = db.into();
        self
    }

    pub fn with_root(mut self, is_root: bool) -> Self {
        self.is_root = is_root;
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - SURREALDB_ENDPOINT (required)
    /// - SURREALDB_USERNAME (required)
    /// - SURREALDB_PASSWORD (required)
    /// - SURREALDB_NAMESPACE (optional, default: "doctor")
    /// - SURREALDB_DATABASE (optional, default: "main")
    /// - SURREALDB_ROOT (optional, default: "false")
    pub fn from_env() -> std::result::Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> std::result::Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup("SURREALDB_ENDPOINT").ok_or("SURREALDB_ENDPOINT not set")?;
        let username = lookup("SURREALDB_USERNAME").ok_or("SURREALDB_USERNAME not set")?;
        let password = lookup("SURREALDB_PASSWORD").ok_or("SURREALDB_PASSWORD not set")?;
        let namespace = lookup("SURREALDB_NAMESPACE").unwrap_or_else(|| "doctor".to_string());
        let database = lookup("SURREALDB_DATABASE").unwrap_or_else(|| "main".to_string());
        let is_root = lookup("SURREALDB_ROOT")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            endpoint,
            username,
            password,
            namespace,
            database,
            is_root,
        })
    }
}
