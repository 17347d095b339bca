use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// twitterapi.io credential. Optional at load time so that commands
    /// which never hit the provider (migrate, list) work without it.
    pub twitterapi_key: Option<String>,
    pub search_base_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub search_request_timeout_secs: u64,
    pub search_user_agent: String,
    pub search_inter_request_delay_ms: u64,
    pub search_max_retries: u32,
    pub search_retry_backoff_base_ms: u64,
    /// Upper bound on raw provider items collected by one scrape, across all keywords.
    pub scrape_max_items: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field(
                "twitterapi_key",
                &self.twitterapi_key.as_ref().map(|_| "[redacted]"),
            )
            .field("search_base_url", &self.search_base_url)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "search_request_timeout_secs",
                &self.search_request_timeout_secs,
            )
            .field("search_user_agent", &self.search_user_agent)
            .field(
                "search_inter_request_delay_ms",
                &self.search_inter_request_delay_ms,
            )
            .field("search_max_retries", &self.search_max_retries)
            .field(
                "search_retry_backoff_base_ms",
                &self.search_retry_backoff_base_ms,
            )
            .field("scrape_max_items", &self.scrape_max_items)
            .finish()
    }
}
