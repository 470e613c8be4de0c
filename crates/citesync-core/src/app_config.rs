use std::net::SocketAddr;
use std::path::PathBuf;

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
    pub domains_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub provider_request_timeout_secs: u64,
    pub provider_user_agent: String,
    pub provider_max_retries: u32,
    pub provider_retry_backoff_base_ms: u64,
    pub credential_cache_ttl_secs: u64,
    pub drain_batch_size: i64,
    pub drain_cron: String,
    pub queue_default_priority: i32,
    pub queue_max_attempts: i32,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_refresh_token: Option<String>,
    pub bing_api_key: Option<String>,
    pub foursquare_api_key: Option<String>,
    pub yext_api_key: Option<String>,
    pub localpages_portal_email: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[redacted]");
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("domains_path", &self.domains_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "provider_request_timeout_secs",
                &self.provider_request_timeout_secs,
            )
            .field("provider_user_agent", &self.provider_user_agent)
            .field("provider_max_retries", &self.provider_max_retries)
            .field(
                "provider_retry_backoff_base_ms",
                &self.provider_retry_backoff_base_ms,
            )
            .field("credential_cache_ttl_secs", &self.credential_cache_ttl_secs)
            .field("drain_batch_size", &self.drain_batch_size)
            .field("drain_cron", &self.drain_cron)
            .field("queue_default_priority", &self.queue_default_priority)
            .field("queue_max_attempts", &self.queue_max_attempts)
            .field("google_client_id", &redact(&self.google_client_id))
            .field("google_client_secret", &redact(&self.google_client_secret))
            .field("google_refresh_token", &redact(&self.google_refresh_token))
            .field("bing_api_key", &redact(&self.bing_api_key))
            .field("foursquare_api_key", &redact(&self.foursquare_api_key))
            .field("yext_api_key", &redact(&self.yext_api_key))
            .field(
                "localpages_portal_email",
                &redact(&self.localpages_portal_email),
            )
            .finish()
    }
}
