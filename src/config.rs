use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Path to the embedded database file (settings, admins, request log)
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Directory for operator-facing artifacts (admin credentials file)
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Log level / env-filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Fixed admin username for first-run bootstrap (generated if unset)
    #[serde(default)]
    pub admin_user: Option<String>,

    /// Fixed admin password for first-run bootstrap (generated if unset)
    #[serde(default)]
    pub admin_password: Option<String>,

    /// Fixed admin bearer token for first-run bootstrap (generated if unset)
    #[serde(default)]
    pub admin_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            db_path: default_db_path(),
            config_dir: default_config_dir(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            admin_user: None,
            admin_password: None,
            admin_token: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional `quotes` config file with
    /// environment variable overrides (`QUOTES__PORT`, `QUOTES__DB_PATH`, ...)
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("quotes").required(false))
            .add_source(config::Environment::with_prefix("QUOTES").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Externally visible base URL for operator artifacts. A wildcard bind
    /// address is not reachable as written, so it becomes a placeholder.
    pub fn base_url(&self) -> String {
        match self.bind_addr.as_str() {
            "0.0.0.0" | "::" | "[::]" => format!("http://<your-host>:{}", self.port),
            host => format!("http://{}:{}", host, self.port),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/quotes.redb")
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("./config")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
