use std::net::SocketAddr;

use hashtable::DEFAULT_BUCKET_SIZE;
use thiserror::Error;

pub const HOST_VAR: &str = "KVTABLE_HOST";
pub const PORT_VAR: &str = "KVTABLE_PORT";
pub const BUCKETS_VAR: &str = "KVTABLE_BUCKETS";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a number, got: {got:?}")]
    NotANumber { var: &'static str, got: String },

    #[error("KVTABLE_BUCKETS must be at least 1")]
    ZeroBuckets,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bucket count the shared table starts with
    pub initial_buckets: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            initial_buckets: DEFAULT_BUCKET_SIZE,
        }
    }
}

impl ServerConfig {
    /// Reads `KVTABLE_HOST`, `KVTABLE_PORT` and `KVTABLE_BUCKETS`,
    /// falling back to the defaults for unset variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup(HOST_VAR) {
            config.host = host;
        }
        if let Some(port) = lookup(PORT_VAR) {
            config.port = parse_number(PORT_VAR, port)?;
        }
        if let Some(buckets) = lookup(BUCKETS_VAR) {
            config.initial_buckets = parse_number(BUCKETS_VAR, buckets)?;
            if config.initial_buckets == 0 {
                return Err(ConfigError::ZeroBuckets);
            }
        }

        Ok(config)
    }

    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::NotANumber { var, got: raw })
}
