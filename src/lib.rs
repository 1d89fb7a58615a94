pub mod config;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;
pub mod util;

use mio::Token;
use thiserror::Error;

pub use config::{ConfigError, ServerConfig};
pub use server::Server;

pub const SERVER: Token = Token(0);

#[derive(Debug, Error)]
pub enum LoopError {
    /// Derived IO error
    #[error("Io error: {0}")]
    IoError(#[from] std::io::Error),

    /// The environment held a value the server cannot start with
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The configured host and port did not form a socket address
    #[error("Invalid listen address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),
}
