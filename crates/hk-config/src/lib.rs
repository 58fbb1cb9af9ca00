mod config;
pub mod paths;

pub use config::{HomeConfig, LogConfig, PoolConfig, ServerConfig, StorageConfig, TimeConfig};
