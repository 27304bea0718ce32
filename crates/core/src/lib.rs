pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, ConfigError, LoggingConfig as LoggingSection, SearchBackend, SearchConfig, StorageConfig};
pub use error::{Error, Result};
pub use logging::{LogFormat, LoggingConfig, init_logging};
