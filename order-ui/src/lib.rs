pub mod config;
pub mod html;
pub mod logging;
pub mod state;
pub mod summary;
pub mod text;

pub use config::{AppConfig, ConfigError, LoggingConfig};
pub use state::{ArticleInput, FormSession, SessionError};
