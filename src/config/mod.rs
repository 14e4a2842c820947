//! Server configuration: settings types, the workspace loader and the manager.

/// Config file loader
mod loader;
/// Configuration manager
mod manager;
/// Configuration types and settings
mod types;

pub use manager::ConfigManager;
pub use types::{
    ConfigError,
    I18nSettings,
    IndexingConfig,
    ServerSettings,
    ValidationError,
    VirtualTextConfig,
};
