//! Workspace configuration (`.drive-i18n.json`).
/// Config file loader
mod loader;
/// Configuration manager
mod manager;
/// Locale file pattern matcher
mod matcher;
/// Configuration types and settings
mod types;

pub use manager::ConfigManager;
pub use matcher::{
    FileMatcher,
    MatcherError,
};
pub use types::{
    CONFIG_FILE_NAME,
    ConfigError,
    DiagnosticsConfig,
    I18nSettings,
    IndexingConfig,
    LocaleFilesConfig,
    MissingKeyPolicy,
    Severity,
    ValidationError,
};
