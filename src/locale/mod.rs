//! Locale files: discovery, parsing, merging, indexing and resolution.

pub mod discovery;
pub mod engine;
pub mod error;
pub mod index;
pub mod literal;
pub mod locale_id;
pub mod merge;
pub mod parser;
pub mod project;

/// Nested key/value messages of one locale. Insertion ordered.
pub type LocaleTree = serde_json::Map<String, serde_json::Value>;

pub use engine::{
    I18nEngine,
    RefreshError,
    RefreshSummary,
};
pub use error::LocaleError;
pub use index::{
    KeyLocation,
    LocaleIndex,
    TranslationResult,
};
pub use locale_id::normalize_locale;
