use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "scanPatterns[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Settings wrapped in the client's configuration section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    pub ts_i18n: I18nSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct I18nSettings {
    /// `true`: locate locale files with `scan_patterns`.
    /// `false`: recurse into `manual_paths`.
    pub auto_discovery: bool,

    /// Glob patterns relative to the workspace root.
    pub scan_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,

    /// Directories relative to the workspace root, used when `auto_discovery` is off.
    pub manual_paths: Vec<String>,

    /// Used when the project does not declare its own locale.
    pub default_locale: String,
    pub fallback_locale: String,

    pub enable_hover: bool,
    pub enable_definition: bool,
    pub enable_completion: bool,
    pub enable_inline_translation: bool,
    /// Translation lens above each resolved call.
    pub enable_code_lens: bool,

    /// Quiet window before a triggered refresh runs.
    pub refresh_debounce_ms: u64,

    pub indexing: IndexingConfig,
    pub virtual_text: VirtualTextConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexingConfig {
    /// Concurrent locale file reads.
    /// Default: 80% of CPU cores (minimum 1).
    pub num_threads: Option<usize>,

    /// Upper bound on discovered locale files per refresh.
    pub max_files: usize,

    /// Upper bound on the blocking directory walk.
    pub discovery_timeout_ms: u64,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self { num_threads: None, max_files: 2000, discovery_timeout_ms: 5000 }
    }
}

impl IndexingConfig {
    /// Resolves `num_threads`, falling back to 80% of the available cores.
    #[must_use]
    pub fn effective_num_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(|| (num_cpus::get() * 4 / 5).max(1)).max(1)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtualTextConfig {
    /// Max characters before truncation with ellipsis.
    pub max_length: usize,
}

impl Default for VirtualTextConfig {
    fn default() -> Self {
        Self { max_length: 50 }
    }
}

impl I18nSettings {
    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern
    /// - Zero limits
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.auto_discovery && self.scan_patterns.is_empty() {
            errors.push(ValidationError::new(
                "scanPatterns",
                "At least one pattern is required when autoDiscovery is enabled. Example: [\"src/locales/**/*.{ts,js}\"]",
            ));
        }

        for (index, pattern) in self.scan_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("scanPatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        for (index, pattern) in self.exclude_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("excludePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        if self.default_locale.trim().is_empty() {
            errors.push(ValidationError::new(
                "defaultLocale",
                "The locale cannot be empty. Example: \"zhCN\"",
            ));
        }

        if self.fallback_locale.trim().is_empty() {
            errors.push(ValidationError::new(
                "fallbackLocale",
                "The locale cannot be empty. Example: \"en\"",
            ));
        }

        if self.indexing.max_files == 0 {
            errors.push(ValidationError::new(
                "indexing.maxFiles",
                "The limit must be greater than zero",
            ));
        }

        if self.indexing.num_threads == Some(0) {
            errors.push(ValidationError::new(
                "indexing.numThreads",
                "The thread count must be greater than zero, or remove this field",
            ));
        }

        if self.indexing.discovery_timeout_ms == 0 {
            errors.push(ValidationError::new(
                "indexing.discoveryTimeoutMs",
                "The timeout must be greater than zero",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Default for I18nSettings {
    fn default() -> Self {
        Self {
            auto_discovery: true,
            scan_patterns: vec![
                "packages/*/src/locales/**/*.{ts,js}".to_string(),
                "packages/*/src/i18n/**/*.{ts,js}".to_string(),
                "src/locales/**/*.{ts,js}".to_string(),
                "src/i18n/**/*.{ts,js}".to_string(),
            ],
            exclude_patterns: vec!["**/node_modules/**".to_string()],
            manual_paths: Vec::new(),
            default_locale: "zhCN".to_string(),
            fallback_locale: "en".to_string(),
            enable_hover: true,
            enable_definition: true,
            enable_completion: true,
            enable_inline_translation: true,
            enable_code_lens: true,
            refresh_debounce_ms: 300,
            indexing: IndexingConfig::default(),
            virtual_text: VirtualTextConfig::default(),
        }
    }
}
