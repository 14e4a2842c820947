//! Interpolation placeholders and arguments.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{
    Map,
    Value,
};

/// `{{name}}`
#[allow(clippy::expect_used)] // 固定パターン
static DOUBLE_BRACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^}]+)\}\}").expect("valid regex"));

/// `{name}`
#[allow(clippy::expect_used)] // 固定パターン
static SINGLE_BRACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("valid regex"));

/// `{0}`
#[allow(clippy::expect_used)] // 固定パターン
static NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\d+\}").expect("valid regex"));

/// Kind of the interpolation argument passed to a translation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationType {
    #[default]
    None,
    Object,
    Array,
    Rest,
}

impl InterpolationType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Object => "object",
            Self::Array => "array",
            Self::Rest => "rest",
        }
    }
}

impl fmt::Display for InterpolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The second argument of a translation call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "interpolationType", content = "interpolation", rename_all = "lowercase")]
pub enum Interpolation {
    /// No argument, or one that could not be read.
    #[default]
    None,
    /// `t('key', { name: 'Bob' })`
    Object(Map<String, Value>),
    /// `t('key', ['Bob', 3])`
    Array(Vec<Value>),
    /// Anything else, kept as trimmed source text (`t('key', params)`).
    Rest(String),
}

impl Interpolation {
    #[must_use]
    pub const fn interpolation_type(&self) -> InterpolationType {
        match self {
            Self::None => InterpolationType::None,
            Self::Object(_) => InterpolationType::Object,
            Self::Array(_) => InterpolationType::Array,
            Self::Rest(_) => InterpolationType::Rest,
        }
    }
}

/// Extracts placeholder names from a translation string.
///
/// `{{name}}`, `{name}` and `{0}` are scanned independently and unioned in
/// that order; duplicates are dropped. The single-brace scan also sees
/// `{{name}` inside a double-brace placeholder, which reduces to the same name.
#[must_use]
pub fn extract_interpolation_keys(template: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();

    for regex in [&*DOUBLE_BRACE, &*SINGLE_BRACE, &*NUMERIC] {
        for matched in regex.find_iter(template) {
            let name = matched.as_str().replace(['{', '}'], "").trim().to_string();
            if !keys.contains(&name) {
                keys.push(name);
            }
        }
    }

    keys
}
