//! Translation call recognition.
//!
//! This is a line-based regex heuristic, not a parser. Known limits:
//! - any function named `t` is treated as a translation call
//! - keys must be plain literals without quotes inside
//! - an interpolation argument ends at the first `)`, so nested calls in the
//!   argument are cut short and read as `none`
//! - the key quote must match on both sides (`t('k")` is not a call)
//! - calls spanning several lines are not recognised

use std::sync::LazyLock;

use regex::{
    Captures,
    Match,
    Regex,
};
use serde::Serialize;
use serde_json::Value;

use crate::locale::literal::evaluate_literal;
use crate::syntax::interpolation::{
    Interpolation,
    InterpolationType,
};
use crate::types::SourceRange;

/// `t('key')`, `$t('key', args)`, `i18n.t("key")`...
///
/// The key quote must match on both sides. Group 4 is the raw text between the
/// key and the closing parenthesis.
#[allow(clippy::expect_used)] // 固定パターン
static CALL_SITE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:\$t|(?:^|[\s({,])t|\.t)\s*\(\s*(?:'([^'"`]+)'|"([^'"`]+)"|`([^'"`]+)`)([^)]*)\)"#,
    )
    .expect("valid regex")
});

/// A translation call read from one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallInfo {
    pub key: String,
    #[serde(flatten)]
    pub interpolation: Interpolation,
}

impl CallInfo {
    #[must_use]
    pub const fn interpolation_type(&self) -> InterpolationType {
        self.interpolation.interpolation_type()
    }
}

/// A translation call found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallSite {
    pub key: String,
    /// Range of the key, quotes excluded.
    pub key_range: SourceRange,
    /// Range of the whole call expression.
    pub call_range: SourceRange,
    /// Raw text after the key up to the closing parenthesis.
    pub arguments: String,
}

impl CallSite {
    #[must_use]
    pub fn call_info(&self) -> CallInfo {
        CallInfo { key: self.key.clone(), interpolation: arguments_interpolation(&self.arguments) }
    }
}

/// Key of a [`CALL_SITE`] match, whichever quote it used.
fn key_match<'t>(captures: &Captures<'t>) -> Option<Match<'t>> {
    captures.get(1).or_else(|| captures.get(2)).or_else(|| captures.get(3))
}

/// Interpolation from the raw text after the key (`, { name: 'Bob' }`).
fn arguments_interpolation(arguments: &str) -> Interpolation {
    arguments.trim().strip_prefix(',').map_or(Interpolation::None, parse_interpolation_argument)
}

/// Recognises the first translation call in `text`.
///
/// Same recognition as [`scan_call_sites`]. Returns `None` when there is no
/// call. A second argument that cannot be read never hides the key; it
/// degrades to [`Interpolation::None`].
#[must_use]
pub fn parse_call_info(text: &str) -> Option<CallInfo> {
    let captures = CALL_SITE.captures(text)?;
    let key = key_match(&captures)?.as_str().to_string();
    let arguments = captures.get(4).map_or("", |m| m.as_str());

    Some(CallInfo { key, interpolation: arguments_interpolation(arguments) })
}

/// Classifies the second argument of a call.
#[must_use]
pub fn parse_interpolation_argument(text: &str) -> Interpolation {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Interpolation::None;
    }

    let is_object = trimmed.starts_with('{') && trimmed.ends_with('}');
    let is_array = trimmed.starts_with('[') && trimmed.ends_with(']');
    if !is_object && !is_array {
        return Interpolation::Rest(trimmed.to_string());
    }

    match evaluate_literal(trimmed) {
        Ok(Value::Object(map)) if is_object => Interpolation::Object(map),
        Ok(Value::Array(items)) if is_array => Interpolation::Array(items),
        Ok(_) => Interpolation::None,
        Err(error) => {
            tracing::debug!(%error, argument = trimmed, "Unreadable interpolation argument");
            Interpolation::None
        }
    }
}

/// Every translation call in a document, in order.
#[must_use]
pub fn scan_call_sites(text: &str) -> Vec<CallSite> {
    let mut sites = Vec::new();

    for (line_index, line) in text.split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        #[allow(clippy::cast_possible_truncation)] // ドキュメントが u32 行を超えることはない
        let line_number = line_index as u32;

        for captures in CALL_SITE.captures_iter(line) {
            let (Some(whole), Some(key)) = (captures.get(0), key_match(&captures)) else {
                continue;
            };

            sites.push(CallSite {
                key: key.as_str().to_string(),
                key_range: SourceRange::on_line(line_number, line, key.start(), key.end()),
                call_range: SourceRange::on_line(line_number, line, whole.start(), whole.end()),
                arguments: captures.get(4).map_or_else(String::new, |m| m.as_str().to_string()),
            });
        }
    }

    sites
}
