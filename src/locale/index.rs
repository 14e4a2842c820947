//! Locale index: merged trees, key provenance and resolution.

use std::collections::{
    HashMap,
    HashSet,
};
use std::path::{
    Path,
    PathBuf,
};

use serde::Serialize;
use serde_json::Value;

use crate::config::I18nSettings;
use crate::locale::LocaleTree;
use crate::locale::locale_id::normalize_locale;
use crate::locale::merge::merge_trees;
use crate::locale::parser::ParsedLocale;
use crate::syntax::interpolation::{
    Interpolation,
    InterpolationType,
    extract_interpolation_keys,
};

/// Where a key was defined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyLocation {
    pub file_path: PathBuf,
    /// 1-based. 0 when unknown.
    pub line: u32,
}

/// A resolved translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub value: String,
    pub file_path: PathBuf,
    pub line: u32,
    pub locale: String,
    pub interpolation_keys: Vec<String>,
    pub interpolation_type: InterpolationType,
}

/// An immutable snapshot of every loaded locale.
///
/// Built file by file during a refresh, then shared read-only.
#[derive(Debug, Clone, Default)]
pub struct LocaleIndex {
    /// locale → merged tree
    trees: HashMap<String, LocaleTree>,
    /// locale → dotted key → location of the last file defining it
    locations: HashMap<String, HashMap<String, KeyLocation>>,
    /// Locales in the order their first file was indexed.
    locale_order: Vec<String>,
    /// Every leaf key across locales, first-seen order.
    all_keys: Vec<String>,
    known_keys: HashSet<String>,
    /// Locale detected from the project configuration, normalized.
    project_locale: Option<String>,
}

impl LocaleIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one parsed file into `locale` and records its keys.
    pub fn add_file(&mut self, locale: &str, file_path: &Path, parsed: ParsedLocale) {
        if !self.trees.contains_key(locale) {
            self.locale_order.push(locale.to_string());
        }

        let ParsedLocale { messages, key_lines } = parsed;

        let locations = self.locations.entry(locale.to_string()).or_default();
        let mut leaves = Vec::new();
        collect_string_leaves(&messages, &mut String::new(), &mut leaves);
        for key in leaves {
            let line = key_lines.get(&key).copied().unwrap_or(1);
            locations.insert(key.clone(), KeyLocation { file_path: file_path.to_path_buf(), line });
            if self.known_keys.insert(key.clone()) {
                self.all_keys.push(key);
            }
        }

        merge_trees(self.trees.entry(locale.to_string()).or_default(), messages);
    }

    pub fn set_project_locale(&mut self, locale: Option<&str>) {
        self.project_locale = locale.map(normalize_locale);
    }

    #[must_use]
    pub fn project_locale(&self) -> Option<&str> {
        self.project_locale.as_deref()
    }

    /// Detected project locale, else the configured default.
    #[must_use]
    pub fn primary_locale(&self, settings: &I18nSettings) -> String {
        self.project_locale.clone().unwrap_or_else(|| normalize_locale(&settings.default_locale))
    }

    /// Resolves a dotted key through the primary and fallback locales.
    ///
    /// `None` is the normal "not found" outcome.
    #[must_use]
    pub fn resolve(
        &self,
        key: &str,
        interpolation: &Interpolation,
        settings: &I18nSettings,
    ) -> Option<TranslationResult> {
        let primary = self.primary_locale(settings);
        let fallback = normalize_locale(&settings.fallback_locale);

        self.resolve_in(key, &primary, interpolation).or_else(|| {
            if fallback == primary {
                None
            } else {
                self.resolve_in(key, &fallback, interpolation)
            }
        })
    }

    /// Resolves a key in one locale only.
    #[must_use]
    pub fn resolve_in(
        &self,
        key: &str,
        locale: &str,
        interpolation: &Interpolation,
    ) -> Option<TranslationResult> {
        let Value::String(value) = lookup(self.trees.get(locale)?, key)? else {
            return None;
        };

        let location = self
            .locations
            .get(locale)
            .and_then(|keys| keys.get(key))
            .cloned()
            .unwrap_or_default();

        Some(TranslationResult {
            value: value.clone(),
            file_path: location.file_path,
            line: location.line,
            locale: locale.to_string(),
            interpolation_keys: extract_interpolation_keys(value),
            interpolation_type: interpolation.interpolation_type(),
        })
    }

    /// Location of a key: primary locale first, then any locale.
    #[must_use]
    pub fn key_location(&self, key: &str, settings: &I18nSettings) -> Option<&KeyLocation> {
        let primary = self.primary_locale(settings);

        self.locations.get(&primary).and_then(|keys| keys.get(key)).or_else(|| {
            self.locale_order
                .iter()
                .filter_map(|locale| self.locations.get(locale))
                .find_map(|keys| keys.get(key))
        })
    }

    /// Every known key, first-seen order.
    #[must_use]
    pub fn all_keys(&self) -> &[String] {
        &self.all_keys
    }

    /// Loaded locales, first-seen order.
    #[must_use]
    pub fn locales(&self) -> &[String] {
        &self.locale_order
    }
}

/// Walks a tree by `.` segments. Array elements are addressed by index.
fn lookup<'t>(tree: &'t LocaleTree, key: &str) -> Option<&'t Value> {
    let mut segments = key.split('.');
    let mut current = tree.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Dotted keys of every string leaf, recursing into objects and arrays.
fn collect_string_leaves(map: &LocaleTree, prefix: &mut String, out: &mut Vec<String>) {
    for (key, value) in map {
        collect_value(value, prefix, key, out);
    }
}

fn collect_value(value: &Value, prefix: &mut String, segment: &str, out: &mut Vec<String>) {
    let len = prefix.len();
    if !prefix.is_empty() {
        prefix.push('.');
    }
    prefix.push_str(segment);

    match value {
        Value::String(_) => out.push(prefix.clone()),
        Value::Object(map) => collect_string_leaves(map, prefix, out),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                collect_value(item, prefix, &index.to_string(), out);
            }
        }
        _ => {}
    }

    prefix.truncate(len);
}
