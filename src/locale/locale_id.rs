//! Locale identifier normalization.

use std::path::Path;

/// Fixed aliases; anything not listed passes through unchanged.
const LOCALE_ALIASES: &[(&str, &str)] = &[
    ("zh-CN", "zhCN"),
    ("zh-cn", "zhCN"),
    ("zh", "zhCN"),
    ("en-US", "en"),
    ("en-us", "en"),
    ("en", "en"),
];

/// File stem that carries no locale of its own (`locales/zh-CN/index.ts`).
const INDEX_STEM: &str = "index";

/// Normalizes a locale name (`zh-CN` → `zhCN`, `en-us` → `en`).
///
/// Total and idempotent: every output is either an alias target, which maps to
/// itself, or an unmapped input.
#[must_use]
pub fn normalize_locale(name: &str) -> String {
    LOCALE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map_or_else(|| name.to_string(), |(_, normalized)| (*normalized).to_string())
}

/// Derives the locale of a locale file from its path.
///
/// The file stem is the locale (`locales/zh-CN.ts` → `zhCN`). An `index` file
/// takes the name of its directory instead (`locales/en-US/index.ts` → `en`).
#[must_use]
pub fn locale_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;

    if stem == INDEX_STEM
        && let Some(dir_name) = path.parent().and_then(Path::file_name).and_then(|n| n.to_str())
    {
        return Some(normalize_locale(dir_name));
    }

    if stem.is_empty() {
        return None;
    }

    Some(normalize_locale(stem))
}
