//! Project locale detection.
//!
//! The project may pin its locale in `package.json` (`"locale": "zh-CN"`) or
//! in a Vue/Vite build config (`locale: 'en'`).

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::locale::locale_id::normalize_locale;

const PACKAGE_JSON: &str = "package.json";

/// Build configs scanned after `package.json`, in order.
const BUILD_CONFIG_FILES: &[&str] = &["vue.config.js", "vite.config.ts", "vite.config.js"];

#[allow(clippy::expect_used)] // 固定パターン
static LOCALE_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"locale:\s*['"`]([^'"`]+)['"`]"#).expect("valid regex"));

/// The only field of `package.json` we care about.
#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    locale: Option<String>,
}

/// Detects the project locale below `root`, normalized.
///
/// Failures are logged and yield `None`, which means "use the configured
/// default".
#[must_use]
pub fn detect_project_locale(root: &Path) -> Option<String> {
    if let Some(locale) = locale_from_package_json(root) {
        tracing::debug!(locale, "Project locale from package.json");
        return Some(normalize_locale(&locale));
    }

    for file_name in BUILD_CONFIG_FILES {
        let path = root.join(file_name);
        if !path.is_file() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                if let Some(locale) = locale_from_build_config(&content) {
                    tracing::debug!(locale, file = file_name, "Project locale from build config");
                    return Some(normalize_locale(&locale));
                }
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "Failed to read build config");
            }
        }
    }

    None
}

fn locale_from_package_json(root: &Path) -> Option<String> {
    let path = root.join(PACKAGE_JSON);
    let content = std::fs::read_to_string(&path).ok()?;

    match serde_json::from_str::<PackageManifest>(&content) {
        Ok(manifest) => manifest.locale.filter(|locale| !locale.is_empty()),
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "Failed to parse package.json");
            None
        }
    }
}

/// First `locale: '<value>'` literal in a build config.
#[must_use]
pub fn locale_from_build_config(content: &str) -> Option<String> {
    LOCALE_LITERAL
        .captures(content)
        .and_then(|captures| captures.get(1))
        .map(|matched| matched.as_str().to_string())
}
