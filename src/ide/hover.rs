//! Hover implementation

use std::fmt::Write as _;
use std::path::Path;

use serde_json::Value;

use crate::config::I18nSettings;
use crate::locale::{
    LocaleIndex,
    TranslationResult,
};
use crate::syntax::call_site::CallInfo;
use crate::syntax::interpolation::Interpolation;

/// 未解決時に表示するキーの数
const SAMPLE_KEY_COUNT: usize = 10;

/// Generate hover content for a translation call
///
/// キーが見つからない場合も、利用可能なキーの例を含む内容を返します。
#[must_use]
pub fn generate_hover_content(
    index: &LocaleIndex,
    settings: &I18nSettings,
    call: &CallInfo,
    workspace_root: Option<&Path>,
) -> String {
    match index.resolve(&call.key, &call.interpolation, settings) {
        Some(translation) => format_translation(call, &translation, workspace_root),
        None => format_not_found(index, &call.key),
    }
}

fn format_translation(
    call: &CallInfo,
    translation: &TranslationResult,
    workspace_root: Option<&Path>,
) -> String {
    let mut content = String::new();

    content.push_str("**Translation**\n\n");
    let _ = writeln!(content, "📝 `{}`\n", translation.value);

    content.push_str("**Details**\n\n");
    let _ = writeln!(content, "🔑 **Key**: `{}`\n", call.key);
    let _ = writeln!(content, "🌍 **Locale**: `{}`\n", translation.locale);

    if !translation.interpolation_keys.is_empty() {
        let _ = writeln!(
            content,
            "🔧 **Interpolation Keys**: `{}`\n",
            translation.interpolation_keys.join(", ")
        );
        write_current_values(&mut content, &call.interpolation);
    }

    if !translation.file_path.as_os_str().is_empty() {
        let path = workspace_root
            .and_then(|root| translation.file_path.strip_prefix(root).ok())
            .unwrap_or(&translation.file_path);
        let _ = writeln!(content, "📁 **Source**: `{}`\n", path.display());
    }

    content
}

fn write_current_values(content: &mut String, interpolation: &Interpolation) {
    let values: Vec<(String, String)> = match interpolation {
        Interpolation::None => return,
        Interpolation::Object(map) => {
            map.iter().map(|(key, value)| (key.clone(), display_value(value))).collect()
        }
        Interpolation::Array(items) => items
            .iter()
            .enumerate()
            .map(|(position, value)| (position.to_string(), display_value(value)))
            .collect(),
        Interpolation::Rest(expression) => vec![("0".to_string(), expression.clone())],
    };

    content.push_str("📊 **Current Values**:\n");
    for (name, value) in values {
        let _ = writeln!(content, "- `{name}`: `{value}`");
    }
    content.push('\n');
}

/// 文字列はクォートなしで表示
fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn format_not_found(index: &LocaleIndex, key: &str) -> String {
    let mut content = String::new();

    content.push_str("## ⚠️ Translation not found\n\n");
    let _ = writeln!(content, "**Key**: `{key}`\n");
    content.push_str("The key is not defined in the active or fallback locale.\n\n");
    content.push_str("- Check the key for typos\n");
    content.push_str("- Make sure a locale file defines it\n");
    content.push_str("- Run `tsI18n.refreshCache` to reload locale files\n\n");

    let all_keys = index.all_keys();
    if !all_keys.is_empty() {
        let _ = writeln!(content, "**Available keys** ({} total):", all_keys.len());
        for sample in all_keys.iter().take(SAMPLE_KEY_COUNT) {
            let _ = writeln!(content, "- `{sample}`");
        }
        if all_keys.len() > SAMPLE_KEY_COUNT {
            let _ = writeln!(content, "- ... and {} more", all_keys.len() - SAMPLE_KEY_COUNT);
        }
    }

    content
}
