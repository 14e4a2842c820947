//! 設定ファイルの読み込み関数

use std::path::Path;

use serde_json::Value;

use super::{
    ConfigError,
    I18nSettings,
};

/// ワークスペース直下の設定ファイル名
pub(super) const CONFIG_FILE_NAME: &str = ".ts-i18n.json";

/// クライアント設定と同じセクション名
const SETTINGS_SECTION: &str = "tsI18n";

/// `.ts-i18n.json` を読み込む
///
/// 設定そのもの、または `{ "tsI18n": { ... } }` の形式を受け付ける。
/// ファイルがなければ `Ok(None)`。
pub(super) fn load_from_workspace(
    workspace_root: &Path,
) -> Result<Option<I18nSettings>, ConfigError> {
    let config_path = workspace_root.join(CONFIG_FILE_NAME);

    if !config_path.is_file() {
        tracing::debug!(path = %config_path.display(), "No workspace configuration file");
        return Ok(None);
    }

    let content = std::fs::read_to_string(&config_path)?;
    let mut document: Value = serde_json::from_str(&content)?;

    let section = match document.get_mut(SETTINGS_SECTION).map(Value::take) {
        Some(section @ Value::Object(_)) => section,
        _ => document,
    };
    let settings: I18nSettings = serde_json::from_value(section)?;

    tracing::info!(path = %config_path.display(), "Loaded workspace configuration");
    Ok(Some(settings))
}
