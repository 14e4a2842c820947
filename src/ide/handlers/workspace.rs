//! Workspace-related handlers.

use serde_json::Value;
use tower_lsp::lsp_types::{
    DidChangeConfigurationParams,
    DidChangeWatchedFilesParams,
    MessageType,
};

use super::super::backend::Backend;
use crate::config::{
    I18nSettings,
    ServerSettings,
};

pub async fn handle_did_change_configuration(
    backend: &Backend,
    params: DidChangeConfigurationParams,
) {
    tracing::info!(settings = %params.settings, "didChangeConfiguration received");

    let Some(new_settings) = settings_from_value(params.settings) else {
        tracing::warn!("Ignoring unreadable configuration");
        return;
    };

    let mut config_manager = backend.config_manager.lock().await;
    match config_manager.update_settings(new_settings) {
        Ok(()) => {
            drop(config_manager);
            tracing::info!("configuration updated successfully");

            backend.refresh_translations().await;
        }
        Err(error) => {
            drop(config_manager);
            tracing::error!(%error, "configuration validation error");
            backend
                .client
                .log_message(MessageType::ERROR, format!("Configuration error: {error}"))
                .await;
        }
    }
}

/// `{ "tsI18n": { ... } }` を優先し、なければ設定そのものとして読む
fn settings_from_value(value: Value) -> Option<I18nSettings> {
    serde_json::from_value::<ServerSettings>(value.clone())
        .map(|wrapped| wrapped.ts_i18n)
        .or_else(|_| serde_json::from_value::<I18nSettings>(value))
        .ok()
}

pub async fn handle_did_change_watched_files(
    backend: &Backend,
    params: DidChangeWatchedFilesParams,
) {
    let mut needs_refresh = false;

    for change in params.changes {
        let Some(file_path) = Backend::uri_to_path(&change.uri) else {
            continue;
        };

        let mut config_manager = backend.config_manager.lock().await;

        if config_manager.is_config_file(&file_path) {
            tracing::debug!("Config file changed: {:?}, type: {:?}", file_path, change.typ);
            let root = config_manager.workspace_root().cloned();
            if let Err(error) = config_manager.load_settings(root) {
                drop(config_manager);
                backend
                    .client
                    .log_message(MessageType::ERROR, format!("Configuration error: {error}"))
                    .await;
                continue;
            }
            needs_refresh = true;
            continue;
        }

        drop(config_manager);

        if backend.is_locale_file(&file_path).await {
            tracing::debug!("Locale file changed: {:?}, type: {:?}", file_path, change.typ);
            needs_refresh = true;
        }
    }

    if needs_refresh {
        backend.schedule_refresh();
    }
}
