//! LSP lifecycle handlers: `initialize`, `initialized`, `shutdown`.

use tower_lsp::jsonrpc::Result;
use std::sync::atomic::Ordering;

use tower_lsp::lsp_types::{
    CodeLensOptions,
    CompletionOptions,
    ExecuteCommandOptions,
    HoverProviderCapability,
    InitializeParams,
    InitializeResult,
    InitializedParams,
    MessageType,
    OneOf,
    ServerCapabilities,
    ServerInfo,
    TextDocumentSyncCapability,
    TextDocumentSyncKind,
    WorkDoneProgressOptions,
};

use super::super::backend::Backend;
use super::execute_command::{
    GET_DECORATIONS_COMMAND,
    REFRESH_CACHE_COMMAND,
};
use crate::config::I18nSettings;
use crate::ide::code_lens::TOGGLE_CODE_LENS_COMMAND;

/// 補完のトリガー文字（キー引数の開きクォート）
const TRIGGER_CHARACTERS: &[&str] = &["'", "\"", "`"];

pub async fn handle_initialize(
    backend: &Backend,
    params: InitializeParams,
) -> Result<InitializeResult> {
    #[allow(deprecated)] // root_uri はワークスペースフォルダ未対応クライアント向け
    let workspace_root = params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .map(|folder| &folder.uri)
        .or(params.root_uri.as_ref())
        .and_then(|uri| uri.to_file_path().ok());

    let code_lens_refresh_support = params
        .capabilities
        .workspace
        .as_ref()
        .and_then(|workspace| workspace.code_lens.as_ref())
        .and_then(|code_lens| code_lens.refresh_support)
        .unwrap_or(false);
    backend.state.code_lens_refresh_support.store(code_lens_refresh_support, Ordering::Relaxed);

    let mut config_manager = backend.config_manager.lock().await;
    if let Err(error) = config_manager.load_settings(workspace_root) {
        backend
            .client
            .log_message(MessageType::ERROR, format!("Configuration error: {error}"))
            .await;
        tracing::error!("Configuration error during initialize: {}", error);
    }
    let settings = config_manager.get_settings().clone();
    drop(config_manager);

    Ok(InitializeResult {
        server_info: Some(ServerInfo {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }),
        capabilities: server_capabilities(&settings),
    })
}

/// 有効化されている機能だけを公開する
fn server_capabilities(settings: &I18nSettings) -> ServerCapabilities {
    let mut commands = vec![REFRESH_CACHE_COMMAND.to_string()];
    if settings.enable_inline_translation {
        commands.push(GET_DECORATIONS_COMMAND.to_string());
    }
    if settings.enable_code_lens {
        commands.push(TOGGLE_CODE_LENS_COMMAND.to_string());
    }

    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
        hover_provider: settings.enable_hover.then_some(HoverProviderCapability::Simple(true)),
        definition_provider: settings.enable_definition.then_some(OneOf::Left(true)),
        completion_provider: settings.enable_completion.then(|| CompletionOptions {
            resolve_provider: Some(false),
            trigger_characters: Some(TRIGGER_CHARACTERS.iter().map(ToString::to_string).collect()),
            work_done_progress_options: WorkDoneProgressOptions::default(),
            all_commit_characters: None,
            completion_item: None,
        }),
        code_lens_provider: settings
            .enable_code_lens
            .then_some(CodeLensOptions { resolve_provider: Some(false) }),
        execute_command_provider: Some(ExecuteCommandOptions {
            commands,
            work_done_progress_options: WorkDoneProgressOptions::default(),
        }),
        ..ServerCapabilities::default()
    }
}

pub async fn handle_initialized(backend: &Backend, _: InitializedParams) {
    backend.client.log_message(MessageType::INFO, "initialized!").await;

    if let Some(summary) = backend.refresh_translations().await {
        backend
            .client
            .log_message(
                MessageType::INFO,
                format!(
                    "Loaded {} locale files ({} keys, locales: {})",
                    summary.loaded,
                    summary.keys,
                    summary.locales.join(", ")
                ),
            )
            .await;
    }

    backend.register_file_watchers().await;
}

#[allow(clippy::unused_async)]
pub async fn handle_shutdown() -> Result<()> {
    Ok(())
}
