//! Execute Command ハンドラー
//!
//! `workspace/executeCommand` リクエストを処理し、
//! カスタムコマンドを実行します。

use serde::Deserialize;
use serde_json::{
    Value,
    json,
};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    ExecuteCommandParams,
    MessageType,
    Url,
};

use super::super::backend::Backend;
use crate::ide::code_lens::{
    CodeLensTarget,
    TOGGLE_CODE_LENS_COMMAND,
};

/// 翻訳キャッシュを再構築する
pub const REFRESH_CACHE_COMMAND: &str = "tsI18n.refreshCache";

/// ドキュメントのインライン翻訳を取得する
pub const GET_DECORATIONS_COMMAND: &str = "tsI18n.getDecorations";

/// `workspace/executeCommand` リクエストを処理
pub async fn handle_execute_command(
    backend: &Backend,
    params: ExecuteCommandParams,
) -> Result<Option<Value>> {
    tracing::debug!(command = %params.command, "Execute Command request");

    match params.command.as_str() {
        REFRESH_CACHE_COMMAND => handle_refresh_cache(backend).await,
        GET_DECORATIONS_COMMAND => handle_get_decorations(backend, params.arguments).await,
        TOGGLE_CODE_LENS_COMMAND => handle_toggle_code_lens(backend, params.arguments).await,
        _ => {
            tracing::warn!("Unknown command: {}", params.command);
            Ok(None)
        }
    }
}

/// `tsI18n.refreshCache` コマンドを実行
///
/// 再構築の結果（ファイル数、キー数、言語）を返す。失敗時は `null`。
async fn handle_refresh_cache(backend: &Backend) -> Result<Option<Value>> {
    let Some(summary) = backend.refresh_translations().await else {
        return Ok(None);
    };

    backend
        .client
        .show_message(
            MessageType::INFO,
            format!("Translation cache refreshed: {} keys from {} files", summary.keys, summary.loaded),
        )
        .await;

    Ok(serde_json::to_value(summary).ok())
}

/// `tsI18n.getDecorations` コマンドの引数
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetDecorationsArgs {
    /// ファイル URI
    uri: String,
    /// 最大表示文字数（省略時は設定のデフォルト値）
    max_length: Option<usize>,
}

/// `tsI18n.getDecorations` コマンドを実行
///
/// ドキュメント内の翻訳キーと翻訳値のリストを返す。
/// エディタ拡張がこの情報を使用して、キー文字列を翻訳値で置換表示する。
async fn handle_get_decorations(backend: &Backend, arguments: Vec<Value>) -> Result<Option<Value>> {
    let Some(first_arg) = arguments.into_iter().next() else {
        tracing::warn!("Missing arguments for {GET_DECORATIONS_COMMAND}");
        return Ok(Some(json!([])));
    };

    let parsed_args = match first_arg {
        Value::String(uri) => GetDecorationsArgs { uri, max_length: None },
        other => match serde_json::from_value::<GetDecorationsArgs>(other) {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!("Invalid arguments for {GET_DECORATIONS_COMMAND}: {}", e);
                return Ok(Some(json!([])));
            }
        },
    };

    tracing::debug!(
        uri = %parsed_args.uri,
        max_length = ?parsed_args.max_length,
        "Executing getDecorations"
    );

    let Ok(uri) = Url::parse(&parsed_args.uri) else {
        tracing::warn!("Invalid URI: {}", parsed_args.uri);
        return Ok(Some(json!([])));
    };

    let (mut settings, _) = backend.settings_snapshot().await;
    if !settings.enable_inline_translation {
        return Ok(Some(json!([])));
    }
    if let Some(max_length) = parsed_args.max_length {
        settings.virtual_text.max_length = max_length;
    }

    let index = backend.engine.index().await;
    let decorations = {
        let (db, source_files) = backend.state.lock_db_and_source_files().await;
        let Some(source_file) = source_files.get(&uri).copied() else {
            tracing::debug!("Source file not found: {}", uri);
            return Ok(Some(json!([])));
        };
        drop(source_files);

        crate::ide::virtual_text::get_translation_decorations(&*db, source_file, &index, &settings)
    };

    tracing::debug!(count = decorations.len(), "Generated decorations");

    Ok(Some(serde_json::to_value(decorations).unwrap_or_else(|_| json!([]))))
}

/// `tsI18n.toggleCodeLensTranslation` コマンドを実行
///
/// 引数はコードレンズに埋め込んだ `{ uri, line, key }`。
/// 切り替え後に翻訳を表示しているかを返す。引数が不正なら `null`。
async fn handle_toggle_code_lens(backend: &Backend, arguments: Vec<Value>) -> Result<Option<Value>> {
    let Some(argument) = arguments.into_iter().next() else {
        tracing::warn!("Missing arguments for {TOGGLE_CODE_LENS_COMMAND}");
        return Ok(None);
    };

    let target = match serde_json::from_value::<CodeLensTarget>(argument) {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!("Invalid arguments for {TOGGLE_CODE_LENS_COMMAND}: {}", e);
            return Ok(None);
        }
    };

    tracing::debug!(uri = %target.uri, line = target.line, key = %target.key, "Toggling code lens");

    let showing_translation = backend.state.code_lens_toggles.lock().await.toggle(target);
    backend.refresh_code_lenses();

    Ok(Some(json!({ "showingTranslation": showing_translation })))
}
