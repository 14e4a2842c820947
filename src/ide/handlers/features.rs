//! LSP 機能ハンドラー
//!
//! `completion`, `hover`, `goto_definition`, `code_lens` の処理を担当します。

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CodeLens,
    CodeLensParams,
    CompletionParams,
    CompletionResponse,
    GotoDefinitionParams,
    GotoDefinitionResponse,
    Hover,
    HoverContents,
    HoverParams,
    MarkupContent,
    MarkupKind,
};

use super::super::backend::Backend;
use crate::types::SourcePosition;

/// `textDocument/hover` リクエストを処理
pub async fn handle_hover(backend: &Backend, params: HoverParams) -> Result<Option<Hover>> {
    let uri = params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "Hover request");

    let (settings, workspace_root) = backend.settings_snapshot().await;
    if !settings.enable_hover {
        return Ok(None);
    }

    let Some(site) = backend.call_site_at(&uri, SourcePosition::from(position)).await else {
        tracing::debug!("No translation call found at position");
        return Ok(None);
    };

    let index = backend.engine.index().await;
    let hover_text = crate::ide::hover::generate_hover_content(
        &index,
        &settings,
        &site.call_info(),
        workspace_root.as_deref(),
    );

    tracing::debug!("Generated hover content for key: {}", site.key);

    Ok(Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: hover_text,
        }),
        range: Some(site.key_range.into()),
    }))
}

/// `textDocument/definition` リクエストを処理
pub async fn handle_goto_definition(
    backend: &Backend,
    params: GotoDefinitionParams,
) -> Result<Option<GotoDefinitionResponse>> {
    let uri = params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "Goto Definition request");

    let (settings, _) = backend.settings_snapshot().await;
    if !settings.enable_definition {
        return Ok(None);
    }

    let Some(site) = backend.call_site_at(&uri, SourcePosition::from(position)).await else {
        tracing::debug!("No translation call found at position");
        return Ok(None);
    };

    let index = backend.engine.index().await;
    let location = crate::ide::goto_definition::find_definition(&index, &settings, &site.key);

    if location.is_none() {
        tracing::debug!("No definition for key: {}", site.key);
    }

    Ok(location.map(GotoDefinitionResponse::Scalar))
}

/// `textDocument/completion` リクエストを処理
pub async fn handle_completion(
    backend: &Backend,
    params: CompletionParams,
) -> Result<Option<CompletionResponse>> {
    let uri = params.text_document_position.text_document.uri;
    let position = params.text_document_position.position;

    tracing::debug!(uri = %uri, line = position.line, character = position.character, "Completion request");

    let (settings, _) = backend.settings_snapshot().await;
    if !settings.enable_completion {
        return Ok(None);
    }

    let Some(text) = backend.document_text(&uri).await else {
        tracing::debug!("Source file not found: {}", uri);
        return Ok(None);
    };

    let line_text = text.lines().nth(position.line as usize).unwrap_or_default();
    let Some(context) =
        crate::ide::completion::extract_completion_context(line_text, position.line, position.character)
    else {
        tracing::debug!("Not in translation function context");
        return Ok(None);
    };

    tracing::debug!(partial_key = %context.partial_key, "Extracted completion context");

    let index = backend.engine.index().await;
    let items = crate::ide::completion::generate_completions(&index, &settings, &context);

    tracing::debug!("Generated {} completion items", items.len());

    if items.is_empty() { Ok(None) } else { Ok(Some(CompletionResponse::Array(items))) }
}

/// `textDocument/codeLens` リクエストを処理
pub async fn handle_code_lens(
    backend: &Backend,
    params: CodeLensParams,
) -> Result<Option<Vec<CodeLens>>> {
    let uri = params.text_document.uri;

    tracing::debug!(uri = %uri, "Code Lens request");

    let (settings, _) = backend.settings_snapshot().await;
    if !settings.enable_code_lens {
        return Ok(None);
    }

    let index = backend.engine.index().await;
    let toggles = backend.state.code_lens_toggles.lock().await.clone();
    let lenses = {
        let (db, source_files) = backend.state.lock_db_and_source_files().await;
        let Some(source_file) = source_files.get(&uri).copied() else {
            tracing::debug!("Source file not found in cache: {}", uri);
            return Ok(None);
        };
        drop(source_files);

        crate::ide::code_lens::code_lenses(&*db, source_file, &uri, &index, &settings, &toggles)
    };

    tracing::debug!(count = lenses.len(), "Generated code lenses");

    Ok(Some(lenses))
}
