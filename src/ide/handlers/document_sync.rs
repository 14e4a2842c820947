//! Document synchronization handlers.

use tower_lsp::lsp_types::{
    DidChangeTextDocumentParams,
    DidCloseTextDocumentParams,
    DidOpenTextDocumentParams,
};

use super::super::backend::Backend;

pub async fn handle_did_open(backend: &Backend, params: DidOpenTextDocumentParams) {
    let uri = params.text_document.uri;
    tracing::debug!(uri = %uri, language = %params.text_document.language_id, "Document opened");

    backend.state.opened_files.lock().await.insert(uri.clone());

    backend
        .update_document(uri, params.text_document.text, Some(&params.text_document.language_id))
        .await;
}

pub async fn handle_did_change(backend: &Backend, params: DidChangeTextDocumentParams) {
    let uri = params.text_document.uri;

    let Some(change) = params.content_changes.into_iter().next_back() else {
        return;
    };

    backend.update_document(uri.clone(), change.text, None).await;

    // 編集中のロケールファイルはデバウンスして再読み込み（ディスク上の内容を使う）
    if let Ok(path) = uri.to_file_path()
        && backend.is_locale_file(&path).await
    {
        backend.schedule_refresh();
    }
}

pub async fn handle_did_close(backend: &Backend, params: DidCloseTextDocumentParams) {
    let uri = params.text_document.uri;
    tracing::debug!(uri = %uri, "Document closed");

    backend.state.opened_files.lock().await.remove(&uri);
    backend.state.code_lens_toggles.lock().await.forget_document(&uri);
    backend.remove_document(&uri).await;
}
