//! LSPサーバーの機能に関するテスト（initialize から各リクエストまで）

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]
#![allow(clippy::indexing_slicing)]
#![allow(missing_docs)]
#![allow(clippy::match_wildcard_for_single_variants)]

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use tower_lsp::lsp_types::*;
use tower_lsp::{
    LanguageServer,
    LspService,
};
use ts_i18n_language_server::Backend;

const APP_SOURCE: &str = "const title = t('home.title')\nconst hi = $t('home.greeting', { name: 'Bob' })\nt('";

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn create_test_backend() -> Backend {
    let (service, _socket) = LspService::new(Backend::new);
    service.inner().clone()
}

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "src/locales/zh-CN.ts",
        "export default {\n  home: {\n    title: '首页',\n    greeting: '你好 {name}',\n  },\n}\n",
    );
    write(dir.path(), "src/locales/en.ts", "export default { home: { title: 'Home', about: 'About' } }\n");
    dir
}

fn app_uri(root: &Path) -> Url {
    Url::from_file_path(root.join("src/App.ts")).unwrap()
}

async fn start(backend: &Backend, root: &Path) {
    let params = InitializeParams {
        workspace_folders: Some(vec![WorkspaceFolder {
            uri: Url::from_file_path(root).unwrap(),
            name: "test".to_string(),
        }]),
        ..InitializeParams::default()
    };
    backend.initialize(params).await.unwrap();
    backend.initialized(InitializedParams {}).await;

    backend
        .did_open(DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: app_uri(root),
                language_id: "typescript".to_string(),
                version: 1,
                text: APP_SOURCE.to_string(),
            },
        })
        .await;
}

fn position_params(uri: Url, line: u32, character: u32) -> TextDocumentPositionParams {
    TextDocumentPositionParams {
        text_document: TextDocumentIdentifier { uri },
        position: Position { line, character },
    }
}

async fn hover_text(backend: &Backend, uri: Url, line: u32, character: u32) -> Option<String> {
    let hover = backend
        .hover(HoverParams {
            text_document_position_params: position_params(uri, line, character),
            work_done_progress_params: WorkDoneProgressParams::default(),
        })
        .await
        .unwrap()?;

    match hover.contents {
        HoverContents::Markup(markup) => {
            assert_eq!(markup.kind, MarkupKind::Markdown);
            Some(markup.value)
        }
        _ => panic!("Expected Markup content"),
    }
}

async fn code_lenses(backend: &Backend, uri: Url) -> Option<Vec<CodeLens>> {
    backend
        .code_lens(CodeLensParams {
            text_document: TextDocumentIdentifier { uri },
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        })
        .await
        .unwrap()
}

fn lens_titles(lenses: &[CodeLens]) -> Vec<&str> {
    lenses.iter().map(|lens| lens.command.as_ref().unwrap().title.as_str()).collect()
}

#[tokio::test]
async fn test_capabilities_are_advertised() {
    let backend = create_test_backend();

    let result = backend.initialize(InitializeParams::default()).await.unwrap();
    let capabilities = result.capabilities;

    assert!(matches!(capabilities.hover_provider, Some(HoverProviderCapability::Simple(true))));
    assert!(capabilities.definition_provider.is_some());
    assert_eq!(
        capabilities.completion_provider.unwrap().trigger_characters,
        Some(vec!["'".to_string(), "\"".to_string(), "`".to_string()])
    );
    assert_eq!(
        capabilities.execute_command_provider.unwrap().commands,
        vec![
            "tsI18n.refreshCache".to_string(),
            "tsI18n.getDecorations".to_string(),
            "tsI18n.toggleCodeLensTranslation".to_string()
        ]
    );
    assert_eq!(capabilities.code_lens_provider, Some(CodeLensOptions { resolve_provider: Some(false) }));
}

#[tokio::test]
async fn test_hover_shows_translation() {
    let dir = workspace();
    let backend = create_test_backend();
    start(&backend, dir.path()).await;

    let text = hover_text(&backend, app_uri(dir.path()), 0, 18).await.unwrap();

    assert!(text.contains("📝 `首页`"));
    assert!(text.contains("🌍 **Locale**: `zhCN`"));
    assert!(text.contains("📁 **Source**: `src/locales/zh-CN.ts`"));

    let text = hover_text(&backend, app_uri(dir.path()), 1, 16).await.unwrap();
    assert!(text.contains("- `name`: `Bob`"));
}

#[tokio::test]
async fn test_hover_outside_call_returns_none() {
    let dir = workspace();
    let backend = create_test_backend();
    start(&backend, dir.path()).await;

    assert!(hover_text(&backend, app_uri(dir.path()), 0, 2).await.is_none());
}

#[tokio::test]
async fn test_goto_definition_points_at_key_line() {
    let dir = workspace();
    let backend = create_test_backend();
    start(&backend, dir.path()).await;

    let response = backend
        .goto_definition(GotoDefinitionParams {
            text_document_position_params: position_params(app_uri(dir.path()), 0, 18),
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        })
        .await
        .unwrap();

    let Some(GotoDefinitionResponse::Scalar(location)) = response else {
        panic!("Expected a single location");
    };
    assert_eq!(location.uri, Url::from_file_path(dir.path().join("src/locales/zh-CN.ts")).unwrap());
    assert_eq!(location.range.start, Position { line: 2, character: 0 });
}

#[tokio::test]
async fn test_completion_lists_ranked_keys() {
    let dir = workspace();
    let backend = create_test_backend();
    start(&backend, dir.path()).await;

    let response = backend
        .completion(CompletionParams {
            text_document_position: position_params(app_uri(dir.path()), 2, 3),
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
            context: None,
        })
        .await
        .unwrap();

    let Some(CompletionResponse::Array(items)) = response else {
        panic!("Expected completion items");
    };
    let labels: Vec<&str> = items.iter().map(|item| item.label.as_str()).collect();
    assert_eq!(labels, vec!["home.title", "home.about", "home.greeting"]);
    assert_eq!(items[0].detail.as_deref(), Some("首页"));
    assert_eq!(items[1].detail.as_deref(), Some("About"));
}

#[tokio::test]
async fn test_get_decorations_command() {
    let dir = workspace();
    let backend = create_test_backend();
    start(&backend, dir.path()).await;

    let result = backend
        .execute_command(ExecuteCommandParams {
            command: "tsI18n.getDecorations".to_string(),
            arguments: vec![json!({ "uri": app_uri(dir.path()).to_string() })],
            work_done_progress_params: WorkDoneProgressParams::default(),
        })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result[0]["key"], json!("home.title"));
    assert_eq!(result[0]["value"], json!("首页"));
    assert_eq!(result[0]["hasTranslation"], json!(true));
    assert_eq!(result[0]["range"]["start"], json!({ "line": 0, "character": 17 }));
    assert_eq!(result[1]["value"], json!("你好 {name}"));
}

#[tokio::test]
async fn test_refresh_cache_picks_up_new_keys() {
    let dir = workspace();
    let backend = create_test_backend();
    start(&backend, dir.path()).await;

    write(dir.path(), "src/locales/ja.ts", "export default { home: { title: 'ホーム', new: '新規' } }\n");
    let result = backend
        .execute_command(ExecuteCommandParams {
            command: "tsI18n.refreshCache".to_string(),
            arguments: vec![],
            work_done_progress_params: WorkDoneProgressParams::default(),
        })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result["loaded"], json!(3));
    assert!(backend.engine.index().await.all_keys().iter().any(|key| key == "home.new"));
}

#[tokio::test]
async fn test_configuration_change_disables_hover() {
    let dir = workspace();
    let backend = create_test_backend();
    start(&backend, dir.path()).await;

    backend
        .did_change_configuration(DidChangeConfigurationParams {
            settings: json!({ "tsI18n": { "enableHover": false } }),
        })
        .await;

    assert!(hover_text(&backend, app_uri(dir.path()), 0, 18).await.is_none());
}

#[tokio::test]
async fn test_document_changes_are_tracked() {
    let dir = workspace();
    let backend = create_test_backend();
    start(&backend, dir.path()).await;

    backend
        .did_change(DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier { uri: app_uri(dir.path()), version: 2 },
            content_changes: vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: "// moved\nconst title = t('home.about')".to_string(),
            }],
        })
        .await;

    let text = hover_text(&backend, app_uri(dir.path()), 1, 18).await.unwrap();
    assert!(text.contains("📝 `About`"));
    assert!(text.contains("🌍 **Locale**: `en`"));
}

#[tokio::test]
async fn test_code_lens_toggles_between_translation_and_key() {
    let dir = workspace();
    let backend = create_test_backend();
    start(&backend, dir.path()).await;

    let lenses = code_lenses(&backend, app_uri(dir.path())).await.unwrap();
    assert_eq!(lens_titles(&lenses), vec!["💬 首页", "💬 你好 {name}"]);
    assert_eq!(lenses[1].range.start, Position { line: 1, character: 0 });

    let command = lenses[0].command.clone().unwrap();
    let result = backend
        .execute_command(ExecuteCommandParams {
            command: command.command,
            arguments: command.arguments.unwrap(),
            work_done_progress_params: WorkDoneProgressParams::default(),
        })
        .await
        .unwrap();
    assert_eq!(result, Some(json!({ "showingTranslation": false })));

    let lenses = code_lenses(&backend, app_uri(dir.path())).await.unwrap();
    assert_eq!(lens_titles(&lenses), vec!["🔑 home.title", "💬 你好 {name}"]);
}

#[tokio::test]
async fn test_code_lens_toggle_with_invalid_arguments() {
    let dir = workspace();
    let backend = create_test_backend();
    start(&backend, dir.path()).await;

    let result = backend
        .execute_command(ExecuteCommandParams {
            command: "tsI18n.toggleCodeLensTranslation".to_string(),
            arguments: vec![json!({ "key": "home.title" })],
            work_done_progress_params: WorkDoneProgressParams::default(),
        })
        .await
        .unwrap();

    assert_eq!(result, None);
}

#[tokio::test]
async fn test_code_lens_can_be_disabled() {
    let dir = workspace();
    let backend = create_test_backend();
    start(&backend, dir.path()).await;

    backend
        .did_change_configuration(DidChangeConfigurationParams {
            settings: json!({ "tsI18n": { "enableCodeLens": false } }),
        })
        .await;

    assert_eq!(code_lenses(&backend, app_uri(dir.path())).await, None);
}

#[tokio::test]
async fn test_completion_snippet_replaces_rest_of_key() {
    let dir = workspace();
    let backend = create_test_backend();
    start(&backend, dir.path()).await;

    backend
        .did_change(DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier { uri: app_uri(dir.path()), version: 2 },
            content_changes: vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: "const hi = t('home.gr')".to_string(),
            }],
        })
        .await;

    let response = backend
        .completion(CompletionParams {
            text_document_position: position_params(app_uri(dir.path()), 0, 16),
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
            context: None,
        })
        .await
        .unwrap();

    let Some(CompletionResponse::Array(items)) = response else {
        panic!("Expected completion items");
    };
    let item = items.iter().find(|item| item.label == "home.greeting").unwrap();
    let Some(CompletionTextEdit::Edit(edit)) = &item.text_edit else {
        panic!("Expected a text edit");
    };
    assert_eq!(edit.new_text, "home.greeting', { ${1:name} }");
    assert_eq!(
        edit.range,
        Range::new(Position { line: 0, character: 14 }, Position { line: 0, character: 22 })
    );
}
