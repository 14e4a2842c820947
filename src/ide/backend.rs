//! LSP Backend 実装

use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use salsa::Setter;
use tokio::sync::Mutex;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CodeLens,
    CodeLensParams,
    CompletionParams,
    CompletionResponse,
    DidChangeConfigurationParams,
    DidChangeTextDocumentParams,
    DidChangeWatchedFilesParams,
    DidChangeWatchedFilesRegistrationOptions,
    DidCloseTextDocumentParams,
    DidOpenTextDocumentParams,
    ExecuteCommandParams,
    FileSystemWatcher,
    GlobPattern,
    GotoDefinitionParams,
    GotoDefinitionResponse,
    Hover,
    HoverParams,
    InitializeParams,
    InitializeResult,
    InitializedParams,
    MessageType,
    Registration,
    Url,
};
use tower_lsp::{
    Client,
    LanguageServer,
};

use super::handlers;
use crate::config::{
    ConfigManager,
    I18nSettings,
};
use crate::db::I18nDatabaseImpl;
use crate::ide::state::ServerState;
use crate::input::source::{
    ProgrammingLanguage,
    SourceFile,
};
use crate::locale::discovery::{
    DiscoveryOptions,
    is_locale_candidate,
};
use crate::locale::{
    I18nEngine,
    RefreshSummary,
};
use crate::syntax::call_site::CallSite;
use crate::types::SourcePosition;

/// 監視するファイルのパターン
const WATCHED_FILE_PATTERNS: &[&str] = &["**/*.{ts,js}", "**/.ts-i18n.json"];

/// LSP Backend
#[derive(Clone)]
pub struct Backend {
    /// LSP クライアント
    pub client: Client,
    /// 設定管理
    pub config_manager: Arc<Mutex<ConfigManager>>,
    /// 翻訳エンジン
    pub engine: Arc<I18nEngine>,
    /// ドキュメント側の共有状態
    pub state: ServerState,
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("config_manager", &"<ConfigManager>")
            .field("engine", &self.engine)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Backend {
    /// 新しい `Backend` を作成
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            config_manager: Arc::new(Mutex::new(ConfigManager::new())),
            engine: Arc::new(I18nEngine::new()),
            state: ServerState::new(I18nDatabaseImpl::default()),
        }
    }

    /// URI をファイルパスに変換
    pub(crate) fn uri_to_path(uri: &Url) -> Option<PathBuf> {
        let path = uri.to_file_path().ok();
        if path.is_none() {
            tracing::warn!("Failed to convert URI to file path: {}", uri);
        }
        path
    }

    /// 現在の設定とワークスペースルートのスナップショット
    pub(crate) async fn settings_snapshot(&self) -> (I18nSettings, Option<PathBuf>) {
        let config_manager = self.config_manager.lock().await;
        (config_manager.get_settings().clone(), config_manager.workspace_root().cloned())
    }

    /// 翻訳インデックスを再構築する
    ///
    /// 失敗時はログに記録し、クライアントに一度だけ通知します。以前のインデックスは維持されます。
    pub(crate) async fn refresh_translations(&self) -> Option<RefreshSummary> {
        let (settings, workspace_root) = self.settings_snapshot().await;
        let Some(root) = workspace_root else {
            tracing::debug!("No workspace root, skipping locale refresh");
            return None;
        };

        let result = self.engine.refresh(&root, &settings).await;
        self.report_refresh(result).await
    }

    /// デバウンス付きで再構築を予約する
    ///
    /// 連続したトリガーは `refreshDebounceMs` の間まとめられ、最後の 1 回だけが実行されます。
    pub(crate) fn schedule_refresh(&self) {
        let backend = self.clone();
        tokio::spawn(async move {
            let (settings, workspace_root) = backend.settings_snapshot().await;
            let Some(root) = workspace_root else {
                return;
            };

            let delay = Duration::from_millis(settings.refresh_debounce_ms);
            if let Some(result) = backend.engine.refresh_debounced(&root, &settings, delay).await {
                backend.report_refresh(result).await;
            }
        });
    }

    /// 再構築の結果をログとクライアントへ報告
    async fn report_refresh(
        &self,
        result: std::result::Result<RefreshSummary, crate::locale::RefreshError>,
    ) -> Option<RefreshSummary> {
        match result {
            Ok(summary) => {
                self.refresh_code_lenses();
                Some(summary)
            }
            Err(error) => {
                tracing::error!(%error, "Locale refresh failed");
                self.client
                    .log_message(MessageType::ERROR, format!("Locale refresh failed: {error}"))
                    .await;
                None
            }
        }
    }

    /// クライアントにコードレンズの再取得を依頼
    ///
    /// クライアントが `workspace/codeLens/refresh` に対応している場合のみ送信します。
    pub(crate) fn refresh_code_lenses(&self) {
        if !self.state.code_lens_refresh_support.load(Ordering::Relaxed) {
            return;
        }

        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(error) = client.code_lens_refresh().await {
                tracing::debug!(%error, "Code lens refresh request failed");
            }
        });
    }

    /// ドキュメントの内容を Salsa に反映
    ///
    /// 対応していない言語のドキュメントは無視します。
    pub(crate) async fn update_document(&self, uri: Url, text: String, language_id: Option<&str>) {
        let language = language_id
            .and_then(ProgrammingLanguage::from_language_id)
            .or_else(|| ProgrammingLanguage::from_uri(uri.path()));

        let (mut db, mut source_files) = self.state.lock_db_and_source_files().await;

        if let Some(existing) = source_files.get(&uri).copied() {
            existing.set_text(&mut *db).to(text);
            return;
        }

        let Some(language) = language else {
            tracing::debug!(uri = %uri, "Unsupported document language");
            return;
        };

        let source_file = SourceFile::new(&*db, uri.to_string(), text, language);
        source_files.insert(uri, source_file);
    }

    /// 現在の設定でロケールファイルとして読み込まれるパスか
    pub(crate) async fn is_locale_file(&self, path: &Path) -> bool {
        let config_manager = self.config_manager.lock().await;
        config_manager.workspace_root().is_some_and(|root| {
            let options = DiscoveryOptions::from_settings(root, config_manager.get_settings());
            is_locale_candidate(&options, path)
        })
    }

    /// ドキュメントを閉じたときに Salsa 入力を破棄
    pub(crate) async fn remove_document(&self, uri: &Url) {
        self.state.source_files.lock().await.remove(uri);
    }

    /// 指定位置の翻訳関数呼び出しを取得
    pub(crate) async fn call_site_at(&self, uri: &Url, position: SourcePosition) -> Option<CallSite> {
        let (db, source_files) = self.state.lock_db_and_source_files().await;
        let Some(source_file) = source_files.get(uri).copied() else {
            tracing::debug!("Source file not found in cache: {}", uri);
            return None;
        };
        drop(source_files);

        crate::syntax::call_site_at(&*db, source_file, position)
    }

    /// ドキュメントのテキストを取得
    pub(crate) async fn document_text(&self, uri: &Url) -> Option<String> {
        let (db, source_files) = self.state.lock_db_and_source_files().await;
        source_files.get(uri).map(|file| file.text(&*db).clone())
    }

    /// 翻訳ファイルと設定ファイルの監視を登録
    pub(crate) async fn register_file_watchers(&self) {
        let watchers = WATCHED_FILE_PATTERNS
            .iter()
            .map(|pattern| FileSystemWatcher {
                glob_pattern: GlobPattern::String((*pattern).to_string()),
                kind: None,
            })
            .collect();

        let register_options =
            match serde_json::to_value(DidChangeWatchedFilesRegistrationOptions { watchers }) {
                Ok(value) => value,
                Err(error) => {
                    tracing::warn!(%error, "Failed to serialize watcher options");
                    return;
                }
            };

        let registration = Registration {
            id: "ts-i18n-file-watcher".to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: Some(register_options),
        };

        if let Err(error) = self.client.register_capability(vec![registration]).await {
            tracing::warn!(%error, "Failed to register file watchers");
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        handlers::lifecycle::handle_initialize(self, params).await
    }

    async fn initialized(&self, params: InitializedParams) {
        handlers::lifecycle::handle_initialized(self, params).await;
    }

    async fn shutdown(&self) -> Result<()> {
        handlers::lifecycle::handle_shutdown().await
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        handlers::workspace::handle_did_change_configuration(self, params).await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        handlers::workspace::handle_did_change_watched_files(self, params).await;
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        handlers::document_sync::handle_did_open(self, params).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        handlers::document_sync::handle_did_change(self, params).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        handlers::document_sync::handle_did_close(self, params).await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        handlers::features::handle_hover(self, params).await
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        handlers::features::handle_goto_definition(self, params).await
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        handlers::features::handle_completion(self, params).await
    }

    async fn code_lens(&self, params: CodeLensParams) -> Result<Option<Vec<CodeLens>>> {
        handlers::features::handle_code_lens(self, params).await
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<serde_json::Value>> {
        handlers::execute_command::handle_execute_command(self, params).await
    }
}
