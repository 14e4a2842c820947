//! LSP サーバーの共有状態

use std::collections::{
    HashMap,
    HashSet,
};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::sync::{
    Mutex,
    MutexGuard,
};
use tower_lsp::lsp_types::Url;

use crate::db::I18nDatabaseImpl;
use crate::ide::code_lens::CodeLensToggles;
use crate::input::source::SourceFile;

/// LSP サーバーの共有状態
///
/// 翻訳データは `I18nEngine` が持つため、ここではドキュメント側の状態のみを管理します。
///
/// # ロック順序
///
/// 複数のロックを同時に取得する場合は、以下の順序を厳守してください：
/// 1. `db`
/// 2. `source_files` / `opened_files`
#[derive(Clone)]
pub struct ServerState {
    /// Salsa データベース
    pub db: Arc<Mutex<I18nDatabaseImpl>>,
    /// `SourceFile` 管理（URI → `SourceFile`）
    pub source_files: Arc<Mutex<HashMap<Url, SourceFile>>>,
    /// 現在開いているファイルの URI
    pub opened_files: Arc<Mutex<HashSet<Url>>>,
    /// キー表示に切り替えられたコードレンズ
    pub code_lens_toggles: Arc<Mutex<CodeLensToggles>>,
    /// クライアントが `workspace/codeLens/refresh` に対応しているか
    pub code_lens_refresh_support: Arc<AtomicBool>,
}

impl ServerState {
    /// 新しい `ServerState` を作成
    pub fn new(db: I18nDatabaseImpl) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            source_files: Arc::new(Mutex::new(HashMap::new())),
            opened_files: Arc::new(Mutex::new(HashSet::new())),
            code_lens_toggles: Arc::new(Mutex::new(CodeLensToggles::new())),
            code_lens_refresh_support: Arc::new(AtomicBool::new(false)),
        }
    }

    /// `db` と `source_files` のロックを一括取得
    ///
    /// ロック順序（`db` → `source_files`）を保証します。
    pub async fn lock_db_and_source_files(
        &self,
    ) -> (MutexGuard<'_, I18nDatabaseImpl>, MutexGuard<'_, HashMap<Url, SourceFile>>) {
        let db = self.db.lock().await;
        let source_files = self.source_files.lock().await;
        (db, source_files)
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new(I18nDatabaseImpl::default())
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("db", &"<I18nDatabaseImpl>")
            .field("source_files", &"<HashMap<Url, SourceFile>>")
            .field("opened_files", &"<HashSet<Url>>")
            .field("code_lens_toggles", &"<CodeLensToggles>")
            .field("code_lens_refresh_support", &self.code_lens_refresh_support)
            .finish()
    }
}
