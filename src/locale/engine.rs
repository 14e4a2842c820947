//! Translation engine: owns the current [`LocaleIndex`] and rebuilds it.
//!
//! A refresh never touches the live index. It builds a new one from disk and
//! swaps the `Arc` in a single write, so readers see the old index or the new
//! one and nothing in between. Refreshes are serialized; the last one started
//! is the last one to complete.

use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;
use std::sync::atomic::{
    AtomicU64,
    Ordering,
};
use std::time::Duration;

use futures::StreamExt;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{
    Mutex,
    RwLock,
};

use crate::config::I18nSettings;
use crate::locale::discovery::{
    DiscoveryOptions,
    discover_locale_files,
};
use crate::locale::error::LocaleError;
use crate::locale::index::LocaleIndex;
use crate::locale::locale_id::locale_from_path;
use crate::locale::parser::{
    ParsedLocale,
    load_locale_file,
};
use crate::locale::project::detect_project_locale;

#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("Locale discovery failed: {0}")]
    Discovery(#[from] LocaleError),
}

/// Outcome of one refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    /// Files discovered.
    pub discovered: usize,
    /// Files merged into the index.
    pub loaded: usize,
    /// Files skipped because they failed to read or parse.
    pub skipped: usize,
    /// Discovery hit `indexing.discoveryTimeoutMs`; only the files found before it were loaded.
    pub timed_out: bool,
    pub locales: Vec<String>,
    pub keys: usize,
    pub project_locale: Option<String>,
}

/// Shared handle to the translation data of one workspace.
#[derive(Debug, Default)]
pub struct I18nEngine {
    index: RwLock<Arc<LocaleIndex>>,
    /// Serializes refreshes.
    refresh_lock: Mutex<()>,
    /// Bumped by every debounced trigger.
    generation: AtomicU64,
}

impl I18nEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current index snapshot.
    pub async fn index(&self) -> Arc<LocaleIndex> {
        Arc::clone(&*self.index.read().await)
    }

    /// Rebuilds the index from disk and swaps it in.
    ///
    /// Per-file failures are logged and skipped. On error the previous index
    /// stays in place.
    ///
    /// A discovery timeout is not an error: the files found before it are
    /// indexed and `timed_out` is set.
    ///
    /// # Errors
    /// Returns an error when the discovery worker fails.
    pub async fn refresh(
        &self,
        root: &Path,
        settings: &I18nSettings,
    ) -> Result<RefreshSummary, RefreshError> {
        let _guard = self.refresh_lock.lock().await;

        tracing::debug!(root = %root.display(), "Refreshing locale index");

        let discovery =
            discover_locale_files(DiscoveryOptions::from_settings(root, settings)).await?;
        let discovered = discovery.files.len();

        let parsed = load_files(discovery.files, settings.indexing.effective_num_threads()).await;

        let mut index = LocaleIndex::new();
        let mut summary = RefreshSummary {
            discovered,
            timed_out: discovery.timed_out,
            ..RefreshSummary::default()
        };

        for (path, result) in parsed {
            match result {
                Ok(Some((locale, parsed))) => {
                    index.add_file(&locale, &path, parsed);
                    summary.loaded += 1;
                }
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "Skipping locale file");
                    summary.skipped += 1;
                }
            }
        }

        let project_root = root.to_path_buf();
        let project_locale = tokio::task::spawn_blocking(move || detect_project_locale(&project_root))
            .await
            .unwrap_or_else(|error| {
                tracing::warn!(%error, "Project locale detection failed");
                None
            });
        index.set_project_locale(project_locale.as_deref());

        summary.locales = index.locales().to_vec();
        summary.keys = index.all_keys().len();
        summary.project_locale = index.project_locale().map(ToString::to_string);

        *self.index.write().await = Arc::new(index);

        tracing::info!(
            files = summary.loaded,
            skipped = summary.skipped,
            timed_out = summary.timed_out,
            keys = summary.keys,
            locales = ?summary.locales,
            project_locale = ?summary.project_locale,
            "Locale index refreshed"
        );

        Ok(summary)
    }

    /// Refreshes after `delay` unless another trigger arrives first.
    ///
    /// Returns `None` when superseded by a later trigger.
    pub async fn refresh_debounced(
        &self,
        root: &Path,
        settings: &I18nSettings,
        delay: Duration,
    ) -> Option<Result<RefreshSummary, RefreshError>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(delay).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "Refresh superseded");
            return None;
        }

        Some(self.refresh(root, settings).await)
    }
}

/// A file whose locale could be derived, with its messages.
type LoadedFile = Result<Option<(String, ParsedLocale)>, LocaleError>;

/// Reads and parses files concurrently, preserving their order.
async fn load_files(files: Vec<PathBuf>, concurrency: usize) -> Vec<(PathBuf, LoadedFile)> {
    futures::stream::iter(files)
        .map(|path| async move {
            let task_path = path.clone();
            let result = tokio::task::spawn_blocking(move || load_file(&task_path))
                .await
                .unwrap_or_else(|error| Err(LocaleError::Other(error.to_string())));
            (path, result)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// ファイル名からロケールを決め、内容を解析する
fn load_file(path: &Path) -> LoadedFile {
    let Some(locale) = locale_from_path(path) else {
        tracing::debug!(path = %path.display(), "No locale in file name");
        return Ok(None);
    };

    let Some(parsed) = load_locale_file(path)? else {
        tracing::debug!(path = %path.display(), "No export default found");
        return Ok(None);
    };

    Ok(Some((locale, parsed)))
}
