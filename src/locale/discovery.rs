//! Locale file discovery.
//!
//! Two modes:
//! - glob mode: `scanPatterns` matched against workspace-relative paths
//! - directory mode: every `.ts` / `.js` file below the `manualPaths`
//!
//! Missing matches are logged, never fatal. The walk runs on a blocking worker
//! and is bounded by `indexing.maxFiles` and `indexing.discoveryTimeoutMs`.
//! Excluded directories are pruned, not entered. When the deadline passes the
//! walk stops and the files found so far are kept.

use std::cell::Cell;
use std::collections::HashSet;
use std::path::{
    Path,
    PathBuf,
};
use std::time::{
    Duration,
    Instant,
};

use globset::{
    Glob,
    GlobMatcher,
    GlobSet,
    GlobSetBuilder,
};
use ignore::WalkBuilder;

use crate::config::I18nSettings;
use crate::locale::error::LocaleError;

/// Extensions kept in directory mode.
const SOURCE_EXTENSIONS: &[&str] = &["ts", "js"];

/// Where to look for locale files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryMode {
    Patterns(Vec<String>),
    Directories(Vec<String>),
}

/// Inputs of a discovery run, detached from the settings so it can move to a
/// blocking worker.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub root: PathBuf,
    pub mode: DiscoveryMode,
    pub exclude_patterns: Vec<String>,
    pub max_files: usize,
    pub timeout: Duration,
}

impl DiscoveryOptions {
    #[must_use]
    pub fn from_settings(root: &Path, settings: &I18nSettings) -> Self {
        let mode = if settings.auto_discovery {
            DiscoveryMode::Patterns(settings.scan_patterns.clone())
        } else {
            DiscoveryMode::Directories(settings.manual_paths.clone())
        };

        Self {
            root: root.to_path_buf(),
            mode,
            exclude_patterns: settings.exclude_patterns.clone(),
            max_files: settings.indexing.max_files,
            timeout: Duration::from_millis(settings.indexing.discovery_timeout_ms),
        }
    }
}

/// Files found by one discovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Locale files in discovery order.
    pub files: Vec<PathBuf>,
    /// The walk stopped at the deadline; `files` holds what was found before it.
    pub timed_out: bool,
}

/// Finds locale files on a blocking worker.
///
/// # Errors
/// Returns an error only when the blocking worker fails. A timeout yields the
/// partial result; patterns or directories that match nothing are logged.
pub async fn discover_locale_files(options: DiscoveryOptions) -> Result<Discovery, LocaleError> {
    let discovery = tokio::task::spawn_blocking(move || find_locale_files(&options))
        .await
        .map_err(|join_error| LocaleError::Other(format!("Discovery task failed: {join_error}")))?;

    Ok(discovery)
}

/// Synchronous discovery. Result order is deterministic when the walk completes.
#[must_use]
pub fn find_locale_files(options: &DiscoveryOptions) -> Discovery {
    let exclusions = Exclusions::new(&options.root, &options.exclude_patterns);
    let deadline = Deadline::after(options.timeout);

    let files = match &options.mode {
        DiscoveryMode::Patterns(patterns) => {
            find_by_patterns(&options.root, patterns, &exclusions, &deadline, options.max_files)
        }
        DiscoveryMode::Directories(directories) => find_in_directories(
            &options.root,
            directories,
            &exclusions,
            &deadline,
            options.max_files,
        ),
    };

    let timed_out = deadline.has_passed();
    if timed_out {
        tracing::warn!(
            timeout = ?options.timeout,
            found = files.len(),
            root = %options.root.display(),
            "Locale discovery timed out, keeping files found so far"
        );
    } else {
        tracing::debug!(count = files.len(), root = %options.root.display(), "Discovered locale files");
    }

    Discovery { files, timed_out }
}

/// Builds a glob set, skipping invalid patterns.
fn build_glob_set<'a>(patterns: impl IntoIterator<Item = &'a str>) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(error) => {
                tracing::warn!(pattern, %error, "Invalid exclude pattern");
            }
        }
    }
    builder.build().unwrap_or_else(|error| {
        tracing::warn!(%error, "Failed to build exclude patterns");
        GlobSet::empty()
    })
}

/// `excludePatterns` relative to the workspace root.
#[derive(Debug, Clone)]
struct Exclusions {
    root: PathBuf,
    /// Excluded files and directories.
    entries: GlobSet,
    /// `dir/**` patterns reduced to `dir`: the directory itself is skipped.
    subtrees: GlobSet,
}

impl Exclusions {
    /// 無効なパターンはログに残して無視
    fn new(root: &Path, patterns: &[String]) -> Self {
        Self {
            root: root.to_path_buf(),
            entries: build_glob_set(patterns.iter().map(String::as_str)),
            subtrees: build_glob_set(patterns.iter().filter_map(|p| p.strip_suffix("/**"))),
        }
    }

    /// `path` はワークスペースルート配下の絶対パス
    fn is_excluded(&self, path: &Path, is_dir: bool) -> bool {
        let Ok(relative_path) = path.strip_prefix(&self.root) else {
            return false;
        };
        if relative_path.as_os_str().is_empty() {
            return false;
        }
        self.entries.is_match(relative_path) || (is_dir && self.subtrees.is_match(relative_path))
    }
}

/// Discovery deadline, checked once per walked entry.
#[derive(Debug)]
struct Deadline {
    /// `None` when the timeout does not fit in an `Instant`.
    at: Option<Instant>,
    passed: Cell<bool>,
}

impl Deadline {
    /// 現在時刻から `timeout` 後
    fn after(timeout: Duration) -> Self {
        Self { at: Instant::now().checked_add(timeout), passed: Cell::new(false) }
    }

    /// 期限切れを記録して返す
    fn check(&self) -> bool {
        if !self.passed.get() && self.at.is_some_and(|at| Instant::now() >= at) {
            self.passed.set(true);
        }
        self.passed.get()
    }

    /// 直前の `check` までに期限切れになったか
    fn has_passed(&self) -> bool {
        self.passed.get()
    }
}

/// Sorted walk that never enters excluded directories.
fn walk(path: &Path, exclusions: &Exclusions) -> ignore::Walk {
    let exclusions = exclusions.clone();
    WalkBuilder::new(path)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !exclusions.is_excluded(entry.path(), is_dir)
        })
        .build()
}

/// Files below `path`, in walk order, until the deadline passes.
fn walk_files<'a>(
    path: &Path,
    exclusions: &Exclusions,
    deadline: &'a Deadline,
) -> impl Iterator<Item = PathBuf> + 'a {
    walk(path, exclusions).take_while(move |_| !deadline.check()).filter_map(|result| match result {
        Ok(entry) if entry.file_type().is_some_and(|ft| ft.is_file()) => Some(entry.into_path()),
        Ok(_) => None,
        Err(err) => {
            tracing::debug!(?err, "Failed to read directory entry");
            None
        }
    })
}

/// Glob mode: one walk, files grouped by the first pattern they match.
fn find_by_patterns(
    root: &Path,
    patterns: &[String],
    exclusions: &Exclusions,
    deadline: &Deadline,
    max_files: usize,
) -> Vec<PathBuf> {
    let matchers: Vec<(&str, GlobMatcher)> = patterns
        .iter()
        .filter_map(|pattern| match Glob::new(pattern) {
            Ok(glob) => Some((pattern.as_str(), glob.compile_matcher())),
            Err(error) => {
                tracing::warn!(pattern, %error, "Invalid scan pattern");
                None
            }
        })
        .collect();

    if matchers.is_empty() || !root.is_dir() {
        tracing::warn!(root = %root.display(), "Nothing to scan for locale files");
        return Vec::new();
    }

    let mut groups: Vec<Vec<PathBuf>> = vec![Vec::new(); matchers.len()];
    let mut total = 0usize;

    for path in walk_files(root, exclusions, deadline) {
        let Ok(relative_path) = path.strip_prefix(root) else {
            continue;
        };
        let Some(index) = matchers.iter().position(|(_, matcher)| matcher.is_match(relative_path))
        else {
            continue;
        };

        if total >= max_files {
            tracing::warn!(max_files, "Locale file limit reached, remaining files skipped");
            break;
        }

        if let Some(group) = groups.get_mut(index) {
            group.push(path);
            total += 1;
        }
    }

    for ((pattern, _), group) in matchers.iter().zip(&groups) {
        if group.is_empty() {
            tracing::debug!(pattern, "Scan pattern matched no files");
        }
    }

    groups.into_iter().flatten().collect()
}

/// Directory mode: every source file below each directory, in list order.
fn find_in_directories(
    root: &Path,
    directories: &[String],
    exclusions: &Exclusions,
    deadline: &Deadline,
    max_files: usize,
) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for directory in directories {
        if deadline.check() {
            break;
        }

        let path = root.join(directory);
        if !path.is_dir() {
            tracing::warn!(path = %path.display(), "Locale directory does not exist");
            continue;
        }

        let before = files.len();
        for file in walk_files(&path, exclusions, deadline) {
            let is_source = file
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext));
            if !is_source {
                continue;
            }
            if files.len() >= max_files {
                tracing::warn!(max_files, "Locale file limit reached, remaining files skipped");
                return files;
            }
            if seen.insert(file.clone()) {
                files.push(file);
            }
        }

        if files.len() == before {
            tracing::debug!(path = %path.display(), "Locale directory contains no source files");
        }
    }

    files
}

/// Whether a changed file would be picked up by a discovery run.
///
/// Used to filter file watcher events; ignores `max_files`.
#[must_use]
pub fn is_locale_candidate(options: &DiscoveryOptions, path: &Path) -> bool {
    let Ok(relative_path) = path.strip_prefix(&options.root) else {
        return false;
    };
    let exclusions = Exclusions::new(&options.root, &options.exclude_patterns);
    let excluded = relative_path.ancestors().any(|ancestor| {
        !ancestor.as_os_str().is_empty()
            && exclusions.is_excluded(&options.root.join(ancestor), ancestor != relative_path)
    });
    if excluded {
        return false;
    }

    match &options.mode {
        DiscoveryMode::Patterns(patterns) => patterns
            .iter()
            .filter_map(|pattern| Glob::new(pattern).ok())
            .any(|glob| glob.compile_matcher().is_match(relative_path)),
        DiscoveryMode::Directories(directories) => {
            let is_source = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext));
            is_source
                && directories.iter().any(|directory| path.starts_with(options.root.join(directory)))
        }
    }
}
