//! Code lens: the translation above each resolved call, switchable to its key.

use std::collections::HashSet;

use serde::{
    Deserialize,
    Serialize,
};
use tower_lsp::lsp_types::{
    CodeLens,
    Command,
    Position,
    Range,
    Url,
};

use crate::config::I18nSettings;
use crate::db::I18nDatabase;
use crate::input::source::SourceFile;
use crate::locale::LocaleIndex;
use crate::syntax::interpolation::Interpolation;

/// 翻訳とキーの表示を切り替える
pub const TOGGLE_CODE_LENS_COMMAND: &str = "tsI18n.toggleCodeLensTranslation";

/// One lens: a key used on a line of a document.
///
/// Sent back as the argument of [`TOGGLE_CODE_LENS_COMMAND`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeLensTarget {
    pub uri: Url,
    /// 0-based line of the call.
    pub line: u32,
    pub key: String,
}

/// Lenses switched to show their key instead of the translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeLensToggles {
    /// キー表示中のレンズ
    showing_key: HashSet<CodeLensTarget>,
}

impl CodeLensToggles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 表示を切り替える。翻訳表示に戻った場合は `true`
    pub fn toggle(&mut self, target: CodeLensTarget) -> bool {
        if self.showing_key.remove(&target) {
            return true;
        }
        self.showing_key.insert(target);
        false
    }

    #[must_use]
    pub fn is_showing_key(&self, target: &CodeLensTarget) -> bool {
        self.showing_key.contains(target)
    }

    /// ドキュメントを閉じたら切り替え状態を破棄
    pub fn forget_document(&mut self, uri: &Url) {
        self.showing_key.retain(|target| &target.uri != uri);
    }
}

/// One lens per call whose key resolves, placed at the start of its line.
///
/// Unresolved keys get no lens; they are reported by the decorations instead.
#[must_use]
pub fn code_lenses(
    db: &dyn I18nDatabase,
    source_file: SourceFile,
    uri: &Url,
    index: &LocaleIndex,
    settings: &I18nSettings,
    toggles: &CodeLensToggles,
) -> Vec<CodeLens> {
    crate::syntax::call_sites(db, source_file)
        .into_iter()
        .filter_map(|site| {
            let translation = index.resolve(&site.key, &Interpolation::None, settings)?;
            let target =
                CodeLensTarget { uri: uri.clone(), line: site.key_range.start.line, key: site.key };

            let title = if toggles.is_showing_key(&target) {
                format!("🔑 {}", target.key)
            } else {
                format!("💬 {}", translation.value)
            };
            let start = Position::new(target.line, 0);

            Some(CodeLens {
                range: Range::new(start, start),
                command: Some(Command {
                    title,
                    command: TOGGLE_CODE_LENS_COMMAND.to_string(),
                    arguments: serde_json::to_value(&target).ok().map(|argument| vec![argument]),
                }),
                data: None,
            })
        })
        .collect()
}
