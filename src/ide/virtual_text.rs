//! Virtual text (inline translation display) for editor extensions.

use serde::{
    Deserialize,
    Serialize,
};
use tower_lsp::lsp_types::Range;

use crate::config::I18nSettings;
use crate::db::I18nDatabase;
use crate::ide::completion::truncate_chars;
use crate::input::source::SourceFile;
use crate::locale::LocaleIndex;
use crate::syntax::interpolation::Interpolation;

/// Translation decoration info for a key usage in the document.
///
/// `range` covers the key without its quotes. Unresolved keys are reported
/// with `has_translation: false` and an empty value so the client can mark them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationDecoration {
    pub range: Range,
    pub key: String,
    pub value: String,
    pub has_translation: bool,
}

/// Generates translation decorations for all key usages in a source file.
#[must_use]
pub fn get_translation_decorations(
    db: &dyn I18nDatabase,
    source_file: SourceFile,
    index: &LocaleIndex,
    settings: &I18nSettings,
) -> Vec<TranslationDecoration> {
    let max_length = settings.virtual_text.max_length;

    crate::syntax::call_sites(db, source_file)
        .into_iter()
        .map(|site| {
            let value = index
                .resolve(&site.key, &Interpolation::None, settings)
                .map(|translation| truncate_chars(&translation.value, max_length));

            TranslationDecoration {
                range: site.key_range.into(),
                has_translation: value.is_some(),
                value: value.unwrap_or_default(),
                key: site.key,
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;

    use googletest::prelude::*;
    use rstest::*;
    use serde_json::json;
    use tower_lsp::lsp_types::Position;

    use super::*;
    use crate::db::I18nDatabaseImpl;
    use crate::input::source::ProgrammingLanguage;
    use crate::locale::parser::ParsedLocale;

    fn create_source_file(db: &I18nDatabaseImpl, content: &str) -> SourceFile {
        SourceFile::new(
            db,
            "file:///test/app.ts".to_string(),
            content.to_string(),
            ProgrammingLanguage::TypeScript,
        )
    }

    fn index() -> LocaleIndex {
        let mut index = LocaleIndex::new();
        let messages = json!({
            "common": { "hello": "こんにちは" },
            "long": "This message is definitely longer than ten characters",
        });
        index.add_file(
            "zhCN",
            Path::new("/test/locales/zhCN.ts"),
            ParsedLocale { messages: messages.as_object().unwrap().clone(), key_lines: HashMap::new() },
        );
        index
    }

    #[rstest]
    fn get_decorations_basic() {
        let db = I18nDatabaseImpl::default();
        let source_file = create_source_file(&db, r#"const msg = t("common.hello");"#);

        let decorations =
            get_translation_decorations(&db, source_file, &index(), &I18nSettings::default());

        assert_that!(decorations, len(eq(1)));
        assert_that!(decorations[0].key, eq("common.hello"));
        assert_that!(decorations[0].value, eq("こんにちは"));
        assert_that!(decorations[0].has_translation, eq(true));
        assert_that!(decorations[0].range.start, eq(Position::new(0, 15)));
        assert_that!(decorations[0].range.end, eq(Position::new(0, 27)));
    }

    #[rstest]
    fn get_decorations_truncates_values() {
        let db = I18nDatabaseImpl::default();
        let source_file = create_source_file(&db, "t('long')");
        let mut settings = I18nSettings::default();
        settings.virtual_text.max_length = 10;

        let decorations = get_translation_decorations(&db, source_file, &index(), &settings);

        assert_that!(decorations[0].value, eq("This messa..."));
    }

    #[rstest]
    fn get_decorations_marks_missing_keys() {
        let db = I18nDatabaseImpl::default();
        let source_file = create_source_file(&db, "t('common.hello')\nt('missing')");

        let decorations =
            get_translation_decorations(&db, source_file, &index(), &I18nSettings::default());

        assert_that!(decorations, len(eq(2)));
        assert_that!(decorations[1].key, eq("missing"));
        assert_that!(decorations[1].has_translation, eq(false));
        assert_that!(decorations[1].value, eq(""));
        assert_that!(decorations[1].range.start.line, eq(1));
    }

    #[rstest]
    fn decoration_serializes_camel_case() {
        let decoration = TranslationDecoration {
            range: Range::default(),
            key: "k".to_string(),
            value: "v".to_string(),
            has_translation: true,
        };

        let value = serde_json::to_value(&decoration).unwrap();

        assert_that!(value["hasTranslation"], eq(&json!(true)));
    }
}
