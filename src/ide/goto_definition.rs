//! Go to Definition implementation

use tower_lsp::lsp_types::{
    Location,
    Position,
    Range,
    Url,
};

use crate::config::I18nSettings;
use crate::locale::LocaleIndex;

/// Find the definition of a translation key
///
/// 主言語のファイルを優先し、なければ任意の言語のファイルを返します。
/// 位置は定義行の先頭です。
#[must_use]
pub fn find_definition(index: &LocaleIndex, settings: &I18nSettings, key: &str) -> Option<Location> {
    let location = index.key_location(key, settings)?;

    let Ok(uri) = Url::from_file_path(&location.file_path) else {
        tracing::warn!("Failed to create URI from file path: {}", location.file_path.display());
        return None;
    };

    let position = Position::new(location.line.saturating_sub(1), 0);
    Some(Location { uri, range: Range::new(position, position) })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;

    use googletest::prelude::*;
    use rstest::*;
    use serde_json::json;

    use super::*;
    use crate::locale::parser::ParsedLocale;

    fn parsed(messages: &serde_json::Value, lines: &[(&str, u32)]) -> ParsedLocale {
        ParsedLocale {
            messages: messages.as_object().unwrap().clone(),
            key_lines: lines.iter().map(|(key, line)| ((*key).to_string(), *line)).collect(),
        }
    }

    #[rstest]
    fn definition_points_at_the_defining_line() {
        let mut index = LocaleIndex::new();
        index.add_file(
            "zhCN",
            Path::new("/ws/locales/zhCN.ts"),
            parsed(&json!({ "menu": { "home": "首页" } }), &[("menu.home", 3)]),
        );

        let location = find_definition(&index, &I18nSettings::default(), "menu.home").unwrap();

        assert_that!(location.uri.path(), eq("/ws/locales/zhCN.ts"));
        assert_that!(location.range.start, eq(Position::new(2, 0)));
        assert_that!(location.range.end, eq(Position::new(2, 0)));
    }

    #[rstest]
    fn definition_falls_back_to_another_locale() {
        let mut index = LocaleIndex::new();
        index.add_file(
            "ja",
            Path::new("/ws/locales/ja.ts"),
            parsed(&json!({ "only": "ja" }), &[("only", 5)]),
        );

        let location = find_definition(&index, &I18nSettings::default(), "only").unwrap();

        assert_that!(location.uri.path(), eq("/ws/locales/ja.ts"));
        assert_that!(location.range.start.line, eq(4));
    }

    #[rstest]
    fn unknown_key_has_no_definition() {
        let index = LocaleIndex::new();

        assert_that!(find_definition(&index, &I18nSettings::default(), "nope"), none());
    }

    #[rstest]
    fn missing_line_maps_to_first_line() {
        let mut index = LocaleIndex::new();
        index.add_file("zhCN", Path::new("/ws/locales/zhCN.ts"), parsed(&json!({ "a": "b" }), &[]));

        let location = find_definition(&index, &I18nSettings::default(), "a").unwrap();

        assert_that!(location.range.start.line, eq(0));
    }
}
