//! Completion implementation

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use tower_lsp::lsp_types::{
    CompletionItem,
    CompletionItemKind,
    CompletionTextEdit,
    Documentation,
    InsertTextFormat,
    MarkupContent,
    MarkupKind,
    Position,
    Range,
    TextEdit,
};

use crate::config::I18nSettings;
use crate::ide::fuzzy::rank_keys;
use crate::locale::{
    LocaleIndex,
    TranslationResult,
};
use crate::syntax::interpolation::Interpolation;
use crate::types::{
    byte_offset,
    utf16_column,
};

/// `detail` に表示する値の最大文字数
const DETAIL_MAX_CHARS: usize = 50;

/// 翻訳関数の呼び出し途中（開きクォートの後）
#[allow(clippy::expect_used)] // 固定パターン
static TRANSLATION_CALL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:\$t|\.t|^t|[\s({,]t|this\.t|i18n\.t)\s*\(\s*['"`]([^'"`]*)$"#)
        .expect("valid regex")
});

/// `translate(` / `trans(` 形式
#[allow(clippy::expect_used)] // 固定パターン
static TRANSLATE_CALL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:translate|trans)\s*\(\s*['"`]([^'"`]*)$"#).expect("valid regex")
});

/// Completion context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionContext {
    /// 入力途中のキー
    pub partial_key: String,
    /// 入力途中のキーの範囲（開きクォートの直後からカーソルまで）
    pub key_range: Range,
    /// キーを開いたクォート
    pub quote: char,
    /// カーソル以降に閉じクォートがある場合、キー先頭から閉じクォートの直後まで
    pub closed_key_range: Option<Range>,
}

/// カーソル位置が翻訳関数のキー引数の中かを判定する
///
/// `line_text` はカーソル行全体、`character` は UTF-16 の列。
#[must_use]
pub fn extract_completion_context(
    line_text: &str,
    line: u32,
    character: u32,
) -> Option<CompletionContext> {
    let cursor = byte_offset(line_text, character);
    let before_cursor = line_text.get(..cursor)?;

    let partial = [&*TRANSLATION_CALL_PREFIX, &*TRANSLATE_CALL_PREFIX]
        .iter()
        .find_map(|pattern| pattern.captures(before_cursor).and_then(|captures| captures.get(1)))?;

    let start = utf16_column(line_text, partial.start());
    let quote = before_cursor.get(..partial.start())?.chars().next_back()?;

    // カーソル以降のキーの残りと、開きクォートと同じ閉じクォート
    let after_cursor = line_text.get(cursor..).unwrap_or_default();
    let closed_key_range = after_cursor
        .find(['\'', '"', '`'])
        .filter(|&offset| after_cursor.get(offset..).is_some_and(|rest| rest.starts_with(quote)))
        .map(|offset| {
            let end = utf16_column(line_text, cursor + offset + quote.len_utf8());
            Range::new(Position::new(line, start), Position::new(line, end))
        });

    Some(CompletionContext {
        partial_key: partial.as_str().to_string(),
        key_range: Range::new(Position::new(line, start), Position::new(line, character)),
        quote,
        closed_key_range,
    })
}

/// 補完候補を生成
#[must_use]
pub fn generate_completions(
    index: &LocaleIndex,
    settings: &I18nSettings,
    context: &CompletionContext,
) -> Vec<CompletionItem> {
    rank_keys(&context.partial_key, index.all_keys())
        .into_iter()
        .map(|ranked| {
            let translation = index.resolve(ranked.key, &Interpolation::None, settings);
            let mut item = build_item(ranked.key, translation.as_ref(), context);
            item.sort_text = Some(ranked.sort_text());
            item
        })
        .collect()
}

/// 1 件分の補完候補
///
/// パラメータ付きの翻訳は、閉じクォートまで置き換えて `key', { ... }` を挿入する。
/// 閉じクォートがない場合はキーだけを挿入する。
fn build_item(
    key: &str,
    translation: Option<&TranslationResult>,
    context: &CompletionContext,
) -> CompletionItem {
    let key_edit = || TextEdit::new(context.key_range, key.to_string());

    let Some(translation) = translation else {
        return CompletionItem {
            label: key.to_string(),
            kind: Some(CompletionItemKind::CONSTANT),
            detail: Some("Translation not found".to_string()),
            text_edit: Some(CompletionTextEdit::Edit(key_edit())),
            ..Default::default()
        };
    };

    let params = &translation.interpolation_keys;
    let kind =
        if params.is_empty() { CompletionItemKind::CONSTANT } else { CompletionItemKind::FUNCTION };
    let (edit, insert_text_format) = match context.closed_key_range {
        Some(range) if !params.is_empty() => (
            TextEdit::new(range, parameter_snippet(key, context.quote, params)),
            Some(InsertTextFormat::SNIPPET),
        ),
        _ => (key_edit(), None),
    };

    CompletionItem {
        label: key.to_string(),
        kind: Some(kind),
        detail: Some(truncate_chars(&translation.value, DETAIL_MAX_CHARS)),
        documentation: Some(Documentation::MarkupContent(MarkupContent {
            kind: MarkupKind::Markdown,
            value: documentation(key, translation),
        })),
        text_edit: Some(CompletionTextEdit::Edit(edit)),
        insert_text_format,
        ..Default::default()
    }
}

/// `key', { ${1:name}, ${2:count} }`
fn parameter_snippet(key: &str, quote: char, params: &[String]) -> String {
    let placeholders: Vec<String> = params
        .iter()
        .enumerate()
        .map(|(index, param)| format!("${{{}:{}}}", index + 1, escape_snippet(param)))
        .collect();
    format!("{}{quote}, {{ {} }}", escape_snippet(key), placeholders.join(", "))
}

/// スニペット構文の `$`, `}`, `\` をエスケープ
fn escape_snippet(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '$' | '}' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn documentation(key: &str, translation: &TranslationResult) -> String {
    let mut docs = String::new();
    docs.push_str("**🌍 Translation**\n\n");
    let _ = writeln!(docs, "`{}`\n", translation.value);
    docs.push_str("**📋 Details**\n\n");
    let _ = writeln!(docs, "• **Key**: `{key}`");
    let _ = writeln!(docs, "• **Locale**: `{}`", translation.locale);

    let params = &translation.interpolation_keys;
    if !params.is_empty() {
        let _ = writeln!(docs, "• **Parameters**: `{}`", params.join(", "));
    }

    docs.push_str("\n**💡 Usage Example**\n\n");
    if params.is_empty() {
        let _ = write!(docs, "```typescript\nt('{key}')\n```");
    } else {
        let example: Vec<String> = params.iter().map(|param| format!("{param}: 'value'")).collect();
        let _ = write!(docs, "```typescript\nt('{key}', {{ {} }})\n```", example.join(", "));
    }

    docs
}

/// 先頭 `max_chars` 文字に切り詰め、切った場合は `...` を付ける
#[must_use]
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", value.get(..cut).unwrap_or(value)),
        None => value.to_string(),
    }
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

    fn index() -> LocaleIndex {
        let mut index = LocaleIndex::new();
        let messages = json!({
            "user": { "name": "Name", "greeting": "Hello {name}, you have {count} messages" },
            "username": "Username",
            "profile": { "user": "Profile user" },
        });
        index.add_file(
            "zhCN",
            Path::new("/ws/src/locales/zhCN.ts"),
            ParsedLocale {
                messages: messages.as_object().unwrap().clone(),
                key_lines: HashMap::new(),
            },
        );
        index
    }

    fn context(partial: &str) -> CompletionContext {
        CompletionContext {
            partial_key: partial.to_string(),
            key_range: Range::new(Position::new(0, 3), Position::new(0, 3)),
            quote: '\'',
            closed_key_range: None,
        }
    }

    /// 1 行のテキストに補完の編集を適用し、スニペットのプレースホルダを展開する
    fn apply_completion(line: &str, character: u32, partial_key_item: &str) -> String {
        let context = extract_completion_context(line, 0, character).unwrap();
        let items = generate_completions(&index(), &I18nSettings::default(), &context);
        let item = items.iter().find(|item| item.label == partial_key_item).unwrap();
        let Some(CompletionTextEdit::Edit(edit)) = &item.text_edit else {
            panic!("expected a text edit");
        };

        let start = byte_offset(line, edit.range.start.character);
        let end = byte_offset(line, edit.range.end.character);
        let inserted = Regex::new(r"\$\{\d+:([^}]*)\}|\$\d+").unwrap().replace_all(&edit.new_text, "$1");
        format!("{}{inserted}{}", &line[..start], &line[end..])
    }

    #[rstest]
    #[case::dollar("{{ $t('user.", "user.")]
    #[case::bare("t(\"", "")]
    #[case::member("this.t(`pro", "pro")]
    #[case::i18n("i18n.t('a", "a")]
    #[case::after_paren("log(t('x", "x")]
    #[case::translate("translate( 'abc", "abc")]
    #[case::trans("trans(\"k", "k")]
    fn context_in_translation_call(#[case] line: &str, #[case] partial: &str) {
        #[allow(clippy::cast_possible_truncation)]
        let character = line.encode_utf16().count() as u32;

        let context = extract_completion_context(line, 4, character).unwrap();

        assert_that!(context.partial_key, eq(partial));
        assert_that!(context.key_range.end, eq(Position::new(4, character)));
    }

    #[rstest]
    #[case::closed_string("t('done') + ")]
    #[case::other_function("format('a")]
    #[case::identifier_suffix("split('a")]
    #[case::no_quote("t(")]
    fn no_context_outside_calls(#[case] line: &str) {
        #[allow(clippy::cast_possible_truncation)]
        let character = line.encode_utf16().count() as u32;

        assert_that!(extract_completion_context(line, 0, character), none());
    }

    #[rstest]
    fn context_uses_text_before_cursor_only() {
        let line = "const a = t('user.name')";

        let context = extract_completion_context(line, 0, 17).unwrap();

        assert_that!(context.partial_key, eq("user"));
        assert_that!(context.key_range.start, eq(Position::new(0, 13)));
    }

    #[rstest]
    fn context_counts_utf16_columns() {
        let line = "// 日本語 t('ab";

        let context = extract_completion_context(line, 0, 12).unwrap();

        assert_that!(context.partial_key, eq("ab"));
        assert_that!(context.key_range.start, eq(Position::new(0, 10)));
    }

    #[rstest]
    fn completions_are_ranked() {
        let index = index();

        let items = generate_completions(&index, &I18nSettings::default(), &context("user"));
        let labels: Vec<&str> = items.iter().map(|item| item.label.as_str()).collect();

        assert_that!(
            labels,
            elements_are![eq(&"username"), eq(&"user.name"), eq(&"user.greeting"), eq(&"profile.user")]
        );
        assert_that!(items[0].sort_text.as_deref(), some(eq("0208_username")));
    }

    #[rstest]
    fn context_finds_closing_quote() {
        let line = "const a = t(\"us\")";

        let context = extract_completion_context(line, 0, 15).unwrap();

        assert_that!(context.quote, eq('"'));
        assert_that!(
            context.closed_key_range,
            some(eq(Range::new(Position::new(0, 13), Position::new(0, 16))))
        );
    }

    #[rstest]
    #[case::unterminated("const a = t('us")]
    #[case::other_quote("const a = t('us\"")]
    fn context_without_matching_closing_quote(#[case] line: &str) {
        let context = extract_completion_context(line, 0, 15).unwrap();

        assert_that!(context.closed_key_range, none());
    }

    #[rstest]
    fn item_with_parameters_is_a_snippet() {
        let index = index();
        let mut context = context("user.greeting");
        context.closed_key_range = Some(Range::new(Position::new(0, 3), Position::new(0, 4)));

        let items = generate_completions(&index, &I18nSettings::default(), &context);
        let item = &items[0];

        assert_that!(item.kind, some(eq(CompletionItemKind::FUNCTION)));
        assert_that!(item.insert_text_format, some(eq(InsertTextFormat::SNIPPET)));
        let Some(CompletionTextEdit::Edit(edit)) = &item.text_edit else {
            panic!("expected a text edit");
        };
        assert_that!(edit.new_text, eq("user.greeting', { ${1:name}, ${2:count} }"));
        assert_that!(edit.range.end, eq(Position::new(0, 4)));
        let Some(Documentation::MarkupContent(docs)) = &item.documentation else {
            panic!("expected markdown docs");
        };
        assert_that!(docs.value, contains_substring("• **Parameters**: `name, count`"));
        assert_that!(
            docs.value,
            contains_substring("t('user.greeting', { name: 'value', count: 'value' })")
        );
    }

    #[rstest]
    #[case::single("const a = t('us')", 15, "const a = t('user.greeting', { name, count })")]
    #[case::double("const a = t(\"us\")", 15, "const a = t(\"user.greeting\", { name, count })")]
    #[case::rest_of_key("const a = t('us.gre')", 15, "const a = t('user.greeting', { name, count })")]
    #[case::unterminated("const a = t('us", 15, "const a = t('user.greeting")]
    fn completion_edit_leaves_a_valid_call(
        #[case] line: &str,
        #[case] character: u32,
        #[case] expected: &str,
    ) {
        assert_that!(apply_completion(line, character, "user.greeting"), eq(expected));
    }

    #[rstest]
    fn completion_edit_without_parameters_keeps_quotes() {
        assert_that!(
            apply_completion("const a = t('us')", 15, "username"),
            eq("const a = t('username')")
        );
    }

    #[rstest]
    #[case::plain("name", "name")]
    #[case::dollar("a$b", "a\\$b")]
    #[case::brace("a}b", "a\\}b")]
    #[case::backslash("a\\b", "a\\\\b")]
    fn snippet_text_is_escaped(#[case] text: &str, #[case] expected: &str) {
        assert_that!(escape_snippet(text), eq(expected));
    }

    #[rstest]
    fn item_without_parameters_is_a_constant() {
        let index = index();

        let items = generate_completions(&index, &I18nSettings::default(), &context("username"));
        let item = &items[0];

        assert_that!(item.kind, some(eq(CompletionItemKind::CONSTANT)));
        assert_that!(item.insert_text_format, none());
        assert_that!(item.detail.as_deref(), some(eq("Username")));
        let Some(Documentation::MarkupContent(docs)) = &item.documentation else {
            panic!("expected markdown docs");
        };
        assert_that!(docs.value, contains_substring("t('username')"));
        assert_that!(docs.value, contains_substring("• **Locale**: `zhCN`"));
    }

    #[rstest]
    fn no_candidates() {
        let index = index();

        assert_that!(
            generate_completions(&index, &I18nSettings::default(), &context("zzz")),
            is_empty()
        );
    }

    #[rstest]
    #[case::short("abc", 5, "abc")]
    #[case::exact("abcde", 5, "abcde")]
    #[case::long("abcdef", 5, "abcde...")]
    #[case::multibyte("こんにちは世界", 5, "こんにちは...")]
    fn truncate_cases(#[case] value: &str, #[case] max: usize, #[case] expected: &str) {
        assert_that!(truncate_chars(value, max), eq(expected));
    }
}
