//! Call-site recognition and interpolation handling for open documents.

pub mod call_site;
pub mod interpolation;

use crate::db::I18nDatabase;
use crate::input::source::SourceFile;
use crate::syntax::call_site::{
    CallSite,
    scan_call_sites,
};
use crate::types::SourcePosition;

/// ドキュメント内の翻訳関数呼び出しを抽出
#[salsa::tracked]
pub fn call_sites(db: &dyn I18nDatabase, file: SourceFile) -> Vec<CallSite> {
    scan_call_sites(file.text(db))
}

/// 指定位置にある翻訳関数呼び出しを取得
///
/// キーの範囲を優先し、なければ呼び出し式全体の範囲で探す。
#[salsa::tracked]
pub fn call_site_at(
    db: &dyn I18nDatabase,
    file: SourceFile,
    position: SourcePosition,
) -> Option<CallSite> {
    let sites = call_sites(db, file);

    sites
        .iter()
        .find(|site| site.key_range.contains(position))
        .or_else(|| sites.iter().find(|site| site.call_range.contains(position)))
        .cloned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;
    use salsa::Setter;

    use super::*;
    use crate::db::I18nDatabaseImpl;
    use crate::input::source::ProgrammingLanguage;

    const fn pos(line: u32, character: u32) -> SourcePosition {
        SourcePosition { line, character }
    }

    #[rstest]
    fn call_sites_follow_document_changes() {
        let mut db = I18nDatabaseImpl::default();
        let file = SourceFile::new(
            &db,
            "file:///app.ts".to_string(),
            "t('a')".to_string(),
            ProgrammingLanguage::TypeScript,
        );

        assert_that!(call_sites(&db, file), len(eq(1)));

        file.set_text(&mut db).to("t('a')\nt('b')".to_string());

        let sites = call_sites(&db, file);
        assert_that!(sites, len(eq(2)));
        assert_that!(sites[1].key, eq("b"));
    }

    #[rstest]
    #[case::on_key(pos(0, 14), Some("user.name"))]
    #[case::on_function_name(pos(0, 10), Some("user.name"))]
    #[case::outside(pos(0, 2), None)]
    #[case::other_line(pos(1, 0), None)]
    fn call_site_at_position(#[case] position: SourcePosition, #[case] expected: Option<&str>) {
        let db = I18nDatabaseImpl::default();
        let file = SourceFile::new(
            &db,
            "file:///app.ts".to_string(),
            "const a = t('user.name')\nconst b = 1".to_string(),
            ProgrammingLanguage::TypeScript,
        );

        let site = call_site_at(&db, file, position);

        assert_that!(site.map(|s| s.key).as_deref(), eq(expected));
    }
}
