//! Salsa データベース定義

/// 開いているドキュメントを保持するデータベーストレイト
#[salsa::db]
pub trait I18nDatabase: salsa::Database {}

/// データベースの実装
#[salsa::db]
#[derive(Default, Clone)]
pub struct I18nDatabaseImpl {
    storage: salsa::Storage<Self>,
}

#[salsa::db]
impl salsa::Database for I18nDatabaseImpl {}

#[salsa::db]
impl I18nDatabase for I18nDatabaseImpl {}
