//! ts-i18n-language-server
//!
//! TypeScript/JavaScript のロケールファイル（`export default { ... }`）から翻訳を解決する
//! i18n Language Server Protocol (LSP) 実装

pub mod config;
pub mod db;
pub mod ide;
pub mod input;
pub mod locale;
pub mod syntax;
pub mod types;

// Backend を再エクスポート
pub use ide::backend::Backend;
pub use locale::{
    I18nEngine,
    LocaleIndex,
    TranslationResult,
};
