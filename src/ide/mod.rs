//! IDE 機能を提供するモジュール

pub mod backend;
pub mod code_lens;
pub mod completion;
pub mod fuzzy;
pub mod goto_definition;
mod handlers;
pub mod hover;
pub mod state;
pub mod virtual_text;
