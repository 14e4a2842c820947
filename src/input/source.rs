//! Source file input definitions.

use std::path::Path;

/// An open editor document.
#[salsa::input]
pub struct SourceFile {
    #[returns(ref)]
    pub uri: String,

    #[returns(ref)]
    pub text: String,

    pub language: ProgrammingLanguage,
}

/// Languages whose documents may contain translation calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgrammingLanguage {
    JavaScript,
    Jsx,
    TypeScript,
    Tsx,
    /// Single-file components; only the text matters for call-site scanning.
    Vue,
}

impl ProgrammingLanguage {
    /// Infers the language from a file extension.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match Path::new(uri).extension().and_then(|ext| ext.to_str()) {
            Some("tsx") => Some(Self::Tsx),
            Some("ts" | "mts" | "cts") => Some(Self::TypeScript),
            Some("jsx") => Some(Self::Jsx),
            Some("js" | "mjs" | "cjs") => Some(Self::JavaScript),
            Some("vue") => Some(Self::Vue),
            _ => None,
        }
    }

    /// Maps an LSP `languageId` to a language.
    #[must_use]
    pub fn from_language_id(language_id: &str) -> Option<Self> {
        match language_id {
            "typescriptreact" => Some(Self::Tsx),
            "typescript" => Some(Self::TypeScript),
            "javascriptreact" => Some(Self::Jsx),
            "javascript" => Some(Self::JavaScript),
            "vue" => Some(Self::Vue),
            _ => None,
        }
    }

    /// Grammar used when a tree is needed. Vue falls back to TypeScript.
    #[must_use]
    pub fn tree_sitter_language(&self) -> tree_sitter::Language {
        match self {
            Self::JavaScript | Self::Jsx => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript | Self::Vue => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}
