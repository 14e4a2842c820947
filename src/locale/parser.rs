//! Locale file parsing.
//!
//! A locale file is a TypeScript or JavaScript module whose default export is
//! an object literal:
//!
//! ```ts
//! export default {
//!   user: {
//!     greeting: 'Hello {name}',
//!   },
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tree_sitter::Node;

use crate::input::source::ProgrammingLanguage;
use crate::locale::LocaleTree;
use crate::locale::error::LocaleError;
use crate::locale::literal::{
    LiteralEvaluator,
    data_children,
    first_error_line,
    node_line,
    parse_tree,
    unwrap_transparent,
};

/// Messages read from one locale file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLocale {
    pub messages: LocaleTree,
    /// Dotted leaf key → 1-based line of its definition.
    pub key_lines: HashMap<String, u32>,
}

/// Reads and parses a locale file.
///
/// `Ok(None)` means the file has no default-exported object.
///
/// # Errors
/// Returns an error if the file cannot be read or its default export is not plain data.
pub fn load_locale_file(path: &Path) -> Result<Option<ParsedLocale>, LocaleError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| LocaleError::Io { path: path.to_path_buf(), source })?;

    let language = ProgrammingLanguage::from_uri(&path.to_string_lossy())
        .unwrap_or(ProgrammingLanguage::TypeScript);

    parse_locale_source(&content, language)
}

/// Parses the text of a locale file.
///
/// The last `export default` statement wins. A default export that names a
/// `const` declared in the same file (`export default messages`) is followed
/// to that declaration's initializer.
///
/// # Errors
/// Returns an error on syntax errors anywhere in the file, or when the
/// exported object contains anything other than literals.
pub fn parse_locale_source(
    content: &str,
    language: ProgrammingLanguage,
) -> Result<Option<ParsedLocale>, LocaleError> {
    let tree = parse_tree(content, language)?;
    let root = tree.root_node();
    let source = content.as_bytes();

    if root.has_error() {
        return Err(LocaleError::Syntax { line: first_error_line(root) });
    }

    let Some(exported) = find_default_export(root) else {
        tracing::debug!("No export default found");
        return Ok(None);
    };

    let exported = unwrap_transparent(exported);
    let object = match exported.kind() {
        "object" => exported,
        "identifier" => {
            let Some(initializer) = exported
                .utf8_text(source)
                .ok()
                .and_then(|name| find_const_initializer(root, source, name))
            else {
                tracing::debug!("Default export does not reference a local object");
                return Ok(None);
            };
            unwrap_transparent(initializer)
        }
        kind => {
            tracing::debug!(kind, "Default export is not an object literal");
            return Ok(None);
        }
    };

    if object.kind() != "object" {
        return Ok(None);
    }

    let mut evaluator = LiteralEvaluator::new(source);
    let Value::Object(messages) = evaluator.evaluate(object)? else {
        return Err(LocaleError::Unsupported {
            kind: object.kind().to_string(),
            line: node_line(object),
        });
    };

    Ok(Some(ParsedLocale { messages, key_lines: evaluator.into_leaf_lines() }))
}

/// Value of the last `export default <expression>` at the top level.
fn find_default_export(root: Node<'_>) -> Option<Node<'_>> {
    data_children(root)
        .into_iter()
        .filter(|node| node.kind() == "export_statement")
        .filter_map(|node| node.child_by_field_name("value"))
        .last()
}

/// Initializer of a top-level `const`/`let`/`var` named `name`.
fn find_const_initializer<'t>(root: Node<'t>, source: &[u8], name: &str) -> Option<Node<'t>> {
    data_children(root)
        .into_iter()
        .flat_map(|statement| match statement.kind() {
            // `export const messages = { ... }`
            "export_statement" => statement.child_by_field_name("declaration").into_iter().collect(),
            "lexical_declaration" | "variable_declaration" => vec![statement],
            _ => Vec::new(),
        })
        .filter(|declaration| {
            matches!(declaration.kind(), "lexical_declaration" | "variable_declaration")
        })
        .flat_map(data_children)
        .filter(|declarator| declarator.kind() == "variable_declarator")
        .filter(|declarator| {
            declarator
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(source).ok())
                .is_some_and(|declared| declared == name)
        })
        .filter_map(|declarator| declarator.child_by_field_name("value"))
        .last()
}
