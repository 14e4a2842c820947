//! Restricted literal evaluation.
//!
//! Locale files and interpolation arguments are read as *data*: tree-sitter
//! parses the text and only object/array/string/number/boolean/null nodes are
//! turned into values. Identifiers, calls, spreads, computed keys and template
//! substitutions are rejected, so nothing in the input is ever executed.

use std::collections::HashMap;

use serde_json::{
    Map,
    Number,
    Value,
};
use tree_sitter::{
    Node,
    Parser,
    Tree,
};

use crate::input::source::ProgrammingLanguage;
use crate::locale::error::LocaleError;
use crate::types::SourcePosition;

/// Deepest object/array nesting accepted. Deeper input is rejected instead of
/// exhausting the stack.
pub const MAX_DEPTH: usize = 256;

/// Wrapper nodes that do not change the wrapped value.
const TRANSPARENT_KINDS: &[&str] =
    &["parenthesized_expression", "as_expression", "satisfies_expression", "non_null_expression"];

/// Parses `source` with the grammar of `language`.
pub(crate) fn parse_tree(source: &str, language: ProgrammingLanguage) -> Result<Tree, LocaleError> {
    let mut parser = Parser::new();
    parser.set_language(&language.tree_sitter_language())?;
    parser.parse(source, None).ok_or(LocaleError::ParseFailed)
}

/// 1-based line of a node.
pub(crate) fn node_line(node: Node<'_>) -> u32 {
    SourcePosition::from(node.start_position()).line + 1
}

/// Named children of a node, comments excluded.
pub(crate) fn data_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).filter(|child| child.kind() != "comment").collect()
}

/// Strips parentheses and TypeScript `as` / `satisfies` / `!` wrappers.
pub(crate) fn unwrap_transparent(mut node: Node<'_>) -> Node<'_> {
    while TRANSPARENT_KINDS.contains(&node.kind()) {
        let Some(inner) = data_children(node).into_iter().next() else {
            break;
        };
        node = inner;
    }
    node
}

/// Evaluates a standalone literal such as `{ name: 'Bob' }` or `[1, 2]`.
///
/// # Errors
/// Returns an error if the text is not valid syntax or contains anything other
/// than plain data.
pub fn evaluate_literal(text: &str) -> Result<Value, LocaleError> {
    // Parenthesized so that `{ ... }` is read as an object, not a block.
    let source = format!("({text}\n)");
    let tree = parse_tree(&source, ProgrammingLanguage::TypeScript)?;
    let root = tree.root_node();

    if root.has_error() {
        return Err(LocaleError::Syntax { line: first_error_line(root) });
    }

    let statements = data_children(root);
    let [statement] = statements.as_slice() else {
        return Err(LocaleError::Unsupported { kind: "multiple statements".to_string(), line: 1 });
    };
    let Some(expression) = data_children(*statement).into_iter().next() else {
        return Err(LocaleError::ParseFailed);
    };

    let mut evaluator = LiteralEvaluator::new(source.as_bytes());
    evaluator.evaluate(expression)
}

/// Line of the first error or missing node below `node`.
pub(crate) fn first_error_line(node: Node<'_>) -> u32 {
    let mut current = node;
    loop {
        if current.is_error() || current.is_missing() {
            return node_line(current);
        }
        let mut cursor = current.walk();
        let next = current.children(&mut cursor).find(|child| child.has_error());
        match next {
            Some(child) => current = child,
            None => return node_line(current),
        }
    }
}

/// Walks literal nodes and builds a [`Value`], optionally recording where each
/// leaf was defined.
pub(crate) struct LiteralEvaluator<'s> {
    /// Source text the tree was parsed from.
    source: &'s [u8],
    /// Property path from the root literal to the node being evaluated.
    path: Vec<String>,
    /// Dotted leaf key → 1-based line of the property that defined it.
    leaf_lines: HashMap<String, u32>,
    /// Current object/array nesting.
    depth: usize,
}

impl<'s> LiteralEvaluator<'s> {
    pub(crate) fn new(source: &'s [u8]) -> Self {
        Self { source, path: Vec::new(), leaf_lines: HashMap::new(), depth: 0 }
    }

    /// Consumes the evaluator, returning the recorded leaf lines.
    pub(crate) fn into_leaf_lines(self) -> HashMap<String, u32> {
        self.leaf_lines
    }

    pub(crate) fn evaluate(&mut self, node: Node<'_>) -> Result<Value, LocaleError> {
        let node = unwrap_transparent(node);
        let line = node_line(node);

        if node.is_error() || node.is_missing() || node.has_error() {
            return Err(LocaleError::Syntax { line: first_error_line(node) });
        }

        match node.kind() {
            "object" | "array" => self.evaluate_nested(node),
            "string" => Ok(Value::String(self.string_value(node)?)),
            "template_string" => Ok(Value::String(self.template_value(node)?)),
            "number" => {
                let text = self.text(node)?;
                parse_number(text)
                    .ok_or_else(|| LocaleError::InvalidNumber { text: text.to_string(), line })
            }
            "unary_expression" => self.evaluate_unary(node),
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "null" | "undefined" => Ok(Value::Null),
            kind => Err(LocaleError::Unsupported { kind: kind.to_string(), line }),
        }
    }

    /// Objects and arrays, bounded by [`MAX_DEPTH`].
    fn evaluate_nested(&mut self, node: Node<'_>) -> Result<Value, LocaleError> {
        if self.depth >= MAX_DEPTH {
            return Err(LocaleError::TooDeep { max_depth: MAX_DEPTH, line: node_line(node) });
        }

        self.depth += 1;
        let value = if node.kind() == "object" {
            self.evaluate_object(node)
        } else {
            self.evaluate_array(node)
        };
        self.depth -= 1;
        value
    }

    fn evaluate_object(&mut self, node: Node<'_>) -> Result<Value, LocaleError> {
        let mut map = Map::new();

        for child in data_children(node) {
            if child.kind() != "pair" {
                return Err(LocaleError::Unsupported {
                    kind: child.kind().to_string(),
                    line: node_line(child),
                });
            }

            let (Some(key_node), Some(value_node)) =
                (child.child_by_field_name("key"), child.child_by_field_name("value"))
            else {
                return Err(LocaleError::Syntax { line: node_line(child) });
            };

            let key = self.property_key(key_node)?;
            self.path.push(key.clone());
            let value = self.evaluate(value_node);
            if let Ok(leaf) = &value {
                self.record_leaf(leaf, node_line(child));
            }
            self.path.pop();

            map.insert(key, value?);
        }

        Ok(Value::Object(map))
    }

    fn evaluate_array(&mut self, node: Node<'_>) -> Result<Value, LocaleError> {
        let mut items = Vec::new();

        for (index, child) in data_children(node).into_iter().enumerate() {
            self.path.push(index.to_string());
            let value = self.evaluate(child);
            if let Ok(leaf) = &value {
                self.record_leaf(leaf, node_line(child));
            }
            self.path.pop();

            items.push(value?);
        }

        Ok(Value::Array(items))
    }

    fn evaluate_unary(&mut self, node: Node<'_>) -> Result<Value, LocaleError> {
        let line = node_line(node);
        let operator = node.child_by_field_name("operator").map(|op| self.text(op)).transpose()?;
        let argument = node.child_by_field_name("argument").map(unwrap_transparent);

        match (operator, argument) {
            (Some("-"), Some(argument)) if argument.kind() == "number" => {
                let text = self.text(argument)?;
                negate(parse_number(text))
                    .ok_or_else(|| LocaleError::InvalidNumber { text: format!("-{text}"), line })
            }
            (Some("+"), Some(argument)) if argument.kind() == "number" => {
                let text = self.text(argument)?;
                parse_number(text)
                    .ok_or_else(|| LocaleError::InvalidNumber { text: text.to_string(), line })
            }
            _ => Err(LocaleError::Unsupported { kind: "unary_expression".to_string(), line }),
        }
    }

    fn property_key(&self, node: Node<'_>) -> Result<String, LocaleError> {
        match node.kind() {
            "property_identifier" => self.text(node).map(ToString::to_string),
            "string" => self.string_value(node),
            "number" => {
                let text = self.text(node)?;
                Ok(match parse_number(text) {
                    Some(Value::Number(number)) => number.to_string(),
                    _ => text.to_string(),
                })
            }
            kind => {
                Err(LocaleError::Unsupported { kind: kind.to_string(), line: node_line(node) })
            }
        }
    }

    fn record_leaf(&mut self, value: &Value, line: u32) {
        if matches!(value, Value::Object(_) | Value::Array(_)) {
            return;
        }
        self.leaf_lines.insert(self.path.join("."), line);
    }

    fn text(&self, node: Node<'_>) -> Result<&'s str, LocaleError> {
        node.utf8_text(self.source).map_err(|_| LocaleError::Syntax { line: node_line(node) })
    }

    fn string_value(&self, node: Node<'_>) -> Result<String, LocaleError> {
        let raw = self.text(node)?;
        let inner = ['"', '\'']
            .iter()
            .find_map(|quote| raw.strip_prefix(*quote).and_then(|r| r.strip_suffix(*quote)))
            .ok_or(LocaleError::Syntax { line: node_line(node) })?;
        Ok(decode_escapes(inner))
    }

    /// Template literals without `${}` read as plain strings.
    fn template_value(&self, node: Node<'_>) -> Result<String, LocaleError> {
        let mut cursor = node.walk();
        if node.named_children(&mut cursor).any(|child| child.kind() == "template_substitution") {
            return Err(LocaleError::TemplateSubstitution { line: node_line(node) });
        }

        let raw = self.text(node)?;
        let inner = raw
            .strip_prefix('`')
            .and_then(|r| r.strip_suffix('`'))
            .ok_or(LocaleError::Syntax { line: node_line(node) })?;
        Ok(decode_escapes(inner))
    }
}

/// Parses a JavaScript numeric literal.
fn parse_number(text: &str) -> Option<Value> {
    let cleaned = text.replace('_', "").to_ascii_lowercase();

    for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        if let Some(digits) = cleaned.strip_prefix(prefix) {
            let digits = digits.strip_suffix('n').unwrap_or(digits);
            return i64::from_str_radix(digits, radix).ok().map(Value::from);
        }
    }

    if let Some(bigint) = cleaned.strip_suffix('n') {
        return bigint.parse::<i64>().ok().map(Value::from);
    }

    if let Ok(integer) = cleaned.parse::<i64>() {
        return Some(Value::from(integer));
    }

    cleaned.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
}

fn negate(value: Option<Value>) -> Option<Value> {
    let Some(Value::Number(number)) = value else {
        return None;
    };

    if let Some(integer) = number.as_i64() {
        return integer.checked_neg().map(Value::from);
    }

    number
        .as_f64()
        .and_then(|float| format!("-{float}").parse::<f64>().ok())
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// Decodes JavaScript escape sequences in a string body.
fn decode_escapes(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    let mut high_surrogate: Option<u32> = None;

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            break;
        };

        let code_point = match escaped {
            'n' => Some('\n' as u32),
            't' => Some('\t' as u32),
            'r' => Some('\r' as u32),
            'b' => Some(0x08),
            'f' => Some(0x0c),
            'v' => Some(0x0b),
            '0' => Some(0),
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                u32::from_str_radix(&hex, 16).ok()
            }
            'u' => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|c| *c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                u32::from_str_radix(&hex, 16).ok()
            }
            // Line continuation
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                None
            }
            '\n' | '\u{2028}' | '\u{2029}' => None,
            other => Some(other as u32),
        };

        let Some(code_point) = code_point else {
            continue;
        };

        if (0xD800..0xDC00).contains(&code_point) {
            high_surrogate = Some(code_point);
            continue;
        }

        let combined = match high_surrogate.take() {
            Some(high) if (0xDC00..0xE000).contains(&code_point) => {
                0x10000 + ((high - 0xD800) << 10) + (code_point - 0xDC00)
            }
            _ => code_point,
        };

        if let Some(decoded) = char::from_u32(combined) {
            out.push(decoded);
        }
    }

    out
}
