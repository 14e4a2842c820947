//! Core types used throughout the project.

use tower_lsp::lsp_types;

/// A range in source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRange {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl From<lsp_types::Range> for SourceRange {
    fn from(range: lsp_types::Range) -> Self {
        Self { start: range.start.into(), end: range.end.into() }
    }
}

impl From<SourceRange> for lsp_types::Range {
    fn from(range: SourceRange) -> Self {
        Self { start: range.start.into(), end: range.end.into() }
    }
}

/// A position in source code (0-indexed, UTF-16 columns as in LSP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    pub line: u32,
    pub character: u32,
}

impl From<lsp_types::Position> for SourcePosition {
    fn from(position: lsp_types::Position) -> Self {
        Self { line: position.line, character: position.character }
    }
}

impl From<SourcePosition> for lsp_types::Position {
    fn from(position: SourcePosition) -> Self {
        Self { line: position.line, character: position.character }
    }
}

impl From<tree_sitter::Point> for SourcePosition {
    #[allow(clippy::cast_possible_truncation)]
    fn from(point: tree_sitter::Point) -> Self {
        Self { line: point.row as u32, character: point.column as u32 }
    }
}

impl SourceRange {
    /// Range on a single line between two byte offsets of `line_text`.
    #[must_use]
    pub fn on_line(line: u32, line_text: &str, start_byte: usize, end_byte: usize) -> Self {
        Self {
            start: SourcePosition { line, character: utf16_column(line_text, start_byte) },
            end: SourcePosition { line, character: utf16_column(line_text, end_byte) },
        }
    }

    /// Checks if a position is within this range.
    #[must_use]
    pub const fn contains(&self, position: SourcePosition) -> bool {
        if position.line < self.start.line {
            return false;
        }
        if position.line == self.start.line && position.character < self.start.character {
            return false;
        }
        if position.line > self.end.line {
            return false;
        }
        if position.line == self.end.line && position.character > self.end.character {
            return false;
        }
        true
    }
}

/// UTF-16 column of a byte offset within one line.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // 1 行が u32 を超えることはない
pub fn utf16_column(line_text: &str, byte_offset: usize) -> u32 {
    line_text
        .char_indices()
        .take_while(|(index, _)| *index < byte_offset)
        .map(|(_, ch)| ch.len_utf16())
        .sum::<usize>() as u32
}

/// Byte offset of a UTF-16 column within one line, clamped to the line end.
#[must_use]
pub fn byte_offset(line_text: &str, utf16_col: u32) -> usize {
    let mut units = 0usize;
    for (index, ch) in line_text.char_indices() {
        if units >= utf16_col as usize {
            return index;
        }
        units += ch.len_utf16();
    }
    line_text.len()
}
