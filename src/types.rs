//! Core types used throughout the project.

use tower_lsp::lsp_types;

/// A range in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
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

/// A position in a document (0-indexed, UTF-16 columns as LSP expects).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
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

impl SourceRange {
    #[must_use]
    pub const fn new(start: SourcePosition, end: SourcePosition) -> Self {
        Self { start, end }
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

/// Maps byte offsets of a text to line/column positions.
///
/// Columns are counted in UTF-16 code units, which is the default
/// `PositionEncodingKind` of LSP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset of the first character of every line.
    line_starts: Vec<usize>,
}

impl LineIndex {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(offset, _)| offset + 1));
        Self { line_starts }
    }

    /// Converts a byte offset into a position. Offsets past the end clamp to the end.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn position(&self, text: &str, offset: usize) -> SourcePosition {
        let offset = offset.min(text.len());
        let line = self.line_starts.partition_point(|&start| start <= offset).saturating_sub(1);
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        let character = text
            .get(line_start..offset)
            .map_or(0, |prefix| prefix.chars().map(char::len_utf16).sum::<usize>());

        SourcePosition { line: line as u32, character: character as u32 }
    }

    /// Converts a pair of byte offsets into a range.
    #[must_use]
    pub fn range(&self, text: &str, start: usize, end: usize) -> SourceRange {
        SourceRange { start: self.position(text, start), end: self.position(text, end) }
    }

    /// Converts a position back into a byte offset.
    #[must_use]
    pub fn offset(&self, text: &str, position: SourcePosition) -> Option<usize> {
        let line_start = *self.line_starts.get(position.line as usize)?;
        let line_end = self
            .line_starts
            .get(position.line as usize + 1)
            .map_or(text.len(), |next| next.saturating_sub(1));
        let line_text = text.get(line_start..line_end)?;

        let mut utf16 = 0;
        for (byte, ch) in line_text.char_indices() {
            if utf16 >= position.character as usize {
                return Some(line_start + byte);
            }
            utf16 += ch.len_utf16();
        }
        Some(line_end)
    }

    /// Position just past the last character of the text.
    #[must_use]
    pub fn end_position(&self, text: &str) -> SourcePosition {
        self.position(text, text.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    const fn pos(line: u32, character: u32) -> SourcePosition {
        SourcePosition { line, character }
    }

    const fn range(start_line: u32, start_char: u32, end_line: u32, end_char: u32) -> SourceRange {
        SourceRange { start: pos(start_line, start_char), end: pos(end_line, end_char) }
    }

    #[rstest]
    #[case::before_start_line(pos(0, 5), range(1, 5, 2, 10), false)]
    #[case::before_start_char(pos(1, 4), range(1, 5, 2, 10), false)]
    #[case::at_start(pos(1, 5), range(1, 5, 2, 10), true)]
    #[case::middle_line(pos(1, 10), range(1, 5, 2, 10), true)]
    #[case::at_end(pos(2, 10), range(1, 5, 2, 10), true)]
    #[case::after_end_char(pos(2, 11), range(1, 5, 2, 10), false)]
    #[case::after_end_line(pos(3, 0), range(1, 5, 2, 10), false)]
    fn test_contains(
        #[case] position: SourcePosition,
        #[case] range: SourceRange,
        #[case] expected: bool,
    ) {
        assert_that!(range.contains(position), eq(expected));
    }

    #[rstest]
    #[case::first_char(0, pos(0, 0))]
    #[case::inside_first_line(3, pos(0, 3))]
    #[case::newline_char(5, pos(0, 5))]
    #[case::second_line(6, pos(1, 0))]
    #[case::past_end(100, pos(2, 3))]
    fn test_line_index_position(#[case] offset: usize, #[case] expected: SourcePosition) {
        let text = "hello\nworld\nabc";
        let index = LineIndex::new(text);

        assert_eq!(index.position(text, offset), expected);
    }

    #[rstest]
    fn test_line_index_counts_utf16_units() {
        // "À" is 2 bytes in UTF-8 and 1 unit in UTF-16.
        let text = "<a>À propos</a>";
        let index = LineIndex::new(text);
        let offset = text.find("propos").unwrap();

        assert_eq!(index.position(text, offset), pos(0, 5));
    }

    #[rstest]
    fn test_line_index_offset_round_trips() {
        let text = "<TS>\n    <name>Dialog</name>\n</TS>\n";
        let index = LineIndex::new(text);
        let offset = text.find("Dialog").unwrap();
        let position = index.position(text, offset);

        assert_eq!(index.offset(text, position), Some(offset));
        assert_eq!(index.offset(text, pos(42, 0)), None);
    }
}
