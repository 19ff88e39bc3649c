use alder_grammar::{Symbol, SymbolSet};
use alder_tree::Point;
use text_size::{TextLen, TextSize};

use crate::cursor::{EOF_CHAR, SourceCursor};

/// A hand-written scanner for tokens the lexing automaton cannot express,
/// such as delimiters that nest or depend on parser context.
///
/// The scanner is consulted before the automaton whenever the current parse
/// state admits at least one external terminal. Returning `None` must leave
/// no observable effect; the engine discards the cursor it handed out.
pub trait ExternalScanner {
    /// Attempts to recognize one token among `valid`, consuming input through
    /// the cursor. On success, the token ends at the last [`mark_end`] call,
    /// or at the cursor's final position if none was made.
    ///
    /// [`mark_end`]: ScanCursor::mark_end
    fn scan(&mut self, cursor: &mut ScanCursor<'_>, valid: &SymbolSet) -> Option<Symbol>;

    /// Captures scanner state carried between tokens. Stateless scanners
    /// leave `out` empty.
    fn serialize(&self, _out: &mut Vec<u8>) {}

    /// Restores state captured by [`serialize`](ExternalScanner::serialize).
    /// Called with an empty slice to restore the initial state.
    fn deserialize(&mut self, _bytes: &[u8]) {}

    /// Drops all carried state, as if freshly constructed.
    fn reset(&mut self) {}
}

/// The view of the source an [`ExternalScanner`] reads through.
pub struct ScanCursor<'text> {
    cursor: SourceCursor<'text>,
    marked: Option<(TextSize, Point)>,
    /// One past the furthest byte any lookahead examined.
    examined: TextSize,
}

impl<'text> ScanCursor<'text> {
    pub(crate) fn new(cursor: SourceCursor<'text>) -> Self {
        let examined = cursor.offset();
        Self { cursor, marked: None, examined }
    }

    /// The next char, or `'\0'` at the end of input.
    pub fn lookahead(&mut self) -> char {
        let c = self.cursor.peek();
        let width = if c == EOF_CHAR { TextSize::new(1) } else { c.text_len() };
        self.examined = self.examined.max(self.cursor.offset() + width);
        c
    }

    pub fn eof(&self) -> bool {
        self.cursor.is_eof()
    }

    pub fn advance(&mut self) {
        self.cursor.advance();
        self.examined = self.examined.max(self.cursor.offset());
    }

    /// Pins the token's end at the current position. Input consumed after
    /// this call counts as lookahead, not as token text.
    pub fn mark_end(&mut self) {
        self.marked = Some((self.cursor.offset(), self.cursor.point()));
    }

    #[inline]
    pub fn offset(&self) -> TextSize {
        self.cursor.offset()
    }

    /// Token end, final point, and the examined high-water mark.
    pub(crate) fn finish(self) -> (TextSize, Point, TextSize) {
        let (end, point) = self.marked.unwrap_or((self.cursor.offset(), self.cursor.point()));
        (end, point, self.examined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_defaults_to_final_position() {
        let mut scan = ScanCursor::new(SourceCursor::new("abc"));
        scan.advance();
        scan.advance();
        let (end, point, examined) = scan.finish();
        assert_eq!(end, TextSize::new(2));
        assert_eq!(point, Point::new(0, 2));
        assert_eq!(examined, TextSize::new(2));
    }

    #[test]
    fn mark_end_splits_text_from_lookahead() {
        let mut scan = ScanCursor::new(SourceCursor::new("abcd"));
        scan.advance();
        scan.mark_end();
        scan.advance();
        assert_eq!(scan.lookahead(), 'c');
        let (end, _, examined) = scan.finish();
        assert_eq!(end, TextSize::new(1));
        assert_eq!(examined, TextSize::new(3));
    }

    #[test]
    fn eof_lookahead_counts_one_byte() {
        let mut scan = ScanCursor::new(SourceCursor::new("a"));
        scan.advance();
        assert_eq!(scan.lookahead(), EOF_CHAR);
        assert!(scan.eof());
        let (end, _, examined) = scan.finish();
        assert_eq!(end, TextSize::new(1));
        assert_eq!(examined, TextSize::new(2));
    }
}
