use std::str::Chars;

use alder_tree::Point;
use text_size::{TextLen, TextSize};

pub(crate) const EOF_CHAR: char = '\0';

/// A char cursor over source text that tracks its byte offset and row/column
/// position, and can be repositioned at any byte offset.
#[derive(Clone)]
pub struct SourceCursor<'text> {
    text: &'text str,
    chars: Chars<'text>,
    offset: TextSize,
    point: Point,
}

impl<'text> SourceCursor<'text> {
    pub fn new(text: &'text str) -> Self {
        Self { text, chars: text.chars(), offset: TextSize::new(0), point: Point::ZERO }
    }

    #[inline]
    pub fn offset(&self) -> TextSize {
        self.offset
    }

    #[inline]
    pub fn point(&self) -> Point {
        self.point
    }

    pub fn is_eof(&self) -> bool {
        self.chars.as_str().is_empty()
    }

    /// Repositions the cursor. `offset` must lie on a char boundary and
    /// `point` must be the row/column of that offset.
    pub fn seek(&mut self, offset: TextSize, point: Point) {
        self.chars = self.text[usize::from(offset)..].chars();
        self.offset = offset;
        self.point = point;
    }

    /// The next char without consuming it, or [`EOF_CHAR`] at the end.
    pub fn peek(&self) -> char {
        self.chars.clone().next().unwrap_or(EOF_CHAR)
    }

    pub fn advance(&mut self) -> char {
        let Some(c) = self.chars.next() else { return EOF_CHAR };
        self.offset += c.text_len();
        self.point = if c == '\n' {
            Point::new(self.point.row + 1, 0)
        } else {
            Point::new(self.point.row, self.point.column + u32::from(c.text_len()))
        };
        c
    }

    pub fn advance_while(&mut self, f: impl Fn(char) -> bool + Copy) {
        while !self.is_eof() && f(self.peek()) {
            self.advance();
        }
    }
}
