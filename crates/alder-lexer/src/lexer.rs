use alder_grammar::{Grammar, LexStateId, Symbol, SymbolSet};
use alder_tree::{Point, PointRange};
use text_size::{TextLen, TextRange, TextSize};

use crate::cursor::{EOF_CHAR, SourceCursor};
use crate::external::{ExternalScanner, ScanCursor};

/// One recognized token. End of input is a zero-width token with
/// [`Symbol::END`]; unrecognizable bytes come back as one-char
/// [`Symbol::ERROR`] tokens rather than failures.
#[derive(Clone, Copy, Debug)]
pub struct Token {
    pub symbol: Symbol,
    pub range: TextRange,
    pub points: PointRange,
    /// Bytes past `range.end()` examined before this token was settled.
    /// An edit inside them invalidates the token.
    pub lookahead_len: TextSize,
    /// Lex state recognition started in.
    pub lex_state: LexStateId,
    /// Whether an external scanner produced the token.
    pub external: bool,
}

impl Token {
    #[inline]
    pub fn len(&self) -> TextSize {
        self.range.len()
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.symbol == Symbol::END
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.symbol == Symbol::ERROR
    }
}

/// Drives the grammar's lexing automaton over source text.
///
/// The lexer holds no lookahead of its own: every call starts from the
/// cursor's position in the lex state the parser selects, so [`seek`] can
/// restart scanning at any byte offset.
///
/// [`seek`]: Lexer::seek
pub struct Lexer<'text> {
    grammar: Grammar,
    cursor: SourceCursor<'text>,
}

impl<'text> Lexer<'text> {
    pub fn new(grammar: Grammar, text: &'text str) -> Self {
        Self { grammar, cursor: SourceCursor::new(text) }
    }

    #[inline]
    pub fn offset(&self) -> TextSize {
        self.cursor.offset()
    }

    #[inline]
    pub fn point(&self) -> Point {
        self.cursor.point()
    }

    /// Repositions the lexer. `point` must be the row/column of `offset`.
    pub fn seek(&mut self, offset: TextSize, point: Point) {
        self.cursor.seek(offset, point);
    }

    /// Recognizes the next token, trying `scanner` for the externals in
    /// `external_valid` before the automaton.
    pub fn next_token(
        &mut self,
        lex_state: LexStateId,
        external_valid: &SymbolSet,
        scanner: Option<&mut dyn ExternalScanner>,
    ) -> Token {
        if let Some(scanner) = scanner
            && !external_valid.is_empty()
            && let Some(token) = self.scan_external(lex_state, external_valid, scanner)
        {
            return token;
        }
        self.scan_dfa(lex_state)
    }

    fn scan_external(
        &mut self,
        lex_state: LexStateId,
        valid: &SymbolSet,
        scanner: &mut dyn ExternalScanner,
    ) -> Option<Token> {
        let start = self.cursor.offset();
        let start_point = self.cursor.point();
        let mut scan = ScanCursor::new(self.cursor.clone());
        let symbol = scanner.scan(&mut scan, valid)?;
        let (end, end_point, examined) = scan.finish();
        // Zero-width externals would stall the parse.
        if end <= start || !valid.contains(symbol) {
            return None;
        }
        self.cursor.seek(end, end_point);
        Some(Token {
            symbol,
            range: TextRange::new(start, end),
            points: PointRange::new(start_point, end_point),
            lookahead_len: examined.max(end) - end,
            lex_state,
            external: true,
        })
    }

    fn scan_dfa(&mut self, lex_state: LexStateId) -> Token {
        let start = self.cursor.offset();
        let start_point = self.cursor.point();
        let table = self.grammar.lex_table();

        let mut state = lex_state;
        let mut accepted: Option<(Symbol, TextSize, Point)> = None;
        let mut examined = start;

        loop {
            let lex = table.state(state);
            if let Some(symbol) = lex.accept
                && self.cursor.offset() > start
            {
                accepted = Some((symbol, self.cursor.offset(), self.cursor.point()));
            }
            if lex.transitions.is_empty() {
                break;
            }
            let c = self.cursor.peek();
            let width = if c == EOF_CHAR { TextSize::new(1) } else { c.text_len() };
            examined = examined.max(self.cursor.offset() + width);
            if self.cursor.is_eof() {
                break;
            }
            match lex.transition(c) {
                Some(next) => {
                    self.cursor.advance();
                    state = next;
                }
                None => break,
            }
        }

        if let Some((symbol, end, end_point)) = accepted {
            self.cursor.seek(end, end_point);
            return Token {
                symbol,
                range: TextRange::new(start, end),
                points: PointRange::new(start_point, end_point),
                lookahead_len: examined.max(end) - end,
                lex_state,
                external: false,
            };
        }

        if start == self.cursor.offset() && self.cursor.is_eof() {
            return Token {
                symbol: Symbol::END,
                range: TextRange::empty(start),
                points: PointRange::new(start_point, start_point),
                lookahead_len: TextSize::new(0),
                lex_state,
                external: false,
            };
        }

        // No rule matches here. Consume one char as an error token and let
        // the parser carry on.
        self.cursor.seek(start, start_point);
        self.cursor.advance();
        let end = self.cursor.offset();
        tracing::trace!(offset = u32::from(start), "no token matches, emitting error token");
        Token {
            symbol: Symbol::ERROR,
            range: TextRange::new(start, end),
            points: PointRange::new(start_point, self.cursor.point()),
            lookahead_len: examined.max(end) - end,
            lex_state,
            external: false,
        }
    }
}
