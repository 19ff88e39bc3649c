use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a terminal, non-terminal or builtin symbol within one grammar.
///
/// Symbol numbering is private to the grammar that produced it; the only
/// stable identities are [`Symbol::END`] and [`Symbol::ERROR`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(u16);

impl Symbol {
    /// End of input. Present in every grammar.
    pub const END: Self = Self(0);

    /// Container produced by error recovery around skipped input.
    pub const ERROR: Self = Self(1);

    /// Lowest symbol value available to grammar-defined symbols.
    pub(crate) const FIRST_FREE: u16 = 2;

    #[inline]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::END => f.write_str("Symbol(END)"),
            Self::ERROR => f.write_str("Symbol(ERROR)"),
            Self(raw) => write!(f, "Symbol({raw})"),
        }
    }
}

/// How a symbol comes into existence during parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    /// Recognized by the built-in lexing automaton.
    Terminal,
    /// Recognized by an external scanner.
    External,
    /// Produced by reductions.
    NonTerminal,
    /// [`Symbol::END`] and [`Symbol::ERROR`].
    Builtin,
}

/// Per-symbol metadata recorded in the grammar.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: Box<str>,
    pub kind: SymbolKind,
    /// Named symbols appear in s-expressions; anonymous punctuation does not.
    pub named: bool,
    /// Extras may appear between any two tokens without a rule mentioning them.
    pub extra: bool,
    /// Token precedence consulted when resolving shift/reduce conflicts.
    pub precedence: Option<i32>,
}

impl SymbolInfo {
    pub(crate) fn new(name: &str, kind: SymbolKind, named: bool) -> Self {
        Self { name: name.into(), kind, named, extra: false, precedence: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_symbols_are_stable() {
        assert_eq!(Symbol::END.raw(), 0);
        assert_eq!(Symbol::ERROR.raw(), 1);
        assert_eq!(format!("{:?}", Symbol::ERROR), "Symbol(ERROR)");
        assert_eq!(format!("{:?}", Symbol::new(7)), "Symbol(7)");
    }
}
