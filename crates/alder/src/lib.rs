//! Incremental GLR parsing, tree-sitter style.
//!
//! A [`Grammar`] holds the lexing and parsing automata for one language;
//! a [`Parser`] interprets them over source text and produces immutable,
//! structurally shared [`Tree`]s. Recording an edit with [`Tree::edit`] and
//! reparsing with the edited tree keeps everything outside the damage
//! pointer-identical to the previous version.
//!
//! ```
//! use alder::{Parser, samples};
//!
//! let mut parser = Parser::new(samples::arithmetic());
//! let tree = parser.parse("1+2*3", None);
//! assert!(!tree.has_error());
//! ```
//!
//! The [`samples`] module carries small complete grammars used across the
//! test suite and benchmarks.

pub mod samples;

pub use alder_grammar::{
    Assoc, Grammar, GrammarBuilder, GrammarError, ParseAction, Production, Symbol, SymbolInfo,
    SymbolKind, SymbolSet,
};
pub use alder_lexer::{ExternalScanner, Lexer, ScanCursor, Token};
pub use alder_parse::{ParseOptions, Parser};
pub use alder_tree::{
    EditError, Green, GreenNode, GreenToken, InputEdit, Node, NodeOrToken, Point, PointDelta,
    PointRange, Tree, TreeCursor,
};
