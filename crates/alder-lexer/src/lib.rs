//! Tokenization for the alder parsing engine.
//!
//! [`Lexer`] drives a grammar's character-level automaton over source text,
//! restartable at any byte offset so incremental reparses can pick up right
//! at the damage. Context-sensitive tokens come from an [`ExternalScanner`],
//! consulted ahead of the automaton through a [`ScanCursor`].

mod cursor;
mod external;
mod lexer;

/// Position-tracking char cursor over source text.
pub use cursor::SourceCursor;
/// Hand-written scanner hook for context-sensitive tokens.
pub use external::{ExternalScanner, ScanCursor};
/// The automaton driver and its token type.
pub use lexer::{Lexer, Token};
