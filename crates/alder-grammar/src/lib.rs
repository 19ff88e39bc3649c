//! Grammar tables for the alder parsing engine.
//!
//! A [`Grammar`] bundles everything the runtime needs to parse one language:
//! the symbol table, the lexing automaton, and the LR parse states whose
//! cells may hold several actions at once. Grammars are immutable and cheap
//! to clone. Build one programmatically with [`GrammarBuilder`] or load a
//! serialized blob with [`Grammar::from_bytes`].

mod blob;
mod builder;
mod grammar;
mod lex_table;
mod parse_table;
mod symbol;
mod symbol_set;

/// Programmatic grammar assembly with validation.
pub use builder::GrammarBuilder;
/// The immutable grammar handle and its load/store errors.
pub use grammar::{Grammar, GrammarError};
/// Lexing automaton tables.
pub use lex_table::{LexState, LexStateId, LexTable, LexTransition};
/// Parsing automaton tables and reduction metadata.
pub use parse_table::{Assoc, ParseAction, ParseState, ParseStateId, Production, ProductionId};
/// Symbol identifiers and per-symbol metadata.
pub use symbol::{Symbol, SymbolInfo, SymbolKind};
/// Compact set for grouping `Symbol` values.
pub use symbol_set::SymbolSet;

/// Version tag written into serialized grammar blobs.
pub use blob::FORMAT_VERSION;
