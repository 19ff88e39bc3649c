//! The GLR parse-table interpreter of the alder engine.
//!
//! [`Parser`] drives a [`Grammar`](alder_grammar::Grammar)'s automaton over
//! tokens from [`alder_lexer`], producing [`Tree`](alder_tree::Tree)s. Where
//! the tables hold several actions for one state and lookahead, the stack
//! forks into a bounded set of parallel versions that merge once the input
//! disambiguates them. Broken input is recovered into ERROR and missing
//! nodes, never a failure. Handing `parse` the edited previous tree makes
//! the parse incremental: undamaged subtrees are shifted whole.

mod parser;
mod recover;
mod reuse;
mod stack;
#[cfg(test)]
mod tests;

pub use parser::{ParseOptions, Parser};
