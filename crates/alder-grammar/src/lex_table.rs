use serde::{Deserialize, Serialize};

use crate::Symbol;

/// Identifies a state of the lexing automaton.
pub type LexStateId = u16;

/// A character-range transition out of one lex state. Bounds are inclusive.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct LexTransition {
    pub lo: char,
    pub hi: char,
    pub target: LexStateId,
}

/// One state of the lexing automaton.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LexState {
    /// Sorted by `lo`, pairwise disjoint.
    pub transitions: Box<[LexTransition]>,
    /// Token recognized when the automaton stops here.
    pub accept: Option<Symbol>,
}

impl LexState {
    /// Returns the state reached on `c`, if any transition covers it.
    pub fn transition(&self, c: char) -> Option<LexStateId> {
        let idx = self.transitions.partition_point(|t| t.hi < c);
        let transition = self.transitions.get(idx)?;
        (transition.lo <= c).then_some(transition.target)
    }
}

/// The character-level DFA tokens are recognized with.
///
/// State zero is the start state shared by every parse state that does not
/// select a more specific one.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LexTable {
    pub states: Box<[LexState]>,
}

impl LexTable {
    pub fn state(&self, id: LexStateId) -> &LexState {
        &self.states[id as usize]
    }
}
