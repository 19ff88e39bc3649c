use serde::{Deserialize, Serialize};

use crate::{LexStateId, Symbol, SymbolSet};

/// Identifies a state of the parsing automaton. State zero is the start.
pub type ParseStateId = u16;

/// Index of a [`Production`] within its grammar.
pub type ProductionId = u16;

/// Breaks shift/reduce ties between a rule and a token of equal precedence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assoc {
    Left,
    Right,
}

/// Metadata of one reduction rule.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Production {
    /// Symbol the reduction produces.
    pub symbol: Symbol,
    /// Number of non-extra stack frames the reduction consumes.
    pub child_count: u16,
    /// Rule precedence, compared against token precedence in conflicts.
    pub precedence: Option<i32>,
    pub assoc: Option<Assoc>,
    /// Bias added to a stack version applying this reduction; ranks
    /// ambiguous interpretations when versions merge.
    pub dynamic_precedence: i32,
}

impl Production {
    pub fn new(symbol: Symbol, child_count: u16) -> Self {
        Self { symbol, child_count, precedence: None, assoc: None, dynamic_precedence: 0 }
    }

    pub fn with_precedence(mut self, precedence: i32) -> Self {
        self.precedence = Some(precedence);
        self
    }

    pub fn with_assoc(mut self, assoc: Assoc) -> Self {
        self.assoc = Some(assoc);
        self
    }

    pub fn with_dynamic_precedence(mut self, dynamic_precedence: i32) -> Self {
        self.dynamic_precedence = dynamic_precedence;
        self
    }
}

/// A single parse action. Cells may hold several; the interpreter forks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseAction {
    /// Consume the lookahead and enter `state`.
    Shift { state: ParseStateId },
    /// Pop the production's children and follow the goto on its symbol.
    Reduce { production: ProductionId },
    /// The root is complete; only valid on end of input.
    Accept,
}

/// One state of the parsing automaton.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParseState {
    /// Terminal action cells, sorted by symbol.
    pub actions: Box<[(Symbol, Box<[ParseAction]>)]>,
    /// Non-terminal transitions, sorted by symbol.
    pub gotos: Box<[(Symbol, ParseStateId)]>,
    /// Lex state the lexer starts in while this state is on top.
    pub lex_state: LexStateId,
    /// External terminals with actions in this state.
    pub external_valid: SymbolSet,
}

impl ParseState {
    /// Returns the action cell for `symbol`, empty when the cell is blank.
    pub fn actions(&self, symbol: Symbol) -> &[ParseAction] {
        match self.actions.binary_search_by_key(&symbol, |&(symbol, _)| symbol) {
            Ok(idx) => &self.actions[idx].1,
            Err(_) => &[],
        }
    }

    pub fn goto(&self, symbol: Symbol) -> Option<ParseStateId> {
        let idx = self.gotos.binary_search_by_key(&symbol, |&(symbol, _)| symbol).ok()?;
        Some(self.gotos[idx].1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_cells_are_sorted_lookups() {
        let state = ParseState {
            actions: vec![
                (Symbol::new(2), vec![ParseAction::Shift { state: 4 }].into_boxed_slice()),
                (
                    Symbol::new(5),
                    vec![ParseAction::Reduce { production: 1 }, ParseAction::Shift { state: 9 }]
                        .into_boxed_slice(),
                ),
            ]
            .into_boxed_slice(),
            gotos: vec![(Symbol::new(10), 3)].into_boxed_slice(),
            lex_state: 0,
            external_valid: SymbolSet::default(),
        };

        assert_eq!(state.actions(Symbol::new(2)), [ParseAction::Shift { state: 4 }]);
        assert_eq!(state.actions(Symbol::new(5)).len(), 2);
        assert!(state.actions(Symbol::new(3)).is_empty());
        assert_eq!(state.goto(Symbol::new(10)), Some(3));
        assert_eq!(state.goto(Symbol::new(11)), None);
    }
}
