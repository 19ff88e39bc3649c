use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    LexStateId, LexTable, ParseAction, ParseState, ParseStateId, Production, ProductionId, Symbol,
    SymbolInfo, SymbolKind, SymbolSet,
};

/// Errors raised while loading or assembling a grammar.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("not a grammar blob (bad magic bytes)")]
    BadMagic,
    #[error("unsupported grammar format version {found}, expected {expected}")]
    UnsupportedVersion { found: u16, expected: u16 },
    #[error("malformed grammar payload: {0}")]
    Payload(#[from] bincode::Error),
    #[error("invalid grammar: {0}")]
    Invalid(String),
}

#[derive(Serialize, Deserialize)]
pub(crate) struct GrammarData {
    pub(crate) name: Box<str>,
    pub(crate) symbols: Box<[SymbolInfo]>,
    pub(crate) productions: Box<[Production]>,
    pub(crate) lex: LexTable,
    pub(crate) states: Box<[ParseState]>,
    /// Symbol whose completed node becomes the tree root.
    pub(crate) root: Symbol,
    pub(crate) extras: SymbolSet,
    pub(crate) externals: SymbolSet,
}

/// An immutable, reference-counted grammar handle.
///
/// Cloning is cheap; every [`Tree`] produced from a grammar keeps a clone so
/// node metadata stays resolvable for the tree's lifetime.
///
/// [`Tree`]: ../alder_tree/struct.Tree.html
#[derive(Clone)]
pub struct Grammar {
    data: triomphe::Arc<GrammarData>,
}

impl Grammar {
    pub(crate) fn new(data: GrammarData) -> Result<Self, GrammarError> {
        data.validate()?;
        Ok(Self { data: triomphe::Arc::new(data) })
    }

    pub(crate) fn data(&self) -> &GrammarData {
        &self.data
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Returns the non-terminal the finished tree is rooted at.
    #[inline]
    pub fn root(&self) -> Symbol {
        self.data.root
    }

    #[inline]
    pub fn symbol_count(&self) -> usize {
        self.data.symbols.len()
    }

    #[inline]
    pub fn symbol_info(&self, symbol: Symbol) -> &SymbolInfo {
        &self.data.symbols[symbol.index()]
    }

    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        &self.symbol_info(symbol).name
    }

    /// Looks a symbol up by name. Linear in the symbol table.
    pub fn symbol_named(&self, name: &str) -> Option<Symbol> {
        let idx = self.data.symbols.iter().position(|info| &*info.name == name)?;
        Some(Symbol::new(idx as u16))
    }

    #[inline]
    pub fn is_extra(&self, symbol: Symbol) -> bool {
        self.data.extras.contains(symbol)
    }

    #[inline]
    pub fn is_external(&self, symbol: Symbol) -> bool {
        self.data.externals.contains(symbol)
    }

    #[inline]
    pub fn is_named(&self, symbol: Symbol) -> bool {
        self.symbol_info(symbol).named
    }

    pub fn has_externals(&self) -> bool {
        !self.data.externals.is_empty()
    }

    #[inline]
    pub fn production(&self, id: ProductionId) -> &Production {
        &self.data.productions[id as usize]
    }

    #[inline]
    pub fn state_count(&self) -> usize {
        self.data.states.len()
    }

    #[inline]
    pub(crate) fn state(&self, id: ParseStateId) -> &ParseState {
        &self.data.states[id as usize]
    }

    /// Returns the action cell for `symbol` in `state`; empty when blank.
    #[inline]
    pub fn actions(&self, state: ParseStateId, symbol: Symbol) -> &[ParseAction] {
        self.state(state).actions(symbol)
    }

    #[inline]
    pub fn goto(&self, state: ParseStateId, symbol: Symbol) -> Option<ParseStateId> {
        self.state(state).goto(symbol)
    }

    /// Terminal action entries of `state`, in symbol order.
    pub fn state_actions(&self, state: ParseStateId) -> &[(Symbol, Box<[ParseAction]>)] {
        &self.state(state).actions
    }

    /// Lex state the lexer should start in while `state` is on top.
    #[inline]
    pub fn lex_state(&self, state: ParseStateId) -> LexStateId {
        self.state(state).lex_state
    }

    pub fn lex_table(&self) -> &LexTable {
        &self.data.lex
    }

    /// External terminals with actions in `state`.
    pub fn external_valid(&self, state: ParseStateId) -> &SymbolSet {
        &self.state(state).external_valid
    }

    /// Returns the state entered after consuming `symbol` in `state`, if the
    /// tables allow it. Non-terminals follow gotos, terminals follow shifts.
    pub fn next_state(&self, state: ParseStateId, symbol: Symbol) -> Option<ParseStateId> {
        match self.symbol_info(symbol).kind {
            SymbolKind::NonTerminal => self.goto(state, symbol),
            _ => self.actions(state, symbol).iter().find_map(|action| match action {
                ParseAction::Shift { state } => Some(*state),
                _ => None,
            }),
        }
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("name", &self.name())
            .field("symbols", &self.symbol_count())
            .field("states", &self.state_count())
            .finish()
    }
}

impl GrammarData {
    pub(crate) fn validate(&self) -> Result<(), GrammarError> {
        let invalid = |message: String| Err(GrammarError::Invalid(message));

        if self.symbols.len() < Symbol::FIRST_FREE as usize {
            return invalid("missing builtin symbols".into());
        }
        if self.states.is_empty() {
            return invalid("no parse states".into());
        }
        if self.lex.states.is_empty() {
            return invalid("no lex states".into());
        }

        let root_info = self
            .symbols
            .get(self.root.index())
            .ok_or_else(|| GrammarError::Invalid(format!("root symbol {:?} unknown", self.root)))?;
        if root_info.kind != SymbolKind::NonTerminal {
            return invalid(format!("root symbol `{}` is not a non-terminal", root_info.name));
        }

        for (idx, state) in self.lex.states.iter().enumerate() {
            let mut previous: Option<char> = None;
            for transition in &state.transitions {
                if transition.hi < transition.lo {
                    return invalid(format!("lex state {idx}: empty character range"));
                }
                if let Some(previous) = previous
                    && transition.lo <= previous
                {
                    return invalid(format!("lex state {idx}: overlapping character ranges"));
                }
                if transition.target as usize >= self.lex.states.len() {
                    return invalid(format!("lex state {idx}: dangling transition target"));
                }
                previous = Some(transition.hi);
            }
            if let Some(accept) = state.accept {
                self.check_symbol(accept, idx, "lex accept")?;
            }
        }

        for (idx, production) in self.productions.iter().enumerate() {
            let info = self.symbols.get(production.symbol.index()).ok_or_else(|| {
                GrammarError::Invalid(format!("production {idx}: unknown symbol"))
            })?;
            if info.kind != SymbolKind::NonTerminal {
                return invalid(format!(
                    "production {idx}: `{}` is not a non-terminal",
                    info.name
                ));
            }
        }

        for (idx, state) in self.states.iter().enumerate() {
            if state.lex_state as usize >= self.lex.states.len() {
                return invalid(format!("state {idx}: dangling lex state"));
            }
            for window in state.actions.windows(2) {
                if window[0].0 >= window[1].0 {
                    return invalid(format!("state {idx}: action cells not sorted"));
                }
            }
            for window in state.gotos.windows(2) {
                if window[0].0 >= window[1].0 {
                    return invalid(format!("state {idx}: gotos not sorted"));
                }
            }
            for (symbol, actions) in &state.actions {
                let info = self.check_symbol(*symbol, idx, "action")?;
                if info.kind == SymbolKind::NonTerminal {
                    return invalid(format!(
                        "state {idx}: action on non-terminal `{}`",
                        info.name
                    ));
                }
                if actions.is_empty() {
                    return invalid(format!("state {idx}: empty action cell"));
                }
                for action in actions {
                    match *action {
                        ParseAction::Shift { state } => {
                            if state as usize >= self.states.len() {
                                return invalid(format!("state {idx}: dangling shift target"));
                            }
                        }
                        ParseAction::Reduce { production } => {
                            if production as usize >= self.productions.len() {
                                return invalid(format!("state {idx}: dangling production"));
                            }
                        }
                        ParseAction::Accept => {
                            if *symbol != Symbol::END {
                                return invalid(format!(
                                    "state {idx}: accept on a symbol other than end of input"
                                ));
                            }
                        }
                    }
                }
            }
            for (symbol, target) in &state.gotos {
                let info = self.check_symbol(*symbol, idx, "goto")?;
                if info.kind != SymbolKind::NonTerminal {
                    return invalid(format!("state {idx}: goto on terminal `{}`", info.name));
                }
                if *target as usize >= self.states.len() {
                    return invalid(format!("state {idx}: dangling goto target"));
                }
            }
        }

        for symbol in self.extras.iter().chain(self.externals.iter()) {
            if symbol.index() >= self.symbols.len() {
                return invalid(format!("{symbol:?} marked but never declared"));
            }
        }

        Ok(())
    }

    fn check_symbol(
        &self,
        symbol: Symbol,
        state: usize,
        what: &str,
    ) -> Result<&SymbolInfo, GrammarError> {
        self.symbols.get(symbol.index()).ok_or_else(|| {
            GrammarError::Invalid(format!("state {state}: {what} on unknown {symbol:?}"))
        })
    }
}
