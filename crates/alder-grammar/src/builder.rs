use rustc_hash::FxHashMap;

use crate::grammar::GrammarData;
use crate::{
    Grammar, GrammarError, LexState, LexStateId, LexTable, LexTransition, ParseAction, ParseState,
    ParseStateId, Production, ProductionId, Symbol, SymbolInfo, SymbolKind, SymbolSet,
};

/// Assembles a [`Grammar`] table by table.
///
/// The builder performs no table construction of its own: callers (usually a
/// generator emitting Rust or a blob) provide finished automata. `finish`
/// sorts the cells and validates cross-references.
pub struct GrammarBuilder {
    name: Box<str>,
    symbols: Vec<SymbolInfo>,
    names: FxHashMap<Box<str>, Symbol>,
    productions: Vec<Production>,
    lex_states: Vec<LexStateBuilder>,
    states: Vec<ParseStateBuilder>,
    root: Option<Symbol>,
    defects: Vec<String>,
}

#[derive(Default)]
struct LexStateBuilder {
    transitions: Vec<LexTransition>,
    accept: Option<Symbol>,
}

#[derive(Default)]
struct ParseStateBuilder {
    actions: Vec<(Symbol, Vec<ParseAction>)>,
    gotos: Vec<(Symbol, ParseStateId)>,
    lex_state: LexStateId,
}

impl GrammarBuilder {
    pub fn new(name: &str) -> Self {
        let mut builder = Self {
            name: name.into(),
            symbols: Vec::new(),
            names: FxHashMap::default(),
            productions: Vec::new(),
            lex_states: vec![LexStateBuilder::default()],
            states: Vec::new(),
            root: None,
            defects: Vec::new(),
        };
        builder.declare("end", SymbolKind::Builtin, false);
        builder.declare("ERROR", SymbolKind::Builtin, true);
        debug_assert_eq!(builder.symbols.len(), Symbol::FIRST_FREE as usize);
        builder
    }

    /// Declares a named terminal recognized by the lexing automaton.
    pub fn terminal(&mut self, name: &str) -> Symbol {
        self.declare(name, SymbolKind::Terminal, true)
    }

    /// Declares an anonymous terminal such as an operator or keyword.
    pub fn token(&mut self, name: &str) -> Symbol {
        self.declare(name, SymbolKind::Terminal, false)
    }

    /// Declares a terminal recognized by an external scanner.
    pub fn external(&mut self, name: &str) -> Symbol {
        self.declare(name, SymbolKind::External, true)
    }

    pub fn non_terminal(&mut self, name: &str) -> Symbol {
        self.declare(name, SymbolKind::NonTerminal, true)
    }

    fn declare(&mut self, name: &str, kind: SymbolKind, named: bool) -> Symbol {
        if let Some(&symbol) = self.names.get(name) {
            let info = &self.symbols[symbol.index()];
            if info.kind != kind {
                self.defects.push(format!(
                    "symbol `{name}` declared as both {:?} and {:?}",
                    info.kind, kind
                ));
            }
            return symbol;
        }
        if self.symbols.len() > u16::MAX as usize {
            self.defects.push(format!("too many symbols at `{name}`"));
            return Symbol::ERROR;
        }
        let symbol = Symbol::new(self.symbols.len() as u16);
        self.symbols.push(SymbolInfo::new(name, kind, named));
        self.names.insert(name.into(), symbol);
        symbol
    }

    /// Marks `symbol` as an extra, shiftable between any two tokens.
    pub fn mark_extra(&mut self, symbol: Symbol) {
        self.symbols[symbol.index()].extra = true;
    }

    /// Sets the token precedence used to resolve shift/reduce conflicts.
    pub fn set_precedence(&mut self, symbol: Symbol, precedence: i32) {
        self.symbols[symbol.index()].precedence = Some(precedence);
    }

    pub fn set_root(&mut self, symbol: Symbol) {
        self.root = Some(symbol);
    }

    pub fn production(&mut self, production: Production) -> ProductionId {
        let id = self.productions.len();
        if id > u16::MAX as usize {
            self.defects.push("too many productions".into());
            return 0;
        }
        self.productions.push(production);
        id as ProductionId
    }

    /// Appends a fresh lex state. State zero exists from the start.
    pub fn lex_state(&mut self) -> LexStateId {
        self.lex_states.push(LexStateBuilder::default());
        (self.lex_states.len() - 1) as LexStateId
    }

    pub fn lex_transition(&mut self, from: LexStateId, lo: char, hi: char, to: LexStateId) {
        self.lex_states[from as usize].transitions.push(LexTransition { lo, hi, target: to });
    }

    pub fn lex_accept(&mut self, state: LexStateId, symbol: Symbol) {
        self.lex_states[state as usize].accept = Some(symbol);
    }

    /// Appends a fresh parse state and returns its id.
    pub fn state(&mut self) -> ParseStateId {
        self.states.push(ParseStateBuilder::default());
        (self.states.len() - 1) as ParseStateId
    }

    pub fn action(&mut self, state: ParseStateId, symbol: Symbol, action: ParseAction) {
        let state = &mut self.states[state as usize];
        let idx = match state.actions.iter().position(|&(cell, _)| cell == symbol) {
            Some(idx) => idx,
            None => {
                state.actions.push((symbol, Vec::new()));
                state.actions.len() - 1
            }
        };
        let cell = &mut state.actions[idx].1;
        if !cell.contains(&action) {
            cell.push(action);
        }
    }

    pub fn shift(&mut self, state: ParseStateId, symbol: Symbol, target: ParseStateId) {
        self.action(state, symbol, ParseAction::Shift { state: target });
    }

    pub fn reduce(&mut self, state: ParseStateId, symbol: Symbol, production: ProductionId) {
        self.action(state, symbol, ParseAction::Reduce { production });
    }

    pub fn accept(&mut self, state: ParseStateId) {
        self.action(state, Symbol::END, ParseAction::Accept);
    }

    pub fn goto(&mut self, state: ParseStateId, symbol: Symbol, target: ParseStateId) {
        self.states[state as usize].gotos.push((symbol, target));
    }

    pub fn set_lex_state(&mut self, state: ParseStateId, lex_state: LexStateId) {
        self.states[state as usize].lex_state = lex_state;
    }

    pub fn finish(self) -> Result<Grammar, GrammarError> {
        if let Some(defect) = self.defects.into_iter().next() {
            return Err(GrammarError::Invalid(defect));
        }
        let root = self
            .root
            .ok_or_else(|| GrammarError::Invalid("no root symbol set".into()))?;

        let symbol_count = self.symbols.len();
        let mut extras = SymbolSet::new(symbol_count);
        let mut externals = SymbolSet::new(symbol_count);
        for (idx, info) in self.symbols.iter().enumerate() {
            let symbol = Symbol::new(idx as u16);
            if info.extra {
                extras.insert(symbol);
            }
            if info.kind == SymbolKind::External {
                externals.insert(symbol);
            }
        }

        let lex_states: Vec<LexState> = self
            .lex_states
            .into_iter()
            .map(|mut state| {
                state.transitions.sort_by_key(|t| t.lo);
                LexState { transitions: state.transitions.into_boxed_slice(), accept: state.accept }
            })
            .collect();

        let states: Vec<ParseState> = self
            .states
            .into_iter()
            .map(|mut state| {
                state.actions.sort_by_key(|&(symbol, _)| symbol);
                state.gotos.sort_by_key(|&(symbol, _)| symbol);
                let mut external_valid = SymbolSet::new(symbol_count);
                for &(symbol, _) in &state.actions {
                    if externals.contains(symbol) {
                        external_valid.insert(symbol);
                    }
                }
                // External extras shift in every state without an action cell.
                for symbol in externals.iter() {
                    if extras.contains(symbol) {
                        external_valid.insert(symbol);
                    }
                }
                ParseState {
                    actions: state
                        .actions
                        .into_iter()
                        .map(|(symbol, cell)| (symbol, cell.into_boxed_slice()))
                        .collect(),
                    gotos: state.gotos.into_boxed_slice(),
                    lex_state: state.lex_state,
                    external_valid,
                }
            })
            .collect();

        Grammar::new(GrammarData {
            name: self.name,
            symbols: self.symbols.into_boxed_slice(),
            productions: self.productions.into_boxed_slice(),
            lex: LexTable { states: lex_states.into_boxed_slice() },
            states: states.into_boxed_slice(),
            root,
            extras,
            externals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_grammar() -> Grammar {
        // root: word
        let mut builder = GrammarBuilder::new("tiny");
        let word = builder.terminal("word");
        let root = builder.non_terminal("root");
        builder.set_root(root);

        let accepting = builder.lex_state();
        builder.lex_transition(0, 'a', 'z', accepting);
        builder.lex_transition(accepting, 'a', 'z', accepting);
        builder.lex_accept(accepting, word);

        let rule = builder.production(Production::new(root, 1));
        let start = builder.state();
        let after_word = builder.state();
        let done = builder.state();
        builder.shift(start, word, after_word);
        builder.reduce(after_word, Symbol::END, rule);
        builder.goto(start, root, done);
        builder.accept(done);

        builder.finish().expect("valid grammar")
    }

    #[test]
    fn builds_and_queries() {
        let grammar = tiny_grammar();
        assert_eq!(grammar.name(), "tiny");
        assert_eq!(grammar.symbol_count(), 4);
        expect_test::expect![[r#"
            Grammar {
                name: "tiny",
                symbols: 4,
                states: 3,
            }
        "#]]
        .assert_debug_eq(&grammar);

        let word = grammar.symbol_named("word").unwrap();
        let root = grammar.root();
        assert_eq!(grammar.symbol_info(word).kind, SymbolKind::Terminal);
        assert_eq!(grammar.next_state(0, word), Some(1));
        assert_eq!(grammar.next_state(0, root), Some(2));
        assert_eq!(grammar.actions(2, Symbol::END), [ParseAction::Accept]);
        assert!(grammar.actions(1, word).is_empty());
    }

    #[test]
    fn interning_is_idempotent() {
        let mut builder = GrammarBuilder::new("g");
        let a = builder.terminal("word");
        let b = builder.terminal("word");
        assert_eq!(a, b);
    }

    #[test]
    fn missing_root_is_rejected() {
        let mut builder = GrammarBuilder::new("g");
        builder.terminal("word");
        assert!(matches!(builder.finish(), Err(GrammarError::Invalid(_))));
    }

    #[test]
    fn kind_conflicts_are_rejected() {
        let mut builder = GrammarBuilder::new("g");
        builder.terminal("thing");
        builder.non_terminal("thing");
        let root = builder.non_terminal("root");
        builder.set_root(root);
        builder.state();
        assert!(matches!(builder.finish(), Err(GrammarError::Invalid(_))));
    }

    #[test]
    fn dangling_shift_is_rejected() {
        let mut builder = GrammarBuilder::new("g");
        let word = builder.terminal("word");
        let root = builder.non_terminal("root");
        builder.set_root(root);
        let start = builder.state();
        builder.shift(start, word, 7);
        assert!(matches!(builder.finish(), Err(GrammarError::Invalid(_))));
    }
}
