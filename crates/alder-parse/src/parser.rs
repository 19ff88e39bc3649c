use alder_grammar::{Assoc, Grammar, LexStateId, ParseAction, ParseStateId, ProductionId, Symbol};
use alder_lexer::{ExternalScanner, Lexer, Token};
use alder_tree::{Green, GreenNode, GreenToken, NodeOrToken, PointDelta, Tree, error_costs};
use text_size::TextSize;

use crate::reuse::ReuseCursor;
use crate::stack::StackVersion;

/// Ceiling on reductions and recovery forks one version may perform between
/// two consumed tokens. Only a degenerate grammar (cyclic empty rules) gets
/// near it; the version is dropped instead of spinning.
const MAX_OPS_PER_STEP: usize = 512;

/// Knobs for one [`Parser`].
#[derive(Clone, Copy, Debug)]
pub struct ParseOptions {
    /// Upper bound on concurrently live stack versions. When local ambiguity
    /// and error recovery fork past it, the worst-ranked versions are pruned.
    pub max_stack_versions: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { max_stack_versions: 8 }
    }
}

/// A reusable parsing session for one grammar.
///
/// A parser is a mutable handle owned by one caller at a time; the trees it
/// returns are immutable and freely shared. Parsing never fails on input
/// text: broken input comes back as a tree containing ERROR and missing
/// nodes.
pub struct Parser {
    grammar: Grammar,
    options: ParseOptions,
    scanner: Option<Box<dyn ExternalScanner>>,
}

impl Parser {
    pub fn new(grammar: Grammar) -> Self {
        Self::with_options(grammar, ParseOptions::default())
    }

    pub fn with_options(grammar: Grammar, options: ParseOptions) -> Self {
        Self { grammar, options, scanner: None }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Installs the external scanner for the grammar's external terminals.
    pub fn set_external_scanner(&mut self, scanner: Box<dyn ExternalScanner>) {
        self.scanner = Some(scanner);
    }

    /// Parses `text` into a tree.
    ///
    /// `old_tree` is a previous version of the same document with all edits
    /// recorded through [`Tree::edit`]; its undamaged subtrees are shifted
    /// whole instead of being re-lexed. The result is structurally identical
    /// to a from-scratch parse of `text`.
    pub fn parse(&mut self, text: &str, old_tree: Option<&Tree>) -> Tree {
        if let Some(scanner) = self.scanner.as_deref_mut() {
            scanner.reset();
        }
        let version = old_tree.map_or(0, |tree| tree.version() + 1);
        let run = ParseRun {
            grammar: &self.grammar,
            options: self.options,
            lexer: Lexer::new(self.grammar.clone(), text),
            scanner: self.scanner.as_deref_mut(),
            reuse: old_tree.map(ReuseCursor::new),
            versions: vec![StackVersion::new()],
            accepted: None,
            halted: Vec::new(),
            cache: None,
        };
        let root = run.run();
        Tree::new(self.grammar.clone(), root, version)
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("grammar", &self.grammar.name())
            .field("options", &self.options)
            .field("external_scanner", &self.scanner.is_some())
            .finish()
    }
}

/// What applying one parse action did to a version.
enum Applied {
    /// The lookahead was consumed; the version is done for this round.
    Consumed,
    /// A rule was reduced; the version still holds the lookahead.
    Reduced,
    /// The root is complete.
    Accepted,
    /// The tables dead-ended; the version is abandoned.
    Halted,
}

/// State for a single [`Parser::parse`] call.
pub(crate) struct ParseRun<'a> {
    pub(crate) grammar: &'a Grammar,
    options: ParseOptions,
    lexer: Lexer<'a>,
    scanner: Option<&'a mut (dyn ExternalScanner + 'static)>,
    reuse: Option<ReuseCursor<'a>>,
    versions: Vec<StackVersion>,
    /// Best accepted interpretation so far.
    accepted: Option<StackVersion>,
    /// Versions that dead-ended; the best is the fallback root.
    pub(crate) halted: Vec<StackVersion>,
    cache: Option<(TextSize, LexStateId, Token)>,
}

impl ParseRun<'_> {
    fn run(mut self) -> GreenNode {
        tracing::debug!(grammar = self.grammar.name(), "parse start");
        while !self.versions.is_empty() {
            let allow_reuse = self.versions.len() == 1;
            let round: Vec<StackVersion> = std::mem::take(&mut self.versions);
            for version in round {
                self.step(version, allow_reuse);
            }
            self.merge_and_prune();
        }
        self.finish()
    }

    /// Advances one version by exactly one consumed token (or to acceptance
    /// or abandonment), forking into `self.versions` on ambiguity.
    fn step(&mut self, version: StackVersion, allow_reuse: bool) {
        let version = if allow_reuse && version.pending_skips.is_empty() {
            match self.step_by_reuse(version) {
                // Nothing reusable here; fall back to lexing.
                Some(version) => version,
                None => return,
            }
        } else {
            version
        };
        self.step_by_token(version);
    }

    /// Shifts as many whole subtrees of the previous tree as fit at the
    /// version's position. Returns the version when nothing was reusable.
    fn step_by_reuse(&mut self, mut version: StackVersion) -> Option<StackVersion> {
        let mut reused = false;
        while let Some((green, state)) = self.reusable_subtree(&version) {
            let length = green.text_len();
            let point = version.point.advance(green.point_len());
            tracing::trace!(
                offset = u32::from(version.position),
                len = u32::from(length),
                "reuse subtree"
            );
            match state {
                Some(state) => version.push(green, state),
                None => version.push_extra(green),
            }
            version.consume_to(version.position + length, point);
            reused = true;
        }
        if reused {
            self.versions.push(version);
            return None;
        }
        Some(version)
    }

    /// The next subtree of the previous tree that starts exactly at the
    /// version's position and can be shifted in its current state. `None`
    /// for extras means shift without a state change.
    fn reusable_subtree(
        &mut self,
        version: &StackVersion,
    ) -> Option<(Green, Option<ParseStateId>)> {
        let reuse = self.reuse.as_mut()?;
        let position = version.position;
        let top = version.top_state();
        loop {
            let (green, start) = reuse.current()?;
            let end = start + green.text_len();
            if start < position {
                if end <= position {
                    reuse.advance_past();
                } else if !reuse.descend() {
                    return None;
                }
                continue;
            }
            if start > position {
                return None;
            }
            if green.text_len() == TextSize::new(0) {
                reuse.advance_past();
                continue;
            }
            let blocked = green.has_changes()
                || green.has_error()
                || green.contains_external()
                || green.first_lex_state() != self.grammar.lex_state(top);
            if blocked {
                if !reuse.descend() {
                    return None;
                }
                continue;
            }
            if green.is_extra() {
                let green = green.clone();
                reuse.advance_past();
                return Some((green, None));
            }
            match self.grammar.next_state(top, green.kind()) {
                Some(state) => {
                    let green = green.clone();
                    reuse.advance_past();
                    return Some((green, Some(state)));
                }
                None => {
                    if !reuse.descend() {
                        return None;
                    }
                }
            }
        }
    }

    fn step_by_token(&mut self, version: StackVersion) {
        let mut work = vec![version];
        let mut ops = 0usize;
        while let Some(mut version) = work.pop() {
            ops += 1;
            if ops > MAX_OPS_PER_STEP {
                tracing::debug!("version dropped: too many operations on one token");
                self.halted.push(version);
                continue;
            }
            let token = self.lookahead(&version);
            let actions = self.grammar.actions(version.top_state(), token.symbol);
            if actions.is_empty() {
                if self.grammar.is_extra(token.symbol) && !token.is_end() {
                    self.shift_extra(&mut version, &token);
                    self.versions.push(version);
                } else {
                    self.recover(version, &token, &mut work);
                }
                continue;
            }

            let resolved = resolve_conflict(self.grammar, actions, token.symbol);
            for &action in resolved.iter().skip(1) {
                ops += 1;
                tracing::trace!(?action, "fork");
                let fork = version.clone();
                self.dispatch(fork, action, &token, &mut work);
            }
            self.dispatch(version, resolved[0], &token, &mut work);
        }
    }

    fn dispatch(
        &mut self,
        mut version: StackVersion,
        action: ParseAction,
        token: &Token,
        work: &mut Vec<StackVersion>,
    ) {
        match self.apply(&mut version, action, token) {
            Applied::Consumed => self.versions.push(version),
            Applied::Reduced => work.push(version),
            Applied::Accepted => self.record_accept(version),
            Applied::Halted => self.halted.push(version),
        }
    }

    fn apply(&mut self, version: &mut StackVersion, action: ParseAction, token: &Token) -> Applied {
        match action {
            ParseAction::Shift { state } => {
                tracing::trace!(
                    symbol = self.grammar.symbol_name(token.symbol),
                    state,
                    "shift"
                );
                self.flush_pending(version);
                version.push(self.token_green(token), state);
                version.consume_to(token.range.end(), token.points.end);
                Applied::Consumed
            }
            ParseAction::Reduce { production } => self.reduce(version, production),
            ParseAction::Accept => {
                self.finish_version(version);
                Applied::Accepted
            }
        }
    }

    fn reduce(&mut self, version: &mut StackVersion, id: ProductionId) -> Applied {
        let production = self.grammar.production(id);
        let mut children = Vec::with_capacity(production.child_count as usize);
        let mut remaining = production.child_count;
        while remaining > 0 {
            let Some(green) = version.pop() else {
                tracing::debug!("version dropped: reduction underflowed the stack");
                return Applied::Halted;
            };
            if counts_toward_rule(&green) {
                remaining -= 1;
            }
            children.push(green);
        }
        children.reverse();
        let Some(next) = self.grammar.goto(version.top_state(), production.symbol) else {
            tracing::debug!("version dropped: no goto after reduction");
            return Applied::Halted;
        };
        tracing::trace!(
            symbol = self.grammar.symbol_name(production.symbol),
            children = children.len(),
            state = next,
            "reduce"
        );
        version.dynamic_precedence += production.dynamic_precedence;
        version.push(NodeOrToken::Node(GreenNode::new(production.symbol, children)), next);
        Applied::Reduced
    }

    fn shift_extra(&mut self, version: &mut StackVersion, token: &Token) {
        tracing::trace!(symbol = self.grammar.symbol_name(token.symbol), "shift extra");
        let green = self.token_green(token);
        if version.pending_skips.is_empty() {
            version.push_extra(green);
        } else {
            // Extras inside a skipped region stay inside its ERROR container.
            version.pending_skips.push(green);
        }
        version.consume_to(token.range.end(), token.points.end);
    }

    /// Marks `version` done for the current round.
    pub(crate) fn push_stepped(&mut self, version: StackVersion) {
        self.versions.push(version);
    }

    /// Wraps any skipped tokens into an ERROR container sitting on the stack.
    pub(crate) fn flush_pending(&self, version: &mut StackVersion) {
        if version.pending_skips.is_empty() {
            return;
        }
        let children = std::mem::take(&mut version.pending_skips);
        tracing::trace!(skipped = children.len(), "close error container");
        version.error_cost += error_costs::ERROR_COST_PER_SKIPPED_TREE;
        version.push_extra(NodeOrToken::Node(GreenNode::new(Symbol::ERROR, children)));
    }

    fn finish_version(&mut self, version: &mut StackVersion) {
        self.flush_pending(version);
        let root_symbol = self.grammar.root();
        let mut children = Vec::new();
        while let Some(green) = version.pop() {
            children.push(green);
        }
        children.reverse();
        let root = match children.as_slice() {
            [NodeOrToken::Node(node)] if node.kind() == root_symbol => node.clone(),
            _ => GreenNode::new(root_symbol, children),
        };
        tracing::debug!(
            error_cost = version.error_cost,
            dynamic_precedence = version.dynamic_precedence,
            "accept"
        );
        version.result = Some(root);
    }

    fn record_accept(&mut self, version: StackVersion) {
        match &self.accepted {
            Some(best) if !version.ranks_above(best) => {}
            _ => self.accepted = Some(version),
        }
    }

    fn lookahead(&mut self, version: &StackVersion) -> Token {
        let state = version.top_state();
        let lex_state = self.grammar.lex_state(state);
        let cacheable = self.scanner.is_none();
        if cacheable
            && let Some((position, cached_state, token)) = self.cache
            && position == version.position
            && cached_state == lex_state
        {
            return token;
        }
        self.lexer.seek(version.position, version.point);
        let token = self.lexer.next_token(
            lex_state,
            self.grammar.external_valid(state),
            self.scanner.as_deref_mut().map(|s| s as &mut dyn ExternalScanner),
        );
        if cacheable {
            self.cache = Some((version.position, lex_state, token));
        }
        token
    }

    pub(crate) fn token_green(&self, token: &Token) -> Green {
        NodeOrToken::Token(GreenToken::leaf(
            token.symbol,
            token.len(),
            PointDelta::between(token.points.start, token.points.end),
            token.lookahead_len,
            token.lex_state,
            self.grammar.is_extra(token.symbol),
            token.external,
        ))
    }

    /// Collapses converged versions and drops the worst past the cap.
    fn merge_and_prune(&mut self) {
        let mut idx = 0;
        while idx < self.versions.len() {
            let mut jdx = idx + 1;
            while jdx < self.versions.len() {
                if self.versions[idx].converged_with(&self.versions[jdx]) {
                    tracing::trace!("merge converged versions");
                    if self.versions[jdx].ranks_above(&self.versions[idx]) {
                        self.versions.swap(idx, jdx);
                    }
                    self.versions.remove(jdx);
                } else {
                    jdx += 1;
                }
            }
            idx += 1;
        }

        // A version can only get costlier; once an accepted interpretation is
        // at hand, anything already worse is pointless to advance.
        if let Some(accepted) = &self.accepted {
            let cutoff = accepted.error_cost;
            self.versions.retain(|version| version.error_cost <= cutoff);
        }

        if self.versions.len() > self.options.max_stack_versions {
            self.versions.sort_by(|a, b| {
                use std::cmp::Ordering;
                if a.ranks_above(b) {
                    Ordering::Less
                } else if b.ranks_above(a) {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            });
            tracing::trace!(dropped = self.versions.len() - self.options.max_stack_versions, "prune");
            self.versions.truncate(self.options.max_stack_versions);
        }
    }

    fn finish(mut self) -> GreenNode {
        if let Some(version) = self.accepted.take() {
            return version.result.expect("accepted versions carry a result");
        }

        // Every interpretation dead-ended. Salvage the best stack into an
        // all-ERROR tree rather than give up.
        let root_symbol = self.grammar.root();
        let best = {
            let mut best: Option<StackVersion> = None;
            for version in self.halted.drain(..) {
                match &best {
                    Some(current) if !version.ranks_above(current) => {}
                    _ => best = Some(version),
                }
            }
            best
        };
        let Some(mut version) = best else {
            return GreenNode::new(root_symbol, Vec::new());
        };
        self.flush_pending(&mut version);
        let mut children = Vec::new();
        while let Some(green) = version.pop() {
            children.push(green);
        }
        children.reverse();
        tracing::debug!("parse salvaged from a dead-ended stack");
        let error = GreenNode::new(Symbol::ERROR, children);
        GreenNode::new(root_symbol, vec![NodeOrToken::Node(error)])
    }
}

fn counts_toward_rule(green: &Green) -> bool {
    !green.is_extra() && green.kind() != Symbol::ERROR
}

/// Picks the actions worth pursuing for one cell. A lone shift/reduce pair
/// may be settled statically by the grammar's precedence metadata; anything
/// still ambiguous is returned whole and forks the stack.
fn resolve_conflict(
    grammar: &Grammar,
    actions: &[ParseAction],
    lookahead: Symbol,
) -> Vec<ParseAction> {
    if actions.len() == 2 {
        let shift = actions.iter().copied().find(|a| matches!(a, ParseAction::Shift { .. }));
        let reduce = actions.iter().copied().find_map(|a| match a {
            ParseAction::Reduce { production } => Some(production),
            _ => None,
        });
        if let (Some(shift), Some(production)) = (shift, reduce) {
            let token_precedence = grammar.symbol_info(lookahead).precedence;
            let rule = grammar.production(production);
            if let (Some(token_precedence), Some(rule_precedence)) =
                (token_precedence, rule.precedence)
            {
                if rule_precedence > token_precedence {
                    return vec![ParseAction::Reduce { production }];
                }
                if token_precedence > rule_precedence {
                    return vec![shift];
                }
                match rule.assoc {
                    Some(Assoc::Left) => return vec![ParseAction::Reduce { production }],
                    Some(Assoc::Right) => return vec![shift],
                    None => {}
                }
            }
        }
    }
    actions.to_vec()
}
