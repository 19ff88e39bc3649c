use alder_grammar::ParseStateId;
use alder_tree::{Green, GreenNode, Point};
use text_size::TextSize;

/// One in-flight interpretation of the input: an LR stack plus the position
/// and cost bookkeeping that ranks it against concurrent versions.
///
/// Versions are cloned on fork, so every field stays cheap: greens are
/// reference-counted and the state vector is plain `u16`s.
#[derive(Clone)]
pub(crate) struct StackVersion {
    /// Automaton states. One longer than `greens`; the bottom entry is the
    /// start state.
    states: Vec<ParseStateId>,
    /// Finished subtrees, one per stack slot above the bottom.
    pub(crate) greens: Vec<Green>,
    /// Tokens skipped by recovery, awaiting their ERROR container.
    pub(crate) pending_skips: Vec<Green>,
    pub(crate) position: TextSize,
    pub(crate) point: Point,
    pub(crate) error_cost: u32,
    pub(crate) dynamic_precedence: i32,
    /// Where the last missing token was fabricated; recovery inserts at most
    /// once per position.
    pub(crate) last_insertion: Option<TextSize>,
    /// The finished root once this version accepted.
    pub(crate) result: Option<GreenNode>,
}

impl StackVersion {
    pub(crate) fn new() -> Self {
        Self {
            states: vec![0],
            greens: Vec::new(),
            pending_skips: Vec::new(),
            position: TextSize::new(0),
            point: Point::ZERO,
            error_cost: 0,
            dynamic_precedence: 0,
            last_insertion: None,
            result: None,
        }
    }

    #[inline]
    pub(crate) fn top_state(&self) -> ParseStateId {
        *self.states.last().expect("state stack is never empty")
    }

    /// The state exposed after popping `depth` frames.
    #[inline]
    pub(crate) fn state_below(&self, depth: usize) -> ParseStateId {
        self.states[self.states.len() - 1 - depth]
    }

    #[inline]
    pub(crate) fn depth(&self) -> usize {
        self.greens.len()
    }

    pub(crate) fn push(&mut self, green: Green, state: ParseStateId) {
        self.greens.push(green);
        self.states.push(state);
    }

    /// Pushes without a state transition, the way extras and ERROR containers
    /// sit on the stack.
    pub(crate) fn push_extra(&mut self, green: Green) {
        let top = self.top_state();
        self.push(green, top);
    }

    /// Pops the top frame's subtree.
    pub(crate) fn pop(&mut self) -> Option<Green> {
        let green = self.greens.pop()?;
        self.states.pop();
        Some(green)
    }

    pub(crate) fn consume_to(&mut self, position: TextSize, point: Point) {
        self.position = position;
        self.point = point;
    }

    /// Whether `self` and `other` have converged: identical automata stacks
    /// at the same input position, with nothing half-recovered.
    pub(crate) fn converged_with(&self, other: &Self) -> bool {
        self.position == other.position
            && self.pending_skips.is_empty()
            && other.pending_skips.is_empty()
            && self.states == other.states
    }

    /// Ranking across versions: fewer errors first, then the grammar's
    /// dynamic precedence.
    pub(crate) fn ranks_above(&self, other: &Self) -> bool {
        (self.error_cost, other.dynamic_precedence) < (other.error_cost, self.dynamic_precedence)
    }
}
