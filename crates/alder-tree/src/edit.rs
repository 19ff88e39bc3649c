use alder_grammar::Symbol;
use text_size::{TextRange, TextSize};
use thiserror::Error;

use crate::green::{Green, GreenNode, NodeFlags, NodeOrToken};
use crate::point::{Point, PointDelta};
use crate::tree::Tree;

/// A source edit: bytes `[start, old_end)` were replaced by text ending at
/// `new_end`. Points mirror the byte offsets in row/column form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputEdit {
    pub start_byte: TextSize,
    pub old_end_byte: TextSize,
    pub new_end_byte: TextSize,
    pub start_point: Point,
    pub old_end_point: Point,
    pub new_end_point: Point,
}

/// Rejected [`Tree::edit`] descriptors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edit start {start} is past the old end {old_end}")]
    InvertedBytes { start: u32, old_end: u32 },
    #[error("edit ends at {old_end} but the tree covers only {len} bytes")]
    OutOfBounds { old_end: u32, len: u32 },
    #[error("new end {new_end} precedes the edit start {start}")]
    NegativeReplacement { new_end: u32, start: u32 },
    #[error("edit points are inconsistent with their byte offsets")]
    InconsistentPoints,
}

impl Tree {
    /// Records `edit` by splicing the tree. Unaffected subtrees are shared
    /// with `self`; affected ones are copied with spans remapped and flagged
    /// as changed.
    ///
    /// The result still describes the old parse. Hand it to the parser along
    /// with the post-edit text to obtain an up-to-date tree.
    pub fn edit(&self, edit: &InputEdit) -> Result<Self, EditError> {
        edit.validate(self.text_len())?;

        let root = edit.splice(self.green_root());

        // Damage survives consecutive edits, remapped into the newest
        // coordinates each time.
        let mut damaged: Vec<TextRange> = self
            .damaged_ranges()
            .iter()
            .map(|range| TextRange::new(edit.map_byte(range.start()), edit.map_byte(range.end())))
            .collect();
        damaged.push(TextRange::new(edit.start_byte, edit.new_end_byte));
        merge_ranges(&mut damaged);

        Ok(Self::with_damage(self.grammar().clone(), root, self.version() + 1, damaged))
    }
}

impl InputEdit {
    fn validate(&self, len: TextSize) -> Result<(), EditError> {
        if self.start_byte > self.old_end_byte {
            return Err(EditError::InvertedBytes {
                start: self.start_byte.into(),
                old_end: self.old_end_byte.into(),
            });
        }
        if self.old_end_byte > len {
            return Err(EditError::OutOfBounds { old_end: self.old_end_byte.into(), len: len.into() });
        }
        if self.new_end_byte < self.start_byte {
            return Err(EditError::NegativeReplacement {
                new_end: self.new_end_byte.into(),
                start: self.start_byte.into(),
            });
        }
        if self.start_point > self.old_end_point || self.new_end_point < self.start_point {
            return Err(EditError::InconsistentPoints);
        }
        Ok(())
    }

    /// Maps an old-coordinate offset into post-edit coordinates. Positions
    /// inside the replaced range collapse to the new end.
    fn map_byte(&self, byte: TextSize) -> TextSize {
        if byte <= self.start_byte {
            byte
        } else if byte >= self.old_end_byte {
            byte + self.new_end_byte - self.old_end_byte
        } else {
            self.new_end_byte
        }
    }

    fn map_point(&self, byte: TextSize, point: Point) -> Point {
        if byte <= self.start_byte {
            point
        } else if byte >= self.old_end_byte {
            if point.row == self.old_end_point.row {
                Point::new(
                    self.new_end_point.row,
                    self.new_end_point.column
                        + point.column.saturating_sub(self.old_end_point.column),
                )
            } else {
                Point::new(
                    point.row.saturating_sub(self.old_end_point.row) + self.new_end_point.row,
                    point.column,
                )
            }
        } else {
            self.new_end_point
        }
    }

    /// Whether a subtree at `[start, end)` must be re-examined: the edit
    /// overlaps its bytes or the lookahead bytes its recognition read.
    fn damages(&self, start: TextSize, end: TextSize, lookahead: TextSize) -> bool {
        start < self.old_end_byte && self.start_byte < end + lookahead
    }

    /// Rebuilds the spliced green tree without recursion: `work` drives a
    /// post-order traversal, `values` collects finished subtrees.
    fn splice(&self, root: &Green) -> Green {
        enum Step<'g> {
            Visit { green: &'g Green, start: TextSize, point: Point },
            Assemble { kind: Symbol, count: usize },
        }

        let mut work = vec![Step::Visit { green: root, start: TextSize::new(0), point: Point::ZERO }];
        let mut values: Vec<Green> = Vec::new();

        while let Some(step) = work.pop() {
            match step {
                Step::Visit { green, start, point } => {
                    let end = start + green.text_len();
                    if !self.damages(start, end, green.trailing_lookahead()) && !green.ptr_eq(root)
                    {
                        values.push(green.clone());
                        continue;
                    }
                    match green {
                        NodeOrToken::Token(token) => {
                            let text_len = self.map_byte(end) - self.map_byte(start);
                            let end_point = point.advance(token.point_len());
                            let point_len = PointDelta::between(
                                self.map_point(start, point),
                                self.map_point(end, end_point),
                            );
                            values.push(NodeOrToken::Token(token.remapped(text_len, point_len)));
                        }
                        NodeOrToken::Node(node) => {
                            work.push(Step::Assemble {
                                kind: node.kind(),
                                count: node.child_count(),
                            });
                            for child in node.children().iter().rev() {
                                work.push(Step::Visit {
                                    green: &child.green,
                                    start: start + child.rel_offset,
                                    point: point.advance(child.rel_point),
                                });
                            }
                        }
                    }
                }
                Step::Assemble { kind, count } => {
                    let children = values.split_off(values.len() - count);
                    values.push(NodeOrToken::Node(GreenNode::with_flags(
                        kind,
                        children,
                        NodeFlags::HAS_CHANGES,
                    )));
                }
            }
        }

        values.pop().expect("splice always produces a root")
    }
}

/// Sorts and merges overlapping or touching ranges in place.
pub(crate) fn merge_ranges(ranges: &mut Vec<TextRange>) {
    ranges.sort_by_key(|range| range.start());
    let mut merged: Vec<TextRange> = Vec::with_capacity(ranges.len());
    for &range in ranges.iter() {
        match merged.last_mut() {
            Some(last) if range.start() <= last.end() => {
                *last = TextRange::new(last.start(), last.end().max(range.end()));
            }
            _ => merged.push(range),
        }
    }
    *ranges = merged;
}
