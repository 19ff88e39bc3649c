use text_size::TextSize;

use crate::green::{Green, NodeOrToken};
use crate::node::Node;
use crate::point::Point;
use crate::tree::Tree;

/// A stateful tree walker with O(1) parent moves.
///
/// The cursor keeps the whole path from its root to the current node, so
/// repeated navigation avoids the root walk [`Node::parent`] performs.
pub struct TreeCursor<'tree> {
    tree: &'tree Tree,
    /// Path from the cursor root to the current node. Never empty.
    path: Vec<Frame<'tree>>,
}

#[derive(Clone, Copy)]
struct Frame<'tree> {
    green: &'tree Green,
    start_byte: TextSize,
    start_point: Point,
    /// Index of this node within the frame below it.
    index: usize,
}

impl<'tree> TreeCursor<'tree> {
    pub(crate) fn new(node: Node<'tree>) -> Self {
        let frame = Frame {
            green: node.green(),
            start_byte: node.start_byte(),
            start_point: node.start_point(),
            index: 0,
        };
        Self { tree: node.tree(), path: vec![frame] }
    }

    fn top(&self) -> Frame<'tree> {
        *self.path.last().expect("cursor path is never empty")
    }

    /// The node the cursor currently points at.
    pub fn node(&self) -> Node<'tree> {
        let top = self.top();
        Node::from_parts(self.tree, top.green, top.start_byte, top.start_point)
    }

    /// Moves to the first child. Returns false on tokens and empty nodes.
    pub fn goto_first_child(&mut self) -> bool {
        let top = self.top();
        let NodeOrToken::Node(node) = top.green else { return false };
        let Some(child) = node.children().first() else { return false };
        self.path.push(Frame {
            green: &child.green,
            start_byte: top.start_byte + child.rel_offset,
            start_point: top.start_point.advance(child.rel_point),
            index: 0,
        });
        true
    }

    /// Moves to the next sibling, staying within the cursor's root.
    pub fn goto_next_sibling(&mut self) -> bool {
        if self.path.len() < 2 {
            return false;
        }
        let current = self.top();
        let parent = self.path[self.path.len() - 2];
        let NodeOrToken::Node(parent_green) = parent.green else { return false };
        let Some(sibling) = parent_green.children().get(current.index + 1) else {
            return false;
        };
        let top = self.path.last_mut().expect("cursor path is never empty");
        *top = Frame {
            green: &sibling.green,
            start_byte: parent.start_byte + sibling.rel_offset,
            start_point: parent.start_point.advance(sibling.rel_point),
            index: current.index + 1,
        };
        true
    }

    /// Moves to the parent. Returns false at the cursor's root.
    pub fn goto_parent(&mut self) -> bool {
        if self.path.len() < 2 {
            return false;
        }
        self.path.pop();
        true
    }

    /// Descends to the first child whose span ends after `byte`, returning
    /// its index. Stays put and returns `None` when no such child exists.
    pub fn goto_first_child_for_byte(&mut self, byte: TextSize) -> Option<usize> {
        let top = self.top();
        let NodeOrToken::Node(node) = top.green else { return None };
        if byte < top.start_byte {
            return None;
        }
        let rel = byte - top.start_byte;
        let children = node.children();
        let index =
            children.partition_point(|child| child.rel_offset + child.green.text_len() <= rel);
        let child = children.get(index)?;
        self.path.push(Frame {
            green: &child.green,
            start_byte: top.start_byte + child.rel_offset,
            start_point: top.start_point.advance(child.rel_point),
            index,
        });
        Some(index)
    }

    /// Repositions the cursor on `node`, keeping the current root.
    pub fn reset(&mut self, node: Node<'tree>) {
        let root = self.path.first().copied().expect("cursor path is never empty");
        self.path.clear();
        self.path.push(root);
        if self.node() == node {
            return;
        }
        let target = node.start_byte();
        while self.node() != node {
            let before = self.path.len();
            self.goto_first_child_for_byte(target);
            if self.path.len() == before {
                break;
            }
        }
    }
}
