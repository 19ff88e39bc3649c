//! Persistent syntax trees with structural sharing.
//!
//! Green subtrees store kinds and lengths behind reference counts and never
//! any text, so recording an edit shares everything the edit did not touch.
//! Red [`Node`]s are copyable views that add absolute byte and row/column
//! positions on demand; [`TreeCursor`] walks with O(1) parent moves.

mod changes;
mod cursor;
mod edit;
mod green;
mod node;
mod point;
mod tree;

/// Stateful walker over a tree.
pub use cursor::TreeCursor;
/// Edit descriptors and their validation errors.
pub use edit::{EditError, InputEdit};
/// Shared, immutable subtree storage.
pub use green::{Green, GreenChild, GreenNode, GreenToken, NodeOrToken, error_costs};
/// Node views and child iteration.
pub use node::{Children, Node};
/// Row/column positions and distances.
pub use point::{Point, PointDelta, PointRange};
/// The parse snapshot handle.
pub use tree::Tree;
