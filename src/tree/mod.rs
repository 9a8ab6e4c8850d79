//! Binary split trees and the classification of points against them.
//!
//! A [`SplitTree`] is addressed by serial number: the root is 1 and the
//! children of node `k` are `2k` (left) and `2k + 1` (right). A point goes
//! left at a split iff `dot(point, axis) < threshold`.
//!
//! A [`ClassTree`] owns a split tree together with a point set and keeps,
//! for every node, the count, mean and standard deviation of the points
//! reaching it. Each point is tagged with the serial of its leaf, so a
//! classified tree holds serials up to 255.
//!
//! Observers subscribe with [`SplitTree::subscribe`] (or
//! [`ClassTree::subscribe`]) and receive [`TreeEvent`]s over a channel.

mod classify;
mod split_tree;

pub use classify::{ClassNode, ClassTree, NodePoints, ProjectionStatistics};
pub use split_tree::{
    descends_from, left_child, parent, right_child, Node, Split, SplitTree, TreeEvent, ROOT,
};
