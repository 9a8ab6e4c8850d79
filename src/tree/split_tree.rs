use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::cluster::Provenance;
use crate::error::{Error, Result};
use crate::linalg::dot;

/// Serial number of the root node.
pub const ROOT: u32 = 1;

/// Serial of the left child of `serial`.
pub fn left_child(serial: u32) -> u32 {
    2 * serial
}

/// Serial of the right child of `serial`.
pub fn right_child(serial: u32) -> u32 {
    2 * serial + 1
}

/// Serial of the parent of `serial`; `None` for the root.
pub fn parent(serial: u32) -> Option<u32> {
    (serial > ROOT).then_some(serial / 2)
}

/// Whether `serial` is `ancestor` or lies in its subtree.
pub fn descends_from(mut serial: u32, ancestor: u32) -> bool {
    while serial > ancestor {
        serial >>= 1;
    }
    serial == ancestor
}

/// A hyperplane test: points with `dot(point, axis) < threshold` go left.
#[derive(Clone, Debug, PartialEq)]
pub struct Split {
    axis: Vec<f64>,
    threshold: f64,
    provenance: Option<Provenance>,
}

impl Split {
    /// Unit axis the node's points are projected on.
    pub fn axis(&self) -> &[f64] {
        &self.axis
    }

    /// Projections below this go left, the rest go right.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// How the axis was found, when it came from a search.
    pub fn provenance(&self) -> Option<Provenance> {
        self.provenance
    }

    /// Projection of `point` onto the axis.
    pub fn evaluate(&self, point: &[f64]) -> f64 {
        dot(point, &self.axis)
    }

    /// `true` when `point` belongs to the left child.
    pub fn goes_left(&self, point: &[f64]) -> bool {
        self.evaluate(point) < self.threshold
    }
}

/// A node of the split tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    serial: u32,
    split: Option<Split>,
}

impl Node {
    fn leaf(serial: u32) -> Self {
        Self { serial, split: None }
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }

    pub fn split(&self) -> Option<&Split> {
        self.split.as_ref()
    }

    pub fn is_leaf(&self) -> bool {
        self.split.is_none()
    }

    pub fn parent(&self) -> Option<u32> {
        parent(self.serial)
    }

    /// Child serials, when split.
    pub fn children(&self) -> Option<(u32, u32)> {
        self.split
            .as_ref()
            .map(|_| (left_child(self.serial), right_child(self.serial)))
    }
}

/// Structural change notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeEvent {
    /// A leaf gained a split and two children.
    Split { serial: u32 },
    /// A split node lost its whole subtree.
    Prune { serial: u32 },
    /// A split's threshold moved.
    ThresholdChanged { serial: u32 },
    /// The classified point set was replaced.
    PointsReplaced,
}

/// Binary tree of hyperplane splits addressed by serial number.
///
/// The root is serial 1; the children of `k` are `2k` and `2k + 1`. Nodes
/// exist only where a split created them.
///
/// ```rust
/// use pursuit::tree::{SplitTree, TreeEvent, ROOT};
///
/// let mut tree = SplitTree::new(2);
/// let events = tree.subscribe();
/// tree.split(ROOT, vec![1.0, 0.0], 0.5, None).unwrap();
///
/// assert_eq!(tree.classify(&[0.0, 9.0]), 2);
/// assert_eq!(tree.classify(&[1.0, 9.0]), 3);
/// assert_eq!(events.try_recv().unwrap(), TreeEvent::Split { serial: ROOT });
/// ```
#[derive(Debug)]
pub struct SplitTree {
    dims: usize,
    nodes: BTreeMap<u32, Node>,
    subscribers: Vec<Sender<TreeEvent>>,
}

impl SplitTree {
    /// An unsplit tree over `dims`-dimensional points.
    pub fn new(dims: usize) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(ROOT, Node::leaf(ROOT));
        Self {
            dims,
            nodes,
            subscribers: Vec::new(),
        }
    }

    pub fn dimension_count(&self) -> usize {
        self.dims
    }

    pub fn root(&self) -> &Node {
        &self.nodes[&ROOT]
    }

    pub fn node(&self, serial: u32) -> Result<&Node> {
        self.nodes.get(&serial).ok_or(Error::UnknownNode(serial))
    }

    /// The split at `serial`, if that node exists and is split.
    pub fn split_of(&self, serial: u32) -> Option<&Split> {
        self.nodes.get(&serial).and_then(Node::split)
    }

    pub fn is_leaf(&self, serial: u32) -> Result<bool> {
        self.node(serial).map(Node::is_leaf)
    }

    /// Serials of all leaves, ascending.
    pub fn leaves(&self) -> impl Iterator<Item = u32> + '_ {
        self.nodes.values().filter(|n| n.is_leaf()).map(Node::serial)
    }

    /// All nodes, ascending by serial.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Install a split on leaf `serial`, creating its two children.
    pub fn split(
        &mut self,
        serial: u32,
        axis: Vec<f64>,
        threshold: f64,
        provenance: Option<Provenance>,
    ) -> Result<()> {
        if axis.len() != self.dims {
            return Err(Error::DimensionMismatch {
                expected: self.dims,
                found: axis.len(),
            });
        }
        if serial > u32::MAX / 2 {
            return Err(Error::DepthExceeded(serial));
        }
        let node = self.nodes.get_mut(&serial).ok_or(Error::UnknownNode(serial))?;
        if node.split.is_some() {
            return Err(Error::AlreadySplit(serial));
        }
        node.split = Some(Split {
            axis,
            threshold,
            provenance,
        });
        self.nodes.insert(left_child(serial), Node::leaf(left_child(serial)));
        self.nodes.insert(right_child(serial), Node::leaf(right_child(serial)));

        tracing::debug!(serial, threshold, "node split");
        self.emit(TreeEvent::Split { serial });
        Ok(())
    }

    /// Remove the split at `serial` together with every descendant node.
    pub fn prune(&mut self, serial: u32) -> Result<()> {
        let node = self.nodes.get_mut(&serial).ok_or(Error::UnknownNode(serial))?;
        if node.split.take().is_none() {
            return Err(Error::NotSplit(serial));
        }
        self.nodes
            .retain(|&s, _| s == serial || !descends_from(s, serial));

        tracing::debug!(serial, "node pruned");
        self.emit(TreeEvent::Prune { serial });
        Ok(())
    }

    pub fn set_threshold(&mut self, serial: u32, threshold: f64) -> Result<()> {
        let node = self.nodes.get_mut(&serial).ok_or(Error::UnknownNode(serial))?;
        let split = node.split.as_mut().ok_or(Error::NotSplit(serial))?;
        split.threshold = threshold;
        self.emit(TreeEvent::ThresholdChanged { serial });
        Ok(())
    }

    /// Serial of the leaf `point` falls into.
    pub fn classify(&self, point: &[f64]) -> u32 {
        self.classify_from(ROOT, point)
    }

    /// Serial of the leaf `point` reaches when dropped in at `serial`.
    pub(crate) fn classify_from(&self, mut serial: u32, point: &[f64]) -> u32 {
        debug_assert_eq!(point.len(), self.dims);
        while let Some(split) = self.split_of(serial) {
            serial = if split.goes_left(point) {
                left_child(serial)
            } else {
                right_child(serial)
            };
        }
        serial
    }

    /// Whether the path of `point` from the root passes through `serial`.
    pub fn contains(&self, serial: u32, point: &[f64]) -> bool {
        self.nodes.contains_key(&serial) && descends_from(self.classify(point), serial)
    }

    /// A channel receiving every subsequent [`TreeEvent`].
    ///
    /// Events are sent synchronously while the mutation runs. Dropping the
    /// receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<TreeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub(crate) fn emit(&mut self, event: TreeEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}
