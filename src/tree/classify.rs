//! Classification of a point set against a [`SplitTree`].

use std::collections::BTreeMap;
use std::sync::mpsc::Receiver;

use super::split_tree::{descends_from, left_child, right_child, SplitTree, TreeEvent, ROOT};
use crate::cluster::{split, Clusterer, FoundAxis, Provenance};
use crate::error::{Error, Result};
use crate::histogram::Histogram;
use crate::monitor::Monitor;
use crate::points::{project, PointCursor, PointSet};

/// Largest serial a one-byte class can hold.
const MAX_CLASS: u32 = u8::MAX as u32;

/// Histogram and best threshold of a node's points projected on an axis.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectionStatistics {
    axis: Vec<f64>,
    histogram: Histogram,
    best_threshold: Option<f64>,
}

impl ProjectionStatistics {
    pub fn compute(points: &dyn PointSet, axis: &[f64]) -> Result<Self> {
        if axis.len() != points.dimension_count() {
            return Err(Error::DimensionMismatch {
                expected: points.dimension_count(),
                found: axis.len(),
            });
        }
        let mut values = project(points, axis);
        values.sort_by(f64::total_cmp);
        Ok(Self {
            axis: axis.to_vec(),
            histogram: Histogram::new(&values)?,
            best_threshold: split(&values),
        })
    }

    /// Reuse `cache` when its axis equals `axis` exactly, otherwise compute.
    pub fn compute_or_reuse(
        cache: Option<&ProjectionStatistics>,
        points: &dyn PointSet,
        axis: &[f64],
    ) -> Result<Self> {
        match cache {
            Some(cached) if cached.axis == axis => Ok(cached.clone()),
            _ => Self::compute(points, axis),
        }
    }

    pub fn axis(&self) -> &[f64] {
        &self.axis
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// `None` when the projection has fewer than two distinct values.
    pub fn best_threshold(&self) -> Option<f64> {
        self.best_threshold
    }
}

/// Running statistics of the points passing through one tree node.
#[derive(Clone, Debug)]
pub struct ClassNode {
    serial: u32,
    count: usize,
    sums: Vec<f64>,
    sums_of_squares: Vec<f64>,
    lookaside: Option<ProjectionStatistics>,
    split_statistics: Option<ProjectionStatistics>,
}

impl ClassNode {
    fn new(serial: u32, dims: usize) -> Self {
        Self {
            serial,
            count: 0,
            sums: vec![0.0; dims],
            sums_of_squares: vec![0.0; dims],
            lookaside: None,
            split_statistics: None,
        }
    }

    fn reset(&mut self) {
        self.count = 0;
        self.sums.iter_mut().for_each(|s| *s = 0.0);
        self.sums_of_squares.iter_mut().for_each(|s| *s = 0.0);
        self.lookaside = None;
        self.split_statistics = None;
    }

    fn add(&mut self, point: &[f64]) {
        self.count += 1;
        for ((s, q), &x) in self.sums.iter_mut().zip(&mut self.sums_of_squares).zip(point) {
            *s += x;
            *q += x * x;
        }
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }

    pub fn point_count(&self) -> usize {
        self.count
    }

    /// Mean of coordinate `d`; `None` for an empty node.
    pub fn mean(&self, d: usize) -> Option<f64> {
        (self.count > 0).then(|| self.sums[d] / self.count as f64)
    }

    /// Population standard deviation of coordinate `d`; `None` for an empty node.
    pub fn standard_deviation(&self, d: usize) -> Option<f64> {
        let mean = self.mean(d)?;
        let variance = self.sums_of_squares[d] / self.count as f64 - mean * mean;
        Some(variance.max(0.0).sqrt())
    }

    /// Statistics last computed for a candidate axis at this node.
    pub fn projection_statistics(&self) -> Option<&ProjectionStatistics> {
        self.lookaside.as_ref()
    }
}

/// A [`SplitTree`] applied to a point set.
///
/// Every point carries a one-byte class: the serial of the leaf it falls
/// into. Node statistics are kept in step with every mutation made through
/// this type, so the tree itself is only reachable read-only.
pub struct ClassTree {
    tree: SplitTree,
    points: Box<dyn PointSet>,
    classes: Vec<u8>,
    nodes: BTreeMap<u32, ClassNode>,
}

impl ClassTree {
    /// Classify `points` against `tree`.
    pub fn new(tree: SplitTree, points: Box<dyn PointSet>) -> Result<Self> {
        if let Some(deepest) = tree.nodes().map(|n| n.serial()).filter(|&s| s > MAX_CLASS).max() {
            return Err(Error::DepthExceeded(deepest));
        }
        check_dimensions(&tree, points.as_ref())?;
        let dims = tree.dimension_count();
        let nodes = tree
            .nodes()
            .map(|n| (n.serial(), ClassNode::new(n.serial(), dims)))
            .collect();
        let mut class_tree = Self {
            tree,
            points,
            classes: Vec::new(),
            nodes,
        };
        class_tree.classify_all();
        Ok(class_tree)
    }

    pub fn tree(&self) -> &SplitTree {
        &self.tree
    }

    pub fn points(&self) -> &dyn PointSet {
        self.points.as_ref()
    }

    pub fn subscribe(&mut self) -> Receiver<TreeEvent> {
        self.tree.subscribe()
    }

    /// Replace the point set and recompute every node from scratch.
    pub fn set_points(&mut self, points: Box<dyn PointSet>) -> Result<()> {
        check_dimensions(&self.tree, points.as_ref())?;
        self.points = points;
        self.classify_all();
        self.tree.emit(TreeEvent::PointsReplaced);
        Ok(())
    }

    fn classify_all(&mut self) {
        self.nodes.values_mut().for_each(ClassNode::reset);

        let n = self.points.point_count();
        self.classes = Vec::with_capacity(n);
        let mut row = vec![0.0; self.tree.dimension_count()];
        let mut cursor = self.points.cursor();
        for _ in 0..n {
            read_row(cursor.as_mut(), &mut row);
            let leaf = descend(&self.tree, &mut self.nodes, ROOT, &row);
            self.classes.push(to_class(leaf));
        }
        tracing::debug!(points = n, leaves = self.tree.leaves().count(), "points classified");
    }

    pub fn node(&self, serial: u32) -> Result<&ClassNode> {
        self.nodes.get(&serial).ok_or(Error::UnknownNode(serial))
    }

    /// One class per point, in point order.
    pub fn classes(&self) -> &[u8] {
        &self.classes
    }

    /// Leaf serial of point `i`.
    pub fn class_of(&self, i: usize) -> u32 {
        u32::from(self.classes[i])
    }

    /// Whether point `i` passes through node `serial`.
    pub fn contains_point(&self, serial: u32, i: usize) -> bool {
        descends_from(self.class_of(i), serial)
    }

    /// The points owned by node `serial`, as a point set.
    pub fn node_points(&self, serial: u32) -> Result<NodePoints<'_>> {
        let node = self.node(serial)?;
        Ok(NodePoints {
            points: self.points.as_ref(),
            classes: &self.classes,
            serial,
            count: node.count,
        })
    }

    /// Project node `serial`'s points on `axis` and keep the result at the node.
    pub fn compute_projection_statistics(
        &mut self,
        serial: u32,
        axis: &[f64],
    ) -> Result<&ProjectionStatistics> {
        let statistics = ProjectionStatistics::compute(&self.node_points(serial)?, axis)?;
        let node = self.nodes.get_mut(&serial).ok_or(Error::UnknownNode(serial))?;
        let statistics: &ProjectionStatistics = node.lookaside.insert(statistics);
        Ok(statistics)
    }

    /// Histogram and best threshold of the split at `serial`, computed on
    /// first use.
    pub fn split_statistics(&mut self, serial: u32) -> Result<&ProjectionStatistics> {
        let node = self.node(serial)?;
        if node.split_statistics.is_none() {
            let axis = self.tree.split_of(serial).ok_or(Error::NotSplit(serial))?.axis();
            let statistics = ProjectionStatistics::compute_or_reuse(
                node.lookaside.as_ref(),
                &self.node_points(serial)?,
                axis,
            )?;
            if let Some(node) = self.nodes.get_mut(&serial) {
                node.split_statistics = Some(statistics);
            }
        }
        self.nodes
            .get(&serial)
            .and_then(|n| n.split_statistics.as_ref())
            .ok_or(Error::NotSplit(serial))
    }

    /// Split leaf `serial` along `axis` at the best threshold for its points.
    ///
    /// Returns the threshold used.
    pub fn split(&mut self, serial: u32, axis: Vec<f64>) -> Result<f64> {
        self.check_splittable(serial)?;
        let statistics = ProjectionStatistics::compute_or_reuse(
            self.node(serial)?.lookaside.as_ref(),
            &self.node_points(serial)?,
            &axis,
        )?;
        let threshold = statistics.best_threshold().ok_or(Error::InvalidParameter {
            name: "axis",
            message: "projection of the node's points has no threshold",
        })?;
        if let Some(node) = self.nodes.get_mut(&serial) {
            node.lookaside = Some(statistics);
        }
        self.split_at(serial, axis, threshold, None)?;
        Ok(threshold)
    }

    /// Split leaf `serial` with an explicit threshold.
    pub fn split_at(
        &mut self,
        serial: u32,
        axis: Vec<f64>,
        threshold: f64,
        provenance: Option<Provenance>,
    ) -> Result<()> {
        self.check_splittable(serial)?;
        self.tree.split(serial, axis, threshold, provenance)?;
        let dims = self.tree.dimension_count();
        for child in [left_child(serial), right_child(serial)] {
            self.nodes.insert(child, ClassNode::new(child, dims));
        }
        self.reclassify_below(serial);
        Ok(())
    }

    /// Search node `serial` for an interesting axis and split it there.
    ///
    /// Nothing is changed if the search fails or is cancelled.
    pub fn find_and_split(
        &mut self,
        serial: u32,
        clusterer: &Clusterer,
        monitor: &mut dyn Monitor,
    ) -> Result<FoundAxis> {
        self.check_splittable(serial)?;
        let found = clusterer.find_axis(&self.node_points(serial)?, monitor)?;
        let statistics = ProjectionStatistics::compute(&self.node_points(serial)?, &found.axis)?;
        let threshold = statistics.best_threshold().ok_or(Error::InvalidParameter {
            name: "axis",
            message: "projection of the node's points has no threshold",
        })?;
        if let Some(node) = self.nodes.get_mut(&serial) {
            node.lookaside = Some(statistics);
        }
        self.split_at(serial, found.axis.clone(), threshold, Some(found.provenance))?;
        Ok(found)
    }

    /// Move the threshold of the split at `serial` and reclassify its subtree.
    pub fn set_threshold(&mut self, serial: u32, threshold: f64) -> Result<()> {
        self.tree.set_threshold(serial, threshold)?;
        self.reclassify_below(serial);
        Ok(())
    }

    /// Remove the subtree below `serial`; its points now belong to `serial`.
    pub fn prune(&mut self, serial: u32) -> Result<()> {
        self.tree.prune(serial)?;
        self.nodes
            .retain(|&s, _| s == serial || !descends_from(s, serial));
        if let Some(node) = self.nodes.get_mut(&serial) {
            node.split_statistics = None;
        }
        let class = to_class(serial);
        for c in &mut self.classes {
            if descends_from(u32::from(*c), serial) {
                *c = class;
            }
        }
        Ok(())
    }

    fn check_splittable(&self, serial: u32) -> Result<()> {
        if !self.tree.is_leaf(serial)? {
            return Err(Error::AlreadySplit(serial));
        }
        if right_child(serial) > MAX_CLASS {
            return Err(Error::DepthExceeded(serial));
        }
        Ok(())
    }

    /// Recompute the children of the split at `serial` from the points it owns.
    fn reclassify_below(&mut self, serial: u32) {
        for (_, node) in self
            .nodes
            .iter_mut()
            .filter(|(s, _)| **s != serial && descends_from(**s, serial))
        {
            node.reset();
        }
        let Some(split) = self.tree.split_of(serial) else {
            return;
        };

        let mut row = vec![0.0; self.tree.dimension_count()];
        let mut cursor = self.points.cursor();
        for class in self.classes.iter_mut() {
            read_row(cursor.as_mut(), &mut row);
            if !descends_from(u32::from(*class), serial) {
                continue;
            }
            let child = if split.goes_left(&row) {
                left_child(serial)
            } else {
                right_child(serial)
            };
            *class = to_class(descend(&self.tree, &mut self.nodes, child, &row));
        }
    }
}

impl std::fmt::Debug for ClassTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassTree")
            .field("tree", &self.tree)
            .field("points", &self.points.point_count())
            .field("nodes", &self.nodes)
            .finish()
    }
}

fn check_dimensions(tree: &SplitTree, points: &dyn PointSet) -> Result<()> {
    if points.dimension_count() != tree.dimension_count() {
        return Err(Error::DimensionMismatch {
            expected: tree.dimension_count(),
            found: points.dimension_count(),
        });
    }
    Ok(())
}

fn read_row(cursor: &mut (dyn PointCursor + '_), row: &mut [f64]) {
    cursor.advance();
    for (j, x) in row.iter_mut().enumerate() {
        *x = cursor.coordinate(j);
    }
}

/// Drop `point` in at `serial`, counting it at every node it passes.
fn descend(
    tree: &SplitTree,
    nodes: &mut BTreeMap<u32, ClassNode>,
    mut serial: u32,
    point: &[f64],
) -> u32 {
    loop {
        if let Some(node) = nodes.get_mut(&serial) {
            node.add(point);
        }
        match tree.split_of(serial) {
            Some(split) if split.goes_left(point) => serial = left_child(serial),
            Some(_) => serial = right_child(serial),
            None => return serial,
        }
    }
}

fn to_class(serial: u32) -> u8 {
    debug_assert!(serial <= MAX_CLASS);
    serial as u8
}

/// The points of a [`ClassTree`] node, in point order.
#[derive(Clone, Copy)]
pub struct NodePoints<'a> {
    points: &'a dyn PointSet,
    classes: &'a [u8],
    serial: u32,
    count: usize,
}

impl NodePoints<'_> {
    pub fn serial(&self) -> u32 {
        self.serial
    }
}

impl PointSet for NodePoints<'_> {
    fn dimension_count(&self) -> usize {
        self.points.dimension_count()
    }

    fn point_count(&self) -> usize {
        self.count
    }

    fn cursor(&self) -> Box<dyn PointCursor + '_> {
        let mut cursor = NodeCursor {
            inner: self.points.cursor(),
            classes: self.classes,
            serial: self.serial,
            advanced: 0,
            next: None,
        };
        cursor.next = cursor.member_from(0);
        Box::new(cursor)
    }
}

struct NodeCursor<'a> {
    inner: Box<dyn PointCursor + 'a>,
    classes: &'a [u8],
    serial: u32,
    /// Number of times `inner` has been advanced.
    advanced: usize,
    next: Option<usize>,
}

impl NodeCursor<'_> {
    fn member_from(&self, start: usize) -> Option<usize> {
        (start..self.classes.len())
            .find(|&i| descends_from(u32::from(self.classes[i]), self.serial))
    }
}

impl PointCursor for NodeCursor<'_> {
    fn has_next(&self) -> bool {
        self.next.is_some()
    }

    fn advance(&mut self) {
        let Some(target) = self.next else {
            return;
        };
        while self.advanced <= target {
            self.inner.advance();
            self.advanced += 1;
        }
        self.next = self.member_from(target + 1);
    }

    fn coordinate(&self, index: usize) -> f64 {
        self.inner.coordinate(index)
    }
}
