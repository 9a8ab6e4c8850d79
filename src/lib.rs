//! Projection-pursuit clustering.
//!
//! `pursuit` finds directions along which a point cloud looks least
//! Gaussian, splits the cloud with hyperplanes across those directions, and
//! organizes the splits in a binary tree.
//!
//! - [`maximize`]: derivative-free maximizers (Nelder-Mead simplex,
//!   simulated annealing, a genetic algorithm and gradient ascent) behind one
//!   [`Maximizer`](maximize::Maximizer) trait.
//! - [`projection`]: projection indices scoring 1-D projections, and the
//!   objective adapting them to the maximizers.
//! - [`cluster`]: axis search, threshold selection and structure bases.
//! - [`tree`]: split trees and the classification of points against them.
//!
//! Long searches report to a [`Monitor`](monitor::Monitor), which can also
//! cancel them.
//!
//! ```rust
//! use pursuit::cluster::Clusterer;
//! use pursuit::monitor::NullMonitor;
//! use pursuit::points::DensePoints;
//! use pursuit::tree::{ClassTree, SplitTree, ROOT};
//!
//! let rows: Vec<Vec<f64>> = (0..60)
//!     .map(|i| {
//!         let side = if i % 2 == 0 { -2.0 } else { 2.0 };
//!         vec![side + 0.01 * (i % 7) as f64, 0.02 * (i % 5) as f64]
//!     })
//!     .collect();
//! let points = DensePoints::from_rows(&rows).unwrap();
//!
//! let mut tree = ClassTree::new(SplitTree::new(2), Box::new(points)).unwrap();
//! let clusterer = Clusterer::default().with_seed(7);
//! tree.find_and_split(ROOT, &clusterer, &mut NullMonitor).unwrap();
//!
//! let total: usize = tree
//!     .tree()
//!     .leaves()
//!     .map(|leaf| tree.node(leaf).unwrap().point_count())
//!     .sum();
//! assert_eq!(total, 60);
//! ```

#![forbid(unsafe_code)]

pub mod cluster;
pub mod error;
pub mod histogram;
pub mod linalg;
pub mod maximize;
pub mod monitor;
pub mod objective;
pub mod points;
pub mod projection;
pub mod tree;

pub use cluster::{Clusterer, FoundAxis, Provenance, StructureBasisFinder};
pub use error::{Error, Result};
pub use maximize::{Algorithm, AlgorithmParameters, Maximizer, Maximum};
pub use monitor::{Monitor, NullMonitor};
pub use objective::Objective;
pub use points::{DensePoints, PointSet};
pub use projection::{ProjectionIndex, ProjectionIndexFunction};
pub use tree::{ClassTree, SplitTree, TreeEvent};
