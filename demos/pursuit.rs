//! Split a 3-D cloud of three clumps with projection pursuit.

use std::thread;

use pursuit::cluster::{Clusterer, StructureBasisFinder};
use pursuit::linalg::project_onto_principal_plane;
use pursuit::maximize::GeneticAlgorithm;
use pursuit::monitor::{CancelHandle, NullMonitor, Progress, ProgressMonitor};
use pursuit::points::DensePoints;
use pursuit::projection::ProjectionIndex;
use pursuit::tree::{ClassTree, SplitTree, ROOT};
use rand::prelude::*;

fn main() -> pursuit::Result<()> {
    // Three clumps: around (-3, 0, 0), (3, 0, 0) and (3, 4, 0).
    let mut rng = StdRng::seed_from_u64(42);
    let centers = [[-3.0, 0.0, 0.0], [3.0, 0.0, 0.0], [3.0, 4.0, 0.0]];
    let rows: Vec<Vec<f64>> = (0..150)
        .map(|i| {
            let center = centers[i % 3];
            center.iter().map(|c| c + rng.random::<f64>() - 0.5).collect()
        })
        .collect();
    let points = DensePoints::from_rows(&rows)?;

    // --- Structure basis ---
    let basis = StructureBasisFinder::new(ProjectionIndex::Friedman)
        .with_seed(1)
        .find(&points, 2, &mut NullMonitor)?;
    println!("=== Structure basis (Friedman's, k=2) ===");
    for (i, axis) in basis.iter().enumerate() {
        println!("  axis {}: {:?}", i, axis);
    }

    // --- Split tree, searching on a worker thread ---
    let mut tree = ClassTree::new(SplitTree::new(3), Box::new(points.clone()))?;
    let clusterer = Clusterer::new(ProjectionIndex::Hall).with_seed(7);

    let (mut monitor, progress) = ProgressMonitor::with_channel(CancelHandle::default());
    let found = thread::scope(|s| {
        let reporter = s.spawn(move || {
            progress
                .iter()
                .filter(|p| matches!(p, Progress::Iteration(_)))
                .count()
        });
        let found = tree.find_and_split(ROOT, &clusterer, &mut monitor);
        drop(monitor);
        let iterations = reporter.join().unwrap_or(0);
        println!("\n=== Root split ({} iterations reported) ===", iterations);
        found
    })?;
    println!("  axis {:?} score {:e}", found.axis, found.score);
    for [along, across] in project_onto_principal_plane(&points, &found.axis)?.iter().take(3) {
        println!("  plot point ({:6.2}, {:6.2})", along, across);
    }

    // Split whichever child still holds two clumps.
    let genetic = Clusterer::new(ProjectionIndex::Hall)
        .with_parameters(GeneticAlgorithm::new().with_population_size(40))
        .with_seed(7);
    let bigger = [2, 3]
        .into_iter()
        .max_by_key(|&s| tree.node(s).map_or(0, |n| n.point_count()))
        .unwrap_or(2);
    tree.find_and_split(bigger, &genetic, &mut NullMonitor)?;

    println!("\n=== Leaves ===");
    let leaves: Vec<u32> = tree.tree().leaves().collect();
    for leaf in leaves {
        let node = tree.node(leaf)?;
        let means: Vec<String> = (0..3)
            .map(|d| format!("{:5.2}", node.mean(d).unwrap_or(f64::NAN)))
            .collect();
        println!("  node {:3}: {:3} points, mean ({})", leaf, node.point_count(), means.join(", "));
    }
    Ok(())
}
