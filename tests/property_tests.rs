use pursuit::cluster::split;
use pursuit::histogram::Histogram;
use pursuit::linalg::orthogonal_basis;
use pursuit::points::DensePoints;
use pursuit::projection::axis_from_arguments;
use pursuit::tree::{ClassTree, SplitTree, ROOT};
use proptest::prelude::*;

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

proptest! {
    #[test]
    fn prop_axis_is_unit(args in prop::collection::vec(-2.0f64..2.0, 0..6)) {
        let axis = axis_from_arguments(&args);
        prop_assert_eq!(axis.len(), args.len() + 1);
        prop_assert!((dot(&axis, &axis) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn prop_histogram_counts_every_value(
        mut values in prop::collection::vec(-1e3f64..1e3, 1..400),
    ) {
        values.sort_by(f64::total_cmp);
        let h = Histogram::new(&values).unwrap();
        prop_assert_eq!(h.total(), values.len());
        prop_assert!(h.bucket_count() >= 1 && h.bucket_count() <= 50);
        prop_assert_eq!(h.max_frequency(), *h.frequencies().iter().max().unwrap());
    }

    #[test]
    fn prop_split_falls_between_separated_groups(
        low in prop::collection::vec(0.0f64..1.0, 1..30),
        high in prop::collection::vec(10.0f64..11.0, 1..30),
    ) {
        let mut values: Vec<f64> = low.iter().chain(&high).copied().collect();
        values.sort_by(f64::total_cmp);
        let threshold = split(&values).unwrap();
        prop_assert!(threshold > values[0]);
        prop_assert!(threshold < values[values.len() - 1]);
    }

    #[test]
    fn prop_orthogonal_basis_is_orthonormal(
        rows in prop::collection::vec(prop::collection::vec(-5.0f64..5.0, 3), 4..20),
        args in prop::collection::vec(-0.7f64..0.7, 2),
    ) {
        let axis = axis_from_arguments(&args);
        let flat: Vec<f64> = rows.concat();
        let basis = orthogonal_basis(&axis, &flat, 3).unwrap();

        prop_assert_eq!(&basis[0], &axis);
        for (i, a) in basis.iter().enumerate() {
            prop_assert!((dot(a, a) - 1.0).abs() < 1e-9);
            for b in &basis[i + 1..] {
                prop_assert!(dot(a, b).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn prop_leaves_partition_points(
        rows in prop::collection::vec(prop::collection::vec(-5.0f64..5.0, 2), 1..60),
        t1 in -5.0f64..5.0,
        t2 in -5.0f64..5.0,
    ) {
        let mut split_tree = SplitTree::new(2);
        split_tree.split(ROOT, vec![1.0, 0.0], t1, None).unwrap();
        split_tree.split(3, vec![0.0, 1.0], t2, None).unwrap();

        let points = DensePoints::from_rows(&rows).unwrap();
        let tree = ClassTree::new(split_tree, Box::new(points)).unwrap();

        let total: usize = tree.tree().leaves().map(|s| tree.node(s).unwrap().point_count()).sum();
        prop_assert_eq!(total, rows.len());
        for (i, row) in rows.iter().enumerate() {
            let expected = if row[0] < t1 { 2 } else if row[1] < t2 { 6 } else { 7 };
            prop_assert_eq!(tree.class_of(i), expected);
        }
    }
}
