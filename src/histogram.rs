//! Fixed-width histogram of a sorted 1-D sample.

use crate::error::{Error, Result};

const MAX_BUCKETS: usize = 50;

/// Equal-width buckets spanning `[min, max]` of a sorted list.
///
/// The bucket count is `len / 10`, clamped to `1..=50`. Every value is
/// counted exactly once; the maximum lands in the last bucket.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    min: f64,
    max: f64,
    width: f64,
    frequencies: Vec<usize>,
    max_frequency: usize,
}

impl Histogram {
    /// Build from an ascending list.
    pub fn new(sorted: &[f64]) -> Result<Self> {
        let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
            return Err(Error::EmptyInput);
        };
        debug_assert!(sorted.windows(2).all(|w| w[0] <= w[1]), "histogram input must be sorted");

        let buckets = (sorted.len() / 10).clamp(1, MAX_BUCKETS);
        let width = (max - min) / buckets as f64;
        let mut frequencies = vec![0; buckets];
        for &value in sorted {
            let slot = if width > 0.0 {
                (((value - min) / width) as usize).min(buckets - 1)
            } else {
                0
            };
            frequencies[slot] += 1;
        }
        let max_frequency = frequencies.iter().copied().max().unwrap_or(0);

        Ok(Self {
            min,
            max,
            width,
            frequencies,
            max_frequency,
        })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.frequencies.len()
    }

    /// Width of every bucket (0 for a constant sample).
    pub fn bucket_width(&self) -> f64 {
        self.width
    }

    /// Count in bucket `index` (0-based).
    pub fn frequency(&self, index: usize) -> usize {
        self.frequencies[index]
    }

    pub fn frequencies(&self) -> &[usize] {
        &self.frequencies
    }

    pub fn max_frequency(&self) -> usize {
        self.max_frequency
    }

    /// Total number of values counted.
    pub fn total(&self) -> usize {
        self.frequencies.iter().sum()
    }
}
