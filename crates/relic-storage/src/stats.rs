//! Per-column equi-width histogram for selectivity estimation.

use relic_common::types::PredicateOp;
use relic_common::{RelicError, Result};

/// Equi-width histogram over one integer column.
///
/// The shape (bucket count, domain, bucket width) is fixed at
/// construction; only the counts change. Values outside `[min, max]`
/// are silently dropped: never counted, never bucketed.
pub struct ColumnStats {
    histogram: Vec<usize>,
    min: i32,
    max: i32,
    bucket_width: i64,
    total: usize,
}

impl ColumnStats {
    /// Creates a histogram with `buckets` equal-width buckets over
    /// `[min, max]`.
    pub fn new(buckets: usize, min: i32, max: i32) -> Result<Self> {
        if buckets == 0 {
            return Err(RelicError::Config(
                "histogram needs at least one bucket".to_string(),
            ));
        }
        if min > max {
            return Err(RelicError::Config(format!(
                "histogram domain [{}, {}] is empty",
                min, max
            )));
        }
        let span = max as i64 - min as i64 + 1;
        let bucket_width = (span + buckets as i64 - 1) / buckets as i64;
        Ok(Self {
            histogram: vec![0; buckets],
            min,
            max,
            bucket_width,
            total: 0,
        })
    }

    /// Total number of in-range values added.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Width of each bucket in key space.
    pub fn bucket_width(&self) -> i64 {
        self.bucket_width
    }

    fn bucket_of(&self, v: i32) -> usize {
        let index = (v as i64 - self.min as i64) / self.bucket_width;
        (index as usize).min(self.histogram.len() - 1)
    }

    /// Records a value. Out-of-range values are dropped.
    pub fn add_value(&mut self, v: i32) {
        if v < self.min || v > self.max {
            return;
        }
        let bucket = self.bucket_of(v);
        self.histogram[bucket] += 1;
        self.total += 1;
    }

    /// Estimates how many recorded values satisfy `column op v`,
    /// assuming values are uniformly distributed within each bucket.
    /// Fractional contributions truncate toward zero.
    pub fn estimate_cardinality(&self, op: PredicateOp, v: i32) -> usize {
        if v < self.min {
            return match op {
                PredicateOp::Gt | PredicateOp::Ge | PredicateOp::Ne => self.total,
                _ => 0,
            };
        }
        if v > self.max {
            return match op {
                PredicateOp::Lt | PredicateOp::Le | PredicateOp::Ne => self.total,
                _ => 0,
            };
        }

        let bucket = self.bucket_of(v);
        let width = self.bucket_width as f64;
        let frac = ((v as i64 - self.min as i64) % self.bucket_width) as f64;
        let in_bucket = self.histogram[bucket] as f64;
        let below: usize = self.histogram[..bucket].iter().sum();
        let above: usize = self.histogram[bucket + 1..].iter().sum();

        match op {
            PredicateOp::Eq => (in_bucket / width) as usize,
            PredicateOp::Ne => self.total - (in_bucket / width) as usize,
            PredicateOp::Lt => below + (in_bucket * frac / width) as usize,
            PredicateOp::Le => below + (in_bucket * (frac + 1.0) / width) as usize,
            PredicateOp::Gt => (in_bucket * (width - frac - 1.0) / width) as usize + above,
            PredicateOp::Ge => (in_bucket * (width - frac) / width) as usize + above,
        }
    }
}
