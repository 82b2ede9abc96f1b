// crates/popatlas-core/src/classify.rs

//! # Quantizer
//!
//! Equal-width classification of `[0, domain_max]` into `k` ordered buckets.
//! Bucket `i` covers `[i·max/k, (i+1)·max/k)`; the last bucket is closed so it
//! also holds `domain_max`. Out-of-range counts clamp to the edge buckets.

use crate::model::{Classification, PopulationRecord};
use serde::{Deserialize, Serialize};

/// Bucket index of `count`.
///
/// `domain_max <= 0` (nothing loaded) and `buckets == 0` both yield 0.
///
/// ```rust
/// use popatlas_core::classify::classify;
///
/// assert_eq!(classify(900_000, 900_000, 10), 9);
/// assert_eq!(classify(500_000, 900_000, 10), 5);
/// assert_eq!(classify(0, 900_000, 10), 0);
/// assert_eq!(classify(42, 0, 10), 0);
/// ```
pub fn classify(count: i64, domain_max: i64, buckets: usize) -> usize {
    if domain_max <= 0 || buckets == 0 || count <= 0 {
        return 0;
    }
    let last = buckets - 1;
    if count >= domain_max {
        return last;
    }
    // floor(count * k / max) in i128 so large counts cannot overflow.
    let idx = (count as i128 * buckets as i128) / domain_max as i128;
    (idx as usize).min(last)
}

/// Classifies an optional match: `None` is the "no data" sentinel.
pub fn classify_match(
    record: Option<&PopulationRecord>,
    domain_max: u64,
    buckets: usize,
) -> Classification {
    match record {
        Some(r) => Classification::Bucket(classify(
            saturating_i64(r.count),
            saturating_i64(domain_max),
            buckets,
        )),
        None => Classification::NoData,
    }
}

fn saturating_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

/// A quantize scale with a fixed domain and bucket count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quantizer {
    domain_max: u64,
    buckets: usize,
}

impl Quantizer {
    pub fn new(domain_max: u64, buckets: usize) -> Self {
        Self {
            domain_max,
            buckets: buckets.max(1),
        }
    }

    pub fn domain_max(&self) -> u64 {
        self.domain_max
    }

    pub fn buckets(&self) -> usize {
        self.buckets
    }

    pub fn bucket(&self, count: u64) -> usize {
        classify(
            saturating_i64(count),
            saturating_i64(self.domain_max),
            self.buckets,
        )
    }

    pub fn classify(&self, record: Option<&PopulationRecord>) -> Classification {
        classify_match(record, self.domain_max, self.buckets)
    }

    /// The `k-1` interior cut points, for legends.
    ///
    /// Empty when the domain is empty.
    pub fn thresholds(&self) -> Vec<f64> {
        if self.domain_max == 0 {
            return Vec::new();
        }
        let width = self.domain_max as f64 / self.buckets as f64;
        (1..self.buckets).map(|i| width * i as f64).collect()
    }

    /// `[lo, hi)` covered by bucket `i` (the last one also includes `hi`).
    pub fn bucket_range(&self, i: usize) -> Option<(f64, f64)> {
        if i >= self.buckets {
            return None;
        }
        let width = self.domain_max as f64 / self.buckets as f64;
        Some((width * i as f64, width * (i + 1) as f64))
    }
}
