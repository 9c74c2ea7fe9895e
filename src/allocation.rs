//! Allocation tables: deterministic partitioning of the bucket space between
//! weighted variants.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, Str};

/// A weighted variant as supplied by the caller on every request.
///
/// Variants are not persisted by the core; the allocation table is rebuilt
/// from the list on each evaluation, which keeps the partition reproducible
/// from the list alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    /// Variant name. Must be non-empty and unique within one request.
    pub name: Str,
    /// Relative traffic weight. Non-negative; normalized against the sum of
    /// all weights in the request.
    pub allocation: f64,
    /// Opaque caller-supplied metadata, carried through to the variant's
    /// allocation range.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl Variant {
    /// Create a variant with no metadata.
    pub fn new(name: impl Into<Str>, allocation: f64) -> Variant {
        Variant {
            name: name.into(),
            allocation,
            meta: serde_json::Map::new(),
        }
    }
}

/// Contiguous range of buckets owned by one variant.
///
/// Bounds are inclusive. A zero-weight variant produces an empty range with
/// `end < start` (which is why bounds are signed: the empty range at the very
/// start of the space is `start = 0, end = -1`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRange {
    /// Name of the owning variant.
    pub variant_name: Str,
    /// First bucket of the range, inclusive.
    pub start: i64,
    /// Last bucket of the range, inclusive.
    pub end: i64,
    /// Metadata copied from the variant.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl AllocationRange {
    /// Return `true` if the range owns no buckets.
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Return `true` if `bucket` falls within this range. Always `false` for
    /// empty ranges.
    pub fn contains(&self, bucket: u64) -> bool {
        let bucket = bucket as i64;
        self.start <= bucket && bucket <= self.end
    }
}

/// A deterministic, gap-free, non-overlapping partition of the bucket space
/// into contiguous ranges, one per variant, in input order.
///
/// Variant order is semantically significant: the table is built in input
/// order and is never re-sorted, and floor rounding favors earlier variants
/// when weights don't divide the space evenly.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationTable {
    ranges: Vec<AllocationRange>,
}

impl AllocationTable {
    /// Build the allocation table for `variants` over a bucket space of
    /// `bucket_space_size` buckets.
    ///
    /// Each variant's share of the space is `allocation / total_allocation`.
    /// Range boundaries are cumulative-floor scaled: one floored value drives
    /// both a range's end and the next range's start, so floating-point error
    /// cannot accumulate across variants and the ranges are contiguous by
    /// construction. The final boundary is pinned to the end of the space so
    /// no bucket is ever left unassigned.
    ///
    /// Fails with [`Error::InvalidAllocation`] if `variants` is empty or the
    /// weights sum to zero or less.
    pub fn build(variants: &[Variant], bucket_space_size: u64) -> Result<AllocationTable> {
        // Weights must be finite and non-negative, and at least one must be
        // positive. NaN and infinity are rejected up front so the cumulative
        // math below can't produce nonsense boundaries.
        if variants
            .iter()
            .any(|v| !v.allocation.is_finite() || v.allocation < 0.0)
        {
            return Err(Error::InvalidAllocation);
        }
        let total: f64 = variants.iter().map(|v| v.allocation).sum();
        if variants.is_empty() || total <= 0.0 {
            return Err(Error::InvalidAllocation);
        }

        let last_weighted = variants
            .iter()
            .rposition(|v| v.allocation > 0.0)
            .expect("a positive total implies a positive-weight variant");

        let size = bucket_space_size as i64;
        let mut ranges = Vec::with_capacity(variants.len());
        let mut cum = 0.0_f64;
        let mut start = 0_i64;
        for (index, variant) in variants.iter().enumerate() {
            cum += variant.allocation / total;
            let boundary = if index == last_weighted {
                // `cum` is 1.0 up to floating-point error here; pinning the
                // boundary of the last weighted variant keeps error from
                // leaking a bucket at either end of the space.
                size
            } else if variant.allocation <= 0.0 {
                // Zero-weight variants own no buckets, ever. Deriving the
                // empty range from `start` rather than `cum` keeps that true
                // even when cumulative error would floor a boundary short.
                start
            } else {
                (cum * bucket_space_size as f64).floor() as i64
            };
            ranges.push(AllocationRange {
                variant_name: variant.name.clone(),
                start,
                end: boundary - 1,
                meta: variant.meta.clone(),
            });
            start = boundary;
        }

        Ok(AllocationTable { ranges })
    }

    /// Find the range owning `bucket`. Empty ranges never match.
    ///
    /// Returns `None` only if `bucket` lies outside the bucket space the
    /// table was built for.
    pub fn locate(&self, bucket: u64) -> Option<&AllocationRange> {
        self.ranges.iter().find(|range| range.contains(bucket))
    }

    /// The computed ranges, in variant input order.
    pub fn ranges(&self) -> &[AllocationRange] {
        &self.ranges
    }

    /// Consume the table, returning the ranges.
    pub fn into_ranges(self) -> Vec<AllocationRange> {
        self.ranges
    }
}
