//! Row batch planning for the bulk loader.
//!
//! The target row count is split 40/60 into a *single* range and a *multiple*
//! range. The multiple range is cut into `multiple` equal segments. Every range
//! is then chopped into uniform batches whose size is the largest
//! `initial / 10^k` that divides the range exactly.

use crate::error::{BenchError, BenchResult};
use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// Share of the total rows that goes to the single range, in tenths.
const SINGLE_TENTHS: u64 = 4;
/// Share of the total rows that goes to the multiple range, in tenths.
const MULTIPLE_TENTHS: u64 = 6;

/// Which of the two benchmarked partitions a batch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RangeKind {
    Single,
    Multiple,
}

impl fmt::Display for RangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeKind::Single => write!(f, "single"),
            RangeKind::Multiple => write!(f, "multiple"),
        }
    }
}

/// One contiguous slice of row indices, rendered into one INSERT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchDescriptor {
    pub range: RangeKind,
    pub offset: u64,
    pub count: u64,
}

impl BatchDescriptor {
    /// Row indices covered by this batch.
    pub fn rows(&self) -> Range<u64> {
        self.offset..self.offset + self.count
    }
}

/// Inputs to [`plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanRequest {
    pub total_rows: u64,
    pub scaler: u64,
    pub multiple: u64,
    pub initial_batch_size: u64,
}

impl PlanRequest {
    pub fn new(total_rows: u64, scaler: u64, multiple: u64, initial_batch_size: u64) -> Self {
        Self {
            total_rows,
            scaler,
            multiple,
            initial_batch_size,
        }
    }
}

/// Ordered batch descriptors plus the sizes they were derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchPlan {
    pub descriptors: Vec<BatchDescriptor>,
    pub single_batch_size: u64,
    pub multiple_batch_size: u64,
    /// Rows in the single range after scaling.
    pub single_rows: u64,
    /// Rows in each multiple-range segment after scaling.
    pub segment_rows: u64,
    pub segments: u64,
}

impl BatchPlan {
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BatchDescriptor> {
        self.descriptors.iter()
    }

    /// Rows actually planned; `[0, covered_rows())` is covered exactly once.
    pub fn covered_rows(&self) -> u64 {
        self.single_rows + self.segments * self.segment_rows
    }

    pub fn single_range(&self) -> Range<u64> {
        0..self.single_rows
    }

    /// The whole multiple range, all segments.
    pub fn multiple_range(&self) -> Range<u64> {
        self.single_rows..self.covered_rows()
    }

    /// Row indices of one multiple-range segment.
    pub fn segment_range(&self, segment: u64) -> Range<u64> {
        let start = self.single_rows + segment * self.segment_rows;
        start..start + self.segment_rows
    }

    pub fn batches_in(&self, range: RangeKind) -> usize {
        self.descriptors.iter().filter(|d| d.range == range).count()
    }
}

impl<'a> IntoIterator for &'a BatchPlan {
    type Item = &'a BatchDescriptor;
    type IntoIter = std::slice::Iter<'a, BatchDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

/// Largest `initial / 10^k` (at least 1) that divides `range_rows` exactly.
///
/// An empty range keeps the initial size since zero divides by anything.
pub fn resolve_batch_size(range_rows: u64, initial: u64) -> u64 {
    let mut batch_size = initial.max(1);
    while range_rows % batch_size != 0 {
        batch_size = (batch_size / 10).max(1);
    }
    batch_size
}

/// `rows * tenths / 10` without overflowing for large row counts.
fn tenths_of(rows: u64, tenths: u64) -> u64 {
    (u128::from(rows) * u128::from(tenths) / 10) as u64
}

/// Partition the target row count into batch descriptors.
///
/// Single-range batches come first, starting at offset 0. Multiple-range
/// batches follow, segment after segment, with offsets continuing from the end
/// of the single range. Fractions lost to integer division (40/60 split,
/// scaler, segment count) are truncated, never rounded up.
pub fn plan(request: PlanRequest) -> BenchResult<BatchPlan> {
    let PlanRequest {
        total_rows,
        scaler,
        multiple,
        initial_batch_size,
    } = request;

    if scaler == 0 {
        return Err(BenchError::Plan("scaler must be at least 1".to_string()));
    }
    if multiple == 0 {
        return Err(BenchError::Plan("multiple must be at least 1".to_string()));
    }
    if initial_batch_size == 0 {
        return Err(BenchError::Plan("batch size must be at least 1".to_string()));
    }

    let single_rows = tenths_of(total_rows, SINGLE_TENTHS) / scaler;
    let segment_rows = tenths_of(total_rows, MULTIPLE_TENTHS) / multiple / scaler;

    let single_batch_size = resolve_batch_size(single_rows, initial_batch_size);
    let multiple_batch_size = resolve_batch_size(segment_rows, initial_batch_size);

    let single_batches = single_rows / single_batch_size;
    let segment_batches = segment_rows / multiple_batch_size;

    let mut descriptors =
        Vec::with_capacity((single_batches + multiple * segment_batches) as usize);

    descriptors.extend((0..single_batches).map(|i| BatchDescriptor {
        range: RangeKind::Single,
        offset: i * single_batch_size,
        count: single_batch_size,
    }));

    for segment in 0..multiple {
        let base = single_rows + segment * segment_rows;
        descriptors.extend((0..segment_batches).map(|i| BatchDescriptor {
            range: RangeKind::Multiple,
            offset: base + i * multiple_batch_size,
            count: multiple_batch_size,
        }));
    }

    Ok(BatchPlan {
        descriptors,
        single_batch_size,
        multiple_batch_size,
        single_rows,
        segment_rows,
        segments: multiple,
    })
}
