//! Synthetic rows for the benchmark table.
//!
//! A row at index `i` is derived only from the generator seed and `i`, so any
//! batch renders the same values no matter which order batches are built in.

use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Longest string the `VARCHAR(30)` columns accept.
pub const MAX_TEXT_LEN: usize = 30;

const MAX_B: i64 = 10_000;
const MAX_C: i64 = 100;

/// One row of the benchmark table `(a, b, c, d, e)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRow {
    /// Row index; point lookups on `a` hit exactly one row.
    pub a: i64,
    pub b: i64,
    pub c: i64,
    pub d: String,
    pub e: String,
}

/// Seeded source of benchmark rows, one per process.
#[derive(Debug)]
pub struct DataGenerator {
    seed: u64,
    rng: StdRng,
}

impl DataGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Rows for indices `offset..offset + count`, in order.
    pub fn rows_for_offset_range(&self, offset: u64, count: u64) -> Vec<DataRow> {
        (offset..offset + count)
            .map(|index| {
                let mut rng = StdRng::seed_from_u64(mix(self.seed, index));
                random_row(&mut rng, index as i64)
            })
            .collect()
    }

    /// A row drawn from the generator's own stream, for UPDATE payloads.
    pub fn random_row(&mut self) -> DataRow {
        let a = self.rng.random_range(0..i64::from(i32::MAX));
        random_row(&mut self.rng, a)
    }

    /// Uniform draw from `range`, used to pick lookup keys.
    pub fn pick(&mut self, range: std::ops::Range<u64>) -> u64 {
        if range.is_empty() {
            return range.start;
        }
        self.rng.random_range(range)
    }
}

fn random_row<R: Rng>(rng: &mut R, a: i64) -> DataRow {
    DataRow {
        a,
        b: rng.random_range(0..MAX_B),
        c: rng.random_range(1..MAX_C),
        d: random_text(rng),
        e: random_text(rng),
    }
}

fn random_text<R: Rng>(rng: &mut R) -> String {
    let len = rng.random_range(1..=MAX_TEXT_LEN);
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

// splitmix64 finalizer
fn mix(seed: u64, index: u64) -> u64 {
    let mut z = seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
