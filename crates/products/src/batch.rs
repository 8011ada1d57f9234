//! Cost layers and the per-product queue of them.

use core::ops::Deref;

use serde::{Deserialize, Serialize};

/// One cost layer: a quantity received at a unit rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockBatch {
    pub qty: f64,
    pub rate: f64,
}

impl StockBatch {
    pub fn new(qty: f64, rate: f64) -> Self {
        Self { qty, rate }
    }

    /// `qty * rate`.
    pub fn value(&self) -> f64 {
        self.qty * self.rate
    }
}

/// Ordered cost layers for one product, oldest at the head.
///
/// Strategies only ever produce queues whose batches have `qty > 0`; a queue
/// deserialized from an external writer may not satisfy that and is checked
/// by validation rather than rejected here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockQueue(Vec<StockBatch>);

impl StockQueue {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// The canonical one-layer queue, or empty when `qty <= 0`.
    pub fn single_layer(qty: f64, rate: f64) -> Self {
        if qty > 0.0 {
            Self(vec![StockBatch::new(qty, rate)])
        } else {
            Self::new()
        }
    }

    /// A copy of this queue with `batch` appended at the tail.
    pub fn appended(&self, batch: StockBatch) -> Self {
        let mut batches = self.0.clone();
        batches.push(batch);
        Self(batches)
    }

    pub fn total_quantity(&self) -> f64 {
        self.0.iter().map(|b| b.qty).sum()
    }

    pub fn total_value(&self) -> f64 {
        self.0.iter().map(StockBatch::value).sum()
    }

    pub fn as_slice(&self) -> &[StockBatch] {
        &self.0
    }
}

impl Deref for StockQueue {
    type Target = [StockBatch];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<StockBatch>> for StockQueue {
    fn from(batches: Vec<StockBatch>) -> Self {
        Self(batches)
    }
}

impl FromIterator<StockBatch> for StockQueue {
    fn from_iter<I: IntoIterator<Item = StockBatch>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a StockQueue {
    type Item = &'a StockBatch;
    type IntoIter = core::slice::Iter<'a, StockBatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
