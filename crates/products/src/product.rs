use serde::{Deserialize, Serialize};

use costledger_core::{AggregateId, approx_eq, safe_div};

use crate::batch::StockQueue;
use crate::method::ValuationMethod;

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(AggregateId::new())
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Snapshot of a product's stock position.
///
/// `stock_queue` should sum to `stock_quantity` / `stock_value` within
/// [`costledger_core::COST_TOLERANCE`]; external writers can break that and
/// the valuation engine can detect and repair it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub code: String,
    #[serde(default)]
    pub valuation_method: ValuationMethod,
    #[serde(default)]
    pub stock_quantity: f64,
    /// Current aggregate unit rate.
    #[serde(default)]
    pub cost_price: f64,
    #[serde(default)]
    pub stock_value: f64,
    #[serde(default)]
    pub stock_queue: StockQueue,
}

impl Product {
    /// A freshly created product: no stock, empty queue.
    pub fn new(id: ProductId, code: impl Into<String>, valuation_method: ValuationMethod) -> Self {
        Self {
            id,
            code: code.into(),
            valuation_method,
            stock_quantity: 0.0,
            cost_price: 0.0,
            stock_value: 0.0,
            stock_queue: StockQueue::new(),
        }
    }

    /// Seed an opening balance as a single layer (migration/import helper).
    pub fn with_opening_balance(mut self, qty: f64, rate: f64) -> Self {
        self.stock_quantity = qty;
        self.cost_price = rate;
        self.stock_value = qty * rate;
        self.stock_queue = StockQueue::single_layer(qty, rate);
        self
    }

    /// `stock_value / stock_quantity`, or 0 with no stock.
    pub fn average_rate(&self) -> f64 {
        safe_div(self.stock_value, self.stock_quantity)
    }

    pub fn has_stock(&self) -> bool {
        self.stock_quantity > 0.0
    }

    /// Queue quantity and value agree with the aggregate figures.
    pub fn queue_matches_totals(&self) -> bool {
        approx_eq(self.stock_queue.total_quantity(), self.stock_quantity)
            && approx_eq(self.stock_queue.total_value(), self.stock_value)
    }
}
