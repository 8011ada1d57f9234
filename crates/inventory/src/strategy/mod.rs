//! Per-method cost algorithms.
//!
//! Every strategy is a pure transform: it reads a prior stock position and a
//! movement and returns fresh figures and a fresh queue. None of them check
//! whether an issue exceeds the stock on hand; the engine does that first.

mod average;
mod consume;
mod fifo;
mod lifo;

pub use average::{MovingAverage, WeightedAverage};
pub use fifo::Fifo;
pub use lifo::Lifo;

use costledger_products::{Product, StockQueue, ValuationMethod};

use crate::result::{IncomingValuation, OutgoingValuation};

/// Stock position before a receipt.
#[derive(Debug, Clone, Copy)]
pub struct PriorStock<'a> {
    pub qty: f64,
    pub rate: f64,
    pub value: f64,
    pub queue: &'a StockQueue,
}

impl<'a> PriorStock<'a> {
    pub fn of(product: &'a Product) -> Self {
        Self {
            qty: product.stock_quantity,
            rate: product.cost_price,
            value: product.stock_value,
            queue: &product.stock_queue,
        }
    }
}

/// Contract shared by the four valuation methods.
pub trait ValuationStrategy: Send + Sync {
    fn method(&self) -> ValuationMethod;

    /// Value a receipt of `incoming_qty` units at `incoming_rate`.
    fn calculate_incoming_rate(
        &self,
        prior: PriorStock<'_>,
        incoming_qty: f64,
        incoming_rate: f64,
    ) -> IncomingValuation;

    /// Cost an issue of `outgoing_qty` units out of `queue`.
    ///
    /// The caller must already have checked `outgoing_qty <= current_qty`.
    fn calculate_outgoing_rate(
        &self,
        current_qty: f64,
        queue: &StockQueue,
        outgoing_qty: f64,
    ) -> OutgoingValuation;

    /// Rate the next issued unit would be costed at.
    fn current_rate(&self, queue: &StockQueue) -> f64;
}

/// Strategy implementing `method`.
pub fn strategy_for(method: ValuationMethod) -> &'static dyn ValuationStrategy {
    match method {
        ValuationMethod::WeightedAverage => &WeightedAverage,
        ValuationMethod::Fifo => &Fifo,
        ValuationMethod::Lifo => &Lifo,
        ValuationMethod::MovingAverage => &MovingAverage,
    }
}

/// Strategy for a raw method tag; anything unrecognized gets Weighted Average.
pub fn strategy_for_tag(tag: &str) -> &'static dyn ValuationStrategy {
    strategy_for(ValuationMethod::parse_or_default(tag))
}
