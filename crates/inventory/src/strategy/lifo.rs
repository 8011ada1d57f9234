use costledger_products::{StockQueue, ValuationMethod};

use super::consume::{Order, consume};
use super::fifo::append_layer;
use super::{PriorStock, ValuationStrategy};
use crate::result::{IncomingValuation, OutgoingValuation};

/// Last-in-first-out: receipts append at the tail like FIFO; issues walk
/// back from the tail, so the newest layers go first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lifo;

impl ValuationStrategy for Lifo {
    fn method(&self) -> ValuationMethod {
        ValuationMethod::Lifo
    }

    fn calculate_incoming_rate(
        &self,
        prior: PriorStock<'_>,
        incoming_qty: f64,
        incoming_rate: f64,
    ) -> IncomingValuation {
        append_layer(prior, incoming_qty, incoming_rate)
    }

    fn calculate_outgoing_rate(
        &self,
        current_qty: f64,
        queue: &StockQueue,
        outgoing_qty: f64,
    ) -> OutgoingValuation {
        consume(current_qty, queue, outgoing_qty, Order::NewestFirst)
    }

    fn current_rate(&self, queue: &StockQueue) -> f64 {
        queue.last().map_or(0.0, |b| b.rate)
    }
}
