use costledger_products::{StockBatch, StockQueue, ValuationMethod};

use super::consume::{Order, consume};
use super::{PriorStock, ValuationStrategy};
use crate::result::{IncomingValuation, OutgoingValuation};

/// First-in-first-out: issues consume the oldest layers first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fifo;

/// Receipt shared by the layered methods: append a layer, keep the rate.
pub(super) fn append_layer(
    prior: PriorStock<'_>,
    incoming_qty: f64,
    incoming_rate: f64,
) -> IncomingValuation {
    IncomingValuation {
        new_qty: prior.qty + incoming_qty,
        new_rate: prior.rate,
        new_value: prior.value + incoming_qty * incoming_rate,
        new_queue: prior
            .queue
            .appended(StockBatch::new(incoming_qty, incoming_rate)),
    }
}

impl ValuationStrategy for Fifo {
    fn method(&self) -> ValuationMethod {
        ValuationMethod::Fifo
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
        consume(current_qty, queue, outgoing_qty, Order::OldestFirst)
    }

    fn current_rate(&self, queue: &StockQueue) -> f64 {
        queue.first().map_or(0.0, |b| b.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_layers() -> StockQueue {
        StockQueue::from(vec![StockBatch::new(100.0, 10.0), StockBatch::new(50.0, 12.0)])
    }

    #[test]
    fn issue_consumes_oldest_layer_first() {
        let out = Fifo.calculate_outgoing_rate(150.0, &two_layers(), 120.0);

        assert_eq!(out.cost_of_goods_sold, 1240.0);
        assert_eq!(out.new_queue.as_slice(), &[StockBatch::new(30.0, 12.0)]);
        assert_eq!(out.new_qty, 30.0);
        assert_eq!(out.new_value, 360.0);
        assert!((out.rate - 1240.0 / 120.0).abs() < 1e-12);
    }

    #[test]
    fn partial_issue_keeps_remainder_in_place() {
        let out = Fifo.calculate_outgoing_rate(150.0, &two_layers(), 40.0);

        assert_eq!(out.cost_of_goods_sold, 400.0);
        assert_eq!(out.rate, 10.0);
        assert_eq!(
            out.new_queue.as_slice(),
            &[StockBatch::new(60.0, 10.0), StockBatch::new(50.0, 12.0)]
        );
    }

    #[test]
    fn exact_depletion_empties_the_queue() {
        let out = Fifo.calculate_outgoing_rate(150.0, &two_layers(), 150.0);

        assert_eq!(out.new_qty, 0.0);
        assert!(out.new_queue.is_empty());
        assert_eq!(out.new_value, 0.0);
        assert_eq!(out.cost_of_goods_sold, 1600.0);
    }

    #[test]
    fn receipt_appends_layer_and_keeps_rate() {
        let queue = two_layers();
        let prior = PriorStock {
            qty: 150.0,
            rate: 10.0,
            value: 1600.0,
            queue: &queue,
        };

        let inc = Fifo.calculate_incoming_rate(prior, 20.0, 15.0);

        assert_eq!(inc.new_qty, 170.0);
        assert_eq!(inc.new_rate, 10.0);
        assert_eq!(inc.new_value, 1900.0);
        assert_eq!(inc.new_queue.len(), 3);
        assert_eq!(inc.new_queue.last(), Some(&StockBatch::new(20.0, 15.0)));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn current_rate_is_oldest_layer_rate() {
        assert_eq!(Fifo.current_rate(&two_layers()), 10.0);
        assert_eq!(Fifo.current_rate(&StockQueue::new()), 0.0);
    }
}
