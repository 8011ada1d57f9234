use costledger_core::safe_div;
use costledger_products::{StockQueue, ValuationMethod};

use super::{PriorStock, ValuationStrategy};
use crate::result::{IncomingValuation, OutgoingValuation};

/// Weighted average: every receipt re-blends the whole position into a
/// single layer at `value / qty`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedAverage;

/// Moving average. Same arithmetic as [`WeightedAverage`]; the two differ in
/// how they are presented to users, not in how they cost stock.
#[derive(Debug, Clone, Copy, Default)]
pub struct MovingAverage;

fn blend(prior: PriorStock<'_>, incoming_qty: f64, incoming_rate: f64) -> IncomingValuation {
    let new_qty = prior.qty + incoming_qty;
    let new_value = prior.value + incoming_qty * incoming_rate;
    let new_rate = safe_div(new_value, new_qty);

    IncomingValuation {
        new_qty,
        new_rate,
        new_value,
        new_queue: StockQueue::single_layer(new_qty, new_rate),
    }
}

fn issue_at_average(current_qty: f64, queue: &StockQueue, outgoing_qty: f64) -> OutgoingValuation {
    let rate = average_rate(queue);
    let new_qty = current_qty - outgoing_qty;

    OutgoingValuation {
        cost_of_goods_sold: outgoing_qty * rate,
        rate,
        new_qty,
        new_queue: StockQueue::single_layer(new_qty, rate),
        new_value: new_qty * rate,
    }
}

fn average_rate(queue: &StockQueue) -> f64 {
    queue.first().map_or(0.0, |b| b.rate)
}

impl ValuationStrategy for WeightedAverage {
    fn method(&self) -> ValuationMethod {
        ValuationMethod::WeightedAverage
    }

    fn calculate_incoming_rate(
        &self,
        prior: PriorStock<'_>,
        incoming_qty: f64,
        incoming_rate: f64,
    ) -> IncomingValuation {
        blend(prior, incoming_qty, incoming_rate)
    }

    fn calculate_outgoing_rate(
        &self,
        current_qty: f64,
        queue: &StockQueue,
        outgoing_qty: f64,
    ) -> OutgoingValuation {
        issue_at_average(current_qty, queue, outgoing_qty)
    }

    fn current_rate(&self, queue: &StockQueue) -> f64 {
        average_rate(queue)
    }
}

impl ValuationStrategy for MovingAverage {
    fn method(&self) -> ValuationMethod {
        ValuationMethod::MovingAverage
    }

    fn calculate_incoming_rate(
        &self,
        prior: PriorStock<'_>,
        incoming_qty: f64,
        incoming_rate: f64,
    ) -> IncomingValuation {
        blend(prior, incoming_qty, incoming_rate)
    }

    fn calculate_outgoing_rate(
        &self,
        current_qty: f64,
        queue: &StockQueue,
        outgoing_qty: f64,
    ) -> OutgoingValuation {
        issue_at_average(current_qty, queue, outgoing_qty)
    }

    fn current_rate(&self, queue: &StockQueue) -> f64 {
        average_rate(queue)
    }
}
