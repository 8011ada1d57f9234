//! Layer-by-layer consumption shared by FIFO and LIFO.

use costledger_core::safe_div;
use costledger_products::{StockBatch, StockQueue};

use crate::result::OutgoingValuation;

/// Remainders at or below this are floating-point residue, not stock.
const DUST: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Order {
    OldestFirst,
    NewestFirst,
}

#[derive(Debug, Default)]
struct Walk {
    remaining: f64,
    cogs: f64,
    kept: Vec<StockBatch>,
}

impl Walk {
    fn step(mut self, batch: &StockBatch) -> Self {
        let take = batch.qty.min(self.remaining.max(0.0));
        self.cogs += take * batch.rate;
        self.remaining -= take;

        let left = batch.qty - take;
        if left > DUST {
            self.kept.push(StockBatch::new(left, batch.rate));
        }
        self
    }
}

/// Issue `outgoing_qty` from `queue`, walking layers in `order`.
///
/// Partially consumed layers keep their rate and position. If the queue
/// holds less than `outgoing_qty`, only what it holds is costed.
pub(crate) fn consume(
    current_qty: f64,
    queue: &StockQueue,
    outgoing_qty: f64,
    order: Order,
) -> OutgoingValuation {
    let start = Walk {
        remaining: outgoing_qty,
        ..Walk::default()
    };

    let walk = match order {
        Order::OldestFirst => queue.iter().fold(start, Walk::step),
        Order::NewestFirst => queue.iter().rev().fold(start, Walk::step),
    };

    let mut kept = walk.kept;
    if order == Order::NewestFirst {
        kept.reverse();
    }
    let new_queue = StockQueue::from(kept);

    OutgoingValuation {
        cost_of_goods_sold: walk.cogs,
        rate: safe_div(walk.cogs, outgoing_qty),
        new_qty: current_qty - outgoing_qty,
        new_value: new_queue.total_value(),
        new_queue,
    }
}
