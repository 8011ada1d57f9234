//! Results returned by the valuation engine.
//!
//! Results are plain data. The caller persists them, typically through
//! `apply_to`, which writes the figures back onto a product snapshot.

use serde::{Deserialize, Serialize};

use costledger_products::{Product, StockQueue};

/// Outcome of a receipt.
///
/// `new_rate` is the blended rate for average methods and the unchanged prior
/// rate for FIFO/LIFO, whose layers are never blended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingValuation {
    pub new_qty: f64,
    pub new_rate: f64,
    pub new_value: f64,
    pub new_queue: StockQueue,
}

impl IncomingValuation {
    /// `product` with this receipt written back.
    pub fn apply_to(&self, product: &Product) -> Product {
        Product {
            stock_quantity: self.new_qty,
            cost_price: self.new_rate,
            stock_value: self.new_value,
            stock_queue: self.new_queue.clone(),
            ..product.clone()
        }
    }
}

/// Outcome of an issue.
///
/// `rate` is the effective unit rate the issued quantity was costed at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingValuation {
    pub cost_of_goods_sold: f64,
    pub rate: f64,
    pub new_qty: f64,
    pub new_queue: StockQueue,
    pub new_value: f64,
}

impl OutgoingValuation {
    /// `product` with this issue written back.
    ///
    /// Average methods carry the issue rate as the product's cost price;
    /// layered methods keep their cost price.
    pub fn apply_to(&self, product: &Product) -> Product {
        let cost_price = if product.valuation_method.is_average() {
            self.rate
        } else {
            product.cost_price
        };

        Product {
            stock_quantity: self.new_qty,
            cost_price,
            stock_value: self.new_value,
            stock_queue: self.new_queue.clone(),
            ..product.clone()
        }
    }
}
