//! Facts emitted when a product's stock valuation changes.
//!
//! The engine never builds these itself; orchestration layers derive them
//! from engine results once the new snapshot has been persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use costledger_events::Event;
use costledger_products::{Product, ProductId, ValuationMethod};

use crate::result::{IncomingValuation, OutgoingValuation};

/// Event: StockReceived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockReceived {
    pub product_id: ProductId,
    pub code: String,
    pub method: ValuationMethod,
    pub quantity: f64,
    pub rate: f64,
    pub new_quantity: f64,
    pub new_value: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockIssued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockIssued {
    pub product_id: ProductId,
    pub code: String,
    pub method: ValuationMethod,
    pub quantity: f64,
    pub cost_of_goods_sold: f64,
    pub rate: f64,
    pub new_quantity: f64,
    pub new_value: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ValuationMethodConverted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationMethodConverted {
    pub product_id: ProductId,
    pub code: String,
    pub from: ValuationMethod,
    pub to: ValuationMethod,
    pub quantity: f64,
    pub value: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockQueueRepaired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQueueRepaired {
    pub product_id: ProductId,
    pub code: String,
    pub discarded_layers: usize,
    pub quantity: f64,
    pub value: f64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InventoryValuationEvent {
    StockReceived(StockReceived),
    StockIssued(StockIssued),
    ValuationMethodConverted(ValuationMethodConverted),
    StockQueueRepaired(StockQueueRepaired),
}

impl InventoryValuationEvent {
    pub fn received(
        product: &Product,
        quantity: f64,
        rate: f64,
        result: &IncomingValuation,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self::StockReceived(StockReceived {
            product_id: product.id,
            code: product.code.clone(),
            method: product.valuation_method,
            quantity,
            rate,
            new_quantity: result.new_qty,
            new_value: result.new_value,
            occurred_at,
        })
    }

    pub fn issued(
        product: &Product,
        quantity: f64,
        result: &OutgoingValuation,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self::StockIssued(StockIssued {
            product_id: product.id,
            code: product.code.clone(),
            method: product.valuation_method,
            quantity,
            cost_of_goods_sold: result.cost_of_goods_sold,
            rate: result.rate,
            new_quantity: result.new_qty,
            new_value: result.new_value,
            occurred_at,
        })
    }

    pub fn converted(before: &Product, after: &Product, occurred_at: DateTime<Utc>) -> Self {
        Self::ValuationMethodConverted(ValuationMethodConverted {
            product_id: after.id,
            code: after.code.clone(),
            from: before.valuation_method,
            to: after.valuation_method,
            quantity: after.stock_quantity,
            value: after.stock_value,
            occurred_at,
        })
    }

    pub fn repaired(before: &Product, after: &Product, occurred_at: DateTime<Utc>) -> Self {
        Self::StockQueueRepaired(StockQueueRepaired {
            product_id: after.id,
            code: after.code.clone(),
            discarded_layers: before.stock_queue.len(),
            quantity: after.stock_quantity,
            value: after.stock_value,
            occurred_at,
        })
    }

    pub fn product_id(&self) -> ProductId {
        match self {
            InventoryValuationEvent::StockReceived(e) => e.product_id,
            InventoryValuationEvent::StockIssued(e) => e.product_id,
            InventoryValuationEvent::ValuationMethodConverted(e) => e.product_id,
            InventoryValuationEvent::StockQueueRepaired(e) => e.product_id,
        }
    }
}

impl Event for InventoryValuationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryValuationEvent::StockReceived(_) => "inventory.valuation.stock_received",
            InventoryValuationEvent::StockIssued(_) => "inventory.valuation.stock_issued",
            InventoryValuationEvent::ValuationMethodConverted(_) => {
                "inventory.valuation.method_converted"
            }
            InventoryValuationEvent::StockQueueRepaired(_) => "inventory.valuation.queue_repaired",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryValuationEvent::StockReceived(e) => e.occurred_at,
            InventoryValuationEvent::StockIssued(e) => e.occurred_at,
            InventoryValuationEvent::ValuationMethodConverted(e) => e.occurred_at,
            InventoryValuationEvent::StockQueueRepaired(e) => e.occurred_at,
        }
    }
}
