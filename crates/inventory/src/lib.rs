//! Inventory valuation engine.
//!
//! Computes cost layers and cost of goods sold under Weighted Average, FIFO,
//! LIFO and Moving Average, and keeps a product's cost-layer queue consistent
//! with its aggregate figures. Pure domain logic: no IO, no storage.

pub mod engine;
pub mod error;
pub mod event;
pub mod method_info;
pub mod result;
pub mod strategy;

pub use engine::ValuationEngine;
pub use error::ValuationError;
pub use event::{
    InventoryValuationEvent, StockIssued, StockQueueRepaired, StockReceived,
    ValuationMethodConverted,
};
pub use method_info::{ValuationMethodInfo, all_method_info, method_info, method_info_for_tag};
pub use result::{IncomingValuation, OutgoingValuation};
pub use strategy::{
    Fifo, Lifo, MovingAverage, PriorStock, ValuationStrategy, WeightedAverage, strategy_for,
    strategy_for_tag,
};
