//! Products: the stock-bearing snapshot the valuation engine operates on.
//!
//! Plain data only (no IO, no storage). A [`Product`] carries its aggregate
//! stock figures and the cost-layer queue backing them.

pub mod batch;
pub mod method;
pub mod product;

pub use batch::{StockBatch, StockQueue};
pub use method::ValuationMethod;
pub use product::{Product, ProductId};
