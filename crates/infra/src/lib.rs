//! Infrastructure around the valuation engine: product storage, serialized
//! stock movements with event publication, reconciliation, configuration,
//! and movement-script replay.

pub mod config;
pub mod movement;
pub mod repository;
pub mod script;

pub use config::ValuationConfig;
pub use movement::{
    InventoryValuationSummary, MovementError, PRODUCT_STREAM, ReconciliationReport,
    StockMovementService, ValuationEnvelope,
};
pub use repository::{InMemoryProductRepository, ProductRepository};
pub use script::{Movement, MovementOutcome};
