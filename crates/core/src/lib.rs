//! `costledger-core`: shared building blocks for the costing domain.
//!
//! Pure primitives only: identifiers, the domain error model and the numeric
//! tolerance used when comparing cost figures.

pub mod error;
pub mod id;
pub mod numeric;

pub use error::DomainError;
pub use id::{AggregateId, TenantId};
pub use numeric::{COST_TOLERANCE, approx_eq, safe_div};
