use thiserror::Error;

use costledger_core::DomainError;

/// The only failure the valuation engine raises.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValuationError {
    /// An issue asked for more than the recorded stock quantity.
    #[error("Insufficient stock for {code}: requested {requested}, available {available}")]
    InsufficientStock {
        code: String,
        requested: f64,
        available: f64,
    },
}

impl ValuationError {
    pub fn insufficient_stock(code: impl Into<String>, requested: f64, available: f64) -> Self {
        Self::InsufficientStock {
            code: code.into(),
            requested,
            available,
        }
    }
}

impl From<ValuationError> for DomainError {
    fn from(err: ValuationError) -> Self {
        DomainError::invariant(err.to_string())
    }
}
