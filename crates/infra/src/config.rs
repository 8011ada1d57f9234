//! Configuration loading for the stock movement layer.

use costledger_products::ValuationMethod;

pub const AUTO_REPAIR_ENV: &str = "COSTLEDGER_AUTO_REPAIR";
pub const DEFAULT_METHOD_ENV: &str = "COSTLEDGER_DEFAULT_METHOD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValuationConfig {
    /// Repair an inconsistent queue before applying a movement, and during
    /// reconciliation. When off, inconsistencies are only reported.
    pub auto_repair: bool,
    /// Method for products registered without one.
    pub default_method: ValuationMethod,
}

impl ValuationConfig {
    /// Read `COSTLEDGER_AUTO_REPAIR` and `COSTLEDGER_DEFAULT_METHOD`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing or unparsable values keep
    /// their defaults (unparsable ones are logged).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let auto_repair = match lookup(AUTO_REPAIR_ENV) {
            None => defaults.auto_repair,
            Some(raw) => parse_flag(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    "{AUTO_REPAIR_ENV}={raw:?} is not a boolean; using {}",
                    defaults.auto_repair
                );
                defaults.auto_repair
            }),
        };

        let default_method = match lookup(DEFAULT_METHOD_ENV) {
            None => defaults.default_method,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "{DEFAULT_METHOD_ENV}={raw:?} is not a valuation method; using {}",
                    defaults.default_method
                );
                defaults.default_method
            }),
        };

        Self {
            auto_repair,
            default_method,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
