use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use costledger_core::DomainError;

/// Inventory valuation convention configured on a product.
///
/// Serialized as its canonical tag. Unknown tags deserialize to
/// [`ValuationMethod::WeightedAverage`] so snapshots written by newer
/// producers stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValuationMethod {
    #[default]
    WeightedAverage,
    Fifo,
    Lifo,
    MovingAverage,
}

impl ValuationMethod {
    /// All methods in canonical order.
    pub const ALL: [ValuationMethod; 4] = [
        ValuationMethod::WeightedAverage,
        ValuationMethod::Fifo,
        ValuationMethod::Lifo,
        ValuationMethod::MovingAverage,
    ];

    /// Canonical tag.
    pub fn as_str(self) -> &'static str {
        match self {
            ValuationMethod::WeightedAverage => "WeightedAverage",
            ValuationMethod::Fifo => "FIFO",
            ValuationMethod::Lifo => "LIFO",
            ValuationMethod::MovingAverage => "MovingAverage",
        }
    }

    /// Exact match against the canonical tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == tag)
    }

    /// Exact match, silently falling back to `WeightedAverage` for anything
    /// unrecognized (including the empty string).
    pub fn parse_or_default(tag: &str) -> Self {
        Self::from_tag(tag).unwrap_or_default()
    }

    /// Layers are blended into a single average layer.
    pub fn is_average(self) -> bool {
        matches!(
            self,
            ValuationMethod::WeightedAverage | ValuationMethod::MovingAverage
        )
    }

    /// Layers are kept distinct and consumed in receipt order (or reverse).
    pub fn is_layered(self) -> bool {
        !self.is_average()
    }
}

impl core::fmt::Display for ValuationMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValuationMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s)
            .ok_or_else(|| DomainError::validation(format!("unknown valuation method: {s}")))
    }
}

impl Serialize for ValuationMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ValuationMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = Option::<String>::deserialize(deserializer)?;
        Ok(tag
            .as_deref()
            .map(Self::parse_or_default)
            .unwrap_or_default())
    }
}
