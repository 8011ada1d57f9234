//! Movement scripts: a JSON list of stock operations keyed by product code,
//! replayed through [`StockMovementService`]. Used for imports, demos and
//! reproducing valuation issues from production data.

use serde::{Deserialize, Serialize};

use costledger_core::TenantId;
use costledger_events::EventBus;
use costledger_products::ValuationMethod;

use crate::movement::{MovementError, StockMovementService, ValuationEnvelope};
use crate::repository::ProductRepository;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Movement {
    Register {
        code: String,
        #[serde(default)]
        method: Option<ValuationMethod>,
    },
    Receive {
        code: String,
        qty: f64,
        rate: f64,
    },
    Issue {
        code: String,
        qty: f64,
    },
    Convert {
        code: String,
        method: ValuationMethod,
    },
    Repair {
        code: String,
    },
}

impl Movement {
    pub fn code(&self) -> &str {
        match self {
            Movement::Register { code, .. }
            | Movement::Receive { code, .. }
            | Movement::Issue { code, .. }
            | Movement::Convert { code, .. }
            | Movement::Repair { code } => code,
        }
    }
}

/// Result of replaying one movement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementOutcome {
    pub line: usize,
    pub code: String,
    /// COGS for issues.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_of_goods_sold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn parse(json: &str) -> Result<Vec<Movement>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Apply a single movement.
pub fn apply<R, B>(
    service: &StockMovementService<R, B>,
    tenant_id: TenantId,
    movement: &Movement,
) -> Result<Option<f64>, MovementError>
where
    R: ProductRepository,
    B: EventBus<ValuationEnvelope>,
{
    match movement {
        Movement::Register { code, method } => {
            service.register_product(tenant_id, code.clone(), *method)?;
            Ok(None)
        }
        Movement::Receive { code, qty, rate } => {
            let product = service.product_by_code(tenant_id, code)?;
            service.receive(tenant_id, product.id, *qty, *rate)?;
            Ok(None)
        }
        Movement::Issue { code, qty } => {
            let product = service.product_by_code(tenant_id, code)?;
            let out = service.issue(tenant_id, product.id, *qty)?;
            Ok(Some(out.cost_of_goods_sold))
        }
        Movement::Convert { code, method } => {
            let product = service.product_by_code(tenant_id, code)?;
            service.convert(tenant_id, product.id, *method)?;
            Ok(None)
        }
        Movement::Repair { code } => {
            let product = service.product_by_code(tenant_id, code)?;
            service.repair(tenant_id, product.id)?;
            Ok(None)
        }
    }
}

/// Apply every movement in order. A failed movement is recorded and
/// skipped; later movements still run.
pub fn replay<R, B>(
    service: &StockMovementService<R, B>,
    tenant_id: TenantId,
    movements: &[Movement],
) -> Vec<MovementOutcome>
where
    R: ProductRepository,
    B: EventBus<ValuationEnvelope>,
{
    movements
        .iter()
        .enumerate()
        .map(|(idx, movement)| {
            let (cost_of_goods_sold, error) = match apply(service, tenant_id, movement) {
                Ok(cogs) => (cogs, None),
                Err(e) => {
                    tracing::warn!(line = idx + 1, code = movement.code(), "movement failed: {e}");
                    (None, Some(e.to_string()))
                }
            };
            MovementOutcome {
                line: idx + 1,
                code: movement.code().to_string(),
                cost_of_goods_sold,
                error,
            }
        })
        .collect()
}
