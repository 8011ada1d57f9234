//! Stock movement service: read, value, write back, publish.
//!
//! The valuation engine is pure and does not guard against two movements
//! computed from the same stale snapshot. This service does: each product
//! has a mutex held across the whole read-compute-write cycle, and the same
//! mutex owns the product's event sequence counter.
//!
//! A movement is committed only once its event is published. If the bus
//! refuses the event, the stored snapshot is rolled back and the sequence
//! counter is left untouched, so an `Err` always means nothing changed and
//! the call can be retried.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use costledger_core::TenantId;
use costledger_events::{EventBus, EventEnvelope};
use costledger_inventory::{
    IncomingValuation, InventoryValuationEvent, OutgoingValuation, ValuationEngine,
    ValuationError,
};
use costledger_products::{Product, ProductId, ValuationMethod};

use crate::config::ValuationConfig;
use crate::repository::ProductRepository;

/// Stream type stamped on every published envelope.
pub const PRODUCT_STREAM: &str = "inventory.product";

pub type ValuationEnvelope = EventEnvelope<InventoryValuationEvent>;

#[derive(Debug, Error)]
pub enum MovementError {
    #[error(transparent)]
    Valuation(#[from] ValuationError),

    #[error("product not found: {0}")]
    ProductNotFound(String),

    #[error("product code already registered: {0}")]
    DuplicateCode(String),

    #[error("failed to publish valuation event: {0}")]
    Publish(String),

    #[error("product lock poisoned: {0}")]
    LockPoisoned(ProductId),
}

/// Outcome of a reconciliation pass over one tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    pub checked: usize,
    /// Codes whose queue disagreed with their totals.
    pub inconsistent: Vec<String>,
    /// Codes whose queue was rebuilt (only with auto-repair on).
    pub repaired: Vec<String>,
}

impl ReconciliationReport {
    pub fn is_clean(&self) -> bool {
        self.inconsistent.is_empty()
    }
}

/// Tenant-wide inventory valuation totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventoryValuationSummary {
    pub total_products: usize,
    pub stocked_products: usize,
    pub total_quantity: f64,
    pub total_value: f64,
}

type StreamKey = (TenantId, ProductId);

pub struct StockMovementService<R, B>
where
    R: ProductRepository,
    B: EventBus<ValuationEnvelope>,
{
    engine: ValuationEngine,
    repository: R,
    bus: B,
    config: ValuationConfig,
    /// Per-product lock; the guarded value is the last published sequence number.
    streams: Mutex<HashMap<StreamKey, Arc<Mutex<u64>>>>,
}

impl<R, B> StockMovementService<R, B>
where
    R: ProductRepository,
    B: EventBus<ValuationEnvelope>,
{
    pub fn new(repository: R, bus: B, config: ValuationConfig) -> Self {
        Self {
            engine: ValuationEngine::new(),
            repository,
            bus,
            config,
            streams: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn engine(&self) -> &ValuationEngine {
        &self.engine
    }

    /// Create an empty product. `method` defaults to the configured one.
    pub fn register_product(
        &self,
        tenant_id: TenantId,
        code: impl Into<String>,
        method: Option<ValuationMethod>,
    ) -> Result<Product, MovementError> {
        let product = Product::new(
            ProductId::generate(),
            code,
            method.unwrap_or(self.config.default_method),
        );
        if !self.repository.insert_new(tenant_id, product.clone()) {
            return Err(MovementError::DuplicateCode(product.code));
        }
        tracing::info!(
            tenant = %tenant_id,
            product = %product.code,
            method = %product.valuation_method,
            "registered product"
        );
        Ok(product)
    }

    pub fn product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Product, MovementError> {
        self.repository
            .get(tenant_id, &product_id)
            .ok_or_else(|| MovementError::ProductNotFound(product_id.to_string()))
    }

    pub fn product_by_code(
        &self,
        tenant_id: TenantId,
        code: &str,
    ) -> Result<Product, MovementError> {
        self.repository
            .find_by_code(tenant_id, code)
            .ok_or_else(|| MovementError::ProductNotFound(code.to_string()))
    }

    /// Value and record a receipt.
    pub fn receive(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        qty: f64,
        rate: f64,
    ) -> Result<IncomingValuation, MovementError> {
        let stream = self.stream(tenant_id, product_id);
        let mut seq = lock(&stream, product_id)?;
        let product = self.load_consistent(tenant_id, product_id, &mut seq)?;

        let result = self.engine.process_incoming_stock(&product, qty, rate);
        self.commit(
            tenant_id,
            &mut seq,
            &product,
            result.apply_to(&product),
            InventoryValuationEvent::received(&product, qty, rate, &result, Utc::now()),
        )?;

        Ok(result)
    }

    /// Cost and record an issue. Nothing is written when stock is short.
    pub fn issue(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        qty: f64,
    ) -> Result<OutgoingValuation, MovementError> {
        let stream = self.stream(tenant_id, product_id);
        let mut seq = lock(&stream, product_id)?;
        let product = self.load_consistent(tenant_id, product_id, &mut seq)?;

        let result = self.engine.process_outgoing_stock(&product, qty)?;
        self.commit(
            tenant_id,
            &mut seq,
            &product,
            result.apply_to(&product),
            InventoryValuationEvent::issued(&product, qty, &result, Utc::now()),
        )?;

        Ok(result)
    }

    /// Switch a product's valuation method, conserving quantity and value.
    pub fn convert(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        method: ValuationMethod,
    ) -> Result<Product, MovementError> {
        let stream = self.stream(tenant_id, product_id);
        let mut seq = lock(&stream, product_id)?;
        let product = self.product(tenant_id, product_id)?;

        let converted = self.engine.convert_valuation_method(&product, method);
        let event = InventoryValuationEvent::converted(&product, &converted, Utc::now());
        self.commit(tenant_id, &mut seq, &product, converted.clone(), event)?;

        Ok(converted)
    }

    /// Rebuild a product's queue from its totals, whether or not it is
    /// currently consistent.
    pub fn repair(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Product, MovementError> {
        let stream = self.stream(tenant_id, product_id);
        let mut seq = lock(&stream, product_id)?;
        let product = self.product(tenant_id, product_id)?;
        self.repair_locked(tenant_id, &product, &mut seq)
    }

    pub fn current_rate(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<f64, MovementError> {
        let product = self.product(tenant_id, product_id)?;
        Ok(self.engine.get_current_rate(&product))
    }

    /// Validate every product of a tenant; with auto-repair on, rebuild the
    /// ones that fail.
    pub fn reconcile(&self, tenant_id: TenantId) -> Result<ReconciliationReport, MovementError> {
        let mut report = ReconciliationReport::default();

        for listed in self.repository.list(tenant_id) {
            report.checked += 1;

            let stream = self.stream(tenant_id, listed.id);
            let mut seq = lock(&stream, listed.id)?;
            let Some(product) = self.repository.get(tenant_id, &listed.id) else {
                continue;
            };

            if self.engine.validate_stock_queue(&product) {
                continue;
            }
            report.inconsistent.push(product.code.clone());

            if self.config.auto_repair {
                self.repair_locked(tenant_id, &product, &mut seq)?;
                report.repaired.push(product.code.clone());
            }
        }

        tracing::info!(
            tenant = %tenant_id,
            checked = report.checked,
            inconsistent = report.inconsistent.len(),
            repaired = report.repaired.len(),
            "reconciled stock queues"
        );

        Ok(report)
    }

    pub fn summary(&self, tenant_id: TenantId) -> InventoryValuationSummary {
        self.repository
            .list(tenant_id)
            .iter()
            .fold(InventoryValuationSummary::default(), |mut acc, p| {
                acc.total_products += 1;
                if p.has_stock() {
                    acc.stocked_products += 1;
                }
                acc.total_quantity += p.stock_quantity;
                acc.total_value += p.stock_value;
                acc
            })
    }

    fn stream(&self, tenant_id: TenantId, product_id: ProductId) -> Arc<Mutex<u64>> {
        match self.streams.lock() {
            Ok(mut streams) => streams.entry((tenant_id, product_id)).or_default().clone(),
            // The registry only maps keys to locks; a panic elsewhere cannot
            // leave it half-updated.
            Err(poisoned) => poisoned
                .into_inner()
                .entry((tenant_id, product_id))
                .or_default()
                .clone(),
        }
    }

    /// Load a product, repairing it first when auto-repair is on and its
    /// queue has drifted from its totals.
    fn load_consistent(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        seq: &mut u64,
    ) -> Result<Product, MovementError> {
        let product = self.product(tenant_id, product_id)?;
        if !self.config.auto_repair || self.engine.validate_stock_queue(&product) {
            return Ok(product);
        }
        self.repair_locked(tenant_id, &product, seq)
    }

    fn repair_locked(
        &self,
        tenant_id: TenantId,
        product: &Product,
        seq: &mut u64,
    ) -> Result<Product, MovementError> {
        let repaired = self.engine.repair_stock_queue(product);
        let event = InventoryValuationEvent::repaired(product, &repaired, Utc::now());
        self.commit(tenant_id, seq, product, repaired.clone(), event)?;
        Ok(repaired)
    }

    /// Store `updated` and publish its event under the next sequence number.
    /// On a publish failure `previous` is restored and `seq` is not advanced.
    fn commit(
        &self,
        tenant_id: TenantId,
        seq: &mut u64,
        previous: &Product,
        updated: Product,
        event: InventoryValuationEvent,
    ) -> Result<(), MovementError> {
        let next = *seq + 1;
        let envelope =
            EventEnvelope::new(tenant_id, event.product_id().0, PRODUCT_STREAM, next, event);

        self.repository.save(tenant_id, updated);
        match self.bus.publish(envelope) {
            Ok(()) => {
                *seq = next;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    tenant = %tenant_id,
                    product = %previous.code,
                    sequence = next,
                    error = %e,
                    "valuation event not published, rolling back"
                );
                self.repository.save(tenant_id, previous.clone());
                Err(MovementError::Publish(e.to_string()))
            }
        }
    }
}

fn lock(
    stream: &Mutex<u64>,
    product_id: ProductId,
) -> Result<MutexGuard<'_, u64>, MovementError> {
    stream
        .lock()
        .map_err(|_| MovementError::LockPoisoned(product_id))
}
