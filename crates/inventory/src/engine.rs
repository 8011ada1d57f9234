//! Valuation engine: method dispatch plus queue validation, repair and
//! method conversion.
//!
//! The engine holds no state. Each operation reads a product snapshot and
//! returns a result (or a new snapshot) for the caller to persist. Two
//! movements computed from the same stale snapshot can both pass the
//! stock check, so callers must serialize read-modify-write cycles per
//! product.

use costledger_products::{Product, StockQueue, ValuationMethod};

use crate::error::ValuationError;
use crate::method_info::{self, ValuationMethodInfo};
use crate::result::{IncomingValuation, OutgoingValuation};
use crate::strategy::{PriorStock, ValuationStrategy, strategy_for};

#[derive(Debug, Clone, Copy, Default)]
pub struct ValuationEngine;

impl ValuationEngine {
    pub fn new() -> Self {
        Self
    }

    fn strategy(&self, product: &Product) -> &'static dyn ValuationStrategy {
        strategy_for(product.valuation_method)
    }

    /// Value a receipt against `product`'s current position.
    pub fn process_incoming_stock(
        &self,
        product: &Product,
        incoming_qty: f64,
        incoming_rate: f64,
    ) -> IncomingValuation {
        let result = self.strategy(product).calculate_incoming_rate(
            PriorStock::of(product),
            incoming_qty,
            incoming_rate,
        );

        tracing::debug!(
            product = %product.code,
            method = %product.valuation_method,
            incoming_qty,
            incoming_rate,
            new_qty = result.new_qty,
            new_value = result.new_value,
            "valued incoming stock"
        );

        result
    }

    /// Cost an issue of `outgoing_qty` from `product`.
    ///
    /// Fails when `outgoing_qty` exceeds the recorded stock quantity.
    pub fn process_outgoing_stock(
        &self,
        product: &Product,
        outgoing_qty: f64,
    ) -> Result<OutgoingValuation, ValuationError> {
        if outgoing_qty > product.stock_quantity {
            tracing::warn!(
                product = %product.code,
                requested = outgoing_qty,
                available = product.stock_quantity,
                "rejected issue exceeding stock on hand"
            );
            return Err(ValuationError::insufficient_stock(
                product.code.clone(),
                outgoing_qty,
                product.stock_quantity,
            ));
        }

        let result = self.strategy(product).calculate_outgoing_rate(
            product.stock_quantity,
            &product.stock_queue,
            outgoing_qty,
        );

        tracing::debug!(
            product = %product.code,
            method = %product.valuation_method,
            outgoing_qty,
            cogs = result.cost_of_goods_sold,
            rate = result.rate,
            new_qty = result.new_qty,
            "costed outgoing stock"
        );

        Ok(result)
    }

    /// Rate the next issued unit would be costed at.
    pub fn get_current_rate(&self, product: &Product) -> f64 {
        self.strategy(product).current_rate(&product.stock_queue)
    }

    /// Switch `product` to `new_method`, conserving quantity and value.
    ///
    /// Layer history cannot be rebuilt retroactively, so every target method
    /// starts from one layer at the current average rate (none with no stock).
    pub fn convert_valuation_method(
        &self,
        product: &Product,
        new_method: ValuationMethod,
    ) -> Product {
        let rate = product.average_rate();

        tracing::info!(
            product = %product.code,
            from = %product.valuation_method,
            to = %new_method,
            qty = product.stock_quantity,
            value = product.stock_value,
            "converted valuation method"
        );

        Product {
            valuation_method: new_method,
            cost_price: rate,
            stock_queue: StockQueue::single_layer(product.stock_quantity, rate),
            ..product.clone()
        }
    }

    /// Queue quantity and value both match the aggregate figures within
    /// [`costledger_core::COST_TOLERANCE`].
    pub fn validate_stock_queue(&self, product: &Product) -> bool {
        let valid = product.queue_matches_totals();

        if !valid {
            tracing::warn!(
                product = %product.code,
                queue_qty = product.stock_queue.total_quantity(),
                stock_quantity = product.stock_quantity,
                queue_value = product.stock_queue.total_value(),
                stock_value = product.stock_value,
                "stock queue out of sync with totals"
            );
        }

        valid
    }

    /// Rebuild the queue from the aggregate figures.
    ///
    /// Positive stock becomes one layer at `stock_value / stock_quantity`
    /// with `stock_value` kept as is. Zero or negative stock gets an empty
    /// queue and a zero value, clearing any leftover layers.
    pub fn repair_stock_queue(&self, product: &Product) -> Product {
        let (stock_value, stock_queue) = if product.has_stock() {
            (
                product.stock_value,
                StockQueue::single_layer(product.stock_quantity, product.average_rate()),
            )
        } else {
            (0.0, StockQueue::new())
        };

        tracing::info!(
            product = %product.code,
            dropped_layers = product.stock_queue.len(),
            qty = product.stock_quantity,
            value = stock_value,
            "rebuilt stock queue"
        );

        Product {
            stock_value,
            stock_queue,
            ..product.clone()
        }
    }

    /// Display metadata for a method tag (unknown tags: Weighted Average).
    pub fn get_valuation_method_info(&self, method: &str) -> &'static ValuationMethodInfo {
        method_info::method_info_for_tag(method)
    }

    /// Display metadata for every method, in canonical order.
    pub fn list_valuation_methods(&self) -> Vec<&'static ValuationMethodInfo> {
        method_info::all_method_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use costledger_products::{ProductId, StockBatch};
    use proptest::prelude::*;

    fn engine() -> ValuationEngine {
        ValuationEngine::new()
    }

    fn product(method: ValuationMethod) -> Product {
        Product::new(ProductId::generate(), "SKU-001", method)
    }

    fn layered(method: ValuationMethod, layers: &[(f64, f64)]) -> Product {
        let queue: StockQueue = layers.iter().map(|&(q, r)| StockBatch::new(q, r)).collect();
        Product {
            stock_quantity: queue.total_quantity(),
            stock_value: queue.total_value(),
            cost_price: queue.first().map_or(0.0, |b| b.rate),
            stock_queue: queue,
            ..product(method)
        }
    }

    fn receive(p: &Product, qty: f64, rate: f64) -> Product {
        engine().process_incoming_stock(p, qty, rate).apply_to(p)
    }

    fn issue(p: &Product, qty: f64) -> Product {
        engine().process_outgoing_stock(p, qty).unwrap().apply_to(p)
    }

    #[test]
    fn fifo_issue_through_engine() {
        let p = layered(ValuationMethod::Fifo, &[(100.0, 10.0), (50.0, 12.0)]);
        let out = engine().process_outgoing_stock(&p, 120.0).unwrap();

        assert_eq!(out.cost_of_goods_sold, 1240.0);
        assert_eq!(out.new_queue.as_slice(), &[StockBatch::new(30.0, 12.0)]);
    }

    #[test]
    fn lifo_issue_through_engine() {
        let p = layered(ValuationMethod::Lifo, &[(100.0, 10.0), (50.0, 12.0)]);
        let out = engine().process_outgoing_stock(&p, 120.0).unwrap();

        assert_eq!(out.cost_of_goods_sold, 1300.0);
        assert_eq!(out.new_queue.as_slice(), &[StockBatch::new(30.0, 10.0)]);
    }

    #[test]
    fn weighted_average_receipt_through_engine() {
        let p = product(ValuationMethod::WeightedAverage).with_opening_balance(100.0, 50.0);
        let inc = engine().process_incoming_stock(&p, 50.0, 60.0);

        assert_eq!(inc.new_qty, 150.0);
        assert_eq!(inc.new_value, 8000.0);
        assert!((inc.new_rate - 53.333).abs() < 0.001);
    }

    #[test]
    fn issuing_everything_depletes_every_method() {
        for method in ValuationMethod::ALL {
            let p = receive(&receive(&product(method), 10.0, 3.0), 5.0, 4.0);
            let out = engine().process_outgoing_stock(&p, p.stock_quantity).unwrap();

            assert_eq!(out.new_qty, 0.0, "{method}");
            assert!(out.new_queue.is_empty(), "{method}");
            assert_eq!(out.new_value, 0.0, "{method}");
        }
    }

    #[test]
    fn issue_beyond_stock_names_the_product() {
        let p = product(ValuationMethod::Fifo).with_opening_balance(50.0, 1.0);
        let err = engine().process_outgoing_stock(&p, 60.0).unwrap_err();

        assert!(err.to_string().contains("SKU-001"));
        assert_eq!(err, ValuationError::insufficient_stock("SKU-001", 60.0, 50.0));
    }

    #[test]
    fn engine_does_not_mutate_the_snapshot() {
        let p = layered(ValuationMethod::Fifo, &[(100.0, 10.0), (50.0, 12.0)]);
        let before = p.clone();
        let _ = engine().process_incoming_stock(&p, 5.0, 1.0);
        let _ = engine().process_outgoing_stock(&p, 20.0);
        assert_eq!(p, before);
    }

    #[test]
    fn current_rate_depends_on_method() {
        let layers = [(100.0, 10.0), (50.0, 12.0)];
        assert_eq!(engine().get_current_rate(&layered(ValuationMethod::Fifo, &layers)), 10.0);
        assert_eq!(engine().get_current_rate(&layered(ValuationMethod::Lifo, &layers)), 12.0);
        assert_eq!(engine().get_current_rate(&product(ValuationMethod::MovingAverage)), 0.0);
    }

    #[test]
    fn fifo_receipts_then_issue_walk_layers_in_order() {
        let p = product(ValuationMethod::Fifo);
        let p = receive(&p, 100.0, 10.0);
        let p = receive(&p, 50.0, 12.0);
        assert_eq!(p.stock_queue.len(), 2);
        assert_eq!(p.stock_value, 1600.0);

        let p = issue(&p, 120.0);
        assert_eq!(p.stock_quantity, 30.0);
        assert_eq!(p.stock_value, 360.0);
        assert!(engine().validate_stock_queue(&p));
    }

    #[test]
    fn convert_layered_to_average_collapses_queue() {
        let p = layered(ValuationMethod::Fifo, &[(100.0, 10.0), (50.0, 12.0)]);
        let converted = engine().convert_valuation_method(&p, ValuationMethod::WeightedAverage);

        assert_eq!(converted.valuation_method, ValuationMethod::WeightedAverage);
        assert_eq!(converted.stock_quantity, 150.0);
        assert_eq!(converted.stock_value, 1600.0);
        assert_eq!(converted.stock_queue.len(), 1);
        assert!(engine().validate_stock_queue(&converted));
    }

    #[test]
    fn convert_average_to_layered_seeds_opening_layer() {
        let p = product(ValuationMethod::WeightedAverage).with_opening_balance(80.0, 2.5);
        let converted = engine().convert_valuation_method(&p, ValuationMethod::Lifo);

        assert_eq!(converted.stock_queue.as_slice(), &[StockBatch::new(80.0, 2.5)]);
        assert_eq!(converted.cost_price, 2.5);
    }

    #[test]
    fn convert_with_no_stock_gives_empty_queue() {
        let p = product(ValuationMethod::Lifo);
        let converted = engine().convert_valuation_method(&p, ValuationMethod::Fifo);
        assert!(converted.stock_queue.is_empty());
        assert_eq!(converted.valuation_method, ValuationMethod::Fifo);
    }

    #[test]
    fn validation_respects_tolerance() {
        let mut p = product(ValuationMethod::Fifo);
        p.stock_quantity = 100.005;
        p.stock_value = 100.005 * 2.0;
        p.stock_queue = StockQueue::single_layer(100.005, 2.0);
        assert!(engine().validate_stock_queue(&p));

        p.stock_quantity = 100.0;
        p.stock_value = 180.0;
        p.stock_queue = StockQueue::single_layer(90.0, 2.0);
        assert!(!engine().validate_stock_queue(&p));
    }

    #[test]
    fn empty_product_is_valid() {
        assert!(engine().validate_stock_queue(&product(ValuationMethod::Lifo)));
    }

    #[test]
    fn value_drift_alone_is_invalid() {
        let mut p = product(ValuationMethod::WeightedAverage).with_opening_balance(10.0, 10.0);
        p.stock_value = 101.0;
        assert!(!engine().validate_stock_queue(&p));
    }

    #[test]
    fn repair_rebuilds_single_layer_from_totals() {
        let mut p = product(ValuationMethod::Fifo);
        p.stock_quantity = 100.0;
        p.stock_value = 1500.0;
        p.stock_queue =
            StockQueue::from(vec![StockBatch::new(40.0, 10.0), StockBatch::new(5.0, 0.0)]);

        let repaired = engine().repair_stock_queue(&p);

        assert_eq!(repaired.stock_queue.as_slice(), &[StockBatch::new(100.0, 15.0)]);
        assert_eq!(repaired.stock_value, 1500.0);
        assert!(engine().validate_stock_queue(&repaired));
    }

    #[test]
    fn repair_clears_ghost_layers_at_zero_stock() {
        let mut p = product(ValuationMethod::Fifo);
        p.stock_value = 3.0;
        p.stock_queue = StockQueue::from(vec![StockBatch::new(1.5, 2.0)]);

        let repaired = engine().repair_stock_queue(&p);

        assert!(repaired.stock_queue.is_empty());
        assert_eq!(repaired.stock_value, 0.0);
        assert!(engine().validate_stock_queue(&repaired));
    }

    #[test]
    fn method_info_falls_back_for_unknown_tag() {
        assert_eq!(engine().get_valuation_method_info("Bogus").name, "Weighted Average");
        assert_eq!(engine().list_valuation_methods().len(), 4);
    }

    fn method_strategy() -> impl Strategy<Value = ValuationMethod> {
        prop::sample::select(ValuationMethod::ALL.to_vec())
    }

    fn layers_strategy() -> impl Strategy<Value = Vec<(f64, f64)>> {
        prop::collection::vec((0.5f64..500.0, 0.0f64..200.0), 0..12)
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Every receipt adds exactly `qty * rate` to the value, whatever the method.
        #[test]
        fn receipts_conserve_value(
            method in method_strategy(),
            receipts in prop::collection::vec((0.5f64..500.0, 0.0f64..200.0), 1..20)
        ) {
            let mut p = product(method);
            for (qty, rate) in receipts {
                let inc = engine().process_incoming_stock(&p, qty, rate);
                prop_assert!((inc.new_value - (p.stock_value + qty * rate)).abs() < 1e-6);
                prop_assert!((inc.new_qty - (p.stock_quantity + qty)).abs() < 1e-9);
                p = inc.apply_to(&p);
            }
            prop_assert!(engine().validate_stock_queue(&p));
        }

        /// Issued cost plus remaining value equals the value before the issue.
        #[test]
        fn issues_split_value_between_cogs_and_remainder(
            method in method_strategy(),
            layers in layers_strategy(),
            fraction in 0.0f64..=1.0
        ) {
            let p = layered(method, &layers);
            let p = if method.is_average() {
                engine().repair_stock_queue(&p)
            } else {
                p
            };
            let qty = p.stock_quantity * fraction;

            let out = engine().process_outgoing_stock(&p, qty).unwrap();

            prop_assert!((out.cost_of_goods_sold + out.new_value - p.stock_value).abs() < 1e-6);
            prop_assert!(out.new_queue.iter().all(|b| b.qty > 0.0));
            prop_assert!((out.new_queue.total_quantity() - out.new_qty).abs() < 1e-6);
        }

        /// Repairing twice is the same as repairing once.
        #[test]
        fn repair_is_idempotent(
            method in method_strategy(),
            layers in layers_strategy(),
            qty in -10.0f64..1000.0,
            value in 0.0f64..100_000.0
        ) {
            let mut p = layered(method, &layers);
            p.stock_quantity = qty;
            p.stock_value = value;

            let once = engine().repair_stock_queue(&p);
            let twice = engine().repair_stock_queue(&once);

            prop_assert_eq!(&once, &twice);
            if qty > 0.0 {
                prop_assert!(engine().validate_stock_queue(&once));
            }
        }

        /// Conversion never changes quantity or value.
        #[test]
        fn conversion_conserves_totals(
            from in method_strategy(),
            to in method_strategy(),
            layers in layers_strategy()
        ) {
            let p = layered(from, &layers);
            let converted = engine().convert_valuation_method(&p, to);

            prop_assert_eq!(converted.stock_quantity, p.stock_quantity);
            prop_assert_eq!(converted.stock_value, p.stock_value);
            prop_assert_eq!(converted.valuation_method, to);
            prop_assert!(converted.stock_queue.len() <= 1);
            prop_assert!(engine().validate_stock_queue(&converted));
        }
    }
}
