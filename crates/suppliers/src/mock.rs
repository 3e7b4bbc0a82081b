use async_trait::async_trait;
use datashop_types::{DataAmount, SupplierId};
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Mutex;

use crate::{
    BalanceResult, CostPriceResult, OrderStatusResult, PurchaseRequest, PurchaseResult,
    SupplierAdapter,
};

/// Scripted supplier for tests: records every purchase request and
/// replays configured results.
pub struct MockSupplier {
    id: SupplierId,
    purchases: Mutex<Vec<PurchaseRequest>>,
    purchase_result: Mutex<PurchaseResult>,
    balance_result: Mutex<BalanceResult>,
    cost_price_result: Mutex<CostPriceResult>,
}

impl MockSupplier {
    /// Mock that accepts every purchase with a canned transaction id.
    pub fn new(id: SupplierId) -> Self {
        Self {
            id,
            purchases: Mutex::new(Vec::new()),
            purchase_result: Mutex::new(PurchaseResult::ok(
                "Order placed successfully",
                Some(json!({ "transaction_id": format!("{id}-tx-1") })),
            )),
            balance_result: Mutex::new(BalanceResult::ok(
                Decimal::new(100_000, 2),
                datashop_types::CURRENCY,
            )),
            cost_price_result: Mutex::new(CostPriceResult::ok(Decimal::new(3220, 2))),
        }
    }

    /// Mock that rejects every purchase with `message`.
    pub fn failing(id: SupplierId, message: impl Into<String>) -> Self {
        let mock = Self::new(id);
        mock.set_purchase_result(PurchaseResult::err(message));
        mock
    }

    pub fn set_purchase_result(&self, result: PurchaseResult) {
        *self.purchase_result.lock().unwrap() = result;
    }

    pub fn set_balance_result(&self, result: BalanceResult) {
        *self.balance_result.lock().unwrap() = result;
    }

    pub fn set_cost_price_result(&self, result: CostPriceResult) {
        *self.cost_price_result.lock().unwrap() = result;
    }

    /// Every purchase request received so far, in order.
    pub fn recorded_purchases(&self) -> Vec<PurchaseRequest> {
        self.purchases.lock().unwrap().clone()
    }

    pub fn purchase_count(&self) -> usize {
        self.purchases.lock().unwrap().len()
    }
}

#[async_trait]
impl SupplierAdapter for MockSupplier {
    fn id(&self) -> SupplierId {
        self.id
    }

    async fn purchase(&self, request: &PurchaseRequest) -> PurchaseResult {
        self.purchases.lock().unwrap().push(request.clone());
        self.purchase_result.lock().unwrap().clone()
    }

    async fn balance(&self) -> BalanceResult {
        self.balance_result.lock().unwrap().clone()
    }

    async fn cost_price(&self, _data_amount: DataAmount) -> CostPriceResult {
        self.cost_price_result.lock().unwrap().clone()
    }

    async fn order_status(&self, _reference: &str) -> OrderStatusResult {
        OrderStatusResult::ok(Some("completed".to_string()), None)
    }
}
