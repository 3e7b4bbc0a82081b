use datashop_store::{SettingStore, StoreError};
use datashop_suppliers::{
    BalanceResult, CostPriceResult, OrderStatusResult, PurchaseRequest, PurchaseResult,
    SupplierAdapter,
};
use datashop_types::{DataAmount, SupplierId};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Settings key holding the currently selected supplier.
pub const ACTIVE_SUPPLIER_KEY: &str = "active_supplier";

// ═══════════════════════════════════════════════════════════════════════════
// ERROR TYPES
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("unknown supplier: {0}")]
    UnknownSupplier(String),

    #[error("failed to persist supplier selection: {0}")]
    SettingWrite(#[from] StoreError),
}

// ═══════════════════════════════════════════════════════════════════════════
// SUPPLIER ROUTER
// ═══════════════════════════════════════════════════════════════════════════

/// A routed call result, tagged with the supplier that handled it.
#[derive(Debug, Clone)]
pub struct Routed<T> {
    pub supplier: SupplierId,
    pub result: T,
}

/// Routes supplier calls to whichever adapter is currently selected.
///
/// The selection lives in the setting store so it survives restarts and
/// takes effect for the next order without a redeploy. Exactly one
/// supplier handles any given purchase; there is no failover to another
/// supplier on failure.
pub struct SupplierRouter {
    settings: Arc<dyn SettingStore>,
    adapters: Vec<Arc<dyn SupplierAdapter>>,
    default_supplier: SupplierId,
}

impl SupplierRouter {
    pub fn new(settings: Arc<dyn SettingStore>, default_supplier: SupplierId) -> Self {
        Self {
            settings,
            adapters: Vec::new(),
            default_supplier,
        }
    }

    pub fn register(mut self, adapter: Arc<dyn SupplierAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn registered_suppliers(&self) -> Vec<SupplierId> {
        self.adapters.iter().map(|a| a.id()).collect()
    }

    /// The supplier that will handle the next purchase.
    ///
    /// A missing setting, an unreadable store, or an unrecognized value
    /// all degrade to the default supplier; routing must keep working
    /// even when the settings table is unhappy.
    pub async fn active_supplier(&self) -> SupplierId {
        match self.settings.get(ACTIVE_SUPPLIER_KEY).await {
            Ok(Some(value)) => match value.parse::<SupplierId>() {
                Ok(id) => id,
                Err(_) => {
                    warn!(
                        value = %value,
                        default = %self.default_supplier,
                        "unrecognized active supplier setting, using default"
                    );
                    self.default_supplier
                }
            },
            Ok(None) => self.default_supplier,
            Err(e) => {
                warn!(
                    error = %e,
                    default = %self.default_supplier,
                    "failed to read active supplier setting, using default"
                );
                self.default_supplier
            }
        }
    }

    /// Persist a new supplier selection. Takes effect for subsequent
    /// purchases only; in-flight fulfillments keep the supplier they
    /// resolved at start.
    pub async fn set_active_supplier(&self, supplier: SupplierId) -> Result<(), RouterError> {
        if self.adapter(supplier).is_none() {
            return Err(RouterError::UnknownSupplier(supplier.to_string()));
        }
        self.settings
            .set(ACTIVE_SUPPLIER_KEY, supplier.as_str())
            .await?;
        info!(supplier = %supplier, "active supplier switched");
        Ok(())
    }

    fn adapter(&self, id: SupplierId) -> Option<&Arc<dyn SupplierAdapter>> {
        self.adapters.iter().find(|a| a.id() == id)
    }

    async fn resolve(&self, supplier: Option<SupplierId>) -> SupplierId {
        match supplier {
            Some(id) => id,
            None => self.active_supplier().await,
        }
    }

    /// Send a purchase to the active supplier. A selection that points
    /// at an unregistered adapter yields a failed purchase result, not
    /// an error; the caller records it like any supplier rejection.
    pub async fn purchase(&self, request: &PurchaseRequest) -> Routed<PurchaseResult> {
        let supplier = self.active_supplier().await;
        let result = match self.adapter(supplier) {
            Some(adapter) => adapter.purchase(request).await,
            None => PurchaseResult::err(format!("supplier {} is not registered", supplier)),
        };
        Routed { supplier, result }
    }

    pub async fn balance(&self, supplier: Option<SupplierId>) -> Routed<BalanceResult> {
        let supplier = self.resolve(supplier).await;
        let result = match self.adapter(supplier) {
            Some(adapter) => adapter.balance().await,
            None => BalanceResult::err(format!("supplier {} is not registered", supplier)),
        };
        Routed { supplier, result }
    }

    pub async fn cost_price(
        &self,
        supplier: Option<SupplierId>,
        amount: DataAmount,
    ) -> Routed<CostPriceResult> {
        let supplier = self.resolve(supplier).await;
        let result = match self.adapter(supplier) {
            Some(adapter) => adapter.cost_price(amount).await,
            None => CostPriceResult::err(format!("supplier {} is not registered", supplier)),
        };
        Routed { supplier, result }
    }

    pub async fn order_status(
        &self,
        supplier: Option<SupplierId>,
        reference: &str,
    ) -> Routed<OrderStatusResult> {
        let supplier = self.resolve(supplier).await;
        let result = match self.adapter(supplier) {
            Some(adapter) => adapter.order_status(reference).await,
            None => OrderStatusResult::err(format!("supplier {} is not registered", supplier)),
        };
        Routed { supplier, result }
    }

    /// Balances from every registered supplier, queried concurrently
    /// (admin dashboard view).
    pub async fn all_balances(&self) -> Vec<Routed<BalanceResult>> {
        let futures = self.adapters.iter().map(|adapter| {
            let adapter = Arc::clone(adapter);
            async move {
                Routed {
                    supplier: adapter.id(),
                    result: adapter.balance().await,
                }
            }
        });
        futures::future::join_all(futures).await
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use datashop_store::MemoryStore;
    use datashop_suppliers::MockSupplier;
    use rust_decimal::Decimal;

    struct FailingSettings;

    #[async_trait]
    impl SettingStore for FailingSettings {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Database("disk on fire".into()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Database("disk on fire".into()))
        }
    }

    fn test_request() -> PurchaseRequest {
        PurchaseRequest {
            phone_number: "0241234567".to_string(),
            data_amount: "5GB".parse().unwrap(),
            price: Decimal::new(2220, 2),
            order_reference: "FS-1-abcdef12".to_string(),
        }
    }

    fn router_with_both(settings: Arc<dyn SettingStore>) -> SupplierRouter {
        SupplierRouter::new(settings, SupplierId::DataXpress)
            .register(Arc::new(MockSupplier::new(SupplierId::DataXpress)))
            .register(Arc::new(MockSupplier::new(SupplierId::Hubnet)))
    }

    #[tokio::test]
    async fn test_defaults_when_setting_missing() {
        let router = router_with_both(Arc::new(MemoryStore::new()));
        assert_eq!(router.active_supplier().await, SupplierId::DataXpress);
    }

    #[tokio::test]
    async fn test_defaults_when_setting_garbage() {
        let settings = Arc::new(MemoryStore::new());
        settings.set(ACTIVE_SUPPLIER_KEY, "carrier-pigeon").await.unwrap();
        let router = router_with_both(settings);
        assert_eq!(router.active_supplier().await, SupplierId::DataXpress);
    }

    #[tokio::test]
    async fn test_defaults_when_store_unreadable() {
        let router = router_with_both(Arc::new(FailingSettings));
        assert_eq!(router.active_supplier().await, SupplierId::DataXpress);
    }

    #[tokio::test]
    async fn test_switch_routes_subsequent_purchases() {
        let settings = Arc::new(MemoryStore::new());
        let dataxpress = Arc::new(MockSupplier::new(SupplierId::DataXpress));
        let hubnet = Arc::new(MockSupplier::new(SupplierId::Hubnet));
        let router = SupplierRouter::new(settings, SupplierId::DataXpress)
            .register(dataxpress.clone())
            .register(hubnet.clone());

        let first = router.purchase(&test_request()).await;
        assert_eq!(first.supplier, SupplierId::DataXpress);

        router
            .set_active_supplier(SupplierId::Hubnet)
            .await
            .unwrap();

        let second = router.purchase(&test_request()).await;
        assert_eq!(second.supplier, SupplierId::Hubnet);

        assert_eq!(dataxpress.purchase_count(), 1);
        assert_eq!(hubnet.purchase_count(), 1);
    }

    #[tokio::test]
    async fn test_no_failover_on_supplier_failure() {
        let settings = Arc::new(MemoryStore::new());
        let dataxpress = Arc::new(MockSupplier::failing(
            SupplierId::DataXpress,
            "insufficient balance",
        ));
        let hubnet = Arc::new(MockSupplier::new(SupplierId::Hubnet));
        let router = SupplierRouter::new(settings, SupplierId::DataXpress)
            .register(dataxpress.clone())
            .register(hubnet.clone());

        let routed = router.purchase(&test_request()).await;
        assert_eq!(routed.supplier, SupplierId::DataXpress);
        assert!(!routed.result.success);

        // The other supplier was never consulted.
        assert_eq!(hubnet.purchase_count(), 0);
    }

    #[tokio::test]
    async fn test_cannot_select_unregistered_supplier() {
        let settings = Arc::new(MemoryStore::new());
        let router = SupplierRouter::new(settings, SupplierId::DataXpress)
            .register(Arc::new(MockSupplier::new(SupplierId::DataXpress)));

        let result = router.set_active_supplier(SupplierId::Hubnet).await;
        assert!(matches!(result, Err(RouterError::UnknownSupplier(_))));
    }

    #[tokio::test]
    async fn test_unregistered_selection_yields_failed_purchase() {
        let settings = Arc::new(MemoryStore::new());
        settings.set(ACTIVE_SUPPLIER_KEY, "hubnet").await.unwrap();
        let router = SupplierRouter::new(settings, SupplierId::DataXpress)
            .register(Arc::new(MockSupplier::new(SupplierId::DataXpress)));

        let routed = router.purchase(&test_request()).await;
        assert_eq!(routed.supplier, SupplierId::Hubnet);
        assert!(!routed.result.success);
    }

    #[tokio::test]
    async fn test_balance_override() {
        let router = router_with_both(Arc::new(MemoryStore::new()));

        let active = router.balance(None).await;
        assert_eq!(active.supplier, SupplierId::DataXpress);

        let explicit = router.balance(Some(SupplierId::Hubnet)).await;
        assert_eq!(explicit.supplier, SupplierId::Hubnet);
    }

    #[tokio::test]
    async fn test_all_balances_covers_every_adapter() {
        let router = router_with_both(Arc::new(MemoryStore::new()));
        let balances = router.all_balances().await;

        let suppliers: Vec<SupplierId> = balances.iter().map(|b| b.supplier).collect();
        assert_eq!(suppliers, vec![SupplierId::DataXpress, SupplierId::Hubnet]);
        assert!(balances.iter().all(|b| b.result.success));
    }
}
