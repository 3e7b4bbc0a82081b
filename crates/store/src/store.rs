use async_trait::async_trait;
use datashop_types::{current_timestamp, FulfillmentStatus, Order, Package, PaymentStatus};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════
// ERROR TYPES
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate id: {0}")]
    DuplicateId(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("connection error: {0}")]
    Connection(String),
}

// ═══════════════════════════════════════════════════════════════════════════
// STORE TRAITS
// ═══════════════════════════════════════════════════════════════════════════

#[async_trait]
pub trait PackageStore: Send + Sync {
    async fn create_package(&self, package: &Package) -> Result<(), StoreError>;

    async fn package(&self, id: &str) -> Result<Option<Package>, StoreError>;

    /// All packages, ordered by data amount ascending.
    async fn list_packages(&self) -> Result<Vec<Package>, StoreError>;

    async fn update_package(&self, package: &Package) -> Result<(), StoreError>;

    async fn delete_package(&self, id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create_order(&self, order: &Order) -> Result<(), StoreError>;

    async fn order(&self, id: &str) -> Result<Option<Order>, StoreError>;

    async fn order_by_reference(&self, reference: &str) -> Result<Option<Order>, StoreError>;

    /// All orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;

    /// Payment lifecycle write (webhook confirmation or admin edit).
    async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
    ) -> Result<(), StoreError>;

    /// Single conditional `pending|failed -> processing` transition.
    ///
    /// Returns `true` iff this caller performed the transition. Two
    /// concurrent fulfillment triggers race here and exactly one wins;
    /// the loser must not call the supplier.
    async fn claim_for_fulfillment(&self, id: &str) -> Result<bool, StoreError>;

    /// `processing -> fulfilled`: stores the supplier transaction
    /// reference and clears any previous fulfillment error.
    async fn record_fulfillment_success(
        &self,
        id: &str,
        supplier_reference: &str,
    ) -> Result<(), StoreError>;

    /// `processing -> failed`: stores the failure reason for the admin UI.
    async fn record_fulfillment_failure(&self, id: &str, error: &str) -> Result<(), StoreError>;

    async fn delete_order(&self, id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SettingStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

// ═══════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE (tests and local development)
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct MemoryStore {
    packages: Arc<RwLock<HashMap<String, Package>>>,
    orders: Arc<RwLock<HashMap<String, Order>>>,
    settings: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PackageStore for MemoryStore {
    async fn create_package(&self, package: &Package) -> Result<(), StoreError> {
        let mut packages = self.packages.write().unwrap();
        if packages.contains_key(&package.id) {
            return Err(StoreError::DuplicateId(package.id.clone()));
        }
        packages.insert(package.id.clone(), package.clone());
        Ok(())
    }

    async fn package(&self, id: &str) -> Result<Option<Package>, StoreError> {
        Ok(self.packages.read().unwrap().get(id).cloned())
    }

    async fn list_packages(&self) -> Result<Vec<Package>, StoreError> {
        let packages = self.packages.read().unwrap();
        let mut results: Vec<_> = packages.values().cloned().collect();
        results.sort_by_key(|p| p.data_amount.gigabytes());
        Ok(results)
    }

    async fn update_package(&self, package: &Package) -> Result<(), StoreError> {
        let mut packages = self.packages.write().unwrap();
        if !packages.contains_key(&package.id) {
            return Err(StoreError::NotFound(package.id.clone()));
        }
        let mut updated = package.clone();
        updated.updated_at = current_timestamp();
        packages.insert(package.id.clone(), updated);
        Ok(())
    }

    async fn delete_package(&self, id: &str) -> Result<(), StoreError> {
        self.packages.write().unwrap().remove(id);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self.orders.write().unwrap();
        if orders.contains_key(&order.id) {
            return Err(StoreError::DuplicateId(order.id.clone()));
        }
        orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn order(&self, id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().unwrap().get(id).cloned())
    }

    async fn order_by_reference(&self, reference: &str) -> Result<Option<Order>, StoreError> {
        Ok(self
            .orders
            .read()
            .unwrap()
            .values()
            .find(|o| o.payment_reference == reference)
            .cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().unwrap();
        let mut results: Vec<_> = orders.values().cloned().collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
    ) -> Result<(), StoreError> {
        let mut orders = self.orders.write().unwrap();
        let order = orders
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        order.status = status;
        order.updated_at = current_timestamp();
        Ok(())
    }

    async fn claim_for_fulfillment(&self, id: &str) -> Result<bool, StoreError> {
        // Check and write under one lock; this is the in-memory analogue
        // of the conditional UPDATE the SQLite store issues.
        let mut orders = self.orders.write().unwrap();
        let order = orders
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if !order.fulfillment_status.is_retriable() {
            return Ok(false);
        }

        order.fulfillment_status = FulfillmentStatus::Processing;
        order.updated_at = current_timestamp();
        Ok(true)
    }

    async fn record_fulfillment_success(
        &self,
        id: &str,
        supplier_reference: &str,
    ) -> Result<(), StoreError> {
        let mut orders = self.orders.write().unwrap();
        let order = orders
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        order.fulfillment_status = FulfillmentStatus::Fulfilled;
        order.fulfillment_error = None;
        order.supplier_reference = Some(supplier_reference.to_string());
        order.updated_at = current_timestamp();
        Ok(())
    }

    async fn record_fulfillment_failure(&self, id: &str, error: &str) -> Result<(), StoreError> {
        let mut orders = self.orders.write().unwrap();
        let order = orders
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        order.fulfillment_status = FulfillmentStatus::Failed;
        order.fulfillment_error = Some(error.to_string());
        order.updated_at = current_timestamp();
        Ok(())
    }

    async fn delete_order(&self, id: &str) -> Result<(), StoreError> {
        self.orders.write().unwrap().remove(id);
        Ok(())
    }
}

#[async_trait]
impl SettingStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.settings.read().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.settings
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use datashop_types::DEFAULT_PROCESSING_FEE_BPS;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn test_package() -> Package {
        Package::new(
            "10GB".parse().unwrap(),
            Decimal::from_str("46.00").unwrap(),
            Decimal::from_str("32.20").unwrap(),
        )
    }

    fn test_order(package: &Package) -> Order {
        Order::new(package, "0241234567", "a@b.com", DEFAULT_PROCESSING_FEE_BPS)
    }

    #[tokio::test]
    async fn test_package_crud() {
        let store = MemoryStore::new();
        let pkg = test_package();

        store.create_package(&pkg).await.unwrap();
        assert_eq!(store.package(&pkg.id).await.unwrap(), Some(pkg.clone()));
        assert!(matches!(
            store.create_package(&pkg).await,
            Err(StoreError::DuplicateId(_))
        ));

        let mut edited = pkg.clone();
        edited.is_active = false;
        store.update_package(&edited).await.unwrap();
        assert!(!store.package(&pkg.id).await.unwrap().unwrap().is_active);

        store.delete_package(&pkg.id).await.unwrap();
        assert_eq!(store.package(&pkg.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_packages_sorted_by_size() {
        let store = MemoryStore::new();
        for size in ["20GB", "1GB", "5GB"] {
            store
                .create_package(&Package::new(
                    size.parse().unwrap(),
                    Decimal::ONE,
                    Decimal::ONE,
                ))
                .await
                .unwrap();
        }

        let sizes: Vec<u32> = store
            .list_packages()
            .await
            .unwrap()
            .iter()
            .map(|p| p.data_amount.gigabytes())
            .collect();
        assert_eq!(sizes, vec![1, 5, 20]);
    }

    #[tokio::test]
    async fn test_order_lookup_by_reference() {
        let store = MemoryStore::new();
        let pkg = test_package();
        let order = test_order(&pkg);

        store.create_order(&order).await.unwrap();
        let found = store
            .order_by_reference(&order.payment_reference)
            .await
            .unwrap();
        assert_eq!(found, Some(order));

        assert_eq!(store.order_by_reference("FS-0-missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_claim_transitions() {
        let store = MemoryStore::new();
        let pkg = test_package();
        let order = test_order(&pkg);
        store.create_order(&order).await.unwrap();

        // pending -> processing wins
        assert!(store.claim_for_fulfillment(&order.id).await.unwrap());
        // processing cannot be claimed again
        assert!(!store.claim_for_fulfillment(&order.id).await.unwrap());

        // failed -> processing is a valid retry path
        store
            .record_fulfillment_failure(&order.id, "insufficient balance")
            .await
            .unwrap();
        assert!(store.claim_for_fulfillment(&order.id).await.unwrap());

        // fulfilled is terminal
        store
            .record_fulfillment_success(&order.id, "TX-1")
            .await
            .unwrap();
        assert!(!store.claim_for_fulfillment(&order.id).await.unwrap());

        assert!(matches!(
            store.claim_for_fulfillment("missing").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fulfillment_success_clears_error() {
        let store = MemoryStore::new();
        let pkg = test_package();
        let order = test_order(&pkg);
        store.create_order(&order).await.unwrap();

        store
            .record_fulfillment_failure(&order.id, "timed out")
            .await
            .unwrap();
        let failed = store.order(&order.id).await.unwrap().unwrap();
        assert_eq!(failed.fulfillment_status, FulfillmentStatus::Failed);
        assert_eq!(failed.fulfillment_error.as_deref(), Some("timed out"));

        store
            .record_fulfillment_success(&order.id, "TX-9")
            .await
            .unwrap();
        let fulfilled = store.order(&order.id).await.unwrap().unwrap();
        assert_eq!(fulfilled.fulfillment_status, FulfillmentStatus::Fulfilled);
        assert_eq!(fulfilled.fulfillment_error, None);
        assert_eq!(fulfilled.supplier_reference.as_deref(), Some("TX-9"));
        // Payment amount untouched by fulfillment writes.
        assert_eq!(fulfilled.amount, order.amount);
    }

    #[tokio::test]
    async fn test_settings_upsert() {
        let store = MemoryStore::new();
        assert_eq!(store.get("active_supplier").await.unwrap(), None);

        store.set("active_supplier", "dataxpress").await.unwrap();
        assert_eq!(
            store.get("active_supplier").await.unwrap().as_deref(),
            Some("dataxpress")
        );

        store.set("active_supplier", "hubnet").await.unwrap();
        assert_eq!(
            store.get("active_supplier").await.unwrap().as_deref(),
            Some("hubnet")
        );
    }
}
