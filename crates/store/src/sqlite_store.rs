use async_trait::async_trait;
use datashop_types::{
    current_timestamp, DataAmount, FulfillmentStatus, Order, Package, PaymentStatus,
};
use rust_decimal::Decimal;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;

use crate::store::{OrderStore, PackageStore, SettingStore, StoreError};

// ═══════════════════════════════════════════════════════════════════════════
// SQLITE STORE IMPLEMENTATION
// ═══════════════════════════════════════════════════════════════════════════

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a SQLite store at the given database path
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let url = format!("sqlite:{}?mode=rwc", db_path.as_ref().display());
        Self::connect(&url).await
    }

    /// Connect with a raw SQLite URL
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        // Each pooled connection to ":memory:" would open its own empty
        // database, so in-memory URLs are pinned to a single connection.
        let options = if url.contains(":memory:") {
            SqlitePoolOptions::new().max_connections(1)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = options
            .connect(url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite database (for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::connect("sqlite::memory:").await
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), StoreError> {
        for migration in [
            include_str!("../migrations/001_create_packages.sql"),
            include_str!("../migrations/002_create_orders.sql"),
            include_str!("../migrations/003_create_settings.sql"),
        ] {
            // Each migration file can hold several statements.
            for statement in migration.split(';').filter(|s| !s.trim().is_empty()) {
                sqlx::query(statement)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| StoreError::Database(e.to_string()))?;
            }
        }

        Ok(())
    }

    fn row_to_package(row: &sqlx::sqlite::SqliteRow) -> Result<Package, StoreError> {
        Ok(Package {
            id: row.get("id"),
            data_amount: parse_data_amount(row.get::<String, _>("data_amount").as_str())?,
            price: parse_decimal(row.get::<String, _>("price").as_str())?,
            supplier_cost: parse_decimal(row.get::<String, _>("supplier_cost").as_str())?,
            is_active: row.get::<i64, _>("is_active") != 0,
            created_at: row.get::<i64, _>("created_at") as u64,
            updated_at: row.get::<i64, _>("updated_at") as u64,
        })
    }

    fn row_to_order(row: &sqlx::sqlite::SqliteRow) -> Result<Order, StoreError> {
        Ok(Order {
            id: row.get("id"),
            package_id: row.get("package_id"),
            phone_number: row.get("phone_number"),
            email: row.get("email"),
            amount: parse_decimal(row.get::<String, _>("amount").as_str())?,
            fee: row
                .get::<Option<String>, _>("fee")
                .as_deref()
                .map(parse_decimal)
                .transpose()?,
            total_amount: row
                .get::<Option<String>, _>("total_amount")
                .as_deref()
                .map(parse_decimal)
                .transpose()?,
            payment_reference: row.get("payment_reference"),
            status: parse_payment_status(row.get::<String, _>("status").as_str())?,
            fulfillment_status: parse_fulfillment_status(
                row.get::<String, _>("fulfillment_status").as_str(),
            )?,
            fulfillment_error: row.get("fulfillment_error"),
            supplier_reference: row.get("supplier_reference"),
            created_at: row.get::<i64, _>("created_at") as u64,
            updated_at: row.get::<i64, _>("updated_at") as u64,
        })
    }
}

#[async_trait]
impl PackageStore for SqliteStore {
    async fn create_package(&self, package: &Package) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO packages (
                id, data_amount, price, supplier_cost, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&package.id)
        .bind(package.data_amount.to_string())
        .bind(package.price.to_string())
        .bind(package.supplier_cost.to_string())
        .bind(package.is_active as i64)
        .bind(package.created_at as i64)
        .bind(package.updated_at as i64)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::DuplicateId(package.id.clone()))
            }
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }

    async fn package(&self, id: &str) -> Result<Option<Package>, StoreError> {
        let row = sqlx::query("SELECT * FROM packages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(Self::row_to_package(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_packages(&self) -> Result<Vec<Package>, StoreError> {
        // data_amount is stored as "<n>GB" text, so sort numerically in Rust.
        let rows = sqlx::query("SELECT * FROM packages")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut packages = rows
            .iter()
            .map(Self::row_to_package)
            .collect::<Result<Vec<_>, _>>()?;
        packages.sort_by_key(|p| p.data_amount.gigabytes());
        Ok(packages)
    }

    async fn update_package(&self, package: &Package) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE packages
            SET data_amount = ?, price = ?, supplier_cost = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(package.data_amount.to_string())
        .bind(package.price.to_string())
        .bind(package.supplier_cost.to_string())
        .bind(package.is_active as i64)
        .bind(current_timestamp() as i64)
        .bind(&package.id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(package.id.clone()));
        }
        Ok(())
    }

    async fn delete_package(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM packages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for SqliteStore {
    async fn create_order(&self, order: &Order) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO orders (
                id, package_id, phone_number, email,
                amount, fee, total_amount, payment_reference,
                status, fulfillment_status, fulfillment_error, supplier_reference,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&order.id)
        .bind(&order.package_id)
        .bind(&order.phone_number)
        .bind(&order.email)
        .bind(order.amount.to_string())
        .bind(order.fee.map(|v| v.to_string()))
        .bind(order.total_amount.map(|v| v.to_string()))
        .bind(&order.payment_reference)
        .bind(order.status.as_str())
        .bind(order.fulfillment_status.as_str())
        .bind(&order.fulfillment_error)
        .bind(&order.supplier_reference)
        .bind(order.created_at as i64)
        .bind(order.updated_at as i64)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::DuplicateId(order.id.clone()))
            }
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }

    async fn order(&self, id: &str) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(Self::row_to_order(&row)?)),
            None => Ok(None),
        }
    }

    async fn order_by_reference(&self, reference: &str) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query("SELECT * FROM orders WHERE payment_reference = ? LIMIT 1")
            .bind(reference)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(Self::row_to_order(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query("SELECT * FROM orders ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.iter().map(Self::row_to_order).collect()
    }

    async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(current_timestamp() as i64)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn claim_for_fulfillment(&self, id: &str) -> Result<bool, StoreError> {
        // Single conditional UPDATE so two concurrent fulfillment attempts
        // cannot both claim the order.
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET fulfillment_status = ?, updated_at = ?
            WHERE id = ? AND fulfillment_status IN (?, ?)
            "#,
        )
        .bind(FulfillmentStatus::Processing.as_str())
        .bind(current_timestamp() as i64)
        .bind(id)
        .bind(FulfillmentStatus::Pending.as_str())
        .bind(FulfillmentStatus::Failed.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        // Distinguish "already claimed or terminal" from "no such order".
        match self.order(id).await? {
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    async fn record_fulfillment_success(
        &self,
        id: &str,
        supplier_reference: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET fulfillment_status = ?, fulfillment_error = NULL,
                supplier_reference = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(FulfillmentStatus::Fulfilled.as_str())
        .bind(supplier_reference)
        .bind(current_timestamp() as i64)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn record_fulfillment_failure(&self, id: &str, error: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET fulfillment_status = ?, fulfillment_error = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(FulfillmentStatus::Failed.as_str())
        .bind(error)
        .bind(current_timestamp() as i64)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete_order(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SettingStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(row.map(|r| r.get("value")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(current_timestamp() as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// HELPER FUNCTIONS
// ═══════════════════════════════════════════════════════════════════════════

fn parse_decimal(s: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(s).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn parse_data_amount(s: &str) -> Result<DataAmount, StoreError> {
    DataAmount::from_str(s).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn parse_payment_status(s: &str) -> Result<PaymentStatus, StoreError> {
    PaymentStatus::from_str(s).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn parse_fulfillment_status(s: &str) -> Result<FulfillmentStatus, StoreError> {
    FulfillmentStatus::from_str(s).map_err(|e| StoreError::Serialization(e.to_string()))
}

// ═══════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════
