use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{current_timestamp, FulfillmentStatus, Package, PaymentStatus};

/// Default payment-processing fee, in basis points (118 bps = 1.18%).
pub const DEFAULT_PROCESSING_FEE_BPS: u32 = 118;

/// A customer order for one package.
///
/// `amount` is the package price frozen at creation time and is never
/// recomputed. `payment_reference` is the opaque idempotency token shared
/// with both the payment gateway and the supplier; it is generated once
/// and reused unchanged across fulfillment retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub package_id: String,
    pub phone_number: String,
    pub email: String,
    pub amount: Decimal,
    pub fee: Option<Decimal>,
    pub total_amount: Option<Decimal>,
    pub payment_reference: String,
    pub status: PaymentStatus,
    pub fulfillment_status: FulfillmentStatus,
    pub fulfillment_error: Option<String>,
    pub supplier_reference: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Order {
    /// Create a pending order for `package`, freezing the customer price
    /// and deriving the processing fee once.
    pub fn new(
        package: &Package,
        phone_number: impl Into<String>,
        email: impl Into<String>,
        fee_bps: u32,
    ) -> Self {
        let amount = package.price;
        let fee = derive_fee(amount, fee_bps);
        let now = current_timestamp();

        Self {
            id: Uuid::new_v4().to_string(),
            package_id: package.id.clone(),
            phone_number: phone_number.into(),
            email: email.into(),
            amount,
            fee: Some(fee),
            total_amount: Some(amount + fee),
            payment_reference: generate_reference(),
            status: PaymentStatus::Pending,
            fulfillment_status: FulfillmentStatus::Pending,
            fulfillment_error: None,
            supplier_reference: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Processing fee for `amount` at `fee_bps` basis points, rounded to the
/// currency's 2-decimal precision.
pub fn derive_fee(amount: Decimal, fee_bps: u32) -> Decimal {
    (amount * Decimal::new(fee_bps as i64, 4)).round_dp(2)
}

/// Generate a fresh order reference: `FS-<unix millis>-<8 hex chars>`.
///
/// Unique per order and stable for its lifetime; suppliers use it to
/// deduplicate retried purchases.
pub fn generate_reference() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("FS-{}-{}", millis, &suffix[..8])
}
