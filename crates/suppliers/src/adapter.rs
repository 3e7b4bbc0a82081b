use async_trait::async_trait;
use datashop_types::{DataAmount, SupplierId};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// A purchase to place with a wholesale supplier.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRequest {
    pub phone_number: String,
    pub data_amount: DataAmount,
    /// Wholesale price owed to the supplier. Never the customer price.
    pub price: Decimal,
    /// Opaque idempotency/tracking key, stable across retries.
    pub order_reference: String,
}

/// Normalized outcome of a supplier purchase call.
///
/// Adapters never raise: a missing credential, a transport failure, a
/// non-2xx response, and an upstream business rejection all collapse into
/// `success == false` with a human-readable message. Callers that need to
/// tell those apart can only read the message text; no control flow
/// depends on the failure subtype.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseResult {
    pub success: bool,
    pub message: String,
    /// Opaque supplier payload holding the upstream transaction ids.
    pub data: Option<Value>,
}

impl PurchaseResult {
    pub fn ok(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// Supplier-side transaction reference, if one came back in the data
    /// bag. Suppliers name this field differently.
    pub fn supplier_reference(&self) -> Option<String> {
        let data = self.data.as_ref()?;
        for key in ["transaction_id", "reference", "order_id", "id"] {
            if let Some(value) = data.get(key) {
                match value {
                    Value::String(s) if !s.is_empty() => return Some(s.clone()),
                    Value::Number(n) => return Some(n.to_string()),
                    _ => {}
                }
            }
        }
        None
    }
}

/// Normalized wallet-balance result.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceResult {
    pub success: bool,
    pub balance: Option<Decimal>,
    pub currency: Option<String>,
    pub message: Option<String>,
}

impl BalanceResult {
    pub fn ok(balance: Decimal, currency: impl Into<String>) -> Self {
        Self {
            success: true,
            balance: Some(balance),
            currency: Some(currency.into()),
            message: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            balance: None,
            currency: None,
            message: Some(message.into()),
        }
    }
}

/// Normalized wholesale cost-price result.
///
/// "Unsupported" is a first-class outcome distinct from a network failure:
/// a supplier without a pricing endpoint still implements the operation
/// and reports the missing capability in the message.
#[derive(Debug, Clone, PartialEq)]
pub struct CostPriceResult {
    pub success: bool,
    pub cost_price: Option<Decimal>,
    pub message: Option<String>,
}

impl CostPriceResult {
    pub fn ok(cost_price: Decimal) -> Self {
        Self {
            success: true,
            cost_price: Some(cost_price),
            message: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            cost_price: None,
            message: Some(message.into()),
        }
    }
}

/// Normalized upstream order-status result.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatusResult {
    pub success: bool,
    pub status: Option<String>,
    pub data: Option<Value>,
    pub message: Option<String>,
}

impl OrderStatusResult {
    pub fn ok(status: Option<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            status,
            data,
            message: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            status: None,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Common contract every supplier integration implements.
///
/// One implementation per upstream vendor; each encodes its own unit
/// conversion, auth scheme, and success marker.
#[async_trait]
pub trait SupplierAdapter: Send + Sync {
    /// Which supplier this adapter talks to.
    fn id(&self) -> SupplierId;

    /// Place a data-bundle purchase upstream.
    async fn purchase(&self, request: &PurchaseRequest) -> PurchaseResult;

    /// Query the wholesale wallet balance.
    async fn balance(&self) -> BalanceResult;

    /// Query the wholesale cost price for a package size.
    async fn cost_price(&self, data_amount: DataAmount) -> CostPriceResult;

    /// Query the upstream status of a previously placed order.
    async fn order_status(&self, reference: &str) -> OrderStatusResult;
}

/// Best-effort decimal extraction from a JSON value that may arrive as a
/// string or a number depending on the endpoint.
pub(crate) fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}
