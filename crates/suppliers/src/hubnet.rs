use async_trait::async_trait;
use datashop_types::{DataAmount, SupplierId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    decimal_from_value, BalanceResult, CostPriceResult, OrderStatusResult, PurchaseRequest,
    PurchaseResult, SupplierAdapter,
};

pub const HUBNET_BASE_URL: &str =
    "https://console.hubnet.app/live/api/context/business/transaction";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_NETWORK: &str = "mtn";

/// Hubnet wholesale API client.
///
/// Auth is a `token: Bearer <key>` header; the success marker is a 2xx
/// response with `status == true` and code `"0000"`.
pub struct HubnetClient {
    base_url: String,
    api_key: Option<String>,
    /// Network segment of the transaction endpoint ("mtn", "at", "big-time").
    network: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HubnetClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        network: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            network: network.into(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    /// Client against the production endpoint, MTN network.
    pub fn production(api_key: Option<String>) -> Self {
        Self::new(HUBNET_BASE_URL, api_key, DEFAULT_NETWORK, DEFAULT_TIMEOUT)
    }

    /// Hubnet unit rule: `volume` is decimal megabytes, so `"5GB"`
    /// becomes `5000`. This rule is private to this adapter.
    fn volume_in_mb(amount: DataAmount) -> u64 {
        u64::from(amount.gigabytes()) * 1000
    }

    fn bearer(&self) -> Option<String> {
        self.api_key.as_deref().map(|key| format!("Bearer {key}"))
    }
}

#[derive(Debug, Serialize)]
struct TransactionRequest<'a> {
    phone: &'a str,
    /// Volume in megabytes, sent as a string per the Hubnet contract.
    volume: String,
    reference: &'a str,
}

#[derive(Debug, Deserialize)]
struct TransactionResponse {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    payment_id: Option<String>,
    #[serde(default)]
    reference: Option<String>,
}

impl TransactionResponse {
    /// Hubnet signals success with a boolean flag plus code "0000".
    fn is_success(&self) -> bool {
        self.status && self.code == "0000"
    }

    fn failure_message(&self) -> String {
        if !self.message.is_empty() {
            self.message.clone()
        } else if !self.reason.is_empty() {
            self.reason.clone()
        } else {
            "transaction failed".to_string()
        }
    }
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: Value,
    #[serde(default)]
    currency: Option<String>,
}

#[async_trait]
impl SupplierAdapter for HubnetClient {
    fn id(&self) -> SupplierId {
        SupplierId::Hubnet
    }

    async fn purchase(&self, request: &PurchaseRequest) -> PurchaseResult {
        let Some(token) = self.bearer() else {
            return PurchaseResult::err("Hubnet API key not configured");
        };

        let volume_in_mb = Self::volume_in_mb(request.data_amount);
        let body = TransactionRequest {
            phone: &request.phone_number,
            volume: volume_in_mb.to_string(),
            reference: &request.order_reference,
        };

        debug!(
            reference = %request.order_reference,
            phone = %request.phone_number,
            data_amount = %request.data_amount,
            volume_in_mb,
            network = %self.network,
            "sending data order to Hubnet"
        );

        let response = self
            .client
            .post(format!("{}/{}-new-transaction", self.base_url, self.network))
            .header("token", token)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => return PurchaseResult::err(e.to_string()),
        };

        let http_status = response.status();
        let parsed: TransactionResponse = match response.json().await {
            Ok(r) => r,
            Err(e) => return PurchaseResult::err(format!("failed to parse Hubnet response: {e}")),
        };

        if http_status.is_success() && parsed.is_success() {
            info!(
                reference = %request.order_reference,
                transaction_id = parsed.transaction_id.as_deref().unwrap_or("-"),
                "Hubnet order accepted"
            );
            let message = if parsed.message.is_empty() {
                parsed.reason.clone()
            } else {
                parsed.message.clone()
            };
            PurchaseResult::ok(
                message,
                Some(json!({
                    "transaction_id": parsed.transaction_id,
                    "payment_id": parsed.payment_id,
                    "reference": parsed.reference,
                })),
            )
        } else {
            let message = if http_status.is_success() {
                parsed.failure_message()
            } else if !parsed.reason.is_empty() {
                parsed.reason.clone()
            } else if !parsed.message.is_empty() {
                parsed.message.clone()
            } else {
                format!("API request failed with status {http_status}")
            };
            warn!(reference = %request.order_reference, error = %message, "Hubnet order failed");
            PurchaseResult::err(message)
        }
    }

    async fn balance(&self) -> BalanceResult {
        let Some(token) = self.bearer() else {
            return BalanceResult::err("Hubnet API key not configured");
        };

        let response = self
            .client
            .get(format!("{}/check_balance", self.base_url))
            .header("token", token)
            .timeout(self.timeout)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => return BalanceResult::err(e.to_string()),
        };

        if !response.status().is_success() {
            return BalanceResult::err(format!(
                "failed to fetch balance: {}",
                response.status()
            ));
        }

        let parsed: BalanceResponse = match response.json().await {
            Ok(r) => r,
            Err(e) => return BalanceResult::err(format!("failed to parse Hubnet response: {e}")),
        };

        match decimal_from_value(&parsed.balance) {
            Some(balance) => BalanceResult::ok(
                balance,
                parsed
                    .currency
                    .unwrap_or_else(|| datashop_types::CURRENCY.to_string()),
            ),
            None => BalanceResult::err("wallet balance missing from response"),
        }
    }

    async fn cost_price(&self, _data_amount: DataAmount) -> CostPriceResult {
        // No cost-price endpoint upstream; unsupported is a first-class
        // outcome here, not a transport failure.
        CostPriceResult::err(
            "Hubnet does not provide a cost price API; configure pricing manually",
        )
    }

    async fn order_status(&self, _reference: &str) -> OrderStatusResult {
        OrderStatusResult::err("Hubnet does not provide an order status API")
    }
}
