use async_trait::async_trait;
use datashop_types::{DataAmount, SupplierId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    decimal_from_value, BalanceResult, CostPriceResult, OrderStatusResult, PurchaseRequest,
    PurchaseResult, SupplierAdapter,
};

pub const DATAXPRESS_BASE_URL: &str = "https://www.dataxpress.shop";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Only MTN bundles are sold through this storefront today.
const NETWORK_TYPE: &str = "mtn";

/// DataXpress wholesale API client.
///
/// Auth is an `X-API-KEY` header; the success marker is a 2xx response
/// whose body carries `status == "success"`.
pub struct DataXpressClient {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl DataXpressClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            timeout,
            client: reqwest::Client::new(),
        }
    }

    /// Client against the production endpoint.
    pub fn production(api_key: Option<String>) -> Self {
        Self::new(DATAXPRESS_BASE_URL, api_key, DEFAULT_TIMEOUT)
    }

    /// DataXpress unit rule: `volumeInMB` is binary megabytes, so
    /// `"5GB"` becomes `5120`. This rule is private to this adapter.
    fn volume_in_mb(amount: DataAmount) -> u64 {
        u64::from(amount.gigabytes()) * 1024
    }

    fn api_key(&self) -> Result<&str, PurchaseResult> {
        match self.api_key.as_deref() {
            Some(key) => Ok(key),
            None => Err(PurchaseResult::err("DataXpress API key not configured")),
        }
    }
}

#[derive(Debug, Serialize)]
struct BuyDataRequest<'a> {
    #[serde(rename = "ref")]
    reference: &'a str,
    phone: &'a str,
    #[serde(rename = "volumeInMB")]
    volume_in_mb: u64,
    amount: rust_decimal::Decimal,
    #[serde(rename = "networkType")]
    network_type: &'a str,
}

#[derive(Debug, Serialize)]
struct CostPriceRequest {
    #[serde(rename = "volumeInMB")]
    volume_in_mb: u64,
    #[serde(rename = "networkType")]
    network_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl ApiResponse {
    fn is_success(&self) -> bool {
        self.status == "success"
    }

    fn message_or(&self, fallback: String) -> String {
        if self.message.is_empty() {
            fallback
        } else {
            self.message.clone()
        }
    }
}

#[derive(Debug, Deserialize)]
struct WalletBalanceData {
    balance: Value,
    #[serde(default)]
    currency: Option<String>,
}

#[async_trait]
impl SupplierAdapter for DataXpressClient {
    fn id(&self) -> SupplierId {
        SupplierId::DataXpress
    }

    async fn purchase(&self, request: &PurchaseRequest) -> PurchaseResult {
        let api_key = match self.api_key() {
            Ok(key) => key,
            Err(result) => return result,
        };

        let body = BuyDataRequest {
            reference: &request.order_reference,
            phone: &request.phone_number,
            volume_in_mb: Self::volume_in_mb(request.data_amount),
            amount: request.price,
            network_type: NETWORK_TYPE,
        };

        debug!(
            reference = %request.order_reference,
            phone = %request.phone_number,
            data_amount = %request.data_amount,
            volume_in_mb = body.volume_in_mb,
            "sending data order to DataXpress"
        );

        let response = self
            .client
            .post(format!("{}/api/buy-data", self.base_url))
            .header("X-API-KEY", api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => return PurchaseResult::err(e.to_string()),
        };

        let http_status = response.status();
        let parsed: ApiResponse = match response.json().await {
            Ok(r) => r,
            Err(e) => {
                return PurchaseResult::err(format!("failed to parse DataXpress response: {e}"))
            }
        };

        if http_status.is_success() && parsed.is_success() {
            info!(reference = %request.order_reference, "DataXpress order accepted");
            PurchaseResult::ok(parsed.message.clone(), parsed.data)
        } else {
            let message =
                parsed.message_or(format!("API request failed with status {http_status}"));
            warn!(reference = %request.order_reference, error = %message, "DataXpress order failed");
            PurchaseResult::err(message)
        }
    }

    async fn balance(&self) -> BalanceResult {
        let Some(api_key) = self.api_key.as_deref() else {
            return BalanceResult::err("DataXpress API key not configured");
        };

        let response = self
            .client
            .get(format!("{}/api/wallet-balance", self.base_url))
            .header("X-API-KEY", api_key)
            .timeout(self.timeout)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => return BalanceResult::err(e.to_string()),
        };

        let http_status = response.status();
        let parsed: ApiResponse = match response.json().await {
            Ok(r) => r,
            Err(e) => return BalanceResult::err(format!("failed to parse DataXpress response: {e}")),
        };

        if !http_status.is_success() || !parsed.is_success() {
            return BalanceResult::err(parsed.message_or("failed to fetch wallet balance".into()));
        }

        let data: WalletBalanceData = match parsed
            .data
            .map(serde_json::from_value)
            .transpose()
        {
            Ok(Some(d)) => d,
            _ => return BalanceResult::err("wallet balance missing from response"),
        };

        match decimal_from_value(&data.balance) {
            Some(balance) => BalanceResult::ok(
                balance,
                data.currency.unwrap_or_else(|| datashop_types::CURRENCY.to_string()),
            ),
            None => BalanceResult::err("wallet balance missing from response"),
        }
    }

    async fn cost_price(&self, data_amount: DataAmount) -> CostPriceResult {
        let Some(api_key) = self.api_key.as_deref() else {
            return CostPriceResult::err("DataXpress API key not configured");
        };

        let body = CostPriceRequest {
            volume_in_mb: Self::volume_in_mb(data_amount),
            network_type: NETWORK_TYPE,
        };

        let response = self
            .client
            .post(format!("{}/api/get-cost-price", self.base_url))
            .header("X-API-KEY", api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => return CostPriceResult::err(e.to_string()),
        };

        let http_status = response.status();
        let parsed: ApiResponse = match response.json().await {
            Ok(r) => r,
            Err(e) => {
                return CostPriceResult::err(format!("failed to parse DataXpress response: {e}"))
            }
        };

        if !http_status.is_success() || !parsed.is_success() {
            return CostPriceResult::err(parsed.message_or("failed to fetch cost price".into()));
        }

        // The field name has drifted across API versions.
        let cost_price = parsed.data.as_ref().and_then(|data| {
            ["cost_price", "costPrice", "price"]
                .iter()
                .find_map(|key| data.get(key).and_then(decimal_from_value))
        });

        match cost_price {
            Some(price) => CostPriceResult::ok(price),
            None => CostPriceResult::err("cost price not found in response"),
        }
    }

    async fn order_status(&self, reference: &str) -> OrderStatusResult {
        let Some(api_key) = self.api_key.as_deref() else {
            return OrderStatusResult::err("DataXpress API key not configured");
        };

        let response = self
            .client
            .get(format!("{}/api/order-status/{reference}", self.base_url))
            .header("X-API-KEY", api_key)
            .timeout(self.timeout)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => return OrderStatusResult::err(e.to_string()),
        };

        let http_status = response.status();
        let parsed: ApiResponse = match response.json().await {
            Ok(r) => r,
            Err(e) => {
                return OrderStatusResult::err(format!("failed to parse DataXpress response: {e}"))
            }
        };

        if !http_status.is_success() || !parsed.is_success() {
            return OrderStatusResult::err(parsed.message_or("failed to check order status".into()));
        }

        let status = parsed
            .data
            .as_ref()
            .and_then(|d| d.get("status"))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        OrderStatusResult::ok(status, parsed.data)
    }
}
