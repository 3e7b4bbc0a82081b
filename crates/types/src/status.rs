use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown status: {0}")]
pub struct StatusParseError(String);

/// Payment lifecycle of an order.
///
/// Transitions happen via payment confirmation (webhook) or admin edit,
/// never via the fulfillment orchestrator. Independent of
/// [`FulfillmentStatus`]: a completed payment can sit next to a failed
/// fulfillment and must stay visible and retriable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "processing" => Ok(PaymentStatus::Processing),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

/// Delivery lifecycle of an order, mutated only by the orchestrator.
///
/// Allowed transitions:
///
/// ```text
/// pending  --claim--> processing --supplier ok--> fulfilled
/// pending  --claim--> processing --supplier err-> failed
/// failed   --retry--> processing --...----------> fulfilled | failed
/// fulfilled | processing --fulfill--> no-op
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentStatus {
    Pending,
    Processing,
    Fulfilled,
    Failed,
}

impl FulfillmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::Pending => "pending",
            FulfillmentStatus::Processing => "processing",
            FulfillmentStatus::Fulfilled => "fulfilled",
            FulfillmentStatus::Failed => "failed",
        }
    }

    /// Whether a fulfillment attempt may begin from this state.
    pub fn is_retriable(&self) -> bool {
        matches!(self, FulfillmentStatus::Pending | FulfillmentStatus::Failed)
    }

    /// Fulfilled is the only terminal success; nothing transitions out of it.
    pub fn is_terminal_success(&self) -> bool {
        matches!(self, FulfillmentStatus::Fulfilled)
    }
}

impl fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FulfillmentStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FulfillmentStatus::Pending),
            "processing" => Ok(FulfillmentStatus::Processing),
            "fulfilled" => Ok(FulfillmentStatus::Fulfilled),
            "failed" => Ok(FulfillmentStatus::Failed),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fulfillment_retriability() {
        assert!(FulfillmentStatus::Pending.is_retriable());
        assert!(FulfillmentStatus::Failed.is_retriable());
        assert!(!FulfillmentStatus::Processing.is_retriable());
        assert!(!FulfillmentStatus::Fulfilled.is_retriable());

        assert!(FulfillmentStatus::Fulfilled.is_terminal_success());
        assert!(!FulfillmentStatus::Failed.is_terminal_success());
    }

    #[test]
    fn test_status_string_round_trips() {
        for status in [
            FulfillmentStatus::Pending,
            FulfillmentStatus::Processing,
            FulfillmentStatus::Fulfilled,
            FulfillmentStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<FulfillmentStatus>().unwrap(), status);
        }

        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Processing,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
    }
}
