use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Semantic package size, canonical form `"<integer>GB"`.
///
/// Suppliers disagree on wire units (binary megabytes, decimal megabytes,
/// bare volume codes), so this type exposes only the gigabyte integer and
/// each supplier adapter applies its own conversion rule. Parsing fails
/// closed: anything that does not match `^\d+GB$` is rejected, as are
/// leading zeros, so every accepted string is already in canonical form
/// and a malformed size can never reach a supplier call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataAmount(u32);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataAmountError {
    #[error("invalid data amount format: {0:?} (expected e.g. \"5GB\")")]
    InvalidFormat(String),
}

impl DataAmount {
    pub fn new(gigabytes: u32) -> Self {
        Self(gigabytes)
    }

    /// The gigabyte integer prefix, e.g. `5` for `"5GB"`.
    pub fn gigabytes(&self) -> u32 {
        self.0
    }
}

impl FromStr for DataAmount {
    type Err = DataAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_suffix("GB")
            .ok_or_else(|| DataAmountError::InvalidFormat(s.to_string()))?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DataAmountError::InvalidFormat(s.to_string()));
        }

        // Leading zeros would re-serialize to a different string and
        // break the canonical-form round trip.
        if digits.starts_with('0') && digits != "0" {
            return Err(DataAmountError::InvalidFormat(s.to_string()));
        }

        digits
            .parse::<u32>()
            .map(Self)
            .map_err(|_| DataAmountError::InvalidFormat(s.to_string()))
    }
}

impl TryFrom<String> for DataAmount {
    type Error = DataAmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataAmount> for String {
    fn from(value: DataAmount) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DataAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}GB", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_amounts() {
        assert_eq!("1GB".parse::<DataAmount>().unwrap().gigabytes(), 1);
        assert_eq!("5GB".parse::<DataAmount>().unwrap().gigabytes(), 5);
        assert_eq!("100GB".parse::<DataAmount>().unwrap().gigabytes(), 100);
    }

    #[test]
    fn test_parse_rejects_malformed_amounts() {
        for input in [
            "5MB", "GB", "", "5", "5 GB", "5gb", "-5GB", "5.5GB", "5GBs", "05GB", "007GB",
        ] {
            assert!(
                input.parse::<DataAmount>().is_err(),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_display_round_trips() {
        let amount: DataAmount = "10GB".parse().unwrap();
        assert_eq!(amount.to_string(), "10GB");
        assert_eq!(amount.to_string().parse::<DataAmount>().unwrap(), amount);
    }

    #[test]
    fn test_every_accepted_string_is_canonical() {
        // Whatever parses must re-serialize byte for byte, so stored
        // text never drifts from round-tripped text.
        for input in ["0GB", "1GB", "10GB", "100GB"] {
            assert_eq!(input.parse::<DataAmount>().unwrap().to_string(), input);
        }
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let amount = DataAmount::new(5);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"5GB\"");

        let parsed: DataAmount = serde_json::from_str("\"5GB\"").unwrap();
        assert_eq!(parsed, amount);

        assert!(serde_json::from_str::<DataAmount>("\"5MB\"").is_err());
    }
}
