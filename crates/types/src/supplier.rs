use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The closed set of wholesale suppliers.
///
/// Routing decisions match exhaustively on this enum; adding a supplier
/// means adding a variant and an adapter, never string branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplierId {
    DataXpress,
    Hubnet,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SupplierIdError {
    #[error("unknown supplier: {0}")]
    Unknown(String),
}

impl SupplierId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupplierId::DataXpress => "dataxpress",
            SupplierId::Hubnet => "hubnet",
        }
    }

    /// All known suppliers, in default-preference order.
    pub fn all() -> [SupplierId; 2] {
        [SupplierId::DataXpress, SupplierId::Hubnet]
    }
}

impl fmt::Display for SupplierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupplierId {
    type Err = SupplierIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dataxpress" => Ok(SupplierId::DataXpress),
            "hubnet" => Ok(SupplierId::Hubnet),
            other => Err(SupplierIdError::Unknown(other.to_string())),
        }
    }
}
