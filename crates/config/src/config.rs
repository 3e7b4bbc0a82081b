//! Core configuration structures for the storefront services

use datashop_types::SupplierId;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Supplier integrations and routing
    #[serde(default)]
    pub suppliers: SuppliersConfig,

    /// Order and package storage
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Customer-facing fee settings
    #[serde(default)]
    pub fees: FeeConfig,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Supplier integration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuppliersConfig {
    /// DataXpress upstream
    #[serde(default)]
    pub dataxpress: DataXpressConfig,

    /// Hubnet upstream
    #[serde(default)]
    pub hubnet: HubnetConfig,

    /// Supplier used when no selection has been stored yet
    #[serde(default = "default_supplier")]
    pub default_supplier: SupplierId,

    /// Upstream HTTP request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// DataXpress API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataXpressConfig {
    /// API base URL
    #[serde(default = "default_dataxpress_base_url")]
    pub base_url: String,

    /// API key; purchases fail fast when unset
    pub api_key: Option<String>,
}

/// Hubnet API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubnetConfig {
    /// API base URL
    #[serde(default = "default_hubnet_base_url")]
    pub base_url: String,

    /// API key; purchases fail fast when unset
    pub api_key: Option<String>,

    /// Network segment used in transaction endpoint paths
    #[serde(default = "default_hubnet_network")]
    pub network: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

/// Fee configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Processing fee charged on top of the package price, in basis points
    #[serde(default = "default_processing_fee_bps")]
    pub processing_fee_bps: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_supplier() -> SupplierId {
    SupplierId::DataXpress
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_dataxpress_base_url() -> String {
    "https://www.dataxpress.shop".to_string()
}

fn default_hubnet_base_url() -> String {
    "https://console.hubnet.app/live/api/context/business/transaction".to_string()
}

fn default_hubnet_network() -> String {
    "mtn".to_string()
}

fn default_database_url() -> String {
    "sqlite:datashop.db?mode=rwc".to_string()
}

fn default_processing_fee_bps() -> u32 {
    datashop_types::DEFAULT_PROCESSING_FEE_BPS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            suppliers: SuppliersConfig::default(),
            database: DatabaseConfig::default(),
            fees: FeeConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for SuppliersConfig {
    fn default() -> Self {
        Self {
            dataxpress: DataXpressConfig::default(),
            hubnet: HubnetConfig::default(),
            default_supplier: default_supplier(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for DataXpressConfig {
    fn default() -> Self {
        Self {
            base_url: default_dataxpress_base_url(),
            api_key: None,
        }
    }
}

impl Default for HubnetConfig {
    fn default() -> Self {
        Self {
            base_url: default_hubnet_base_url(),
            api_key: None,
            network: default_hubnet_network(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            processing_fee_bps: default_processing_fee_bps(),
        }
    }
}
