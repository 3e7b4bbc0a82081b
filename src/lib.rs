//! Order fulfillment core for a data bundle storefront
//!
//! Wires the supplier adapters, supplier router, fulfillment
//! orchestrator, and persistence layer into a running application.
//! The individual crates:
//!
//! - `datashop-types`: domain types (packages, orders, statuses)
//! - `datashop-suppliers`: wholesale supplier API adapters
//! - `datashop-routing`: active-supplier selection and call routing
//! - `datashop-store`: SQLite and in-memory persistence
//! - `datashop-fulfillment`: the order delivery state machine
//! - `datashop-config`: configuration loading and validation

pub mod bootstrap;

pub use bootstrap::{build, build_adapters, init_tracing, wire, App};

pub use datashop_config as config;
pub use datashop_fulfillment as fulfillment;
pub use datashop_routing as routing;
pub use datashop_store as store;
pub use datashop_suppliers as suppliers;
pub use datashop_types as types;
