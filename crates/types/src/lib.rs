pub mod amount;
pub mod order;
pub mod package;
pub mod status;
pub mod supplier;

pub use amount::*;
pub use order::*;
pub use package::*;
pub use status::*;
pub use supplier::*;

/// Settlement currency for all customer and wholesale amounts.
pub const CURRENCY: &str = "GHS";

/// Current unix timestamp in seconds.
pub fn current_timestamp() -> u64 {
    chrono::Utc::now().timestamp() as u64
}
