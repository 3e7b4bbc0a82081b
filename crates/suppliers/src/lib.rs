pub mod adapter;
pub mod dataxpress;
pub mod hubnet;
pub mod mock;

pub use adapter::*;
pub use dataxpress::*;
pub use hubnet::*;
pub use mock::*;
