#![forbid(unsafe_code)]

pub mod entitlement;
pub mod error;
pub mod gate;
pub mod model;
pub mod stats;
pub mod time;

pub use entitlement::{AccessTier, Feature, resolve_status};
pub use error::Error;
pub use gate::{Decision, DenyReason, FeatureGate, GatedAction};
pub use time::Clock;
