//! Device model: appliance types, feature payloads, and power transitions.

/// The device record and its On/Off state machine.
pub mod device;
/// Per-type feature payloads and clamping.
pub mod features;
pub mod types;

// Re-export the main types for convenience
pub use device::{Device, PowerTransition};
pub use features::{FeatureKey, Features, RawFeatures};
pub use types::{DeviceType, FanSpeed, Power};
