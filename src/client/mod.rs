/// Upstream API access: credential rotation and degrade-gracefully fetching

pub mod fetch;
pub mod keys;

pub use fetch::TrackerClient;
pub use keys::KeyRotator;
