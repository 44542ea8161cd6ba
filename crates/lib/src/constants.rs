//! Constants used throughout the mapsync library.
//!
//! Event names published to outward observers and default tuning values.

/// Name of the notification published when a member joins a collection.
pub const MEMBER_ADDED: &str = "member-added";

/// Name of the notification published when a member leaves a collection.
pub const MEMBER_REMOVED: &str = "member-removed";

/// Prefix of per-property update notifications (`update:<name>`).
pub const UPDATE_PREFIX: &str = "update:";

/// Default coalescing interval for native property changes, one frame at 60 Hz.
pub const DEFAULT_THROTTLE_INTERVAL_MS: f64 = 1000.0 / 60.0;

/// Default buffer size of outward notification channels.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Priority assigned to objects that carry none.
pub const DEFAULT_PRIORITY: f64 = 0.0;
