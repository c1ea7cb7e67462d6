//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Field keys read back by the test capture layer
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_ENTITY: &str = "entity";
pub const FIELD_CACHE_KEY: &str = "cache_key";

// Canonical operation event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Cache path event names
pub const EVENT_CACHE_HIT: &str = "cache_hit";
pub const EVENT_CACHE_MISS: &str = "cache_miss";
pub const EVENT_CACHE_UNAVAILABLE: &str = "cache_unavailable";
pub const EVENT_CACHE_DECODE_FAILED: &str = "cache_decode_failed";
pub const EVENT_CACHE_WRITE_FAILED: &str = "cache_write_failed";
