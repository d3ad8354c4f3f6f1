/*!
 * System Limits and Constants
 *
 * Centralized location for mailbox limits, defaults and wire constants.
 */

// =============================================================================
// CHANNEL LIMITS
// =============================================================================

/// Default mailbox capacity (1KB)
pub const DEFAULT_CAPACITY: usize = 1024;

/// Smallest usable mailbox
pub const MIN_CAPACITY: usize = 1;

/// Largest mailbox a single device may allocate (1MB)
pub const MAX_CAPACITY: usize = 1024 * 1024;

// =============================================================================
// DEVICE
// =============================================================================

/// Device node name used when none is configured
pub const DEFAULT_DEVICE_NAME: &str = "mailbox";

// =============================================================================
// CONTROL PLANE
// =============================================================================

/// Size of the `QueryBufferInfo` record: two i64 timestamps, two i32 pids,
/// two u32 owner ids
pub const BUFFER_INFO_SIZE: usize = 2 * 8 + 2 * 4 + 2 * 4;

// =============================================================================
// TRACING
// =============================================================================

/// Device operations slower than this are logged at warn level
pub const SLOW_OPERATION_MS: u128 = 100;
