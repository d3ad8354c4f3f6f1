/*!
 * Mode Control
 * The single blocking/non-blocking switch shared by every session
 */

use super::types::IoMode;
use std::sync::atomic::{AtomicU8, Ordering};

/// Global waiting discipline of a channel
///
/// Readable without the channel lock: a stale value only changes which
/// discipline a caller picks, never buffer integrity.
#[derive(Debug)]
pub(crate) struct ModeControl {
    mode: AtomicU8,
}

impl ModeControl {
    pub const fn new(mode: IoMode) -> Self {
        Self {
            mode: AtomicU8::new(mode as u8),
        }
    }

    #[inline]
    pub fn get(&self) -> IoMode {
        IoMode::from_u8(self.mode.load(Ordering::Acquire))
    }

    /// Overwrite the mode, returning the previous one
    #[inline]
    pub fn set(&self, mode: IoMode) -> IoMode {
        IoMode::from_u8(self.mode.swap(mode as u8, Ordering::AcqRel))
    }
}
