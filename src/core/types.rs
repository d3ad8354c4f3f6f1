/*!
 * Core Types
 * Common types used across the mailbox
 */

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Process ID type (matches the host `pid_t`)
pub type Pid = i32;

/// User ID type (matches the host `uid_t`)
pub type Uid = u32;

/// Timestamp in whole seconds since the Unix epoch
pub type Timestamp = i64;

/// Size type for buffer operations
pub type Size = usize;

/// Offset into the current message
pub type Offset = usize;

/// Identity of the process issuing a channel operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
    pub pid: Pid,
    pub uid: Uid,
}

impl Caller {
    pub const fn new(pid: Pid, uid: Uid) -> Self {
        Self { pid, uid }
    }

    /// Credentials of the current host process
    pub fn current() -> Self {
        Self {
            pid: nix::unistd::getpid().as_raw(),
            uid: nix::unistd::getuid().as_raw(),
        }
    }
}

impl std::fmt::Display for Caller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pid {} (uid {})", self.pid, self.uid)
    }
}

/// Current wall-clock time in seconds
pub fn unix_now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as Timestamp)
        .unwrap_or(0)
}
