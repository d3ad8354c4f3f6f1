/*!
 * Mailbox Types
 * Errors, I/O mode and call context for the single-slot channel
 */

use crate::core::sync::{InterruptFlag, WaitError};
use crate::core::types::Caller;
use crate::ipc::transfer::CopyFault;
use miette::Diagnostic;
use nix::errno::Errno;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Mailbox operation result
pub type MailboxResult<T> = Result<T, MailboxError>;

/// Mailbox error types
///
/// Every failing operation leaves the buffer, its occupancy and the
/// transfer metadata exactly as they were before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum MailboxError {
    #[error("Would block: {0}")]
    #[diagnostic(
        code(mailbox::would_block),
        help("The mailbox is in non-blocking mode. Retry once the peer has run.")
    )]
    WouldBlock(String),

    #[error("Interrupted while waiting for {0}")]
    #[diagnostic(
        code(mailbox::interrupted),
        help("The wait was aborted by a signal. No data was transferred.")
    )]
    Interrupted(String),

    #[error("Invalid argument: {0}")]
    #[diagnostic(
        code(mailbox::invalid_argument),
        help("Messages must fit the mailbox capacity and control codes must be 0, 1 or 2.")
    )]
    InvalidArgument(String),

    #[error("Copy fault: {0}")]
    #[diagnostic(
        code(mailbox::copy_fault),
        help("Caller memory could not be accessed. The mailbox itself is unaffected.")
    )]
    CopyFault(String),
}

impl MailboxError {
    /// Host errno reported across the device boundary
    pub fn errno(&self) -> Errno {
        match self {
            MailboxError::WouldBlock(_) => Errno::EAGAIN,
            MailboxError::Interrupted(_) => Errno::EINTR,
            MailboxError::InvalidArgument(_) => Errno::EINVAL,
            MailboxError::CopyFault(_) => Errno::EFAULT,
        }
    }

    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MailboxError::WouldBlock(_) | MailboxError::Interrupted(_)
        )
    }
}

impl From<CopyFault> for MailboxError {
    fn from(fault: CopyFault) -> Self {
        MailboxError::CopyFault(fault.0)
    }
}

/// Waiting discipline shared by every caller of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum IoMode {
    /// Callers park until their operation can proceed
    #[default]
    Blocking = 0,
    /// Callers fail with `WouldBlock` instead of parking
    NonBlocking = 1,
}

impl IoMode {
    pub(crate) const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => IoMode::Blocking,
            _ => IoMode::NonBlocking,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IoMode::Blocking => "blocking",
            IoMode::NonBlocking => "nonblocking",
        }
    }
}

impl std::fmt::Display for IoMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IoMode {
    type Err = MailboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blocking" | "block" => Ok(IoMode::Blocking),
            "nonblocking" | "non-blocking" | "nonblock" => Ok(IoMode::NonBlocking),
            other => Err(MailboxError::InvalidArgument(format!(
                "unknown I/O mode '{}'",
                other
            ))),
        }
    }
}

/// Who is calling, and how to abort them if they have to wait
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    pub caller: Caller,
    pub interrupt: &'a InterruptFlag,
}

impl<'a> CallContext<'a> {
    pub fn new(caller: Caller, interrupt: &'a InterruptFlag) -> Self {
        Self { caller, interrupt }
    }
}

/// Map an aborted wait onto the mailbox taxonomy
pub(crate) fn wait_error(err: WaitError, waiting_for: &str) -> MailboxError {
    match err {
        WaitError::Interrupted => MailboxError::Interrupted(waiting_for.to_string()),
    }
}
