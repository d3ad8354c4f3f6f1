/*!
 * Control Plane
 * Decoding and dispatch of the 32-bit control commands
 */

use super::channel::Channel;
use super::metadata::TransferMetadata;
use super::types::{IoMode, MailboxError, MailboxResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Control command codes (wire values are fixed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ControlCommand {
    SetBlocking = 0,
    SetNonBlocking = 1,
    QueryBufferInfo = 2,
}

impl ControlCommand {
    #[inline]
    pub const fn code(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for ControlCommand {
    type Error = MailboxError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ControlCommand::SetBlocking),
            1 => Ok(ControlCommand::SetNonBlocking),
            2 => Ok(ControlCommand::QueryBufferInfo),
            other => Err(MailboxError::InvalidArgument(format!(
                "unknown control command {}",
                other
            ))),
        }
    }
}

/// Outcome of a control command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reply", content = "info", rename_all = "snake_case")]
pub enum ControlReply {
    Done,
    BufferInfo(TransferMetadata),
}

impl Channel {
    /// Execute a raw control command code
    ///
    /// Unknown codes fail with `InvalidArgument` and change nothing.
    pub fn control(&self, code: u32) -> MailboxResult<ControlReply> {
        let command = ControlCommand::try_from(code).map_err(|e| {
            warn!(code, "rejected control command");
            e
        })?;
        debug!(?command, "control command");
        Ok(self.dispatch(command))
    }

    /// Execute a decoded control command
    pub fn dispatch(&self, command: ControlCommand) -> ControlReply {
        match command {
            ControlCommand::SetBlocking => {
                self.set_mode(IoMode::Blocking);
                ControlReply::Done
            }
            ControlCommand::SetNonBlocking => {
                self.set_mode(IoMode::NonBlocking);
                ControlReply::Done
            }
            ControlCommand::QueryBufferInfo => ControlReply::BufferInfo(self.query_info()),
        }
    }
}
