/*!
 * AI-OS Mailbox Library
 * Single-slot shared-memory mailbox with blocking and non-blocking hand-off
 */

pub mod core;
pub mod device;
pub mod ipc;
pub mod monitoring;

// Re-exports
pub use crate::core::sync::InterruptFlag;
pub use crate::core::types::{Caller, Pid, Uid};
pub use device::{ConfigError, Interrupter, MailboxConfig, MailboxDevice, Session};
pub use ipc::{
    CallContext, Channel, ControlCommand, ControlReply, CopyFault, CopyIn, CopyOut, IoMode,
    MailboxError, MailboxResult, TransferMetadata,
};
pub use monitoring::init_tracing;
