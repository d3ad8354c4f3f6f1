/*!
 * IPC Module
 * Inter-process communication through the single-slot mailbox
 */

pub mod mailbox;
pub mod transfer;

// Re-export for convenience
pub use mailbox::{
    CallContext, Channel, ControlCommand, ControlReply, IoMode, MailboxError, MailboxResult,
    TransferMetadata,
};
pub use transfer::{CopyFault, CopyIn, CopyOut};
