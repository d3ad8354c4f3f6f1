/*!
 * Mailbox Module
 * Single-slot shared-memory channel with a metadata side channel
 */

pub mod channel;
pub mod control;
pub mod metadata;
mod mode;
pub mod types;

// Re-export public API
pub use channel::Channel;
pub use control::{ControlCommand, ControlReply};
pub use metadata::{format_timestamp, TransferMetadata};
pub use types::{CallContext, IoMode, MailboxError, MailboxResult};
