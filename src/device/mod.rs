/*!
 * Device Module
 * Session layer exposing the mailbox through a file-like interface
 */

pub mod config;
pub mod session;

// Re-export public API
pub use config::{ConfigError, MailboxConfig};
pub use session::{Interrupter, MailboxDevice, Session, SessionId};
