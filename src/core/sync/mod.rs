/*!
 * Synchronization Primitives
 *
 * Interruptible condition waits used by the mailbox channel.
 */

mod wait;

pub use wait::{wait_until, InterruptFlag, WaitError, WaitResult};
