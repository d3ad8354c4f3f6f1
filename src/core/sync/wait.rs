/*!
 * Interruptible Waits
 *
 * Condition waits that re-check their predicate after every wake-up and can
 * be aborted by a pending interrupt.
 *
 * # Protocol
 *
 * The predicate and the interrupt flag are both tested while the mutex is
 * held, and the condvar releases that mutex atomically when parking. An
 * interrupter that raises the flag and then notifies under the same mutex
 * can therefore never be missed.
 */

use parking_lot::{Condvar, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Result type for wait operations
pub type WaitResult<T> = Result<T, WaitError>;

/// Wait operation errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    #[error("Wait was interrupted")]
    Interrupted,
}

/// Pending-interrupt flag of a single caller
///
/// Raising the flag only records the interrupt; whoever owns the condvar the
/// caller parks on is responsible for waking it.
#[derive(Debug, Default)]
pub struct InterruptFlag {
    pending: AtomicBool,
}

impl InterruptFlag {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Mark an interrupt as pending
    #[inline]
    pub fn raise(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Consume the pending interrupt, returning whether one was pending
    #[inline]
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }
}

/// Park on `condvar` until `ready` holds for the guarded state
///
/// The predicate is evaluated before the first park and after every wake,
/// so spurious and stolen wake-ups are harmless. A pending interrupt is
/// only consumed when the predicate is false.
pub fn wait_until<T, F>(
    condvar: &Condvar,
    guard: &mut MutexGuard<'_, T>,
    interrupt: &InterruptFlag,
    mut ready: F,
) -> WaitResult<()>
where
    F: FnMut(&T) -> bool,
{
    loop {
        if ready(&**guard) {
            return Ok(());
        }
        if interrupt.take() {
            return Err(WaitError::Interrupted);
        }
        condvar.wait(guard);
    }
}
