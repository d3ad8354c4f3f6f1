/*!
 * Mailbox Channel
 * Single-slot shared buffer with blocking and non-blocking hand-off
 */

use super::metadata::{MetadataCell, TransferMetadata};
use super::mode::ModeControl;
use super::types::{wait_error, CallContext, IoMode, MailboxError, MailboxResult};
use crate::core::limits::{MAX_CAPACITY, MIN_CAPACITY};
use crate::core::sync::wait_until;
use crate::core::types::{Offset, Size};
use crate::ipc::transfer::{CopyIn, CopyOut};
use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Buffer state guarded by the channel mutex
struct Slot {
    data: Box<[u8]>,
    /// Length of the stored message (binary-safe, may contain zero bytes)
    len: Size,
    /// True iff `data[..len]` holds an unconsumed message
    occupied: bool,
}

/// Single-slot mailbox
///
/// Holds at most one message. A sender waits until a receive has consumed
/// the previous message; a receiver waits until a message is present. Both
/// waits run inside the same mutex that guards the buffer and the metadata
/// updates, so no caller observes a torn transfer.
///
/// The channel owns no threads. Share it with `Arc` between sessions.
pub struct Channel {
    capacity: Size,
    slot: Mutex<Slot>,
    /// Signalled when a message lands
    data_ready: Condvar,
    /// Signalled when a receive frees the slot
    space_ready: Condvar,
    mode: ModeControl,
    metadata: MetadataCell,
}

impl Channel {
    /// Create an empty blocking channel
    ///
    /// Capacity is clamped to `MIN_CAPACITY..=MAX_CAPACITY`.
    pub fn new(capacity: Size) -> Self {
        Self::with_mode(capacity, IoMode::Blocking)
    }

    pub fn with_mode(capacity: Size, mode: IoMode) -> Self {
        let clamped = capacity.clamp(MIN_CAPACITY, MAX_CAPACITY);
        if clamped != capacity {
            warn!(
                requested = capacity,
                capacity = clamped,
                "mailbox capacity clamped to supported range"
            );
        }
        info!(capacity = clamped, mode = %mode, "mailbox channel created");

        Self {
            capacity: clamped,
            slot: Mutex::new(Slot {
                data: vec![0u8; clamped].into_boxed_slice(),
                len: 0,
                occupied: false,
            }),
            data_ready: Condvar::new(),
            space_ready: Condvar::new(),
            mode: ModeControl::new(mode),
            metadata: MetadataCell::new(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> Size {
        self.capacity
    }

    /// Whether a message is waiting to be received
    pub fn is_occupied(&self) -> bool {
        self.slot.lock().occupied
    }

    /// Length of the waiting message, if any
    pub fn pending_len(&self) -> Option<Size> {
        let slot = self.slot.lock();
        slot.occupied.then_some(slot.len)
    }

    #[inline]
    pub fn mode(&self) -> IoMode {
        self.mode.get()
    }

    /// Switch the waiting discipline for all subsequent calls
    ///
    /// Callers already parked keep waiting under the mode they started with;
    /// nobody is woken by a mode change.
    pub fn set_mode(&self, mode: IoMode) {
        let _slot = self.slot.lock();
        let previous = self.mode.set(mode);
        if previous != mode {
            info!(from = %previous, to = %mode, "mailbox mode changed");
        }
    }

    /// Snapshot of the last read/write metadata, taken without blocking
    #[inline]
    pub fn query_info(&self) -> TransferMetadata {
        self.metadata.snapshot()
    }

    /// Receive the waiting message into `out`
    ///
    /// Copies `min(out.size(), len - cursor)` bytes starting at `cursor` and
    /// advances the cursor. Every completed receive consumes the message:
    /// the slot is zeroed and released, and one sender is woken. Bytes past
    /// what `out` could hold are discarded. A cursor at or past the end of
    /// the buffer returns 0 without touching the slot.
    pub fn receive<O>(
        &self,
        ctx: &CallContext<'_>,
        out: &mut O,
        cursor: &mut Offset,
    ) -> MailboxResult<Size>
    where
        O: CopyOut + ?Sized,
    {
        if *cursor >= self.capacity {
            debug!(pid = ctx.caller.pid, cursor = *cursor, "receive at end of buffer");
            return Ok(0);
        }

        let mode = self.mode.get();
        let mut slot = self.slot.lock();
        self.await_slot(&mut slot, ctx, mode, true)?;

        let start = (*cursor).min(slot.len);
        let end = start + out.size().min(slot.len - start);
        out.copy_out(&slot.data[start..end])?;

        let len = slot.len;
        slot.data[..len].fill(0);
        slot.len = 0;
        slot.occupied = false;
        self.metadata.record_read(ctx.caller);
        drop(slot);

        let bytes = end - start;
        *cursor += bytes;
        debug!(
            pid = ctx.caller.pid,
            bytes,
            discarded = len - bytes,
            cursor = *cursor,
            "mailbox receive"
        );

        self.space_ready.notify_one();
        Ok(bytes)
    }

    /// Store `message` as the single waiting message
    ///
    /// Messages longer than the capacity are rejected whole. Returns the
    /// number of bytes stored, or 0 when `cursor` is at the end of the buffer.
    pub fn send<I>(&self, ctx: &CallContext<'_>, message: &I, cursor: Offset) -> MailboxResult<Size>
    where
        I: CopyIn + ?Sized,
    {
        let len = message.size();
        if len > self.capacity {
            return Err(MailboxError::InvalidArgument(format!(
                "message of {} bytes exceeds mailbox capacity of {} bytes",
                len, self.capacity
            )));
        }
        if cursor >= self.capacity {
            debug!(pid = ctx.caller.pid, cursor, "send at end of buffer");
            return Ok(0);
        }

        let mode = self.mode.get();
        let mut slot = self.slot.lock();
        self.await_slot(&mut slot, ctx, mode, false)?;

        if let Err(fault) = message.copy_in(&mut slot.data[..len]) {
            slot.data[..len].fill(0);
            return Err(fault.into());
        }
        slot.data[len..].fill(0);
        slot.len = len;
        slot.occupied = true;
        self.metadata.record_write(ctx.caller);
        drop(slot);

        debug!(pid = ctx.caller.pid, bytes = len, "mailbox send");

        self.data_ready.notify_all();
        Ok(len)
    }

    /// Wake every parked caller so it re-checks its interrupt flag
    pub fn wake_all(&self) {
        let _slot = self.slot.lock();
        self.data_ready.notify_all();
        self.space_ready.notify_all();
    }

    /// Wait until the slot is occupied (`want_occupied`) or free
    fn await_slot(
        &self,
        slot: &mut MutexGuard<'_, Slot>,
        ctx: &CallContext<'_>,
        mode: IoMode,
        want_occupied: bool,
    ) -> MailboxResult<()> {
        let (condvar, waiting_for) = if want_occupied {
            (&self.data_ready, "data")
        } else {
            (&self.space_ready, "space")
        };

        if slot.occupied == want_occupied {
            return Ok(());
        }
        if mode == IoMode::NonBlocking {
            return Err(MailboxError::WouldBlock(format!(
                "no {} available in mailbox",
                waiting_for
            )));
        }

        debug!(pid = ctx.caller.pid, waiting_for, "parking on mailbox");
        wait_until(condvar, slot, ctx.interrupt, |s| s.occupied == want_occupied).map_err(|e| {
            // Hand a wake-up we may have absorbed to the next waiter
            if slot.occupied == want_occupied {
                condvar.notify_one();
            }
            debug!(pid = ctx.caller.pid, waiting_for, "mailbox wait interrupted");
            wait_error(e, waiting_for)
        })
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.slot.lock();
        f.debug_struct("Channel")
            .field("capacity", &self.capacity)
            .field("occupied", &slot.occupied)
            .field("len", &slot.len)
            .field("mode", &self.mode.get())
            .finish()
    }
}
