/*!
 * Mailbox Device and Sessions
 * File-like access to the shared channel: open, read, write, ioctl, release
 */

use super::config::MailboxConfig;
use crate::core::sync::InterruptFlag;
use crate::core::types::{Caller, Offset, Size};
use crate::ipc::mailbox::{
    CallContext, Channel, ControlReply, IoMode, MailboxResult, TransferMetadata,
};
use crate::ipc::transfer::{CopyIn, CopyOut};
use crate::monitoring::span_operation;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Session identifier, unique per device
pub type SessionId = u64;

/// A mailbox exposed as a device node
///
/// Cheap to clone; clones share the channel and session accounting.
#[derive(Clone)]
pub struct MailboxDevice {
    name: Arc<str>,
    channel: Arc<Channel>,
    open_sessions: Arc<AtomicUsize>,
    next_session_id: Arc<AtomicU64>,
}

impl MailboxDevice {
    pub fn new(config: &MailboxConfig) -> Self {
        let channel = Channel::with_mode(config.capacity, config.initial_mode);
        info!(
            device = %config.device_name,
            capacity = channel.capacity(),
            mode = %config.initial_mode,
            "mailbox device registered"
        );
        Self {
            name: Arc::from(config.device_name.as_str()),
            channel: Arc::new(channel),
            open_sessions: Arc::new(AtomicUsize::new(0)),
            next_session_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shared channel behind this device
    pub fn channel(&self) -> &Arc<Channel> {
        &self.channel
    }

    /// Number of sessions currently open
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::Acquire)
    }

    /// Open a new session for `caller`
    pub fn open(&self, caller: Caller) -> Session {
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let open = self.open_sessions.fetch_add(1, Ordering::AcqRel) + 1;
        info!(device = %self.name, session = id, %caller, open, "session opened");

        Session {
            id,
            caller,
            cursor: 0,
            interrupt: Arc::new(InterruptFlag::new()),
            channel: Arc::clone(&self.channel),
            open_sessions: Arc::clone(&self.open_sessions),
        }
    }
}

impl std::fmt::Debug for MailboxDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxDevice")
            .field("name", &self.name)
            .field("channel", &self.channel)
            .field("open_sessions", &self.open_sessions())
            .finish()
    }
}

/// One caller's open handle on the device
///
/// Owns the cursor into the message being read. Each read consumes one
/// message, so the cursor starts over at the head of the next one.
/// Dropping the session releases it.
pub struct Session {
    id: SessionId,
    caller: Caller,
    cursor: Offset,
    interrupt: Arc<InterruptFlag>,
    channel: Arc<Channel>,
    open_sessions: Arc<AtomicUsize>,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn caller(&self) -> Caller {
        self.caller
    }

    /// Read the waiting message, up to `buf.size()` bytes of it
    ///
    /// The message is consumed even if `buf` is shorter than it.
    pub fn read<O>(&mut self, buf: &mut O) -> MailboxResult<Size>
    where
        O: CopyOut + ?Sized,
    {
        let span = span_operation("read", self.id, self.caller.pid);
        let _guard = span.enter();

        let ctx = CallContext::new(self.caller, &self.interrupt);
        let result = self.channel.receive(&ctx, buf, &mut self.cursor);
        if let Ok(bytes) = result {
            span.record_bytes(bytes);
            self.cursor = 0;
        }
        span.record_outcome(&result);
        result
    }

    /// Write `data` as the next message
    pub fn write<I>(&mut self, data: &I) -> MailboxResult<Size>
    where
        I: CopyIn + ?Sized,
    {
        let span = span_operation("write", self.id, self.caller.pid);
        let _guard = span.enter();

        let ctx = CallContext::new(self.caller, &self.interrupt);
        let result = self.channel.send(&ctx, data, self.cursor);
        if let Ok(bytes) = result {
            span.record_bytes(bytes);
        }
        span.record_outcome(&result);
        result
    }

    /// Issue a raw control command
    ///
    /// `QueryBufferInfo` copies the fixed-layout metadata record into `arg`;
    /// the mode commands ignore it.
    pub fn ioctl<O>(&mut self, code: u32, arg: &mut O) -> MailboxResult<ControlReply>
    where
        O: CopyOut + ?Sized,
    {
        let span = span_operation("ioctl", self.id, self.caller.pid);
        let _guard = span.enter();

        let result = self.channel.control(code).and_then(|reply| {
            if let ControlReply::BufferInfo(info) = &reply {
                let record = info.to_bytes()?;
                arg.copy_out(&record)?;
                span.record_bytes(record.len());
            }
            Ok(reply)
        });
        span.record_outcome(&result);
        result
    }

    pub fn set_mode(&self, mode: IoMode) {
        self.channel.set_mode(mode);
    }

    pub fn query_info(&self) -> TransferMetadata {
        self.channel.query_info()
    }

    /// Handle for aborting this session's waits from another thread
    pub fn interrupter(&self) -> Interrupter {
        Interrupter {
            session: self.id,
            flag: Arc::clone(&self.interrupt),
            channel: Arc::clone(&self.channel),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let open = self.open_sessions.fetch_sub(1, Ordering::AcqRel) - 1;
        info!(session = self.id, caller = %self.caller, open, "session released");
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("caller", &self.caller)
            .field("cursor", &self.cursor)
            .field("interrupt_pending", &self.interrupt.is_pending())
            .finish()
    }
}

/// Delivers an interrupt to one session
///
/// A parked read or write returns `Interrupted`; if the session is not
/// waiting, the interrupt stays pending and aborts its next wait.
#[derive(Clone)]
pub struct Interrupter {
    session: SessionId,
    flag: Arc<InterruptFlag>,
    channel: Arc<Channel>,
}

impl Interrupter {
    pub fn interrupt(&self) {
        debug!(session = self.session, "interrupt delivered");
        self.flag.raise();
        self.channel.wake_all();
    }

    pub fn session(&self) -> SessionId {
        self.session
    }
}
