/*!
 * Transfer Metadata
 * Who last read and wrote the mailbox, and when
 */

use super::types::{MailboxError, MailboxResult};
use crate::core::limits::BUFFER_INFO_SIZE;
use crate::core::types::{unix_now, Caller, Pid, Timestamp, Uid};
use seqlock::SeqLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::macros::format_description;
use time::OffsetDateTime;

/// Snapshot of the most recent completed receive and send
///
/// Field order is the wire order of the `QueryBufferInfo` record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(C)]
pub struct TransferMetadata {
    pub last_read_time: Timestamp,
    pub last_write_time: Timestamp,
    pub last_read_pid: Pid,
    pub last_write_pid: Pid,
    pub last_read_owner: Uid,
    pub last_write_owner: Uid,
}

impl TransferMetadata {
    /// Encode as the fixed-layout little-endian control record
    pub fn to_bytes(&self) -> MailboxResult<Vec<u8>> {
        let bytes = bincode::serialize(self).map_err(|e| {
            MailboxError::CopyFault(format!("failed to encode buffer info: {}", e))
        })?;
        debug_assert_eq!(bytes.len(), BUFFER_INFO_SIZE);
        Ok(bytes)
    }

    /// Decode a control record produced by [`TransferMetadata::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> MailboxResult<Self> {
        if bytes.len() < BUFFER_INFO_SIZE {
            return Err(MailboxError::InvalidArgument(format!(
                "buffer info record needs {} bytes, got {}",
                BUFFER_INFO_SIZE,
                bytes.len()
            )));
        }
        bincode::deserialize(&bytes[..BUFFER_INFO_SIZE]).map_err(|e| {
            MailboxError::InvalidArgument(format!("malformed buffer info record: {}", e))
        })
    }

    pub fn last_reader(&self) -> Caller {
        Caller::new(self.last_read_pid, self.last_read_owner)
    }

    pub fn last_writer(&self) -> Caller {
        Caller::new(self.last_write_pid, self.last_write_owner)
    }
}

/// Render a timestamp as `dd-mm-YYYY HH:MM:SS UTC`
pub fn format_timestamp(ts: Timestamp) -> String {
    let format = format_description!("[day]-[month]-[year] [hour]:[minute]:[second] UTC");
    OffsetDateTime::from_unix_timestamp(ts)
        .ok()
        .and_then(|t| t.format(&format).ok())
        .unwrap_or_else(|| ts.to_string())
}

impl fmt::Display for TransferMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "last read time:       {}", format_timestamp(self.last_read_time))?;
        writeln!(f, "last write time:      {}", format_timestamp(self.last_write_time))?;
        writeln!(f, "last read PID:        {}", self.last_read_pid)?;
        writeln!(f, "last write PID:       {}", self.last_write_pid)?;
        writeln!(f, "last read owner UID:  {}", self.last_read_owner)?;
        write!(f, "last write owner UID: {}", self.last_write_owner)
    }
}

/// Seqlock-protected metadata cell
///
/// Writers are already serialized by the channel mutex; readers never block
/// and always observe one side's fields as a group.
pub(crate) struct MetadataCell {
    inner: SeqLock<TransferMetadata>,
}

impl MetadataCell {
    pub fn new() -> Self {
        Self {
            inner: SeqLock::new(TransferMetadata::default()),
        }
    }

    #[inline]
    pub fn snapshot(&self) -> TransferMetadata {
        self.inner.read()
    }

    pub fn record_read(&self, caller: Caller) {
        let now = unix_now();
        let mut meta = self.inner.lock_write();
        meta.last_read_time = now;
        meta.last_read_pid = caller.pid;
        meta.last_read_owner = caller.uid;
    }

    pub fn record_write(&self, caller: Caller) {
        let now = unix_now();
        let mut meta = self.inner.lock_write();
        meta.last_write_time = now;
        meta.last_write_pid = caller.pid;
        meta.last_write_owner = caller.uid;
    }
}
