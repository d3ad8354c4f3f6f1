/*!
 * Transfer Layer
 * Byte marshaling between a caller's memory and the channel buffer
 */

use crate::core::types::Size;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A caller-side memory access failed
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{0}")]
pub struct CopyFault(pub String);

impl CopyFault {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Destination of a receive: caller memory the channel copies into
pub trait CopyOut {
    /// Number of bytes the caller asked for
    fn size(&self) -> Size;

    /// Copy `src` to the start of the caller's memory
    fn copy_out(&mut self, src: &[u8]) -> Result<(), CopyFault>;
}

/// Source of a send: caller memory the channel copies from
pub trait CopyIn {
    /// Length of the caller's message
    fn size(&self) -> Size;

    /// Fill `dst` (exactly `size()` bytes) from the caller's memory
    fn copy_in(&self, dst: &mut [u8]) -> Result<(), CopyFault>;
}

impl CopyOut for [u8] {
    #[inline]
    fn size(&self) -> Size {
        self.len()
    }

    fn copy_out(&mut self, src: &[u8]) -> Result<(), CopyFault> {
        let available = self.len();
        let dst = self.get_mut(..src.len()).ok_or_else(|| {
            CopyFault::new(format!(
                "destination holds {} bytes, {} required",
                available,
                src.len()
            ))
        })?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

impl CopyOut for Vec<u8> {
    #[inline]
    fn size(&self) -> Size {
        self.len()
    }

    fn copy_out(&mut self, src: &[u8]) -> Result<(), CopyFault> {
        self.as_mut_slice().copy_out(src)
    }
}

impl CopyIn for [u8] {
    #[inline]
    fn size(&self) -> Size {
        self.len()
    }

    fn copy_in(&self, dst: &mut [u8]) -> Result<(), CopyFault> {
        if dst.len() != self.len() {
            return Err(CopyFault::new(format!(
                "source holds {} bytes, {} requested",
                self.len(),
                dst.len()
            )));
        }
        dst.copy_from_slice(self);
        Ok(())
    }
}

impl CopyIn for Vec<u8> {
    #[inline]
    fn size(&self) -> Size {
        self.len()
    }

    fn copy_in(&self, dst: &mut [u8]) -> Result<(), CopyFault> {
        self.as_slice().copy_in(dst)
    }
}

impl CopyIn for str {
    #[inline]
    fn size(&self) -> Size {
        self.len()
    }

    fn copy_in(&self, dst: &mut [u8]) -> Result<(), CopyFault> {
        self.as_bytes().copy_in(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_out_into_larger_slice() {
        let mut dst = [0xffu8; 8];
        dst.copy_out(b"abc").unwrap();
        assert_eq!(&dst[..4], b"abc\xff");
    }

    #[test]
    fn test_copy_out_short_destination_faults() {
        let mut dst = [0u8; 2];
        let err = dst.copy_out(b"abc").unwrap_err();
        assert!(err.0.contains("2 bytes"));
        assert_eq!(dst, [0, 0]);
    }

    #[test]
    fn test_copy_in_length_mismatch_faults() {
        let src: &[u8] = b"hello";
        let mut dst = [0u8; 3];
        assert!(src.copy_in(&mut dst).is_err());
    }

    #[test]
    fn test_str_copy_in() {
        let mut dst = [0u8; 5];
        "hello".copy_in(&mut dst).unwrap();
        assert_eq!(&dst, b"hello");
    }
}
