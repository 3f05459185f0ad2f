//! Producer/consumer byte FIFO used to stage scan data.
//!
//! Not a ring buffer: unread bytes always form one
//! contiguous slice so they can be handed to the pixel pipeline as-is. When a
//! write needs more room than is left at the tail, the unread region is moved
//! back to offset 0 first.
//!
//! The slices returned by [`FifoBuffer::get_write_pos`] and
//! [`FifoBuffer::get_read_pos`] borrow the buffer, so they cannot outlive a
//! later `alloc`, `clear` or compaction.

use crate::error::{GenesysError, Result};

#[derive(Debug, Default, Clone)]
pub struct FifoBuffer {
    storage: Vec<u8>,
    pos: usize,
    avail: usize,
}

impl FifoBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the storage with `size` zeroed bytes and reset the cursors.
    pub fn alloc(&mut self, size: usize) {
        self.storage = vec![0; size];
        self.pos = 0;
        self.avail = 0;
    }

    /// Release the storage.
    pub fn clear(&mut self) {
        self.storage = Vec::new();
        self.pos = 0;
        self.avail = 0;
    }

    /// Forget all unread data, keeping the storage.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.avail = 0;
    }

    /// Total capacity in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.storage.len()
    }

    /// Bytes ready to be consumed.
    #[inline]
    pub fn avail(&self) -> usize {
        self.avail
    }

    /// Free bytes, counting the already-consumed head.
    #[inline]
    pub fn free(&self) -> usize {
        self.storage.len() - self.avail
    }

    /// Writable view of `size` bytes right after the unread data, or `None`
    /// when the buffer cannot take `size` more bytes.
    ///
    /// Compacts the unread data to offset 0 when the tail is too short.
    pub fn get_write_pos(&mut self, size: usize) -> Option<&mut [u8]> {
        if self.avail + size > self.storage.len() {
            return None;
        }
        if self.pos + self.avail + size > self.storage.len() {
            self.compact();
        }
        let start = self.pos + self.avail;
        Some(&mut self.storage[start..start + size])
    }

    /// Commit `size` bytes written through `get_write_pos`.
    pub fn produce(&mut self, size: usize) -> Result<()> {
        if size == 0 {
            return Ok(());
        }
        if self.avail + size > self.storage.len() {
            return Err(GenesysError::BufferExceeded {
                requested: size,
                free: self.free(),
            });
        }
        if self.pos + self.avail + size > self.storage.len() {
            self.compact();
        }
        self.avail += size;
        Ok(())
    }

    /// The unread bytes, oldest first.
    pub fn get_read_pos(&self) -> &[u8] {
        &self.storage[self.pos..self.pos + self.avail]
    }

    /// Drop `size` bytes from the front of the unread data.
    pub fn consume(&mut self, size: usize) -> Result<()> {
        if size > self.avail {
            return Err(GenesysError::NoMoreData {
                requested: size,
                available: self.avail,
            });
        }
        self.pos += size;
        self.avail -= size;
        Ok(())
    }

    /// Copy `data` in, failing without side effects when it does not fit.
    pub fn push(&mut self, data: &[u8]) -> Result<()> {
        let free = self.free();
        let Some(dst) = self.get_write_pos(data.len()) else {
            return Err(GenesysError::BufferExceeded {
                requested: data.len(),
                free,
            });
        };
        dst.copy_from_slice(data);
        self.produce(data.len())
    }

    /// Copy up to `out.len()` unread bytes out, returning how many were copied.
    pub fn pop_into(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.avail);
        out[..n].copy_from_slice(&self.storage[self.pos..self.pos + n]);
        self.pos += n;
        self.avail -= n;
        n
    }

    fn compact(&mut self) {
        self.storage.copy_within(self.pos..self.pos + self.avail, 0);
        self.pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_in_order() {
        let mut b = FifoBuffer::new();
        b.alloc(8);
        b.get_write_pos(3).unwrap().copy_from_slice(&[1, 2, 3]);
        b.produce(3).unwrap();
        assert_eq!(b.get_read_pos(), &[1, 2, 3]);
        b.consume(2).unwrap();
        assert_eq!(b.get_read_pos(), &[3]);
        assert_eq!(b.avail(), 1);
    }

    #[test]
    fn compacts_when_tail_is_short() {
        let mut b = FifoBuffer::new();
        b.alloc(6);
        b.push(&[1, 2, 3, 4, 5]).unwrap();
        b.consume(3).unwrap();
        // tail has 1 byte free, total free is 4
        let w = b.get_write_pos(3).unwrap();
        w.copy_from_slice(&[6, 7, 8]);
        b.produce(3).unwrap();
        assert_eq!(b.get_read_pos(), &[4, 5, 6, 7, 8]);
    }

    #[test]
    fn refuses_oversized_write() {
        let mut b = FifoBuffer::new();
        b.alloc(4);
        assert!(b.get_write_pos(5).is_none());
        b.push(&[1, 2]).unwrap();
        assert!(b.get_write_pos(3).is_none());
        assert!(matches!(
            b.produce(3),
            Err(GenesysError::BufferExceeded {
                requested: 3,
                free: 2
            })
        ));
    }

    #[test]
    fn consume_more_than_available_fails() {
        let mut b = FifoBuffer::new();
        b.alloc(4);
        b.push(&[9]).unwrap();
        assert!(matches!(
            b.consume(2),
            Err(GenesysError::NoMoreData {
                requested: 2,
                available: 1
            })
        ));
        assert_eq!(b.avail(), 1);
    }

    #[test]
    fn zero_sized_ops_are_noops() {
        let mut b = FifoBuffer::new();
        b.alloc(2);
        b.produce(0).unwrap();
        b.consume(0).unwrap();
        assert_eq!(b.avail(), 0);
    }

    #[test]
    fn reset_keeps_storage_clear_drops_it() {
        let mut b = FifoBuffer::new();
        b.alloc(16);
        b.push(&[1; 10]).unwrap();
        b.reset();
        assert_eq!((b.avail(), b.size()), (0, 16));
        b.clear();
        assert_eq!(b.size(), 0);
        assert!(b.get_write_pos(1).is_none());
    }
}
