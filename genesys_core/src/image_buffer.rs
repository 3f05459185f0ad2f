//! Pull-style readers that turn device-sized chunks into an arbitrary-size
//! byte stream.
//!
//! The producer fills the slice it is handed completely or returns an error.
//! On error, bytes already copied into the caller's output stay there; the
//! scan is considered lost at that point and nothing is rolled back.

use crate::error::{GenesysError, Result};

/// Chunk granularity the ASIC read counters work in.
pub const READ_SIZE_ALIGNMENT: usize = 0x100;

/// Size of the next bulk read, given the bytes still owed by the device and
/// the nominal chunk size.
///
/// The chip counts words, so reads are even, and some setups require
/// 256-byte multiples. A final read smaller than the nominal chunk is rounded
/// *up* to 256 bytes so the tail of the transfer is still fetched.
pub fn get_read_size(remaining_size: usize, nominal_size: usize) -> usize {
    if remaining_size == 0 {
        return 0;
    }
    let mut size = nominal_size & !1;
    size &= !(READ_SIZE_ALIGNMENT - 1);
    if size == 0 {
        size = READ_SIZE_ALIGNMENT;
    }
    if remaining_size < size {
        size = remaining_size.div_ceil(READ_SIZE_ALIGNMENT) * READ_SIZE_ALIGNMENT;
    }
    size
}

/// Stream reader over a producer that yields fixed-size chunks, optionally
/// bounded by a known total.
pub struct ImageBuffer<P>
where
    P: FnMut(&mut [u8]) -> Result<()>,
{
    producer: P,
    size: usize,
    buffer: Vec<u8>,
    offset: usize,
    curr_size: usize,
    remaining_size: Option<u64>,
    last_read_multiple: Option<usize>,
}

impl<P> ImageBuffer<P>
where
    P: FnMut(&mut [u8]) -> Result<()>,
{
    /// `size` is the producer chunk size; 0 is treated as 1.
    pub fn new(size: usize, producer: P) -> Self {
        let size = size.max(1);
        Self {
            producer,
            size,
            buffer: vec![0; size],
            offset: 0,
            curr_size: 0,
            remaining_size: None,
            last_read_multiple: None,
        }
    }

    /// Bound the stream to `remaining` more bytes from the producer.
    pub fn set_remaining_size(&mut self, remaining: u64) {
        self.remaining_size = Some(remaining);
    }

    /// Round the final refill up to a multiple of `multiple` bytes.
    pub fn set_last_read_multiple(&mut self, multiple: usize) {
        self.last_read_multiple = Some(multiple);
    }

    /// Bytes buffered but not yet handed out.
    #[inline]
    pub fn available(&self) -> usize {
        self.curr_size - self.offset
    }

    /// Fill `out` completely, refilling from the producer as needed.
    pub fn get_data(&mut self, out: &mut [u8]) -> Result<()> {
        let mut written = self.copy_buffered(out);
        while written < out.len() {
            let mut to_read = self.size;
            if let Some(remaining) = self.remaining_size {
                if remaining == 0 {
                    return Err(GenesysError::NoMoreData {
                        requested: out.len() - written,
                        available: 0,
                    });
                }
                to_read = to_read.min(usize::try_from(remaining).unwrap_or(usize::MAX));
                self.remaining_size = Some(remaining - to_read as u64);
            }

            let mut aligned = to_read;
            if self.remaining_size == Some(0)
                && let Some(multiple) = self.last_read_multiple
                && multiple > 0
            {
                aligned = to_read.div_ceil(multiple) * multiple;
            }
            if self.buffer.len() < aligned {
                self.buffer.resize(aligned, 0);
            }

            self.offset = 0;
            self.curr_size = 0;
            (self.producer)(&mut self.buffer[..aligned])?;
            self.curr_size = to_read;
            written += self.copy_buffered(&mut out[written..]);
        }
        Ok(())
    }

    fn copy_buffered(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.available());
        out[..n].copy_from_slice(&self.buffer[self.offset..self.offset + n]);
        self.offset += n;
        n
    }
}

/// Stream reader for USB-attached ASICs: the total is known up front and
/// chunk sizes follow [`get_read_size`].
pub struct ImageBufferGenesysUsb<P>
where
    P: FnMut(&mut [u8]) -> Result<()>,
{
    producer: P,
    nominal_size: usize,
    remaining_size: usize,
    buffer: Vec<u8>,
    offset: usize,
    curr_size: usize,
}

impl<P> ImageBufferGenesysUsb<P>
where
    P: FnMut(&mut [u8]) -> Result<()>,
{
    pub fn new(total_size: usize, nominal_size: usize, producer: P) -> Self {
        Self {
            producer,
            nominal_size,
            remaining_size: total_size,
            buffer: Vec::new(),
            offset: 0,
            curr_size: 0,
        }
    }

    /// Bytes the device still owes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.remaining_size
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.curr_size - self.offset
    }

    /// Size of the next device read.
    pub fn get_read_size(&self) -> usize {
        get_read_size(self.remaining_size, self.nominal_size)
    }

    pub fn get_data(&mut self, out: &mut [u8]) -> Result<()> {
        let mut written = self.copy_buffered(out);
        while written < out.len() {
            let size = self.get_read_size();
            if size == 0 {
                return Err(GenesysError::NoMoreData {
                    requested: out.len() - written,
                    available: 0,
                });
            }
            if self.buffer.len() < size {
                self.buffer.resize(size, 0);
            }
            self.offset = 0;
            self.curr_size = 0;
            tracing::trace!(size, remaining = self.remaining_size, "bulk read chunk");
            (self.producer)(&mut self.buffer[..size])?;
            // The tail of the last chunk is alignment padding, never image data.
            self.curr_size = size.min(self.remaining_size);
            self.remaining_size -= self.curr_size;
            written += self.copy_buffered(&mut out[written..]);
        }
        Ok(())
    }

    fn copy_buffered(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.available());
        out[..n].copy_from_slice(&self.buffer[self.offset..self.offset + n]);
        self.offset += n;
        n
    }
}
