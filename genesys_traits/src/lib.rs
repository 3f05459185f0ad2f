pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Byte-oriented link to the scanner ASIC.
///
/// Every call blocks until the device answers or the link fails. Errors are
/// surfaced as-is; retry policy, if any, belongs to the implementation.
pub trait Transport {
    fn read_register(
        &mut self,
        address: u16,
    ) -> Result<u8, Box<dyn std::error::Error + Send + Sync>>;
    fn write_register(
        &mut self,
        address: u16,
        value: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn bulk_write(&mut self, data: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn bulk_read(&mut self, data: &mut [u8])
    -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read_register(
        &mut self,
        address: u16,
    ) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_register(address)
    }

    fn write_register(
        &mut self,
        address: u16,
        value: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).write_register(address, value)
    }

    fn bulk_write(&mut self, data: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).bulk_write(data)
    }

    fn bulk_read(
        &mut self,
        data: &mut [u8],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).bulk_read(data)
    }
}
