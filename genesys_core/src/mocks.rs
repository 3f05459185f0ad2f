//! Test and helper mocks for genesys_core

use genesys_traits::Transport;

/// A transport whose every transfer fails; useful for exercising the error
/// paths of the device layer without a simulator.
pub struct NoopTransport;

fn unavailable() -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::other("noop transport"))
}

impl Transport for NoopTransport {
    fn read_register(
        &mut self,
        _address: u16,
    ) -> Result<u8, Box<dyn std::error::Error + Send + Sync>> {
        Err(unavailable())
    }

    fn write_register(
        &mut self,
        _address: u16,
        _value: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(unavailable())
    }

    fn bulk_write(&mut self, _data: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(unavailable())
    }

    fn bulk_read(
        &mut self,
        _data: &mut [u8],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(unavailable())
    }
}
