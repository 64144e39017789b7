//! Per-chip bus transports
//!
//! Each CPLD is reached through one transport handle. Handles implement the
//! `device-driver` [`RegisterInterface`] with byte offsets as addresses, plus
//! [`Transport`] so failures can be reported with the chip's bus address.
//!
//! Two transports are provided:
//! - [`I2cInterface`]: SMBus "byte data" transfers on an `embedded-hal` I2C bus
//! - [`IoPortInterface`]: byte access to an LPC I/O port window
//!
//! Transports are not internally synchronized. Callers sharing one bus
//! between threads must serialize access themselves, for example with
//! `embedded_hal_bus::i2c::MutexDevice`.

use crate::logging::debug;
use device_driver::RegisterInterface;

/// Largest single transfer the transports will frame (address byte excluded)
const MAX_TRANSFER: usize = 32;

/// A register transport that knows where its chip lives on the bus
pub trait Transport: RegisterInterface<AddressType = u8> {
    /// Bus address of the chip, used in diagnostics
    ///
    /// For I2C this is the 7-bit device address, for I/O ports the base port.
    fn bus_address(&self) -> u16;
}

/// I2C transport for one CPLD
///
/// Reads are a write of the offset followed by a repeated-start read, writes
/// send the offset followed by the data, which is what SMBus byte-data
/// transfers look like on the wire.
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cInterface<I2C> {
    /// Create a new I2C interface for the chip at the given 7-bit address
    ///
    /// # Arguments
    /// * `i2c` - The I2C peripheral or shared bus device
    /// * `address` - The 7-bit device address of the CPLD
    ///
    /// # Example
    /// ```ignore
    /// let system_cpld = I2cInterface::new(i2c, 0x60);
    /// ```
    pub const fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// The 7-bit device address
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Consume the interface and return the I2C peripheral
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> RegisterInterface for I2cInterface<I2C>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
{
    type Error = E;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let _ = size_bits; // Size is implicit in read_data.len() for I2C
        self.i2c.write_read(self.address, &[address], read_data)
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let _ = size_bits; // Size is implicit in write_data.len() for I2C
        let mut buffer = [0u8; MAX_TRANSFER + 1];
        buffer[0] = address;
        let len = write_data.len().min(MAX_TRANSFER);
        buffer[1..=len].copy_from_slice(&write_data[..len]);

        self.i2c.write(self.address, &buffer[..=len])
    }
}

impl<I2C, E> Transport for I2cInterface<I2C>
where
    I2C: embedded_hal::i2c::I2c<Error = E>,
{
    fn bus_address(&self) -> u16 {
        u16::from(self.address)
    }
}

/// Byte-wide access to an I/O port space
///
/// Implemented by the platform: x86 `in`/`out` instructions, `/dev/port`, or
/// a test double.
pub trait PortIo {
    /// Error raised by a port access
    type Error;

    /// Read one byte from `port`
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be accessed.
    fn read_u8(&mut self, port: u16) -> Result<u8, Self::Error>;

    /// Write one byte to `port`
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be accessed.
    fn write_u8(&mut self, port: u16, value: u8) -> Result<(), Self::Error>;
}

/// LPC transport for a CPLD mapped into the I/O port space
///
/// Register `offset` lives at port `base + offset`.
pub struct IoPortInterface<P> {
    io: P,
    base: u16,
}

impl<P> IoPortInterface<P> {
    /// Create a new I/O port interface for the window starting at `base`
    pub const fn new(io: P, base: u16) -> Self {
        Self { io, base }
    }

    /// First port of the register window
    pub const fn base(&self) -> u16 {
        self.base
    }

    /// Consume the interface and return the port accessor
    pub fn release(self) -> P {
        self.io
    }

    fn port(&self, offset: u8, index: usize) -> u16 {
        #[allow(clippy::cast_possible_truncation)]
        let index = index as u16;
        self.base.wrapping_add(u16::from(offset)).wrapping_add(index)
    }
}

impl<P: PortIo> RegisterInterface for IoPortInterface<P> {
    type Error = P::Error;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let _ = size_bits; // One port access per byte
        for (i, byte) in read_data.iter_mut().enumerate() {
            *byte = self.io.read_u8(self.port(address, i))?;
        }
        Ok(())
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let _ = size_bits; // One port access per byte
        for (i, &byte) in write_data.iter().enumerate() {
            self.io.write_u8(self.port(address, i), byte)?;
        }
        Ok(())
    }
}

impl<P: PortIo> Transport for IoPortInterface<P> {
    fn bus_address(&self) -> u16 {
        self.base
    }
}

/// Transport wrapper that repeats failed writes
///
/// Some boards' I2C controllers occasionally fail a byte write with a bus
/// error that succeeds when simply reissued. Wrap only the affected chips;
/// reads are passed through untouched and the registry itself never retries.
pub struct WriteRetry<T> {
    inner: T,
    attempts: u8,
}

impl<T> WriteRetry<T> {
    /// Wrap `inner`, issuing each write at most `attempts` times (minimum 1)
    pub const fn new(inner: T, attempts: u8) -> Self {
        Self {
            inner,
            attempts: if attempts == 0 { 1 } else { attempts },
        }
    }

    /// Number of times a write is issued before giving up
    pub const fn attempts(&self) -> u8 {
        self.attempts
    }

    /// Consume the wrapper and return the inner transport
    pub fn release(self) -> T {
        self.inner
    }
}

impl<T: Transport> RegisterInterface for WriteRetry<T> {
    type Error = T::Error;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.inner.read_register(address, size_bits, read_data)
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let mut attempt = 1;
        loop {
            match self.inner.write_register(address, size_bits, write_data) {
                Ok(()) => return Ok(()),
                Err(e) if attempt >= self.attempts => return Err(e),
                Err(_) => {
                    debug!(
                        "write retry {} - addr: {:#x}, offset: {:#x}",
                        attempt,
                        self.inner.bus_address(),
                        address
                    );
                    attempt += 1;
                }
            }
        }
    }
}

impl<T: Transport> Transport for WriteRetry<T> {
    fn bus_address(&self) -> u16 {
        self.inner.bus_address()
    }
}
