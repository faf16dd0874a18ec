use embedded_hal::{digital::OutputPin, spi};

/// Trait for pushing one frame down the chain.
///
/// A frame is `2 * module_count` bytes: a (register, data) pair for every module,
/// pair 0 being shifted in first so it ends up in the module farthest from the
/// controller. The load line is released once the whole frame has been clocked
/// out, latching every pair at the same time.
pub trait ChainAccess {
    type Error;

    /// Writes one complete frame inside a single load envelope.
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), Self::Error>;
}

/// Error of the [`SpiInterface`], which owns both a bus and the load pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterfaceError<SE, PE> {
    /// The SPI bus reported an error
    Spi(SE),
    /// Driving the load (CS) pin failed
    Pin(PE),
}

/// Interface for a plain `SpiBus` with a separately driven LOAD/CS pin.
pub struct SpiInterface<SPI, CS> {
    pub(crate) spi: SPI,
    pub(crate) load: CS,
}

impl<SPI, CS> SpiInterface<SPI, CS>
where
    SPI: spi::SpiBus,
    CS: OutputPin,
{
    pub fn new(spi: SPI, load: CS) -> Self {
        Self { spi, load }
    }

    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.load)
    }
}

impl<SPI, CS> ChainAccess for SpiInterface<SPI, CS>
where
    SPI: spi::SpiBus,
    CS: OutputPin,
{
    type Error = InterfaceError<SPI::Error, CS::Error>;

    fn write_frame(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        self.load.set_low().map_err(InterfaceError::Pin)?;

        // the bus may still be shifting when write() returns, flush before latching
        self.spi.write(frame).map_err(InterfaceError::Spi)?;
        self.spi.flush().map_err(InterfaceError::Spi)?;

        self.load.set_high().map_err(InterfaceError::Pin)?;

        Ok(())
    }
}

/// Interface for a `SpiDevice`, the device asserts CS for the duration of a transaction.
pub struct SpiDeviceInterface<SPID> {
    pub(crate) spi_device: SPID,
}

impl<SPID: spi::SpiDevice> SpiDeviceInterface<SPID> {
    pub fn new(spi_device: SPID) -> Self {
        Self { spi_device }
    }

    pub fn release(self) -> SPID {
        self.spi_device
    }
}

impl<SPID> ChainAccess for SpiDeviceInterface<SPID>
where
    SPID: spi::SpiDevice,
{
    type Error = SPID::Error;

    fn write_frame(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        self.spi_device
            .transaction(&mut [spi::Operation::Write(frame)])
    }
}

#[cfg(feature = "async")]
pub mod nb {
    use embedded_hal_async::spi;

    /// Async counterpart of [`super::ChainAccess`].
    #[allow(async_fn_in_trait)]
    pub trait ChainAccess {
        type Error;

        async fn write_frame(&mut self, frame: &[u8]) -> Result<(), Self::Error>;
    }

    pub struct SpiDeviceInterface<SPID> {
        pub(crate) spi_device: SPID,
    }

    impl<SPID: spi::SpiDevice> SpiDeviceInterface<SPID> {
        pub fn new(spi_device: SPID) -> Self {
            Self { spi_device }
        }

        pub fn release(self) -> SPID {
            self.spi_device
        }
    }

    impl<SPID> ChainAccess for SpiDeviceInterface<SPID>
    where
        SPID: spi::SpiDevice,
    {
        type Error = SPID::Error;

        async fn write_frame(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
            self.spi_device
                .transaction(&mut [spi::Operation::Write(frame)])
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::{
        digital::{Mock as PinMock, State as PinState, Transaction as PinTransaction},
        spi::{Mock as SpiMock, Transaction as SpiTransaction},
    };

    #[test]
    fn test_spi_bus_frame_is_framed_by_load() {
        let spi = SpiMock::new(&[
            SpiTransaction::write_vec(vec![0x0c, 0x01, 0x0c, 0x01]),
            SpiTransaction::flush(),
        ]);
        let load = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);

        let mut iface = SpiInterface::new(spi, load);
        iface.write_frame(&[0x0c, 0x01, 0x0c, 0x01]).unwrap();

        let (mut spi, mut load) = iface.release();
        spi.done();
        load.done();
    }

    #[test]
    fn test_spi_device_frame_is_single_transaction() {
        let spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0x00, 0x00, 0x0a, 0x07]),
            SpiTransaction::transaction_end(),
        ]);

        let mut iface = SpiDeviceInterface::new(spi);
        iface.write_frame(&[0x00, 0x00, 0x0a, 0x07]).unwrap();

        iface.release().done();
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::ChainAccess;
    use crate::register::Register;

    /// A simulated MAX7219 chain. Every frame is shifted through the modules the
    /// way the real hardware does it, so the register file of each module can be
    /// inspected afterwards.
    #[derive(Debug)]
    pub(crate) struct SimulatedChain {
        registers: Vec<[u8; 16]>,
        frames: Vec<Vec<u8>>,
    }

    impl SimulatedChain {
        pub fn new(module_count: usize) -> Self {
            Self {
                registers: vec![[0; 16]; module_count],
                frames: Vec::new(),
            }
        }

        /// Register `register` of the module at chain index `module`.
        pub fn register(&self, module: usize, register: u8) -> u8 {
            self.registers[module][register as usize]
        }

        /// The eight column registers of `module`.
        pub fn columns(&self, module: usize) -> [u8; 8] {
            let mut columns = [0; 8];
            columns.copy_from_slice(
                &self.registers[module][Register::DIGIT0 as usize..=Register::DIGIT7 as usize],
            );
            columns
        }

        pub fn frames(&self) -> &[Vec<u8>] {
            &self.frames
        }

        pub fn clear_frames(&mut self) {
            self.frames.clear();
        }
    }

    impl ChainAccess for SimulatedChain {
        type Error = ();

        fn write_frame(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
            assert_eq!(
                frame.len(),
                self.registers.len() * 2,
                "Frame of {} bytes does not fit a chain of {} modules",
                frame.len(),
                self.registers.len()
            );

            for (module, pair) in frame.chunks_exact(2).enumerate() {
                let (register, data) = (pair[0], pair[1]);
                if register != Register::NOOP {
                    self.registers[module][register as usize & 0x0f] = data;
                }
            }
            self.frames.push(frame.to_vec());

            Ok(())
        }
    }

    #[cfg(feature = "async")]
    impl super::nb::ChainAccess for SimulatedChain {
        type Error = ();

        async fn write_frame(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
            ChainAccess::write_frame(self, frame)
        }
    }
}
