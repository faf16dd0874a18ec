//! Driver for daisy-chained Maxim MAX7219 LED drivers wired to 8x8 LED matrices,
//! as found on single modules and 4-in-1 assemblies.
//!
//! Besides direct access to the modules the driver keeps a column buffer spanning
//! the whole chain, used to print and scroll text in a small built-in font.
//!
//! Datasheet: <https://www.analog.com/media/en/technical-documentation/data-sheets/MAX7219-MAX7221.pdf>

#![cfg_attr(not(test), no_std)]

mod configuration;
pub mod font;
pub mod framebuffer;
pub mod interface;
pub mod matrix;
#[cfg(feature = "async")]
pub mod nb;
mod register;
mod scroll;

pub use configuration::{ConfigBuilder, Topology, MAX_CHAIN_LENGTH};
pub use font::{parse_byte_array_literal, Font};
pub use framebuffer::FrameBuffer;
pub use interface::{SpiDeviceInterface, SpiInterface};
pub use matrix::{Matrix8x8, Orientation};
pub use scroll::ScrollState;

use embedded_hal::delay::DelayNs;
use interface::ChainAccess;
use rand_core::RngCore;
use register::{BitFlags, Register};

/// Error enum for the MAX7219 chain driver
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<IE> {
    /// An interface related error has occured
    Interface(IE),

    /// A chain needs at least one module
    InvalidChainLength,

    /// More modules than [`MAX_CHAIN_LENGTH`] were configured
    ChainTooLong,
}

/// Bytes needed for a frame addressing the longest supported chain.
const FRAME_CAPACITY: usize = 2 * MAX_CHAIN_LENGTH;

/// A single register write travelling down the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum ChainWrite {
    /// Every module gets the same register value.
    Broadcast { register: u8, data: u8 },
    /// Only the module at chain index `module` is written, all others get a no-op.
    Targeted { register: u8, data: u8, module: usize },
}

impl ChainWrite {
    /// Encodes the write for a chain of `module_count` modules into `frame`.
    ///
    /// Returns `None` for a targeted write to a module outside the chain.
    pub(crate) fn encode(
        self,
        module_count: usize,
        frame: &mut [u8; FRAME_CAPACITY],
    ) -> Option<&[u8]> {
        let frame = &mut frame[..module_count * 2];

        match self {
            ChainWrite::Broadcast { register, data } => {
                frame.chunks_exact_mut(2).for_each(|pair| {
                    pair.copy_from_slice(&[register, data]);
                });
            }
            ChainWrite::Targeted {
                register,
                data,
                module,
            } => {
                if module >= module_count {
                    return None;
                }
                frame.chunks_exact_mut(2).enumerate().for_each(|(i, pair)| {
                    if i == module {
                        pair.copy_from_slice(&[register, data]);
                    } else {
                        pair.copy_from_slice(&[Register::NOOP, 0]);
                    }
                });
            }
        }

        Some(frame)
    }

    /// Writes of the eight column registers, to every module or only to `module`.
    pub(crate) fn columns(
        columns: [u8; 8],
        module: Option<usize>,
    ) -> impl Iterator<Item = ChainWrite> {
        (0u8..8).zip(columns).map(move |(digit, data)| {
            let register = Register::digit(digit);
            match module {
                Some(module) => ChainWrite::Targeted {
                    register,
                    data,
                    module,
                },
                None => ChainWrite::Broadcast { register, data },
            }
        })
    }

    /// Initialization sequence. The order matters, settings sent while the
    /// chips are in shutdown or test mode are not always applied.
    pub(crate) fn init_sequence(intensity: u8, scan_limit: u8) -> [ChainWrite; 6] {
        [
            (Register::SHUTDOWN, BitFlags::SHUTDOWN_SHUTDOWN),
            (Register::DISPLAY_TEST, BitFlags::DISPLAY_TEST_OFF),
            (Register::DECODE_MODE, BitFlags::DECODE_MODE_NO_DECODE),
            (Register::SCAN_LIMIT, scan_limit),
            (Register::INTENSITY, intensity),
            (Register::SHUTDOWN, BitFlags::SHUTDOWN_NORMAL),
        ]
        .map(|(register, data)| ChainWrite::Broadcast { register, data })
    }
}

/// Targeted writes pushing every visible band of `buffer` to the module showing it.
pub(crate) fn render_writes<'a>(
    topology: &'a Topology,
    buffer: &'a FrameBuffer,
) -> impl Iterator<Item = ChainWrite> + 'a {
    (0..buffer.band_count())
        .filter_map(move |band| Some((band, buffer.band(band)?)))
        .flat_map(move |(band, columns)| {
            let columns = matrix::transform_columns(&columns, topology.orientation);
            ChainWrite::columns(columns, Some(topology.physical_index(band)))
        })
}

/// Prints glyph `index` of `font` into module slot `slot`, wiping the slot first.
pub(crate) fn print_demo_glyph(font: &Font, buffer: &mut FrameBuffer, index: usize, slot: usize) {
    let offset = (slot * framebuffer::BAND_WIDTH) as i32;
    let blank = font.glyph(0).unwrap_or_default();

    // two blanks wipe the module before the glyph is drawn
    buffer.print_columns(blank, offset);
    buffer.print_columns(blank, offset + 4);
    buffer.print_columns(font.glyph(index).unwrap_or_default(), offset);
}

fn random_columns<R: RngCore>(rng: &mut R) -> [u8; 8] {
    let mut columns = [0u8; 8];
    rng.fill_bytes(&mut columns);
    columns
}

/// Driver for a chain of MAX7219 8x8 LED matrix modules.
///
/// Chain index 0 is the module farthest from the controller.
pub struct Max7219Chain<I> {
    interface: I,
    topology: Topology,
    buffer: FrameBuffer,
    font: Font,
}

impl<SPI, CS, SE, PE> Max7219Chain<SpiInterface<SPI, CS>>
where
    SPI: embedded_hal::spi::SpiBus<Error = SE>,
    CS: embedded_hal::digital::OutputPin<Error = PE>,
{
    pub fn new_with_spi_bus(
        config: &ConfigBuilder,
        spi: SPI,
        load: CS,
    ) -> Result<Self, Error<interface::InterfaceError<SE, PE>>> {
        Self::new(config, SpiInterface::new(spi, load))
    }

    /// Destroys the driver and releases the owned bus and load pin.
    pub fn release(self) -> (SPI, CS) {
        self.interface.release()
    }
}

impl<SPID> Max7219Chain<SpiDeviceInterface<SPID>>
where
    SPID: embedded_hal::spi::SpiDevice,
{
    pub fn new_with_spi_device(
        config: &ConfigBuilder,
        spi_device: SPID,
    ) -> Result<Self, Error<SPID::Error>> {
        Self::new(config, SpiDeviceInterface::new(spi_device))
    }

    /// Destroys the driver and releases the owned `SpiDevice`.
    pub fn release(self) -> SPID {
        self.interface.release()
    }
}

impl<I, IE> Max7219Chain<I>
where
    I: ChainAccess<Error = IE>,
{
    /// Create a new driver for the chain described by `config`.
    ///
    /// All modules are initialized, switched on and cleared.
    pub fn new(config: &ConfigBuilder, interface: I) -> Result<Self, Error<IE>> {
        let configuration = &config.configuration;
        if configuration.module_count == 0 {
            return Err(Error::InvalidChainLength);
        }
        let buffer = FrameBuffer::new(configuration.module_count).ok_or(Error::ChainTooLong)?;

        let mut driver = Max7219Chain {
            interface,
            topology: configuration.topology(),
            buffer,
            font: Font::new(),
        };

        for write in ChainWrite::init_sequence(
            configuration.intensity_reg_value(),
            configuration.scan_limit_reg_value(),
        ) {
            driver.transmit(write)?;
        }
        driver.clear_all()?;

        #[cfg(feature = "defmt")]
        defmt::debug!("MAX7219 chain of {} modules initialized", driver.topology.module_count);

        Ok(driver)
    }

    fn transmit(&mut self, write: ChainWrite) -> Result<(), Error<IE>> {
        Self::send(&mut self.interface, self.topology.module_count, write)
    }

    fn send(interface: &mut I, module_count: usize, write: ChainWrite) -> Result<(), Error<IE>> {
        let mut frame = [0u8; FRAME_CAPACITY];

        match write.encode(module_count, &mut frame) {
            Some(frame) => interface.write_frame(frame).map_err(Error::Interface),
            None => {
                #[cfg(feature = "defmt")]
                defmt::trace!("dropping write to module outside the chain: {}", write);
                Ok(())
            }
        }
    }

    fn transmit_all(
        &mut self,
        writes: impl IntoIterator<Item = ChainWrite>,
    ) -> Result<(), Error<IE>> {
        writes
            .into_iter()
            .try_for_each(|write| self.transmit(write))
    }

    /// Number of modules in the chain
    pub fn module_count(&self) -> usize {
        self.topology.module_count
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The column buffer used for text.
    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    /// Sets how the modules are mounted. Applies to everything sent afterwards.
    pub fn configure_orientation(&mut self, orientation: Orientation, reversed: bool) {
        self.topology.orientation = orientation;
        self.topology.reversed = reversed;

        #[cfg(feature = "defmt")]
        defmt::debug!("orientation {}, reversed {}", orientation, reversed);
    }

    /// Switch all modules on or into shutdown. Display data is retained.
    pub fn set_power(&mut self, on: bool) -> Result<(), Error<IE>> {
        self.transmit(ChainWrite::Broadcast {
            register: Register::SHUTDOWN,
            data: if on {
                BitFlags::SHUTDOWN_NORMAL
            } else {
                BitFlags::SHUTDOWN_SHUTDOWN
            },
        })
    }

    /// Enable or disable display test mode (all LEDs on) on all modules.
    pub fn set_display_test(&mut self, on: bool) -> Result<(), Error<IE>> {
        self.transmit(ChainWrite::Broadcast {
            register: Register::DISPLAY_TEST,
            data: if on {
                BitFlags::DISPLAY_TEST_ON
            } else {
                BitFlags::DISPLAY_TEST_OFF
            },
        })
    }

    /// Sets the brightness (0..15) of all modules.
    pub fn set_brightness_all(&mut self, level: u8) -> Result<(), Error<IE>> {
        self.transmit(ChainWrite::Broadcast {
            register: Register::INTENSITY,
            data: level.min(BitFlags::INTENSITY_MAX),
        })
    }

    /// Sets the brightness (0..15) of the module at chain index `module`.
    pub fn set_brightness_one(&mut self, module: usize, level: u8) -> Result<(), Error<IE>> {
        self.transmit(ChainWrite::Targeted {
            register: Register::INTENSITY,
            data: level.min(BitFlags::INTENSITY_MAX),
            module,
        })
    }

    /// Turns on all LEDs of all modules.
    pub fn fill_all(&mut self) -> Result<(), Error<IE>> {
        self.transmit_all(ChainWrite::columns([BitFlags::COLUMN_ALL_ON; 8], None))
    }

    pub fn fill_one(&mut self, module: usize) -> Result<(), Error<IE>> {
        self.transmit_all(ChainWrite::columns(
            [BitFlags::COLUMN_ALL_ON; 8],
            Some(module),
        ))
    }

    /// Turns off all LEDs of all modules. The column buffer is left as is.
    pub fn clear_all(&mut self) -> Result<(), Error<IE>> {
        self.transmit_all(ChainWrite::columns([BitFlags::COLUMN_ALL_OFF; 8], None))
    }

    pub fn clear_one(&mut self, module: usize) -> Result<(), Error<IE>> {
        self.transmit_all(ChainWrite::columns(
            [BitFlags::COLUMN_ALL_OFF; 8],
            Some(module),
        ))
    }

    /// Lights random LEDs, every module shows the same pattern.
    pub fn randomize_all<R: RngCore>(&mut self, rng: &mut R) -> Result<(), Error<IE>> {
        let columns = random_columns(rng);
        self.transmit_all(ChainWrite::columns(columns, None))
    }

    pub fn randomize_one<R: RngCore>(
        &mut self,
        module: usize,
        rng: &mut R,
    ) -> Result<(), Error<IE>> {
        let columns = random_columns(rng);
        self.transmit_all(ChainWrite::columns(columns, Some(module)))
    }

    /// Shows `matrix` on all modules, rotated if the modules are mounted turned.
    pub fn display_matrix_all(&mut self, matrix: &Matrix8x8) -> Result<(), Error<IE>> {
        let columns = matrix.rotated(self.topology.orientation).to_columns();
        self.transmit_all(ChainWrite::columns(columns, None))
    }

    /// Shows `matrix` on the module at chain index `module`.
    pub fn display_matrix_one(
        &mut self,
        module: usize,
        matrix: &Matrix8x8,
    ) -> Result<(), Error<IE>> {
        let columns = matrix.rotated(self.topology.orientation).to_columns();
        self.transmit_all(ChainWrite::columns(columns, Some(module)))
    }

    /// Pushes the visible part of the column buffer to the modules.
    pub fn render(&mut self) -> Result<(), Error<IE>> {
        render_writes(&self.topology, &self.buffer)
            .try_for_each(|write| Self::send(&mut self.interface, self.topology.module_count, write))
    }

    fn clear_buffer_and_chain(&mut self) -> Result<(), Error<IE>> {
        self.buffer.clear();
        self.clear_all()
    }

    /// Prints `text` starting `offset` columns from the left edge (-8 up to the last column).
    ///
    /// Characters missing from the font are skipped. Text running past the right
    /// edge is dropped, there is no wrapping. With `clear_first` unset the text is
    /// drawn over whatever the buffer already holds.
    pub fn display_text(
        &mut self,
        text: &str,
        offset: i32,
        clear_first: bool,
    ) -> Result<(), Error<IE>> {
        if clear_first {
            self.clear_buffer_and_chain()?;
        }

        self.buffer.print_glyphs(self.font.glyphs(text), offset);
        self.render()
    }

    /// Prints raw column bytes, for example from [`parse_byte_array_literal`], like [`Self::display_text`].
    pub fn display_custom_columns(
        &mut self,
        columns: &[u8],
        offset: i32,
        clear_first: bool,
    ) -> Result<(), Error<IE>> {
        if clear_first {
            self.clear_buffer_and_chain()?;
        }

        self.buffer.print_columns(columns, offset);
        self.render()
    }

    /// Clears buffer and modules and prepares scrolling `text` in from the right edge.
    pub fn begin_scroll<'a>(&mut self, text: &'a str) -> Result<ScrollState<'a>, Error<IE>> {
        self.clear_buffer_and_chain()?;
        Ok(ScrollState::new(
            text,
            &self.font,
            self.topology.module_count,
        ))
    }

    /// Scrolls one column further and updates the modules.
    ///
    /// Returns `false` once the scroll has finished.
    pub fn advance_scroll(&mut self, state: &mut ScrollState<'_>) -> Result<bool, Error<IE>> {
        if !state.step(&self.font, &mut self.buffer) {
            return Ok(false);
        }
        self.render()?;

        Ok(true)
    }

    /// Scrolls `text` once across the chain from right to left, blocking until done.
    ///
    /// Waits `step_delay_ms` after every column and `end_delay_ms` at the end.
    pub fn scroll_text<D: DelayNs>(
        &mut self,
        text: &str,
        delay: &mut D,
        step_delay_ms: u32,
        end_delay_ms: u32,
    ) -> Result<(), Error<IE>> {
        let mut state = self.begin_scroll(text)?;

        while self.advance_scroll(&mut state)? {
            delay.delay_ms(step_delay_ms);
        }
        delay.delay_ms(end_delay_ms);

        #[cfg(feature = "defmt")]
        defmt::trace!("scroll finished");

        Ok(())
    }

    /// Shows every glyph of the font after the space, one module at a time, `delay_ms` apart.
    pub fn font_demo<D: DelayNs>(&mut self, delay: &mut D, delay_ms: u32) -> Result<(), Error<IE>> {
        self.clear_all()?;

        for index in 1..self.font.len() {
            let slot = (index - 1) % self.topology.module_count;
            print_demo_glyph(&self.font, &mut self.buffer, index, slot);
            self.render()?;
            delay.delay_ms(delay_ms);
        }

        delay.delay_ms(delay_ms);
        self.clear_all()
    }

    /// Adds a glyph for `chr` to the font, see [`Font::add_custom_glyph`].
    pub fn add_custom_glyph(&mut self, chr: &str, columns: &[u8]) -> bool {
        self.font.add_custom_glyph(chr, columns)
    }
}

#[cfg(test)]
impl Max7219Chain<interface::mock::SimulatedChain> {
    /// Destroys the driver and returns the simulated chain.
    pub fn release(self) -> interface::mock::SimulatedChain {
        self.interface
    }

    fn chain(&self) -> &interface::mock::SimulatedChain {
        &self.interface
    }

    fn chain_mut(&mut self) -> &mut interface::mock::SimulatedChain {
        &mut self.interface
    }
}
