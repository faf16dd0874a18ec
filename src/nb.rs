use embedded_hal_async::delay::DelayNs;
use rand_core::RngCore;

use crate::{
    interface::nb::{ChainAccess, SpiDeviceInterface},
    print_demo_glyph, random_columns,
    register::{BitFlags, Register},
    render_writes, ChainWrite, ConfigBuilder, Error, Font, FrameBuffer, Matrix8x8, Orientation,
    ScrollState, Topology, FRAME_CAPACITY,
};

/// Async driver for a chain of MAX7219 modules, see [`crate::Max7219Chain`].
pub struct Max7219Chain<I> {
    interface: I,
    topology: Topology,
    buffer: FrameBuffer,
    font: Font,
}

impl<SPI> Max7219Chain<SpiDeviceInterface<SPI>>
where
    SPI: embedded_hal_async::spi::SpiDevice,
{
    pub async fn init_with_spi_device(
        config: &ConfigBuilder,
        spi_device: SPI,
    ) -> Result<Self, Error<SPI::Error>> {
        Self::init(config, SpiDeviceInterface::new(spi_device)).await
    }

    pub fn release(self) -> SPI {
        self.interface.release()
    }
}

impl<I, IE> Max7219Chain<I>
where
    I: ChainAccess<Error = IE>,
{
    pub async fn init(config: &ConfigBuilder, interface: I) -> Result<Self, Error<IE>> {
        let configuration = &config.configuration;
        if configuration.module_count == 0 {
            return Err(Error::InvalidChainLength);
        }
        let buffer = FrameBuffer::new(configuration.module_count).ok_or(Error::ChainTooLong)?;

        let mut this = Self {
            interface,
            topology: configuration.topology(),
            buffer,
            font: Font::new(),
        };

        for write in ChainWrite::init_sequence(
            configuration.intensity_reg_value(),
            configuration.scan_limit_reg_value(),
        ) {
            this.transmit(write).await?;
        }
        this.clear_all().await?;

        #[cfg(feature = "defmt")]
        defmt::debug!("MAX7219 chain of {} modules initialized", this.topology.module_count);

        Ok(this)
    }

    async fn transmit(&mut self, write: ChainWrite) -> Result<(), Error<IE>> {
        Self::send(&mut self.interface, self.topology.module_count, write).await
    }

    async fn send(interface: &mut I, module_count: usize, write: ChainWrite) -> Result<(), Error<IE>> {
        let mut frame = [0u8; FRAME_CAPACITY];

        match write.encode(module_count, &mut frame) {
            Some(frame) => interface.write_frame(frame).await.map_err(Error::Interface),
            None => {
                #[cfg(feature = "defmt")]
                defmt::trace!("dropping write to module outside the chain: {}", write);
                Ok(())
            }
        }
    }

    async fn transmit_columns(
        &mut self,
        columns: [u8; 8],
        module: Option<usize>,
    ) -> Result<(), Error<IE>> {
        for write in ChainWrite::columns(columns, module) {
            self.transmit(write).await?;
        }

        Ok(())
    }

    pub fn module_count(&self) -> usize {
        self.topology.module_count
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    pub fn configure_orientation(&mut self, orientation: Orientation, reversed: bool) {
        self.topology.orientation = orientation;
        self.topology.reversed = reversed;

        #[cfg(feature = "defmt")]
        defmt::debug!("orientation {}, reversed {}", orientation, reversed);
    }

    pub async fn set_power(&mut self, on: bool) -> Result<(), Error<IE>> {
        self.transmit(ChainWrite::Broadcast {
            register: Register::SHUTDOWN,
            data: if on {
                BitFlags::SHUTDOWN_NORMAL
            } else {
                BitFlags::SHUTDOWN_SHUTDOWN
            },
        })
        .await
    }

    pub async fn set_display_test(&mut self, on: bool) -> Result<(), Error<IE>> {
        self.transmit(ChainWrite::Broadcast {
            register: Register::DISPLAY_TEST,
            data: if on {
                BitFlags::DISPLAY_TEST_ON
            } else {
                BitFlags::DISPLAY_TEST_OFF
            },
        })
        .await
    }

    pub async fn set_brightness_all(&mut self, level: u8) -> Result<(), Error<IE>> {
        self.transmit(ChainWrite::Broadcast {
            register: Register::INTENSITY,
            data: level.min(BitFlags::INTENSITY_MAX),
        })
        .await
    }

    pub async fn set_brightness_one(&mut self, module: usize, level: u8) -> Result<(), Error<IE>> {
        self.transmit(ChainWrite::Targeted {
            register: Register::INTENSITY,
            data: level.min(BitFlags::INTENSITY_MAX),
            module,
        })
        .await
    }

    pub async fn fill_all(&mut self) -> Result<(), Error<IE>> {
        self.transmit_columns([BitFlags::COLUMN_ALL_ON; 8], None)
            .await
    }

    pub async fn fill_one(&mut self, module: usize) -> Result<(), Error<IE>> {
        self.transmit_columns([BitFlags::COLUMN_ALL_ON; 8], Some(module))
            .await
    }

    pub async fn clear_all(&mut self) -> Result<(), Error<IE>> {
        self.transmit_columns([BitFlags::COLUMN_ALL_OFF; 8], None)
            .await
    }

    pub async fn clear_one(&mut self, module: usize) -> Result<(), Error<IE>> {
        self.transmit_columns([BitFlags::COLUMN_ALL_OFF; 8], Some(module))
            .await
    }

    pub async fn randomize_all<R: RngCore>(&mut self, rng: &mut R) -> Result<(), Error<IE>> {
        let columns = random_columns(rng);
        self.transmit_columns(columns, None).await
    }

    pub async fn randomize_one<R: RngCore>(
        &mut self,
        module: usize,
        rng: &mut R,
    ) -> Result<(), Error<IE>> {
        let columns = random_columns(rng);
        self.transmit_columns(columns, Some(module)).await
    }

    pub async fn display_matrix_all(&mut self, matrix: &Matrix8x8) -> Result<(), Error<IE>> {
        let columns = matrix.rotated(self.topology.orientation).to_columns();
        self.transmit_columns(columns, None).await
    }

    pub async fn display_matrix_one(
        &mut self,
        module: usize,
        matrix: &Matrix8x8,
    ) -> Result<(), Error<IE>> {
        let columns = matrix.rotated(self.topology.orientation).to_columns();
        self.transmit_columns(columns, Some(module)).await
    }

    pub async fn render(&mut self) -> Result<(), Error<IE>> {
        let module_count = self.topology.module_count;
        for write in render_writes(&self.topology, &self.buffer) {
            Self::send(&mut self.interface, module_count, write).await?;
        }

        Ok(())
    }

    async fn clear_buffer_and_chain(&mut self) -> Result<(), Error<IE>> {
        self.buffer.clear();
        self.clear_all().await
    }

    pub async fn display_text(
        &mut self,
        text: &str,
        offset: i32,
        clear_first: bool,
    ) -> Result<(), Error<IE>> {
        if clear_first {
            self.clear_buffer_and_chain().await?;
        }

        self.buffer.print_glyphs(self.font.glyphs(text), offset);
        self.render().await
    }

    pub async fn display_custom_columns(
        &mut self,
        columns: &[u8],
        offset: i32,
        clear_first: bool,
    ) -> Result<(), Error<IE>> {
        if clear_first {
            self.clear_buffer_and_chain().await?;
        }

        self.buffer.print_columns(columns, offset);
        self.render().await
    }

    pub async fn begin_scroll<'a>(&mut self, text: &'a str) -> Result<ScrollState<'a>, Error<IE>> {
        self.clear_buffer_and_chain().await?;
        Ok(ScrollState::new(
            text,
            &self.font,
            self.topology.module_count,
        ))
    }

    /// Scrolls one column further, `false` once the scroll has finished.
    pub async fn advance_scroll(&mut self, state: &mut ScrollState<'_>) -> Result<bool, Error<IE>> {
        if !state.step(&self.font, &mut self.buffer) {
            return Ok(false);
        }
        self.render().await?;

        Ok(true)
    }

    /// Scrolls `text` once across the chain, yielding to the executor between steps.
    pub async fn scroll_text<D: DelayNs>(
        &mut self,
        text: &str,
        delay: &mut D,
        step_delay_ms: u32,
        end_delay_ms: u32,
    ) -> Result<(), Error<IE>> {
        let mut state = self.begin_scroll(text).await?;

        while self.advance_scroll(&mut state).await? {
            delay.delay_ms(step_delay_ms).await;
        }
        delay.delay_ms(end_delay_ms).await;

        #[cfg(feature = "defmt")]
        defmt::trace!("scroll finished");

        Ok(())
    }

    pub async fn font_demo<D: DelayNs>(
        &mut self,
        delay: &mut D,
        delay_ms: u32,
    ) -> Result<(), Error<IE>> {
        self.clear_all().await?;

        for index in 1..self.font.len() {
            let slot = (index - 1) % self.topology.module_count;
            print_demo_glyph(&self.font, &mut self.buffer, index, slot);
            self.render().await?;
            delay.delay_ms(delay_ms).await;
        }

        delay.delay_ms(delay_ms).await;
        self.clear_all().await
    }

    pub fn add_custom_glyph(&mut self, chr: &str, columns: &[u8]) -> bool {
        self.font.add_custom_glyph(chr, columns)
    }
}

#[cfg(test)]
impl Max7219Chain<crate::interface::mock::SimulatedChain> {
    fn chain(&self) -> &crate::interface::mock::SimulatedChain {
        &self.interface
    }

    fn chain_mut(&mut self) -> &mut crate::interface::mock::SimulatedChain {
        &mut self.interface
    }
}
