/// MAX7219 registers
///
/// Register table: <https://www.analog.com/media/en/technical-documentation/data-sheets/MAX7219-MAX7221.pdf>
pub struct Register;
#[allow(dead_code)]
impl Register {
    pub const NOOP: u8 = 0x00;

    // One digit register per LED column, DIGIT0 drives column 0.
    pub const DIGIT0: u8 = 0x01;
    pub const DIGIT7: u8 = 0x08;
    pub const fn digit(column: u8) -> u8 {
        Self::DIGIT0 + column
    }

    pub const DECODE_MODE: u8 = 0x09;
    pub const INTENSITY: u8 = 0x0A;
    pub const SCAN_LIMIT: u8 = 0x0B;
    pub const SHUTDOWN: u8 = 0x0C;
    pub const DISPLAY_TEST: u8 = 0x0F;
}

/// Values for registers
pub struct BitFlags;
#[allow(dead_code)]
impl BitFlags {
    pub const SHUTDOWN_SHUTDOWN: u8 = 0;
    pub const SHUTDOWN_NORMAL: u8 = 1;

    pub const DISPLAY_TEST_OFF: u8 = 0;
    pub const DISPLAY_TEST_ON: u8 = 1;

    pub const DECODE_MODE_NO_DECODE: u8 = 0x00;

    pub const SCAN_LIMIT_ALL_DIGITS: u8 = 7;

    pub const INTENSITY_MAX: u8 = 0x0F;

    pub const COLUMN_ALL_ON: u8 = 0xFF;
    pub const COLUMN_ALL_OFF: u8 = 0x00;
}
