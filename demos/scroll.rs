use embedded_hal::delay::DelayNs;
use max7219_chain::{parse_byte_array_literal, ConfigBuilder, Matrix8x8, Max7219Chain, Orientation};

fn main() {
    // placeholders, replace with instances from your HAL
    let spi_bus = embedded_hal_mock::eh1::spi::Mock::new(&[]);
    let load_pin = embedded_hal_mock::eh1::digital::Mock::new(&[]);
    let mut delay = embedded_hal_mock::eh1::delay::NoopDelay::new();

    // one 4-in-1 assembly
    let config = ConfigBuilder::new(4)
        .orientation(Orientation::Clockwise)
        .reversed(true)
        .intensity(4);
    let mut chain = Max7219Chain::new_with_spi_bus(&config, spi_bus, load_pin).unwrap();

    let heart: heapless::Vec<u8, 8> = parse_byte_array_literal(
        "B00011100,B00111110,B01111100,B11111000,B01111100,B00111110,B00011100,B00000000",
    )
    .collect();
    chain.add_custom_glyph("\u{2665}", &heart);

    let mut pattern = Matrix8x8::empty();
    for i in 0..8 {
        pattern.set(i, i, true);
    }

    loop {
        chain
            .scroll_text("I \u{2665} Rust!", &mut delay, 75, 500)
            .unwrap();

        chain.display_matrix_all(&pattern).unwrap();
        delay.delay_ms(1000);

        chain.display_text("Hi!", 0, true).unwrap();
        delay.delay_ms(1000);
    }
}
