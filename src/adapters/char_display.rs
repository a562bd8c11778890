//! HD44780 character LCD behind a PCF8574 I²C backpack.
//!
//! Implements [`DisplayPort`] over any `embedded_hal` 1.0 I²C bus and
//! delay.  The controller runs in 4-bit mode; each nibble goes out as
//! one expander byte with EN pulsed high then low:
//!
//! ```text
//!   PCF8574 bit:  7  6  5  4   3   2   1   0
//!                 D7 D6 D5 D4  BL  EN  RW  RS
//! ```
//!
//! A shadow copy of the grid is kept so callers (and tests) can read
//! back what the panel shows.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::info;

use crate::app::ports::DisplayPort;
use crate::error::DisplayError;

const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE_INC: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

/// DDRAM start address of each row.
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

const MAX_ROWS: usize = 4;
const MAX_COLS: usize = 40;

pub struct CharDisplay<I, D> {
    i2c: I,
    delay: D,
    address: u8,
    rows: u8,
    cols: u8,
    shadow: [[u8; MAX_COLS]; MAX_ROWS],
    ready: bool,
}

impl<I: I2c, D: DelayNs> CharDisplay<I, D> {
    pub fn new(i2c: I, delay: D, address: u8, rows: u8, cols: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
            rows: rows.min(MAX_ROWS as u8),
            cols: cols.min(MAX_COLS as u8),
            shadow: [[b' '; MAX_COLS]; MAX_ROWS],
            ready: false,
        }
    }

    /// Power-on initialisation sequence (HD44780 datasheet, figure 24).
    pub fn init(&mut self) -> Result<(), DisplayError> {
        self.delay.delay_ms(50);
        for wait_us in [4_500, 4_500, 150] {
            self.write_nibble(0x03, 0)?;
            self.delay.delay_us(wait_us);
        }
        self.write_nibble(0x02, 0)?;

        self.command(CMD_FUNCTION_4BIT_2LINE)?;
        self.command(CMD_DISPLAY_ON)?;
        self.command(CMD_CLEAR)?;
        self.delay.delay_ms(2);
        self.command(CMD_ENTRY_MODE_INC)?;

        self.ready = true;
        info!("LCD: {}x{} ready at 0x{:02X}", self.cols, self.rows, self.address);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// What row `row` currently shows, as far as this driver knows.
    pub fn line(&self, row: u8) -> Option<&str> {
        let r = self.shadow.get(usize::from(row)).filter(|_| row < self.rows)?;
        core::str::from_utf8(&r[..usize::from(self.cols)]).ok()
    }

    fn command(&mut self, cmd: u8) -> Result<(), DisplayError> {
        self.write_byte(cmd, 0)
    }

    fn write_byte(&mut self, byte: u8, mode: u8) -> Result<(), DisplayError> {
        self.write_nibble(byte >> 4, mode)?;
        self.write_nibble(byte & 0x0F, mode)
    }

    fn write_nibble(&mut self, nibble: u8, mode: u8) -> Result<(), DisplayError> {
        let data = (nibble << 4) | mode | BACKLIGHT;
        self.i2c
            .write(self.address, &[data | EN])
            .map_err(|_| DisplayError::Unavailable)?;
        self.delay.delay_us(1);
        self.i2c
            .write(self.address, &[data])
            .map_err(|_| DisplayError::Unavailable)?;
        self.delay.delay_us(50);
        Ok(())
    }
}

impl<I: I2c, D: DelayNs> DisplayPort for CharDisplay<I, D> {
    fn write(&mut self, text: &str, column: u8, row: u8) -> Result<(), DisplayError> {
        if row >= self.rows || column >= self.cols {
            return Err(DisplayError::OutOfBounds);
        }
        if !self.ready {
            return Err(DisplayError::Unavailable);
        }

        let room = usize::from(self.cols - column);
        let start = usize::from(column);
        let r = usize::from(row);

        self.command(CMD_SET_DDRAM | (ROW_OFFSETS[r] + column))?;
        for (i, ch) in text.chars().take(room).enumerate() {
            // The HD44780 ROM is ASCII in this range.
            let byte = if ch.is_ascii() && !ch.is_ascii_control() {
                ch as u8
            } else {
                b'?'
            };
            self.write_byte(byte, RS)?;
            self.shadow[r][start + i] = byte;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        if !self.ready {
            return Err(DisplayError::Unavailable);
        }
        self.command(CMD_CLEAR)?;
        self.delay.delay_ms(2);
        self.shadow = [[b' '; MAX_COLS]; MAX_ROWS];
        Ok(())
    }
}
