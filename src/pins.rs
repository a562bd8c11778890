//! GPIO / peripheral pin assignments for the EMG logger board.
//!
//! Single source of truth; every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Control inputs (momentary, active-low, internal pull-up)
// ---------------------------------------------------------------------------

/// Start-session button.
pub const START_BUTTON_GPIO: i32 = 4;
/// Stop-session button.
pub const STOP_BUTTON_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// EMG front end (ADC1)
// ---------------------------------------------------------------------------

/// Muscle sensor envelope output.
/// ADC1 channel 0 (GPIO 1 on ESP32-S3).
pub const EMG_ADC_GPIO: i32 = 1;
/// ADC1 channel number for [`EMG_ADC_GPIO`].
pub const EMG_ADC_CHANNEL: u32 = 0;

// ---------------------------------------------------------------------------
// SD card (SPI, FAT mounted at SD_MOUNT_POINT)
// ---------------------------------------------------------------------------

pub const SD_SCK_GPIO: i32 = 12;
pub const SD_MOSI_GPIO: i32 = 11;
pub const SD_MISO_GPIO: i32 = 13;
pub const SD_CS_GPIO: i32 = 10;
/// VFS path the card is mounted on.
pub const SD_MOUNT_POINT: &str = "/sdcard";

// ---------------------------------------------------------------------------
// Status display (HD44780 16x2 over I2C backpack)
// ---------------------------------------------------------------------------

pub const LCD_SDA_GPIO: i32 = 8;
pub const LCD_SCL_GPIO: i32 = 9;
pub const LCD_I2C_ADDR: u8 = 0x27;
