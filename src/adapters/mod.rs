//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements            | Connects to                 |
//! |----------------|-----------------------|-----------------------------|
//! | `hardware`     | InputPort, SamplePort | Button GPIOs, EMG ADC       |
//! | `time`         | ClockPort             | ESP32 timer, gettimeofday   |
//! | `sntp`         | TimeSyncPort          | ESP-IDF SNTP client         |
//! | `wifi`         | LinkPort              | ESP-IDF WiFi STA            |
//! | `network`      | LinkPort, TimeSyncPort| `wifi` + `sntp`             |
//! | `sd_log`       | LogStoragePort        | FAT on SD card (VFS)        |
//! | `char_display` | DisplayPort           | HD44780 via PCF8574 I²C     |
//! | `nvs`          | ConfigPort, NvsPort   | NVS / in-memory store       |
//! | `uploader`     | UploadPort            | HTTP batch endpoint         |
//! | `log_sink`     | EventSink             | Serial log output           |

pub mod char_display;
pub mod hardware;
pub mod log_sink;
pub mod network;
pub mod nvs;
pub mod sd_log;
pub mod sntp;
pub mod time;
pub mod uploader;
pub(super) mod utils;
pub mod wifi;
