//! EMG Logger Firmware: Main Entry Point
//!
//! Hexagonal architecture with a single polled acquisition loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   SdLogStorage   CharDisplay   Esp32Time      │
//! │  (Input+Sample)    (LogStorage)   (Display)     (Clock)        │
//! │  NetworkAdapter    NvsAdapter     HttpUploader  LogEventSink   │
//! │  (Link+TimeSync)   (Config+NVS)   (Upload)      (EventSink)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Debounce · FSM · Flush policy · Gates · Status        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{debug, error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::fs::fatfs::Fatfs;
use esp_idf_svc::hal::delay::Ets;
use esp_idf_svc::hal::gpio::{AnyIOPin, PinDriver, Pull};
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::prelude::*;
use esp_idf_svc::hal::spi::{SpiDriver, SpiDriverConfig, Dma};
use esp_idf_svc::io::vfs::MountedFatfs;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sd::spi::SdSpiHostDriver;
use esp_idf_svc::sd::{SdCardConfiguration, SdCardDriver};
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use emglogger::adapters::char_display::CharDisplay;
use emglogger::adapters::hardware::HardwareAdapter;
use emglogger::adapters::log_sink::LogEventSink;
use emglogger::adapters::network::NetworkAdapter;
use emglogger::adapters::nvs::NvsAdapter;
use emglogger::adapters::sd_log::SdLogStorage;
use emglogger::adapters::sntp::SntpAdapter;
use emglogger::adapters::time::Esp32TimeAdapter;
use emglogger::adapters::uploader::HttpUploader;
use emglogger::adapters::wifi::WifiAdapter;
use emglogger::app::ports::ConfigPort;
use emglogger::app::service::AppService;
use emglogger::config::SystemConfig;
use emglogger::drivers::hw_init;
use emglogger::error::Error;
use emglogger::pins;
use emglogger::sensors::emg::EmgSensor;

// The HAL hands out pins as distinct types, so `main` names them directly.
// These keep that wiring in step with `pins`.
const _: () = {
    assert!(pins::START_BUTTON_GPIO == 4);
    assert!(pins::STOP_BUTTON_GPIO == 5);
    assert!(pins::LCD_SDA_GPIO == 8);
    assert!(pins::LCD_SCL_GPIO == 9);
    assert!(pins::SD_SCK_GPIO == 12);
    assert!(pins::SD_MOSI_GPIO == 11);
    assert!(pins::SD_MISO_GPIO == 13);
    assert!(pins::SD_CS_GPIO == 10);
};

/// Mount the FAT volume on the SD card at [`pins::SD_MOUNT_POINT`].
///
/// The returned guard keeps the card mounted; dropping it unmounts.
fn mount_sd(
    spi: esp_idf_svc::hal::spi::SPI2,
    sclk: esp_idf_svc::hal::gpio::Gpio12,
    mosi: esp_idf_svc::hal::gpio::Gpio11,
    miso: esp_idf_svc::hal::gpio::Gpio13,
    cs: esp_idf_svc::hal::gpio::Gpio10,
) -> Result<Box<dyn core::any::Any>> {
    let bus = SpiDriver::new(
        spi,
        sclk,
        mosi,
        Some(miso),
        &SpiDriverConfig::default().dma(Dma::Auto(4096)),
    )?;
    let host = SdSpiHostDriver::new(
        bus,
        Some(cs),
        AnyIOPin::none(),
        AnyIOPin::none(),
        AnyIOPin::none(),
        None,
    )?;
    let card = SdCardDriver::new_spi(host, &SdCardConfiguration::new())?;
    let mounted = MountedFatfs::mount(Fatfs::new_sdcard(0, card)?, pins::SD_MOUNT_POINT, 4)?;
    Ok(Box::new(mounted))
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  EMG Logger v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    if let Err(e) = hw_init::init_peripherals() {
        // Sampling reads 0 until the next reboot; sessions still work.
        error!("{}: {} on GPIO {}, continuing", Error::from(e), e, pins::EMG_ADC_GPIO);
    }

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => Some(n),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            None
        }
    };
    let config = match nvs.as_ref().map(|n| n.load()) {
        Some(Ok(cfg)) => {
            info!("Config loaded from NVS");
            cfg
        }
        Some(Err(e)) => {
            warn!("{}, using defaults", Error::from(e));
            SystemConfig::default()
        }
        None => SystemConfig::default(),
    };

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    // ── 3. Inputs + EMG front end ─────────────────────────────
    let mut start_pin = PinDriver::input(peripherals.pins.gpio4)?;
    start_pin.set_pull(Pull::Up)?;
    let mut stop_pin = PinDriver::input(peripherals.pins.gpio5)?;
    stop_pin.set_pull(Pull::Up)?;
    let mut hw = HardwareAdapter::new(
        start_pin,
        stop_pin,
        EmgSensor::new(pins::EMG_ADC_CHANNEL, config.adc_max),
    );

    // ── 4. Status display ─────────────────────────────────────
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8, // SDA
        peripherals.pins.gpio9, // SCL
        &I2cConfig::new().baudrate(100u32.kHz().into()),
    )?;
    let mut display = CharDisplay::new(
        i2c,
        Ets,
        pins::LCD_I2C_ADDR,
        config.display_rows,
        config.display_cols,
    );
    if let Err(e) = display.init().map_err(Error::from) {
        warn!("{}, status display disabled", e);
    }

    // ── 5. Storage ────────────────────────────────────────────
    let _sd_mount = match mount_sd(
        peripherals.spi2,
        peripherals.pins.gpio12,
        peripherals.pins.gpio11,
        peripherals.pins.gpio13,
        peripherals.pins.gpio10,
    ) {
        Ok(guard) => {
            info!("SD: mounted at {}", pins::SD_MOUNT_POINT);
            Some(guard)
        }
        Err(e) => {
            // Sessions still run, sampling without storage.
            warn!("SD: mount failed: {}", e);
            None
        }
    };
    let mut storage = SdLogStorage::new(pins::SD_MOUNT_POINT);

    // ── 6. Network link + time sync ───────────────────────────
    let mut wifi = WifiAdapter::new();
    let esp_wifi = EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs_partition))?;
    wifi.attach(BlockingWifi::wrap(esp_wifi, sysloop)?);
    match nvs.as_ref().and_then(NvsAdapter::wifi_credentials) {
        Some(creds) => {
            if let Err(e) = wifi.set_credentials(&creds.ssid, &creds.password) {
                warn!("WiFi: stored credentials rejected: {}", e);
            } else if let Err(e) = wifi.connect() {
                warn!("WiFi: initial connect failed: {}", e);
            }
        }
        None => warn!("WiFi: no stored credentials, running offline"),
    }
    let mut net = NetworkAdapter::new(wifi, SntpAdapter::new());

    // ── 7. Remaining adapters ─────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let mut sink = LogEventSink::new();
    let mut uploader = HttpUploader::new(&config.upload_endpoint, config.upload_timeout_ms);
    let upload_enabled = config.upload_enabled;

    // ── 8. Application service ────────────────────────────────
    let mut app = AppService::new(config);
    app.start(&clock, &mut net, &mut display, &mut sink);

    // ── 9. Acquisition loop ───────────────────────────────────
    info!("Entering acquisition loop");
    loop {
        app.tick(&mut hw, &clock, &mut storage, &mut net, &mut display, &mut sink);
        if upload_enabled {
            if let Some(Err(e)) = app.upload(&mut uploader, &mut sink) {
                debug!("{}", Error::from(e));
            }
        }
    }
}
