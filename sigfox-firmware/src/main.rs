//! Sigfox sensor node firmware
//!
//! Main firmware binary for RP2040 boards with a Wisol Sigfox modem on
//! UART0. Sensor tasks sample on-chip and simulated sensors; the protocol
//! engine starts the modem and relays readings as Sigfox uplinks.

#![no_std]
#![no_main]

use core::cell::RefCell;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{self, Adc};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::Pull;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_sync::blocking_mutex::Mutex;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use sigfox_core::config::{parse_config, NodeConfig, POLL_INTERVAL_MS};
use sigfox_core::pipeline::{Pipeline, PipelineBuilder, Priority, ProducerConfig, SensorProducer};

use crate::channels::{BUS, DISPLAY, FRAMER, INBOX, RESPONSES};
use crate::sensors::{ChipTemperature, SensorBank, SharedAdc, SupplyVoltage};

/// Embedded node configuration (compiled into firmware)
/// Edit node.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../node.toml");

/// Wisol modules talk at 9600 baud
const MODEM_BAUD: u32 = 9600;

mod channels;
mod sensors;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

static ADC: StaticCell<SharedAdc> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Sigfox node firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();
    let pipeline = build_pipeline(&config);

    // Setup UART for the modem
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = MODEM_BAUD;

    let tx_buf = TX_BUF.init([0u8; 64]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    FRAMER.set_completion_target(&RESPONSES);
    info!("UART initialized for modem communication");

    // Setup ADC for the on-chip sensors
    // VSYS/3 is wired to GPIO29 on the Pico
    let adc = ADC.init(Mutex::new(RefCell::new(Adc::new_blocking(
        p.ADC,
        adc::Config::default(),
    ))));
    let mut bank = SensorBank::new(
        ChipTemperature::new(adc, adc::Channel::new_temp_sensor(p.ADC_TEMP_SENSOR)),
        SupplyVoltage::new(adc, adc::Channel::new_pin(p.PIN_29, Pull::None)),
    );

    info!("ADC initialized");

    // Spawn tasks
    spawner.spawn(tasks::modem_rx_task(rx).unwrap());
    spawner.spawn(tasks::modem_driver_task(tx).unwrap());
    spawner.spawn(tasks::engine_task(config.radio.clone()).unwrap());
    spawner.spawn(tasks::display_task().unwrap());

    for producer_config in pipeline.producers() {
        let name = producer_config.name.clone();
        let Some(sensor) = bank.take(&name) else {
            warn!("No sensor named {} on this board, skipping", name.as_str());
            continue;
        };

        let producer = SensorProducer::new(producer_config.clone(), sensor, &BUS, &INBOX)
            .with_display(&DISPLAY);
        spawner.spawn(tasks::sensor_task(producer).unwrap());
    }

    info!(
        "All tasks spawned: {} sensors, display at {:?}",
        pipeline.producers().len(),
        pipeline.display_priority()
    );
}

/// Parse the embedded node.toml
///
/// Falls back to defaults if the file does not parse; build.rs validates it,
/// so this only happens when the two parsers disagree.
fn load_config() -> NodeConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {:?}", e);
            warn!("Using default node configuration");
            NodeConfig::default()
        }
    }
}

/// Validate the sensor layout, falling back to the chip temperature alone
fn build_pipeline(config: &NodeConfig) -> Pipeline {
    match config.pipeline() {
        Ok(pipeline) if !pipeline.producers().is_empty() => pipeline,
        Ok(_) => {
            warn!("No sensors configured, using chip temperature");
            fallback_pipeline()
        }
        Err(e) => {
            error!("Invalid sensor layout: {:?}", e);
            warn!("Using chip temperature only");
            fallback_pipeline()
        }
    }
}

fn fallback_pipeline() -> Pipeline {
    PipelineBuilder::new()
        .producer(ProducerConfig::new("tmp", POLL_INTERVAL_MS, Priority::Critical))
        .unwrap_or_default()
        .build()
}
