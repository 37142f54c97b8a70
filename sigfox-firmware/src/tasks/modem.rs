//! Modem UART tasks
//!
//! The receive half feeds every byte into the response framer; the transmit
//! half belongs to the channel driver, which serves the engine's requests.

use defmt::*;
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embassy_time::Delay;
use embedded_io_async::Read;

use sigfox_core::channel::ChannelDriver;

use crate::channels::{BUS, FRAMER, REQUESTS};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Modem RX task - frames responses from the modem
#[embassy_executor::task]
pub async fn modem_rx_task(mut rx: BufferedUartRx) {
    info!("Modem RX task started");

    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);
                FRAMER.on_bytes_received(&buf[..n]);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Modem UART read error: {:?}", e);
            }
        }
    }
}

/// Modem driver task - writes commands and waits for their responses
#[embassy_executor::task]
pub async fn modem_driver_task(tx: BufferedUartTx) {
    info!("Modem driver task started");

    let mut driver = ChannelDriver::new(&REQUESTS, &BUS, &FRAMER, tx, Delay);
    driver.run().await
}
