//! Protocol engine task

use defmt::*;
use embassy_time::Delay;

use sigfox_core::config::RadioConfig;
use sigfox_core::engine::{ProtocolEngine, SequenceKind};

use crate::channels::{DISPLAY, ENGINE_NOTIFY, INBOX, REQUESTS};

/// Engine task - turns samples into modem command sequences
#[embassy_executor::task]
pub async fn engine_task(radio: RadioConfig) {
    let mut engine = ProtocolEngine::new(radio, &INBOX, &REQUESTS, &ENGINE_NOTIFY, Delay)
        .with_display(&DISPLAY);

    info!(
        "Engine task started: country {}, RCZ{}, emulator {}",
        engine.context().country().as_str(),
        engine.context().zone().number(),
        engine.context().use_emulator()
    );

    loop {
        let Some(report) = engine.next().await else {
            continue;
        };
        if report.kind != SequenceKind::Startup || !report.succeeded() {
            continue;
        }

        info!(
            "Modem ready: device {}, PAC {}",
            engine.context().device_id(),
            engine.context().pac()
        );

        if engine.diagnostics().await.succeeded() {
            let ctx = engine.context();
            info!(
                "Module at {} C, {} mV",
                ctx.module_temperature().unwrap_or(f32::NAN),
                ctx.module_voltage_mv().unwrap_or(0)
            );
        }
    }
}
