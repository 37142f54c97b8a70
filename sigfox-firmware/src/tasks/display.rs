//! Display consumer task
//!
//! Renders samples and sequence outcomes to the defmt log.

use defmt::*;

use sigfox_core::engine::SequenceReport;
use sigfox_core::pipeline::{DisplayMessage, SampleMessage};

use crate::channels::DISPLAY;

/// Display task - lowest priority consumer of [`DISPLAY`]
#[embassy_executor::task]
pub async fn display_task() {
    info!("Display task started");

    loop {
        match DISPLAY.receive().await {
            DisplayMessage::Sample(sample) => show_sample(&sample),
            DisplayMessage::Sequence(report) => show_report(&report),
        }
    }
}

fn show_sample(sample: &SampleMessage) {
    info!(
        "[{} ms] {} #{}: {}",
        sample.timestamp_ms,
        sample.name.as_str(),
        sample.count,
        sample.value
    );
}

fn show_report(report: &SequenceReport) {
    match report.error {
        None => info!(
            "{:?} sequence done ({} steps, {} skipped)",
            report.kind, report.steps_completed, report.steps_skipped
        ),
        Some(e) => warn!(
            "{:?} sequence failed after {} steps: {:?}",
            report.kind, report.steps_completed, e
        ),
    }
}
