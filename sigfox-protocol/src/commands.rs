//! Wisol AT commands and command sequences
//!
//! A [`CommandSequence`] is an ordered list of [`CommandStep`]s executed one
//! at a time against the modem and terminated by [`CommandStep::END`].

use core::fmt::Write;

use heapless::{String, Vec};

use crate::zone::Zone;

/// Line terminator appended to every command
pub const CMD_END: &str = "\r";

/// Device will only talk to the SNEK emulator
pub const CMD_EMULATOR_ENABLE: &str = "ATS410=1";
/// Device will only talk to the Sigfox network
pub const CMD_EMULATOR_DISABLE: &str = "ATS410=0";
/// Get Sigfox device ID
pub const CMD_GET_ID: &str = "AT$I=10";
/// Get Sigfox device PAC, used for registering the device
pub const CMD_GET_PAC: &str = "AT$I=11";
/// RCZ1: set output power to maximum
pub const CMD_OUTPUT_POWER_MAX: &str = "ATS302=15";
/// RCZ2/4: query macro channel availability, answers `X,Y`
pub const CMD_CHANNEL_INFO: &str = "AT$GI?";
/// RCZ2/4: reset macro channels
pub const CMD_RESET_CHANNELS: &str = "AT$RC";
/// Send a frame to the Sigfox cloud, followed by the hex payload
pub const CMD_SEND_MESSAGE: &str = "AT$SF=";
/// Module temperature in tenths of a degree
pub const CMD_GET_TEMPERATURE: &str = "AT$T?";
/// Module voltage in mV: idle, then during the last transmission
pub const CMD_GET_VOLTAGE: &str = "AT$V?";
/// Software reset
pub const CMD_SOFTWARE_RESET: &str = "AT$P=0";
/// Set uplink frequency, followed by the frequency in Hz
pub const CMD_SET_FREQUENCY: &str = "AT$IF=";

/// Maximum command line length including the terminator
pub const MAX_COMMAND_LEN: usize = 40;

/// Maximum argument length appended to a command
pub const MAX_ARGUMENT_LEN: usize = 2 * MAX_BYTES_PER_MESSAGE;

/// Maximum number of steps in a sequence, sentinel included
pub const MAX_SEQUENCE_LEN: usize = 8;

/// Only 12 bytes per Sigfox uplink message
pub const MAX_BYTES_PER_MESSAGE: usize = 12;

/// Rendered command text sent to the modem
pub type CommandLine = String<MAX_COMMAND_LEN>;

/// Ordered list of commands ending with [`CommandStep::END`]
pub type CommandSequence = Vec<CommandStep, MAX_SEQUENCE_LEN>;

/// Processing applied to the response of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseHandler {
    /// Any response is accepted
    None,
    /// Store the response as the device ID
    CaptureDeviceId,
    /// Store the response as the device PAC
    CapturePac,
    /// Response must be `OK`
    ExpectOk,
    /// Parse the `X,Y` macro channel report
    ChannelInfo,
    /// Store the module temperature
    CaptureTemperature,
    /// Store the idle module voltage
    CaptureVoltage,
}

/// When a step is sent rather than passed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepCondition {
    #[default]
    Always,
    /// Only when the last `AT$GI?` report asks for a macro channel reset,
    /// or no report was captured
    ChannelsBusy,
}

/// One modem interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStep {
    /// Command text; empty for the end-of-sequence sentinel
    pub command: &'static str,
    /// Text appended after the command (e.g. hex payload)
    pub argument: String<MAX_ARGUMENT_LEN>,
    /// Number of markers making up the response
    pub expected_markers: u8,
    pub handler: ResponseHandler,
    pub when: StepCondition,
}

impl CommandStep {
    /// End-of-sequence sentinel, never transmitted
    pub const END: CommandStep = CommandStep::new("", 0, ResponseHandler::None);

    pub const fn new(command: &'static str, expected_markers: u8, handler: ResponseHandler) -> Self {
        Self {
            command,
            argument: String::new(),
            expected_markers,
            handler,
            when: StepCondition::Always,
        }
    }

    /// Send this step only under `condition`
    pub fn only_when(mut self, condition: StepCondition) -> Self {
        self.when = condition;
        self
    }

    /// Create a step with an argument, truncated to [`MAX_ARGUMENT_LEN`]
    pub fn with_argument(
        command: &'static str,
        argument: &str,
        expected_markers: u8,
        handler: ResponseHandler,
    ) -> Self {
        let mut step = Self::new(command, expected_markers, handler);
        push_truncated(&mut step.argument, argument);
        step
    }

    /// Whether this is the end-of-sequence sentinel
    pub fn is_end(&self) -> bool {
        self.command.is_empty()
    }

    /// Render the wire text: command, argument, then CR
    ///
    /// Overlong text is truncated; the terminator is always kept.
    pub fn render(&self) -> CommandLine {
        let mut line = CommandLine::new();
        let mut body: String<{ MAX_COMMAND_LEN - 1 }> = String::new();
        push_truncated(&mut body, self.command);
        push_truncated(&mut body, &self.argument);
        let _ = line.push_str(&body);
        let _ = line.push_str(CMD_END);
        line
    }
}

/// Append as much of `text` as fits
fn push_truncated<const N: usize>(target: &mut String<N>, text: &str) {
    for c in text.chars() {
        if target.push(c).is_err() {
            break;
        }
    }
}

static STARTUP_EMULATOR: [CommandStep; 4] = [
    CommandStep::new(CMD_EMULATOR_ENABLE, 1, ResponseHandler::None),
    CommandStep::new(CMD_GET_ID, 1, ResponseHandler::CaptureDeviceId),
    CommandStep::new(CMD_GET_PAC, 1, ResponseHandler::CapturePac),
    CommandStep::END,
];

static STARTUP_NETWORK: [CommandStep; 4] = [
    CommandStep::new(CMD_EMULATOR_DISABLE, 1, ResponseHandler::None),
    CommandStep::new(CMD_GET_ID, 1, ResponseHandler::CaptureDeviceId),
    CommandStep::new(CMD_GET_PAC, 1, ResponseHandler::CapturePac),
    CommandStep::END,
];

/// Commands bringing up the modem and reading its identity
pub fn startup_sequence(use_emulator: bool) -> CommandSequence {
    let table = if use_emulator {
        &STARTUP_EMULATOR
    } else {
        &STARTUP_NETWORK
    };
    table.iter().cloned().collect()
}

/// Commands sending `payload` as one uplink frame in `zone`
///
/// Payloads longer than [`MAX_BYTES_PER_MESSAGE`] are truncated.
pub fn transmit_sequence(zone: Zone, payload: &[u8]) -> CommandSequence {
    let mut sequence = CommandSequence::new();

    if zone == Zone::Rcz1 {
        let _ = sequence.push(CommandStep::new(
            CMD_OUTPUT_POWER_MAX,
            1,
            ResponseHandler::ExpectOk,
        ));
    }
    if zone.needs_channel_check() {
        let _ = sequence.push(CommandStep::new(
            CMD_CHANNEL_INFO,
            1,
            ResponseHandler::ChannelInfo,
        ));
        let _ = sequence.push(
            CommandStep::new(CMD_RESET_CHANNELS, 1, ResponseHandler::ExpectOk)
                .only_when(StepCondition::ChannelsBusy),
        );
    }

    let hex = encode_hex(&payload[..payload.len().min(MAX_BYTES_PER_MESSAGE)]);
    let _ = sequence.push(CommandStep::with_argument(
        CMD_SEND_MESSAGE,
        &hex,
        1,
        ResponseHandler::ExpectOk,
    ));
    let _ = sequence.push(CommandStep::END);
    sequence
}

static DIAGNOSTICS: [CommandStep; 3] = [
    CommandStep::new(CMD_GET_TEMPERATURE, 1, ResponseHandler::CaptureTemperature),
    CommandStep::new(CMD_GET_VOLTAGE, 2, ResponseHandler::CaptureVoltage),
    CommandStep::END,
];

/// Commands reading the module's own temperature and supply voltage
pub fn diagnostics_sequence() -> CommandSequence {
    DIAGNOSTICS.iter().cloned().collect()
}

/// Commands resetting the modem and putting it back on the zone frequency
pub fn recovery_sequence(zone: Zone) -> CommandSequence {
    let mut frequency: String<MAX_ARGUMENT_LEN> = String::new();
    let _ = write!(frequency, "{}", zone.frequency_hz());

    let mut sequence = CommandSequence::new();
    let _ = sequence.push(CommandStep::new(CMD_SOFTWARE_RESET, 1, ResponseHandler::ExpectOk));
    let _ = sequence.push(CommandStep::with_argument(
        CMD_SET_FREQUENCY,
        &frequency,
        1,
        ResponseHandler::ExpectOk,
    ));
    let _ = sequence.push(CommandStep::END);
    sequence
}

/// Upper-case hex encoding of an uplink payload
pub fn encode_hex(bytes: &[u8]) -> String<MAX_ARGUMENT_LEN> {
    let mut hex = String::new();
    for byte in bytes {
        if write!(hex, "{:02X}", byte).is_err() {
            break;
        }
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_appends_cr() {
        let step = CommandStep::new(CMD_GET_ID, 1, ResponseHandler::CaptureDeviceId);
        assert_eq!(step.render().as_str(), "AT$I=10\r");
    }

    #[test]
    fn test_render_with_argument() {
        let step = CommandStep::with_argument(CMD_SEND_MESSAGE, "0102", 1, ResponseHandler::ExpectOk);
        assert_eq!(step.render().as_str(), "AT$SF=0102\r");
    }

    #[test]
    fn test_render_truncates_but_keeps_terminator() {
        static LONG: &str = "AT$XXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXXX";
        let step = CommandStep::new(LONG, 1, ResponseHandler::None);
        let line = step.render();

        assert_eq!(line.len(), MAX_COMMAND_LEN);
        assert!(line.ends_with('\r'));
        assert!(LONG.starts_with(&line[..MAX_COMMAND_LEN - 1]));
    }

    #[test]
    fn test_startup_sequence_shape() {
        let sequence = startup_sequence(true);
        let commands: [&str; 4] = [
            sequence[0].command,
            sequence[1].command,
            sequence[2].command,
            sequence[3].command,
        ];
        assert_eq!(commands, [CMD_EMULATOR_ENABLE, CMD_GET_ID, CMD_GET_PAC, ""]);
        assert!(sequence[3].is_end());
        assert_eq!(sequence[1].handler, ResponseHandler::CaptureDeviceId);
        assert_eq!(sequence[2].handler, ResponseHandler::CapturePac);

        assert_eq!(startup_sequence(false)[0].command, CMD_EMULATOR_DISABLE);
    }

    #[test]
    fn test_transmit_sequence_per_zone() {
        let rcz1 = transmit_sequence(Zone::Rcz1, &[0x01, 0xAB]);
        assert_eq!(rcz1.len(), 3);
        assert_eq!(rcz1[0].command, CMD_OUTPUT_POWER_MAX);
        assert_eq!(rcz1[1].render().as_str(), "AT$SF=01AB\r");
        assert!(rcz1[2].is_end());

        let rcz2 = transmit_sequence(Zone::Rcz2, &[0xFF]);
        assert_eq!(rcz2.len(), 4);
        assert_eq!(rcz2[0].command, CMD_CHANNEL_INFO);
        assert_eq!(rcz2[1].command, CMD_RESET_CHANNELS);
        assert_eq!(rcz2[1].when, StepCondition::ChannelsBusy);
        assert_eq!(rcz2[2].render().as_str(), "AT$SF=FF\r");
        assert!(rcz2
            .iter()
            .filter(|step| step.command != CMD_RESET_CHANNELS)
            .all(|step| step.when == StepCondition::Always));

        let rcz3 = transmit_sequence(Zone::Rcz3, &[0x00]);
        assert_eq!(rcz3.len(), 2);
        assert_eq!(rcz3[0].command, CMD_SEND_MESSAGE);
    }

    #[test]
    fn test_transmit_payload_truncated_to_twelve_bytes() {
        let payload = [0xAAu8; 20];
        let sequence = transmit_sequence(Zone::Rcz3, &payload);
        assert_eq!(sequence[0].argument.len(), 2 * MAX_BYTES_PER_MESSAGE);
    }

    #[test]
    fn test_recovery_sequence_sets_zone_frequency() {
        let sequence = recovery_sequence(Zone::Rcz2);
        assert_eq!(sequence[0].render().as_str(), "AT$P=0\r");
        assert_eq!(sequence[1].render().as_str(), "AT$IF=902200000\r");
        assert!(sequence[2].is_end());
    }

    #[test]
    fn test_diagnostics_sequence() {
        let sequence = diagnostics_sequence();
        assert_eq!(sequence[0].command, CMD_GET_TEMPERATURE);
        // Voltage answers with two lines
        assert_eq!(sequence[1].expected_markers, 2);
        assert!(sequence[2].is_end());
    }

    #[test]
    fn test_end_sentinel() {
        assert!(CommandStep::END.is_end());
        assert!(!CommandStep::new(CMD_GET_ID, 1, ResponseHandler::None).is_end());
    }
}
