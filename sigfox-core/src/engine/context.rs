//! Per-device protocol state

use heapless::String;
use sigfox_protocol::{CommandSequence, CommandStep, Country, Zone};

use crate::config::RadioConfig;

/// Sigfox device IDs are 8 hex digits
pub const DEVICE_ID_LEN: usize = 8;

/// Porting authorization codes are 16 hex digits
pub const PAC_LEN: usize = 16;

/// Macro channel availability reported by `AT$GI?`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelInfo {
    /// Whether the current macro channel is usable
    pub x: u8,
    /// Number of free micro channels
    pub y: u8,
}

impl ChannelInfo {
    /// Macro channels need a reset before the next frame
    pub fn needs_reset(&self) -> bool {
        self.x == 0 || self.y < 3
    }
}

/// State of the modem session, owned by the protocol engine
#[derive(Debug)]
pub struct ProtocolContext {
    country: Country,
    zone: Zone,
    use_emulator: bool,
    pub(crate) device_id: String<DEVICE_ID_LEN>,
    pub(crate) pac: String<PAC_LEN>,
    pub(crate) channel_info: Option<ChannelInfo>,
    /// Module temperature in tenths of a degree
    pub(crate) module_temperature: Option<i16>,
    /// Idle module voltage in mV
    pub(crate) module_voltage_mv: Option<u16>,
    sequence: CommandSequence,
    index: usize,
    status: bool,
    started: bool,
    first_activation: bool,
}

impl ProtocolContext {
    pub fn new(radio: &RadioConfig) -> Self {
        Self {
            country: radio.country,
            zone: Zone::for_country(radio.country),
            use_emulator: radio.use_emulator,
            device_id: String::new(),
            pac: String::new(),
            channel_info: None,
            module_temperature: None,
            module_voltage_mv: None,
            sequence: CommandSequence::new(),
            index: 0,
            status: false,
            started: false,
            first_activation: true,
        }
    }

    pub fn country(&self) -> Country {
        self.country
    }

    /// Radio zone, fixed at construction
    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn use_emulator(&self) -> bool {
        self.use_emulator
    }

    /// Device ID captured at startup; empty until then
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// PAC captured at startup; empty until then
    pub fn pac(&self) -> &str {
        &self.pac
    }

    pub fn channel_info(&self) -> Option<ChannelInfo> {
        self.channel_info
    }

    /// Module temperature in °C from the last diagnostics run
    pub fn module_temperature(&self) -> Option<f32> {
        self.module_temperature.map(|t| f32::from(t) / 10.0)
    }

    pub fn module_voltage_mv(&self) -> Option<u16> {
        self.module_voltage_mv
    }

    /// Outcome of the last sequence step run
    pub fn status(&self) -> bool {
        self.status
    }

    /// Startup sequence has completed successfully
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Index of the next step to run
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn sequence(&self) -> &[CommandStep] {
        &self.sequence
    }

    /// Install a sequence and rewind to its first step
    pub fn install(&mut self, sequence: CommandSequence) {
        self.sequence = sequence;
        self.index = 0;
        self.status = true;
    }

    /// Step at the current index, `None` once the sequence is done
    pub fn current_step(&self) -> Option<&CommandStep> {
        self.sequence.get(self.index).filter(|step| !step.is_end())
    }

    /// Move past the current step
    pub fn advance(&mut self) {
        self.index = (self.index + 1).min(self.sequence.len());
    }

    /// Mark the running sequence failed; the index stays on the failed step
    pub fn fail(&mut self) {
        self.status = false;
    }

    pub(crate) fn set_started(&mut self, started: bool) {
        self.started = started;
    }

    /// True exactly once, on the first call
    pub fn take_first_activation(&mut self) -> bool {
        core::mem::replace(&mut self.first_activation, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigfox_protocol::startup_sequence;

    fn context(country: Country) -> ProtocolContext {
        ProtocolContext::new(&RadioConfig {
            country,
            ..RadioConfig::default()
        })
    }

    #[test]
    fn test_zone_computed_once_from_country() {
        assert_eq!(context(Country::JAPAN).zone(), Zone::Rcz3);
        assert_eq!(context(Country::FRANCE).zone(), Zone::Rcz1);
        assert_eq!(context(Country::BRAZIL).zone(), Zone::Rcz4);
    }

    #[test]
    fn test_install_rewinds_index() {
        let mut ctx = context(Country::FRANCE);
        ctx.install(startup_sequence(true));
        ctx.advance();
        ctx.advance();
        assert_eq!(ctx.index(), 2);

        ctx.install(startup_sequence(false));
        assert_eq!(ctx.index(), 0);
        assert!(ctx.status());
    }

    #[test]
    fn test_sentinel_ends_sequence() {
        let mut ctx = context(Country::FRANCE);
        ctx.install(startup_sequence(true));
        for _ in 0..3 {
            assert!(ctx.current_step().is_some());
            ctx.advance();
        }
        assert!(ctx.current_step().is_none());

        // Index never runs past the sequence
        for _ in 0..10 {
            ctx.advance();
        }
        assert_eq!(ctx.index(), ctx.sequence().len());
        assert!(ctx.current_step().is_none());
    }

    #[test]
    fn test_empty_sequence_is_done() {
        let mut ctx = context(Country::FRANCE);
        ctx.install(CommandSequence::new());
        assert!(ctx.current_step().is_none());
    }

    #[test]
    fn test_first_activation_is_one_shot() {
        let mut ctx = context(Country::FRANCE);
        assert!(ctx.take_first_activation());
        assert!(!ctx.take_first_activation());
    }

    #[test]
    fn test_channel_info_reset_rule() {
        assert!(ChannelInfo { x: 0, y: 5 }.needs_reset());
        assert!(ChannelInfo { x: 1, y: 2 }.needs_reset());
        assert!(!ChannelInfo { x: 1, y: 3 }.needs_reset());
    }
}
