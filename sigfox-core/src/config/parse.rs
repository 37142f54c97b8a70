//! Minimal TOML parser for node configuration
//!
//! Handles only the subset `node.toml` needs. It does NOT support the full
//! TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - `[radio]` section
//! - `[sensor.<name>]` (or `[sensor <name>]`) sections
//! - Comments (# ...)
//!
//! Unknown keys are ignored so newer files still load.

use sigfox_protocol::Country;

use super::types::{NodeConfig, POLL_INTERVAL_MS};
use crate::pipeline::{sensor_name, Priority, ProducerConfig, SensorName};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Invalid section header
    InvalidSection,
    /// Invalid value type
    InvalidValue,
    /// Country code is not two letters
    InvalidCountry,
    /// Unknown priority name
    InvalidPriority,
    /// More sensors than the node supports
    TooManySensors,
}

/// Current parsing context
enum Section {
    Root,
    Radio,
    Sensor(SensorName),
}

/// Parse TOML configuration into NodeConfig
pub fn parse_config(input: &str) -> Result<NodeConfig, ConfigError> {
    let mut config = NodeConfig::new();
    let mut section = Section::Root;
    let mut current_sensor: Option<ProducerConfig> = None;

    for line in input.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            save_sensor(&mut config, &mut current_sensor)?;

            section = parse_section_header(&line[1..line.len() - 1])?;
            if let Section::Sensor(name) = &section {
                current_sensor = Some(ProducerConfig {
                    name: name.clone(),
                    poll_interval_ms: POLL_INTERVAL_MS,
                    priority: Priority::Normal,
                });
            }
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            match &section {
                Section::Root => {}
                Section::Radio => apply_radio(&mut config, key, value)?,
                Section::Sensor(_) => {
                    if let Some(sensor) = current_sensor.as_mut() {
                        apply_sensor(sensor, key, value)?;
                    }
                }
            }
        }
    }

    save_sensor(&mut config, &mut current_sensor)?;
    Ok(config)
}

/// Parse section header like "radio", "sensor.tmp" or "sensor tmp"
fn parse_section_header(header: &str) -> Result<Section, ConfigError> {
    let header = header.trim();

    if header == "radio" {
        return Ok(Section::Radio);
    }

    let name = header
        .strip_prefix("sensor.")
        .or_else(|| header.strip_prefix("sensor "))
        .map(str::trim)
        .ok_or(ConfigError::InvalidSection)?;

    if name.is_empty() {
        return Err(ConfigError::InvalidSection);
    }
    Ok(Section::Sensor(sensor_name(parse_string(name))))
}

fn save_sensor(
    config: &mut NodeConfig,
    current: &mut Option<ProducerConfig>,
) -> Result<(), ConfigError> {
    if let Some(sensor) = current.take() {
        config
            .sensors
            .push(sensor)
            .map_err(|_| ConfigError::TooManySensors)?;
    }
    Ok(())
}

fn apply_radio(config: &mut NodeConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let radio = &mut config.radio;
    match key {
        "country" => {
            radio.country =
                Country::from_code(parse_string(value)).ok_or(ConfigError::InvalidCountry)?;
        }
        "use_emulator" => radio.use_emulator = parse_bool(value)?,
        "command_timeout_ms" => radio.command_timeout_ms = parse_int(value)?,
        "send_interval_ms" => radio.send_interval_ms = parse_int(value)?,
        "max_attempts" => radio.max_attempts = parse_int(value)?,
        "retry_backoff_ms" => radio.retry_backoff_ms = parse_int(value)?,
        _ => {}
    }
    Ok(())
}

fn apply_sensor(sensor: &mut ProducerConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "poll_interval_ms" => sensor.poll_interval_ms = parse_int(value)?,
        "priority" => {
            sensor.priority =
                Priority::from_name(parse_string(value)).ok_or(ConfigError::InvalidPriority)?;
        }
        _ => {}
    }
    Ok(())
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = match value.find('#') {
        Some(hash_pos) if value[..hash_pos].matches('"').count() % 2 == 0 => {
            value[..hash_pos].trim()
        }
        _ => value,
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn parse_string(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        // Allow unquoted strings for simple values
        value
    }
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ConfigError> {
    // TOML allows underscores as digit separators
    let mut digits: heapless::String<16> = heapless::String::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ConfigError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ConfigError::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue),
    }
}
