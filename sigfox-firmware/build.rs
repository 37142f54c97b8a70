//! Build script for sigfox-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates node.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Sensor names are this many characters on the wire
const NAME_LEN: usize = 3;

/// Producers the node can run
const MAX_SENSORS: usize = 4;

const PRIORITIES: [&str; 4] = ["critical", "high", "normal", "low"];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate node.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=node.toml");

    let config_path = Path::new("node.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: node.toml not found!                                     ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds node.toml as its configuration.             ║\n\
            ║  Please create one in the sigfox-firmware directory.             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read node.toml                                 ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in node.toml                         ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_radio(&config, &mut errors);
    validate_sensors(&config, &mut errors);
    report("Invalid node configuration", &errors);

    println!("cargo:warning=node.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn report(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn validate_radio(config: &toml::Value, errors: &mut Vec<String>) {
    let radio = match config.get("radio") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[radio] must be a table".to_string());
            return;
        }
        None => return,
    };

    if let Some(country) = radio.get("country") {
        match country.as_str() {
            Some(code) if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) => {}
            _ => errors.push("[radio] country must be a two-letter code".to_string()),
        }
    }

    if let Some(value) = radio.get("use_emulator") {
        if !value.is_bool() {
            errors.push("[radio] use_emulator must be true or false".to_string());
        }
    }

    for key in ["command_timeout_ms", "send_interval_ms", "retry_backoff_ms"] {
        if let Some(value) = radio.get(key) {
            match value.as_integer() {
                Some(v) if v > 0 && v <= u32::MAX as i64 => {}
                _ => errors.push(format!("[radio] {} must be a positive integer", key)),
            }
        }
    }

    if let Some(value) = radio.get("max_attempts") {
        match value.as_integer() {
            Some(v) if (1..=255).contains(&v) => {}
            _ => errors.push("[radio] max_attempts must be 1-255".to_string()),
        }
    }
}

fn validate_sensors(config: &toml::Value, errors: &mut Vec<String>) {
    let sensors = match config.get("sensor") {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push("[sensor.*] must be tables".to_string());
            return;
        }
        None => {
            errors.push("Missing [sensor.*] section - at least one sensor is required".to_string());
            return;
        }
    };

    if sensors.len() > MAX_SENSORS {
        errors.push(format!("At most {} sensors are supported", MAX_SENSORS));
    }

    let mut priorities: Vec<String> = Vec::new();
    let mut tags: Vec<char> = Vec::new();

    for (name, sensor) in sensors {
        if name.is_empty() || name.len() > NAME_LEN {
            errors.push(format!("[sensor.{}] name must be 1-{} characters", name, NAME_LEN));
        }
        if name == "000" {
            errors.push("[sensor.000] is reserved for modem startup".to_string());
        }
        // The first character tags the reading in the uplink payload
        if let Some(tag) = name.chars().next() {
            if tags.contains(&tag) {
                errors.push(format!(
                    "[sensor.{}] starts with '{}' like another sensor; payload tags must differ",
                    name, tag
                ));
            } else {
                tags.push(tag);
            }
        }

        let sensor = match sensor {
            toml::Value::Table(t) => t,
            _ => {
                errors.push(format!("[sensor.{}] must be a table", name));
                continue;
            }
        };

        if let Some(value) = sensor.get("poll_interval_ms") {
            match value.as_integer() {
                Some(v) if v > 0 && v <= u32::MAX as i64 => {}
                _ => errors.push(format!(
                    "[sensor.{}] poll_interval_ms must be a positive integer",
                    name
                )),
            }
        }

        let priority = sensor
            .get("priority")
            .and_then(|p| p.as_str())
            .unwrap_or("normal")
            .to_string();
        if !PRIORITIES.contains(&priority.as_str()) {
            errors.push(format!(
                "[sensor.{}] priority must be critical, high, normal or low",
                name
            ));
        } else if priorities.contains(&priority) {
            errors.push(format!(
                "[sensor.{}] priority '{}' is already used",
                name, priority
            ));
        } else {
            priorities.push(priority);
        }
    }
}
