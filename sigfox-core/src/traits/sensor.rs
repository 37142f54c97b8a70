//! Sensor trait

/// Errors that can occur while sampling a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Device did not answer on the bus
    NotResponding,
    /// Bus transfer or conversion failed
    BusError,
    /// Reading outside the plausible range of the device
    OutOfRange,
}

/// Trait for polled sensors
///
/// Implementations handle the specific device (on-chip ADC channel, I2C
/// environmental sensor, simulated source, ...). Calibration is the
/// implementation's concern; the pipeline only sees engineering units.
///
/// Takes `&mut self` because bus reads typically require mutable access.
/// Callers hold the bus permit for the duration of the call.
pub trait Sensor {
    /// Read one value in the sensor's engineering unit
    fn read(&mut self) -> Result<f32, SensorError>;
}
