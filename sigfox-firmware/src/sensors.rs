//! Node sensors
//!
//! The RP2040 reads its own die temperature and the VSYS rail through the
//! on-chip ADC. A simulated gyroscope stands in for a motion sensor so the
//! pipeline carries a fast-changing value as well.

use core::cell::RefCell;

use embassy_rp::adc::{self, Adc, Blocking};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use sigfox_core::traits::{Sensor, SensorError};

/// One ADC shared by every analog sensor
pub type SharedAdc = Mutex<CriticalSectionRawMutex, RefCell<Adc<'static, Blocking>>>;

/// ADC reference voltage
const ADC_VREF: f32 = 3.3;

/// 12-bit converter
const ADC_FULL_SCALE: f32 = 4096.0;

/// VSYS is measured through a 1:3 divider on the Pico
const VSYS_DIVIDER: f32 = 3.0;

/// Plausible VSYS range in volts
const VSYS_MIN_V: f32 = 1.8;
const VSYS_MAX_V: f32 = 5.5;

/// Samples per simulated sweep
const GYRO_PERIOD: u16 = 40;

/// Peak simulated rotation rate in degrees per second
const GYRO_PEAK_DPS: f32 = 90.0;

fn read_raw(adc: &SharedAdc, channel: &mut adc::Channel<'static>) -> Result<u16, SensorError> {
    adc.lock(|adc| adc.borrow_mut().blocking_read(channel))
        .map_err(|_| SensorError::BusError)
}

fn to_volts(raw: u16) -> f32 {
    raw as f32 * ADC_VREF / ADC_FULL_SCALE
}

/// RP2040 die temperature in °C
pub struct ChipTemperature {
    adc: &'static SharedAdc,
    channel: adc::Channel<'static>,
}

impl ChipTemperature {
    pub fn new(adc: &'static SharedAdc, channel: adc::Channel<'static>) -> Self {
        Self { adc, channel }
    }
}

impl Sensor for ChipTemperature {
    fn read(&mut self) -> Result<f32, SensorError> {
        let voltage = to_volts(read_raw(self.adc, &mut self.channel)?);
        // RP2040 datasheet: 0.706 V at 27 °C, -1.721 mV per °C
        Ok(27.0 - (voltage - 0.706) / 0.001721)
    }
}

/// System supply voltage in volts
pub struct SupplyVoltage {
    adc: &'static SharedAdc,
    channel: adc::Channel<'static>,
}

impl SupplyVoltage {
    pub fn new(adc: &'static SharedAdc, channel: adc::Channel<'static>) -> Self {
        Self { adc, channel }
    }
}

impl Sensor for SupplyVoltage {
    fn read(&mut self) -> Result<f32, SensorError> {
        let voltage = to_volts(read_raw(self.adc, &mut self.channel)?) * VSYS_DIVIDER;
        if !(VSYS_MIN_V..=VSYS_MAX_V).contains(&voltage) {
            return Err(SensorError::OutOfRange);
        }
        Ok(voltage)
    }
}

/// Simulated gyroscope sweeping a triangle wave
pub struct SimulatedGyro {
    step: u16,
}

impl SimulatedGyro {
    pub const fn new() -> Self {
        Self { step: 0 }
    }
}

impl Sensor for SimulatedGyro {
    fn read(&mut self) -> Result<f32, SensorError> {
        let half = GYRO_PERIOD / 2;
        let phase = self.step % GYRO_PERIOD;
        self.step = self.step.wrapping_add(1) % GYRO_PERIOD;

        let rise = if phase < half { phase } else { GYRO_PERIOD - phase };
        Ok(rise as f32 * (2.0 * GYRO_PEAK_DPS / half as f32) - GYRO_PEAK_DPS)
    }
}

/// Any sensor the node can run a producer for
pub enum NodeSensor {
    ChipTemperature(ChipTemperature),
    SupplyVoltage(SupplyVoltage),
    Gyro(SimulatedGyro),
}

impl Sensor for NodeSensor {
    fn read(&mut self) -> Result<f32, SensorError> {
        match self {
            NodeSensor::ChipTemperature(s) => s.read(),
            NodeSensor::SupplyVoltage(s) => s.read(),
            NodeSensor::Gyro(s) => s.read(),
        }
    }
}

/// Sensors available on the board, handed out by name
///
/// Each ADC channel exists once, so a hardware sensor can only be taken
/// once; the simulated gyro can be taken any number of times.
pub struct SensorBank {
    temperature: Option<ChipTemperature>,
    supply: Option<SupplyVoltage>,
}

impl SensorBank {
    pub fn new(temperature: ChipTemperature, supply: SupplyVoltage) -> Self {
        Self {
            temperature: Some(temperature),
            supply: Some(supply),
        }
    }

    /// Take the sensor configured as `name` in `node.toml`
    pub fn take(&mut self, name: &str) -> Option<NodeSensor> {
        match name {
            "tmp" => self.temperature.take().map(NodeSensor::ChipTemperature),
            "vsy" => self.supply.take().map(NodeSensor::SupplyVoltage),
            "gyr" => Some(NodeSensor::Gyro(SimulatedGyro::new())),
            _ => None,
        }
    }
}
