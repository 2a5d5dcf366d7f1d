//! Sensor/actuator snapshot
//!
//! A [`StateRecord`] holds the last complete frame received over the serial
//! link. The field order below is the frame order and the telemetry key
//! order; both are part of the wire contract.
//!
//! ```text
//!  0..=4   sensor 1   type, temperature, humidity, light, CO2
//!  5..=9   sensor 2   type, temperature, humidity, light, CO2
//! 10..=12  fan 1      type, set percent, speed
//! 13..=15  fan 2      type, set percent, speed
//! 16..=19  outputs    relay CO2, relay prog 1, relay prog 2, PWM light
//! ```

use crate::constants::FIELD_COUNT;
use crate::errors::DecodeError;

/// Telemetry key for each field, in frame order
///
/// The spellings (`sensors_N_humidity`, upper-case `CO2`) are what the hub
/// side already ingests.
pub const FIELD_KEYS: [&str; FIELD_COUNT] = [
    "sensor_1_type",
    "sensor_1_temperature",
    "sensors_1_humidity",
    "sensor_1_light",
    "sensor_1_CO2",
    "sensor_2_type",
    "sensor_2_temperature",
    "sensors_2_humidity",
    "sensor_2_light",
    "sensor_2_CO2",
    "fan_1_type",
    "fan_1_set_percent",
    "fan_1_speed",
    "fan_2_type",
    "fan_2_set_percent",
    "fan_2_speed",
    "relay_CO2",
    "relay_programmable_1",
    "relay_programmable_2",
    "pwm_light",
];

/// Environmental sensor group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorGroup {
    /// Sensor model code
    pub kind: u8,
    /// Temperature in tenths of a degree Celsius (signed)
    pub temperature: i16,
    /// Relative humidity in percent
    pub humidity: u8,
    /// Light level, raw sensor units
    pub light: u8,
    /// CO2 in ppm
    pub co2: u16,
}

/// Fan actuator group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanGroup {
    /// Fan model code
    pub kind: u8,
    /// Commanded duty in percent
    pub set_percent: u8,
    /// Measured speed in RPM
    pub speed: u16,
}

/// Discrete outputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outputs {
    /// CO2 dosing relay
    pub relay_co2: u8,
    /// First user-assigned relay
    pub relay_programmable_1: u8,
    /// Second user-assigned relay
    pub relay_programmable_2: u8,
    /// Grow-light PWM level
    pub pwm_light: u8,
}

/// Full device snapshot decoded from one serial frame
///
/// Starts zeroed. Replaced wholesale by a successful decode, never patched
/// field by field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateRecord {
    /// Frame fields 0..5
    pub sensor_1: SensorGroup,
    /// Frame fields 5..10
    pub sensor_2: SensorGroup,
    /// Frame fields 10..13
    pub fan_1: FanGroup,
    /// Frame fields 13..16
    pub fan_2: FanGroup,
    /// Frame fields 16..20
    pub outputs: Outputs,
}

impl StateRecord {
    /// Field values widened to `i32`, in frame order
    pub fn values(&self) -> [i32; FIELD_COUNT] {
        let s1 = &self.sensor_1;
        let s2 = &self.sensor_2;
        let o = &self.outputs;
        [
            s1.kind.into(), s1.temperature.into(), s1.humidity.into(), s1.light.into(), s1.co2.into(),
            s2.kind.into(), s2.temperature.into(), s2.humidity.into(), s2.light.into(), s2.co2.into(),
            self.fan_1.kind.into(), self.fan_1.set_percent.into(), self.fan_1.speed.into(),
            self.fan_2.kind.into(), self.fan_2.set_percent.into(), self.fan_2.speed.into(),
            o.relay_co2.into(), o.relay_programmable_1.into(), o.relay_programmable_2.into(), o.pwm_light.into(),
        ]
    }

    /// Build a record from frame-ordered values, checking each field's width
    pub fn from_values(values: &[i64; FIELD_COUNT]) -> Result<Self, DecodeError> {
        let sensor = |base: usize| -> Result<SensorGroup, DecodeError> {
            Ok(SensorGroup {
                kind: narrow(values, base)?,
                temperature: narrow(values, base + 1)?,
                humidity: narrow(values, base + 2)?,
                light: narrow(values, base + 3)?,
                co2: narrow(values, base + 4)?,
            })
        };
        let fan = |base: usize| -> Result<FanGroup, DecodeError> {
            Ok(FanGroup {
                kind: narrow(values, base)?,
                set_percent: narrow(values, base + 1)?,
                speed: narrow(values, base + 2)?,
            })
        };

        Ok(Self {
            sensor_1: sensor(0)?,
            sensor_2: sensor(5)?,
            fan_1: fan(10)?,
            fan_2: fan(13)?,
            outputs: Outputs {
                relay_co2: narrow(values, 16)?,
                relay_programmable_1: narrow(values, 17)?,
                relay_programmable_2: narrow(values, 18)?,
                pwm_light: narrow(values, 19)?,
            },
        })
    }

    /// Replace this record with the decoding of `frame`
    ///
    /// The frame is decoded into a temporary first. On error `self` is left
    /// exactly as it was.
    pub fn update_from_frame(&mut self, frame: &str) -> Result<(), DecodeError> {
        *self = super::decode(frame)?;
        Ok(())
    }
}

fn narrow<T: TryFrom<i64>>(values: &[i64; FIELD_COUNT], index: usize) -> Result<T, DecodeError> {
    T::try_from(values[index]).map_err(|_| DecodeError::OutOfRange { index })
}
