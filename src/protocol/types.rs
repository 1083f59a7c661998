// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Ports and peripheral enumerations shared by requests and responses.

use serde::{Deserialize, Serialize};

/// Output (motor) port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OutputPort {
    A = 0x00,
    B = 0x01,
    C = 0x02,
    /// Addresses all three motor ports at once. Not a valid attach point.
    All = 0xFF,
}

/// Input (sensor) port. The brick labels these 1 through 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum InputPort {
    One = 0x00,
    Two = 0x01,
    Three = 0x02,
    Four = 0x03,
}

impl InputPort {
    /// All four input ports, in brick order.
    pub const ALL: [InputPort; 4] = [
        InputPort::One,
        InputPort::Two,
        InputPort::Three,
        InputPort::Four,
    ];
}

/// Physical sensor type pushed to the brick with SetInputMode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SensorType {
    None = 0x00,
    Switch = 0x01,
    Temperature = 0x02,
    Reflection = 0x03,
    Angle = 0x04,
    LightActive = 0x05,
    LightInactive = 0x06,
    SoundDb = 0x07,
    SoundDba = 0x08,
    Custom = 0x09,
    LowSpeed = 0x0A,
    LowSpeed9V = 0x0B,
    HighSpeed = 0x0C,
    ColorFull = 0x0D,
    ColorRed = 0x0E,
    ColorGreen = 0x0F,
    ColorBlue = 0x10,
    ColorNone = 0x11,
}

/// Sensor value interpretation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SensorMode {
    Raw = 0x00,
    Boolean = 0x20,
    TransitionCounter = 0x40,
    PeriodCounter = 0x60,
    PercentFullScale = 0x80,
    Celsius = 0xA0,
    Fahrenheit = 0xC0,
    AngleSteps = 0xE0,
}

/// Motor mode bit flags for SetOutputState.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorMode(u8);

impl MotorMode {
    pub const NONE: MotorMode = MotorMode(0x00);
    pub const ON: MotorMode = MotorMode(0x01);
    pub const BRAKE: MotorMode = MotorMode(0x02);
    pub const REGULATED: MotorMode = MotorMode(0x04);

    /// Combine flags.
    pub const fn union(self, other: MotorMode) -> MotorMode {
        MotorMode(self.0 | other.0)
    }

    /// Whether all bits of `other` are set.
    pub fn contains(self, other: MotorMode) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw wire value.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Rebuild from a wire byte.
    pub fn from_bits(bits: u8) -> MotorMode {
        MotorMode(bits)
    }
}

/// Motor regulation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RegulationMode {
    Idle = 0x00,
    MotorSpeed = 0x01,
    MotorSync = 0x02,
}

/// Motor run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    Idle = 0x00,
    RampUp = 0x10,
    Running = 0x20,
    RampDown = 0x40,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_wire_values() {
        assert_eq!(OutputPort::A as u8, 0x00);
        assert_eq!(OutputPort::All as u8, 0xFF);
        assert_eq!(InputPort::Four as u8, 0x03);
    }

    #[test]
    fn test_motor_mode_flags() {
        let mode = MotorMode::ON.union(MotorMode::BRAKE).union(MotorMode::REGULATED);
        assert_eq!(mode.bits(), 0x07);
        assert!(mode.contains(MotorMode::BRAKE));
        assert!(!MotorMode::ON.contains(MotorMode::REGULATED));
    }
}
