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

//! Request builders for every supported command.
//!
//! Requests are built immutably per call. Values with a documented
//! clamping policy (motor power, turn ratio, tone frequency) are clamped
//! here; values without one (mailbox numbers, name lengths) are rejected
//! with a range error before any bytes reach the wire.

use crate::error::{Error, Result};

use super::command::{CommandType, DirectOpcode, SystemOpcode};
use super::types::{InputPort, MotorMode, OutputPort, RegulationMode, RunState, SensorMode, SensorType};

/// Longest file name the brick accepts: 15.3 format plus NUL.
const MAX_NAME_LEN: usize = 19;

/// Longest mailbox message including the NUL terminator.
const MAX_MESSAGE_LEN: usize = 58;

/// Mailboxes visible to callers.
const MAILBOX_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

/// A single command ready for framing: command type, opcode and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    command_type: CommandType,
    opcode: u8,
    payload: Vec<u8>,
}

impl Request {
    fn direct(opcode: DirectOpcode, payload: Vec<u8>) -> Self {
        Request {
            command_type: CommandType::Direct,
            opcode: opcode as u8,
            payload,
        }
    }

    fn direct_no_reply(opcode: DirectOpcode, payload: Vec<u8>) -> Self {
        Request {
            command_type: CommandType::DirectNoReply,
            opcode: opcode as u8,
            payload,
        }
    }

    fn system(opcode: SystemOpcode, payload: Vec<u8>) -> Self {
        Request {
            command_type: CommandType::System,
            opcode: opcode as u8,
            payload,
        }
    }

    /// Whether a response frame must be read for this request.
    pub fn expects_reply(&self) -> bool {
        self.command_type.expects_reply()
    }

    /// The opcode the reply will echo.
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Serialize to the unframed wire payload: type, opcode, parameters.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + self.payload.len());
        bytes.push(self.command_type as u8);
        bytes.push(self.opcode);
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    // Program control.

    /// Start the named program (`.rxe`) on the brick.
    pub fn start_program(name: &str) -> Result<Self> {
        Ok(Self::direct(DirectOpcode::StartProgram, ascii_z(name, MAX_NAME_LEN, "program name")?))
    }

    /// Stop the running program.
    pub fn stop_program() -> Self {
        Self::direct(DirectOpcode::StopProgram, Vec::new())
    }

    /// Query the name of the running program.
    pub fn get_current_program_name() -> Self {
        Self::direct(DirectOpcode::GetCurrentProgramName, Vec::new())
    }

    // Sound.

    /// Play a sound file (`.rso`), optionally looping.
    pub fn play_sound_file(name: &str, repeat: bool) -> Result<Self> {
        let mut payload = vec![repeat as u8];
        payload.extend(ascii_z(name, MAX_NAME_LEN, "sound file name")?);
        Ok(Self::direct(DirectOpcode::PlaySoundFile, payload))
    }

    /// Play a tone. Frequency is clamped to the brick's 200-14000 Hz range.
    pub fn play_tone(frequency_hz: u16, duration_ms: u16) -> Self {
        let frequency = frequency_hz.clamp(200, 14_000);
        let mut payload = Vec::with_capacity(4);
        payload.extend_from_slice(&frequency.to_le_bytes());
        payload.extend_from_slice(&duration_ms.to_le_bytes());
        Self::direct(DirectOpcode::PlayTone, payload)
    }

    /// Stop any sound playback.
    pub fn stop_sound_playback() -> Self {
        Self::direct(DirectOpcode::StopSoundPlayback, Vec::new())
    }

    // Motors.

    /// Drive an output port. Power and turn ratio are clamped to +/-100.
    /// Sent without a reply.
    pub fn set_output_state(
        port: OutputPort,
        power: i8,
        mode: MotorMode,
        regulation: RegulationMode,
        turn_ratio: i8,
        run_state: RunState,
        tacho_limit: u32,
    ) -> Self {
        let mut payload = Vec::with_capacity(10);
        payload.push(port as u8);
        payload.push(power.clamp(-100, 100) as u8);
        payload.push(mode.bits());
        payload.push(regulation as u8);
        payload.push(turn_ratio.clamp(-100, 100) as u8);
        payload.push(run_state as u8);
        payload.extend_from_slice(&tacho_limit.to_le_bytes());
        Self::direct_no_reply(DirectOpcode::SetOutputState, payload)
    }

    /// Query an output port's state and tacho counters.
    pub fn get_output_state(port: OutputPort) -> Self {
        Self::direct(DirectOpcode::GetOutputState, vec![port as u8])
    }

    /// Reset an output port's position counters.
    pub fn reset_motor_position(port: OutputPort, relative: bool) -> Self {
        Self::direct(
            DirectOpcode::ResetMotorPosition,
            vec![port as u8, relative as u8],
        )
    }

    // Sensors.

    /// Configure an input port's sensor type and mode.
    pub fn set_input_mode(port: InputPort, sensor_type: SensorType, mode: SensorMode) -> Self {
        Self::direct(
            DirectOpcode::SetInputMode,
            vec![port as u8, sensor_type as u8, mode as u8],
        )
    }

    /// Read an input port's raw, normalized and scaled values.
    pub fn get_input_values(port: InputPort) -> Self {
        Self::direct(DirectOpcode::GetInputValues, vec![port as u8])
    }

    /// Reset an input port's accumulated scaled value.
    pub fn reset_input_scaled_value(port: InputPort) -> Self {
        Self::direct(DirectOpcode::ResetInputScaledValue, vec![port as u8])
    }

    // Messaging.

    /// Write a message to a mailbox (1-10). Sent without a reply.
    pub fn message_write(mailbox: u8, message: &str) -> Result<Self> {
        check_mailbox(mailbox)?;
        let text = ascii_z(message, MAX_MESSAGE_LEN, "mailbox message")?;
        let mut payload = Vec::with_capacity(2 + text.len());
        payload.push(mailbox - 1);
        payload.push(text.len() as u8);
        payload.extend(text);
        Ok(Self::direct_no_reply(DirectOpcode::MessageWrite, payload))
    }

    /// Read a message written by the brick to a response mailbox (1-10),
    /// optionally removing it from the queue.
    pub fn message_read(mailbox: u8, remove: bool) -> Result<Self> {
        check_mailbox(mailbox)?;
        // Brick-side outboxes appear as remote inboxes 10-19.
        Ok(Self::direct(
            DirectOpcode::MessageRead,
            vec![mailbox + 9, mailbox - 1, remove as u8],
        ))
    }

    // Power and keep-alive.

    /// Query the battery level in millivolts.
    pub fn get_battery_level() -> Self {
        Self::direct(DirectOpcode::GetBatteryLevel, Vec::new())
    }

    /// Reset the brick's sleep timer; the reply carries the sleep limit.
    pub fn keep_alive() -> Self {
        Self::direct(DirectOpcode::KeepAlive, Vec::new())
    }

    // Low-speed (I2C) bus.

    /// Query how many bytes a low-speed sensor has ready.
    pub fn ls_get_status(port: InputPort) -> Self {
        Self::direct(DirectOpcode::LsGetStatus, vec![port as u8])
    }

    /// Write an I2C transaction: payload bytes plus the expected reply
    /// length. Sent without a reply.
    pub fn ls_write(port: InputPort, data: &[u8], response_len: u8) -> Result<Self> {
        if data.is_empty() || data.len() > 16 {
            return Err(Error::Range {
                name: "I2C transmit length",
                value: data.len() as i64,
                min: 1,
                max: 16,
            });
        }
        if response_len > 16 {
            return Err(Error::Range {
                name: "I2C receive length",
                value: response_len as i64,
                min: 0,
                max: 16,
            });
        }
        let mut payload = Vec::with_capacity(3 + data.len());
        payload.push(port as u8);
        payload.push(data.len() as u8);
        payload.push(response_len);
        payload.extend_from_slice(data);
        Ok(Self::direct_no_reply(DirectOpcode::LsWrite, payload))
    }

    /// Read the bytes a low-speed sensor has ready (up to 16).
    pub fn ls_read(port: InputPort) -> Self {
        Self::direct(DirectOpcode::LsRead, vec![port as u8])
    }

    // System commands.

    /// Query protocol and firmware versions.
    pub fn get_firmware_version() -> Self {
        Self::system(SystemOpcode::GetFirmwareVersion, Vec::new())
    }

    /// Query brick name, Bluetooth address, signal strength and free flash.
    pub fn get_device_info() -> Self {
        Self::system(SystemOpcode::GetDeviceInfo, Vec::new())
    }

    /// Rename the brick. Names longer than 14 characters are rejected.
    pub fn set_brick_name(name: &str) -> Result<Self> {
        Ok(Self::system(
            SystemOpcode::SetBrickName,
            ascii_z(name, 15, "brick name")?,
        ))
    }
}

/// Encode a string as ASCII with a single trailing NUL, rejecting
/// non-ASCII input and oversized names.
fn ascii_z(text: &str, max_len_with_nul: usize, name: &'static str) -> Result<Vec<u8>> {
    if !text.is_ascii() {
        return Err(Error::InvalidState("string fields must be ASCII"));
    }
    if text.len() + 1 > max_len_with_nul {
        return Err(Error::Range {
            name,
            value: text.len() as i64,
            min: 0,
            max: (max_len_with_nul - 1) as i64,
        });
    }
    let mut bytes = Vec::with_capacity(text.len() + 1);
    bytes.extend_from_slice(text.as_bytes());
    bytes.push(0);
    Ok(bytes)
}

fn check_mailbox(mailbox: u8) -> Result<()> {
    if !MAILBOX_RANGE.contains(&mailbox) {
        return Err(Error::Range {
            name: "mailbox",
            value: mailbox as i64,
            min: *MAILBOX_RANGE.start() as i64,
            max: *MAILBOX_RANGE.end() as i64,
        });
    }
    Ok(())
}
