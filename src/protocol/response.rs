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

//! Response parsing: bounds-checked little-endian field accessors and
//! typed reply structures.

use crate::error::{Error, Result};

use super::command::{CommandType, StatusCode};
use super::types::{MotorMode, OutputPort};

/// A raw reply frame payload as read off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    bytes: Vec<u8>,
}

impl Response {
    /// Wrap a reply payload. The three-byte preamble (reply marker,
    /// echoed opcode, status) is validated lazily by [`Response::check`].
    pub fn new(bytes: Vec<u8>) -> Self {
        Response { bytes }
    }

    /// Raw payload bytes, including the preamble.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Validate the reply preamble: reply marker, echoed opcode, and a
    /// success status byte.
    pub fn check(&self, expected_opcode: u8) -> Result<()> {
        if self.bytes.len() < 3 {
            return Err(Error::InvalidState("reply shorter than its preamble"));
        }
        if self.bytes[0] != CommandType::Reply as u8 {
            return Err(Error::InvalidState("reply marker byte missing"));
        }
        if self.bytes[1] != expected_opcode {
            return Err(Error::InvalidState("reply echoes a different opcode"));
        }
        let status = StatusCode::from_byte(self.bytes[2]);
        if !status.is_success() {
            return Err(Error::Brick(status));
        }
        Ok(())
    }

    /// Status byte, if present.
    pub fn status(&self) -> Result<StatusCode> {
        Ok(StatusCode::from_byte(self.u8_at(2)?))
    }

    fn slice_at(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.bytes
            .get(offset..offset + len)
            .ok_or(Error::InvalidState("reply shorter than its declared layout"))
    }

    pub fn u8_at(&self, offset: usize) -> Result<u8> {
        Ok(self.slice_at(offset, 1)?[0])
    }

    pub fn i8_at(&self, offset: usize) -> Result<i8> {
        Ok(self.u8_at(offset)? as i8)
    }

    pub fn bool_at(&self, offset: usize) -> Result<bool> {
        Ok(self.u8_at(offset)? != 0)
    }

    pub fn u16_at(&self, offset: usize) -> Result<u16> {
        let bytes = self.slice_at(offset, 2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn i16_at(&self, offset: usize) -> Result<i16> {
        Ok(self.u16_at(offset)? as i16)
    }

    pub fn u32_at(&self, offset: usize) -> Result<u32> {
        let bytes = self.slice_at(offset, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn i32_at(&self, offset: usize) -> Result<i32> {
        Ok(self.u32_at(offset)? as i32)
    }

    /// Read a fixed-width ASCII field, trimming trailing NUL, space and
    /// `?` padding bytes.
    pub fn string_at(&self, offset: usize, len: usize) -> Result<String> {
        let raw = self.slice_at(offset, len)?;
        Ok(trim_padding(raw))
    }
}

/// Strip the padding bytes the brick appends to string fields.
pub fn trim_padding(raw: &[u8]) -> String {
    let end = raw
        .iter()
        .rposition(|&byte| byte != 0 && byte != b' ' && byte != b'?')
        .map_or(0, |pos| pos + 1);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Snapshot of an output port: SetOutputState echo plus tacho counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputState {
    pub power: i8,
    pub mode: MotorMode,
    pub regulation: u8,
    pub turn_ratio: i8,
    pub run_state: u8,
    pub tacho_limit: u32,
    /// Degrees turned since the last reset.
    pub tacho_count: i32,
    /// Degrees turned since the last block boundary.
    pub block_tacho_count: i32,
    /// Program-visible rotation counter, in degrees.
    pub rotation_count: i32,
}

impl OutputState {
    /// Decode a GetOutputState reply. The brick echoes the port byte
    /// between the status and the fields.
    pub fn decode(response: &Response) -> Result<OutputState> {
        Ok(OutputState {
            power: response.i8_at(4)?,
            mode: MotorMode::from_bits(response.u8_at(5)?),
            regulation: response.u8_at(6)?,
            turn_ratio: response.i8_at(7)?,
            run_state: response.u8_at(8)?,
            tacho_limit: response.u32_at(9)?,
            tacho_count: response.i32_at(13)?,
            block_tacho_count: response.i32_at(17)?,
            rotation_count: response.i32_at(21)?,
        })
    }

    /// The port the reply describes.
    pub fn port(response: &Response) -> Result<Option<OutputPort>> {
        Ok(match response.u8_at(3)? {
            0x00 => Some(OutputPort::A),
            0x01 => Some(OutputPort::B),
            0x02 => Some(OutputPort::C),
            _ => None,
        })
    }
}

/// Snapshot of an input port from GetInputValues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputValues {
    /// Whether the reading should be trusted.
    pub valid: bool,
    pub calibrated: bool,
    pub sensor_type: u8,
    pub mode: u8,
    /// Raw A/D reading.
    pub raw: u16,
    pub normalized: u16,
    /// Mode-dependent scaled reading; most accessors derive from this.
    pub scaled: i16,
    pub calibrated_value: i16,
}

impl InputValues {
    /// Decode a GetInputValues reply. The brick echoes the port byte
    /// between the status and the fields.
    pub fn decode(response: &Response) -> Result<InputValues> {
        Ok(InputValues {
            valid: response.bool_at(4)?,
            calibrated: response.bool_at(5)?,
            sensor_type: response.u8_at(6)?,
            mode: response.u8_at(7)?,
            raw: response.u16_at(8)?,
            normalized: response.u16_at(10)?,
            scaled: response.i16_at(12)?,
            calibrated_value: response.i16_at(14)?,
        })
    }
}

/// Protocol and firmware versions from GetFirmwareVersion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    pub protocol_major: u8,
    pub protocol_minor: u8,
    pub firmware_major: u8,
    pub firmware_minor: u8,
}

impl FirmwareVersion {
    /// Decode a GetFirmwareVersion reply; the brick sends each pair
    /// minor-first.
    pub fn decode(response: &Response) -> Result<FirmwareVersion> {
        Ok(FirmwareVersion {
            protocol_minor: response.u8_at(3)?,
            protocol_major: response.u8_at(4)?,
            firmware_minor: response.u8_at(5)?,
            firmware_major: response.u8_at(6)?,
        })
    }
}

impl std::fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "protocol {}.{}, firmware {}.{:02}",
            self.protocol_major, self.protocol_minor, self.firmware_major, self.firmware_minor
        )
    }
}

/// Brick identity from GetDeviceInfo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub bluetooth_address: [u8; 6],
    pub signal_strength: u32,
    pub free_flash: u32,
}

impl DeviceInfo {
    /// Decode a GetDeviceInfo reply.
    pub fn decode(response: &Response) -> Result<DeviceInfo> {
        let name = response.string_at(3, 15)?;
        let addr = response.slice_at(18, 6)?;
        Ok(DeviceInfo {
            name,
            bluetooth_address: [addr[0], addr[1], addr[2], addr[3], addr[4], addr[5]],
            signal_strength: response.u32_at(25)?,
            free_flash: response.u32_at(29)?,
        })
    }

    /// Bluetooth address in colon-separated hex.
    pub fn bluetooth_address_string(&self) -> String {
        self.bluetooth_address
            .iter()
            .map(|byte| format!("{byte:02X}"))
            .collect::<Vec<_>>()
            .join(":")
    }
}

/// Decode an LsRead reply: a byte count followed by up to 16 data bytes.
pub fn decode_ls_read(response: &Response) -> Result<Vec<u8>> {
    let count = response.u8_at(3)? as usize;
    if count > 16 {
        return Err(Error::InvalidState("LsRead reply declares more than 16 bytes"));
    }
    Ok(response.slice_at(4, count)?.to_vec())
}

/// Decode a MessageRead reply: local mailbox, size, then the message.
pub fn decode_message_read(response: &Response) -> Result<String> {
    let size = response.u8_at(4)? as usize;
    if size == 0 {
        return Ok(String::new());
    }
    let raw = response.slice_at(5, size)?;
    Ok(trim_padding(raw))
}

/// Decode a GetCurrentProgramName reply.
pub fn decode_program_name(response: &Response) -> Result<String> {
    response.string_at(3, 20)
}

/// Decode a KeepAlive reply: the sleep time limit in milliseconds.
pub fn decode_sleep_limit(response: &Response) -> Result<u32> {
    response.u32_at(3)
}

/// Decode a GetBatteryLevel reply: millivolts.
pub fn decode_battery_level(response: &Response) -> Result<u16> {
    response.u16_at(3)
}

/// Decode an LsGetStatus reply: bytes ready to read.
pub fn decode_ls_status(response: &Response) -> Result<u8> {
    response.u8_at(3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::DirectOpcode;

    fn reply(opcode: u8, fields: &[u8]) -> Response {
        let mut bytes = vec![0x02, opcode, 0x00];
        bytes.extend_from_slice(fields);
        Response::new(bytes)
    }

    #[test]
    fn test_check_accepts_valid_reply() {
        let response = reply(0x0C, &[0x10, 0x27]);
        assert!(response.check(0x0C).is_ok());
        assert_eq!(decode_battery_level(&response).unwrap(), 10_000);
    }

    #[test]
    fn test_check_rejects_wrong_opcode() {
        let response = reply(0x0C, &[0x10, 0x27]);
        assert!(matches!(
            response.check(0x07),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_check_surfaces_brick_status() {
        let response = Response::new(vec![0x02, 0x06, 0xC0]);
        assert!(matches!(
            response.check(0x06),
            Err(Error::Brick(StatusCode::OutOfRange))
        ));
    }

    #[test]
    fn test_check_rejects_truncated_preamble() {
        let response = Response::new(vec![0x02]);
        assert!(matches!(
            response.check(0x0C),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_output_state_decoding() {
        let mut fields = vec![0x01]; // port echo
        fields.push(75u8); // power
        fields.push(0x05); // mode: on | regulated
        fields.push(0x01); // regulation
        fields.push((-25i8) as u8); // turn ratio
        fields.push(0x20); // run state
        fields.extend_from_slice(&360u32.to_le_bytes());
        fields.extend_from_slice(&1234i32.to_le_bytes());
        fields.extend_from_slice(&(-56i32).to_le_bytes());
        fields.extend_from_slice(&78i32.to_le_bytes());
        let response = reply(DirectOpcode::GetOutputState as u8, &fields);

        let state = OutputState::decode(&response).unwrap();
        assert_eq!(state.power, 75);
        assert_eq!(state.turn_ratio, -25);
        assert_eq!(state.tacho_limit, 360);
        assert_eq!(state.tacho_count, 1234);
        assert_eq!(state.block_tacho_count, -56);
        assert_eq!(state.rotation_count, 78);
        assert_eq!(OutputState::port(&response).unwrap(), Some(OutputPort::B));
    }

    #[test]
    fn test_output_state_short_reply_fails() {
        let response = reply(DirectOpcode::GetOutputState as u8, &[0x00, 50, 0x01]);
        assert!(matches!(
            OutputState::decode(&response),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_input_values_decoding() {
        let mut fields = vec![0x02]; // port echo
        fields.push(1); // valid
        fields.push(0); // calibrated
        fields.push(0x01); // type: switch
        fields.push(0x20); // mode: boolean
        fields.extend_from_slice(&183u16.to_le_bytes());
        fields.extend_from_slice(&1023u16.to_le_bytes());
        fields.extend_from_slice(&1i16.to_le_bytes());
        fields.extend_from_slice(&0i16.to_le_bytes());
        let response = reply(DirectOpcode::GetInputValues as u8, &fields);

        let values = InputValues::decode(&response).unwrap();
        assert!(values.valid);
        assert!(!values.calibrated);
        assert_eq!(values.raw, 183);
        assert_eq!(values.normalized, 1023);
        assert_eq!(values.scaled, 1);
    }

    #[test]
    fn test_input_values_short_reply_fails() {
        let response = reply(DirectOpcode::GetInputValues as u8, &[0x02, 1, 0]);
        assert!(matches!(
            InputValues::decode(&response),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_firmware_version_order() {
        let response = reply(0x88, &[0x7C, 0x01, 0x1F, 0x01]);
        let version = FirmwareVersion::decode(&response).unwrap();
        assert_eq!(version.protocol_major, 1);
        assert_eq!(version.protocol_minor, 0x7C);
        assert_eq!(version.firmware_major, 1);
        assert_eq!(version.firmware_minor, 0x1F);
    }

    #[test]
    fn test_string_trimming() {
        assert_eq!(trim_padding(b"NXT\0\0\0\0"), "NXT");
        assert_eq!(trim_padding(b"V1.0?  \0"), "V1.0");
        assert_eq!(trim_padding(b"\0\0\0"), "");
    }

    #[test]
    fn test_ls_read_decoding() {
        let mut fields = vec![3u8];
        fields.extend_from_slice(&[0xAA, 0xBB, 0xCC]);
        fields.extend_from_slice(&[0u8; 13]);
        let response = reply(DirectOpcode::LsRead as u8, &fields);
        assert_eq!(decode_ls_read(&response).unwrap(), vec![0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_ls_read_rejects_bogus_count() {
        let response = reply(DirectOpcode::LsRead as u8, &[17u8; 18]);
        assert!(decode_ls_read(&response).is_err());
    }

    #[test]
    fn test_device_info_decoding() {
        let mut fields = Vec::new();
        let mut name = b"MyBot".to_vec();
        name.resize(15, 0);
        fields.extend_from_slice(&name);
        fields.extend_from_slice(&[0x00, 0x16, 0x53, 0x01, 0x02, 0x03]);
        fields.push(0); // address padding byte
        fields.extend_from_slice(&42u32.to_le_bytes());
        fields.extend_from_slice(&130_944u32.to_le_bytes());
        let response = reply(0x9B, &fields);

        let info = DeviceInfo::decode(&response).unwrap();
        assert_eq!(info.name, "MyBot");
        assert_eq!(info.bluetooth_address_string(), "00:16:53:01:02:03");
        assert_eq!(info.free_flash, 130_944);
    }
}
