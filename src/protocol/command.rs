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

//! Command types, opcode tables and brick status codes.
//!
//! The numeric values are the brick's firmware contract and are never
//! renumbered.

use std::fmt;

/// First byte of every payload: distinguishes direct/system commands,
/// replies, and the no-reply variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Direct = 0x00,
    System = 0x01,
    Reply = 0x02,
    DirectNoReply = 0x80,
    SystemNoReply = 0x81,
}

impl CommandType {
    /// Whether the brick will produce a response frame for this type.
    pub fn expects_reply(self) -> bool {
        matches!(self, CommandType::Direct | CommandType::System)
    }
}

/// Direct command opcodes (motor, sensor, sound and messaging control).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DirectOpcode {
    StartProgram = 0x00,
    StopProgram = 0x01,
    PlaySoundFile = 0x02,
    PlayTone = 0x03,
    SetOutputState = 0x04,
    SetInputMode = 0x05,
    GetOutputState = 0x06,
    GetInputValues = 0x07,
    ResetInputScaledValue = 0x08,
    MessageWrite = 0x09,
    ResetMotorPosition = 0x0A,
    StopSoundPlayback = 0x0B,
    GetBatteryLevel = 0x0C,
    KeepAlive = 0x0D,
    LsGetStatus = 0x0E,
    LsWrite = 0x0F,
    LsRead = 0x10,
    GetCurrentProgramName = 0x11,
    MessageRead = 0x13,
}

/// System command opcodes (brick management).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SystemOpcode {
    GetFirmwareVersion = 0x88,
    SetBrickName = 0x98,
    GetDeviceInfo = 0x9B,
}

/// Status byte returned by the brick in the third byte of every reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Success,
    PendingTransaction,
    MailboxEmpty,
    RequestFailed,
    UnknownCommand,
    InsanePacket,
    OutOfRange,
    BusError,
    CommunicationOverflow,
    ChannelBusy,
    NoActiveProgram,
    Other(u8),
}

impl StatusCode {
    /// Map a raw status byte to its meaning.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => StatusCode::Success,
            0x20 => StatusCode::PendingTransaction,
            0x40 => StatusCode::MailboxEmpty,
            0xBD => StatusCode::RequestFailed,
            0xBE => StatusCode::UnknownCommand,
            0xBF => StatusCode::InsanePacket,
            0xC0 => StatusCode::OutOfRange,
            0xDD => StatusCode::BusError,
            0xDE => StatusCode::CommunicationOverflow,
            0xDF => StatusCode::ChannelBusy,
            0xEC => StatusCode::NoActiveProgram,
            other => StatusCode::Other(other),
        }
    }

    /// Whether the status byte signals success.
    pub fn is_success(self) -> bool {
        matches!(self, StatusCode::Success)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Success => write!(f, "success"),
            StatusCode::PendingTransaction => write!(f, "pending communication transaction"),
            StatusCode::MailboxEmpty => write!(f, "mailbox queue empty"),
            StatusCode::RequestFailed => write!(f, "request failed"),
            StatusCode::UnknownCommand => write!(f, "unknown command opcode"),
            StatusCode::InsanePacket => write!(f, "insane packet"),
            StatusCode::OutOfRange => write!(f, "data out of range"),
            StatusCode::BusError => write!(f, "communication bus error"),
            StatusCode::CommunicationOverflow => write!(f, "communication buffer overflow"),
            StatusCode::ChannelBusy => write!(f, "channel busy"),
            StatusCode::NoActiveProgram => write!(f, "no active program"),
            StatusCode::Other(code) => write!(f, "error status {code:#04x}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_type_reply_expectation() {
        assert!(CommandType::Direct.expects_reply());
        assert!(CommandType::System.expects_reply());
        assert!(!CommandType::DirectNoReply.expects_reply());
        assert!(!CommandType::SystemNoReply.expects_reply());
        assert!(!CommandType::Reply.expects_reply());
    }

    #[test]
    fn test_direct_opcode_values() {
        assert_eq!(DirectOpcode::StartProgram as u8, 0x00);
        assert_eq!(DirectOpcode::SetOutputState as u8, 0x04);
        assert_eq!(DirectOpcode::GetInputValues as u8, 0x07);
        assert_eq!(DirectOpcode::MessageWrite as u8, 0x09);
        assert_eq!(DirectOpcode::StopSoundPlayback as u8, 0x0B);
        assert_eq!(DirectOpcode::GetBatteryLevel as u8, 0x0C);
        assert_eq!(DirectOpcode::KeepAlive as u8, 0x0D);
        assert_eq!(DirectOpcode::LsGetStatus as u8, 0x0E);
        assert_eq!(DirectOpcode::LsWrite as u8, 0x0F);
        assert_eq!(DirectOpcode::LsRead as u8, 0x10);
        assert_eq!(DirectOpcode::GetCurrentProgramName as u8, 0x11);
        assert_eq!(DirectOpcode::MessageRead as u8, 0x13);
    }

    #[test]
    fn test_system_opcode_values() {
        assert_eq!(SystemOpcode::GetFirmwareVersion as u8, 0x88);
        assert_eq!(SystemOpcode::SetBrickName as u8, 0x98);
        assert_eq!(SystemOpcode::GetDeviceInfo as u8, 0x9B);
    }

    #[test]
    fn test_status_mapping() {
        assert!(StatusCode::from_byte(0x00).is_success());
        assert_eq!(StatusCode::from_byte(0xC0), StatusCode::OutOfRange);
        assert_eq!(StatusCode::from_byte(0xBE), StatusCode::UnknownCommand);
        assert_eq!(StatusCode::from_byte(0x77), StatusCode::Other(0x77));
    }
}
