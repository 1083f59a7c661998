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

//! Binary command/response protocol: framing, opcodes, request encoding
//! and response decoding.

pub mod frame;

mod command;
mod request;
mod response;
mod types;

pub use command::{CommandType, DirectOpcode, StatusCode, SystemOpcode};
pub use request::Request;
pub use response::{
    decode_battery_level, decode_ls_read, decode_ls_status, decode_message_read,
    decode_program_name, decode_sleep_limit, trim_padding, DeviceInfo, FirmwareVersion,
    InputValues, OutputState, Response,
};
pub use types::{
    InputPort, MotorMode, OutputPort, RegulationMode, RunState, SensorMode, SensorType,
};
