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

//! Remote control of a LEGO Mindstorms NXT brick over Bluetooth.
//!
//! The crate speaks the brick's framed command protocol: every request
//! and reply travels as a little-endian 16-bit length prefix followed by
//! the payload. A [`Brick`] session owns the byte channel exclusively
//! and serializes all exchanges, so motors, sensors and ad-hoc commands
//! can be driven concurrently from independent tasks.
//!
//! ```no_run
//! use nxt_remote::{Brick, RfcommConnector, Sensor};
//!
//! # async fn run() -> nxt_remote::Result<()> {
//! let address = "00:16:53:01:02:03".parse().map_err(|_| {
//!     nxt_remote::Error::InvalidState("bad address")
//! })?;
//! let brick = Brick::new(RfcommConnector::new(address));
//! brick.connect().await?;
//!
//! let touch = Sensor::touch();
//! brick.attach_sensor(&touch, nxt_remote::protocol::InputPort::One).await?;
//! touch.poll().await?;
//! println!("pressed: {:?}", touch.is_pressed());
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "bluetooth")]
mod bluetooth;
pub mod config;
mod devices;
mod error;
mod poll;
pub mod protocol;
mod session;
pub mod transport;

#[cfg(feature = "bluetooth")]
pub use bluetooth::{RfcommConnector, RFCOMM_CHANNEL};
pub use devices::{
    ColorMode, ColorReading, DriveOptions, Motor, Sensor, SensorKind, SensorSnapshot,
    UltrasonicMode,
};
pub use error::{Error, Result};
pub use session::{Brick, Notification, PollSource};
