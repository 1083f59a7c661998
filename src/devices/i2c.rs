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

//! Low-speed (I2C) digital sensor transactions.
//!
//! A transaction is LsWrite, then LsGetStatus polled until the expected
//! byte count is ready, then LsRead. The wait is bounded by the session's
//! [`BrickOptions`](crate::config::BrickOptions).

use tracing::trace;

use crate::error::{Error, Result};
use crate::protocol::{InputPort, StatusCode};
use crate::session::Brick;

/// I2C bus address of the ultrasonic sensor.
pub(crate) const ULTRASONIC_ADDRESS: u8 = 0x02;

/// Identification registers, each an 8-byte padded ASCII field.
pub(crate) const REG_VERSION: u8 = 0x00;
pub(crate) const REG_PRODUCT_ID: u8 = 0x08;
pub(crate) const REG_SENSOR_TYPE: u8 = 0x10;
pub(crate) const REG_UNITS: u8 = 0x14;

/// Continuous-measurement interval register.
pub(crate) const REG_INTERVAL: u8 = 0x40;

/// Register holding the measurement command state.
pub(crate) const REG_COMMAND: u8 = 0x41;

/// First measurement byte register.
pub(crate) const REG_MEASUREMENT: u8 = 0x42;

/// Command register values understood by the ultrasonic sensor.
pub(crate) const CMD_OFF: u8 = 0x00;
pub(crate) const CMD_SINGLE_SHOT: u8 = 0x01;
pub(crate) const CMD_CONTINUOUS: u8 = 0x02;
pub(crate) const CMD_EVENT_CAPTURE: u8 = 0x03;
pub(crate) const CMD_WARM_RESET: u8 = 0x04;

/// Run one low-speed transaction on a port and return the response
/// bytes. A `rx_len` of zero completes right after the write.
///
/// The ready wait sleeps between status polls and gives up with a
/// timeout after the configured number of attempts, so a dead sensor
/// never wedges the session.
pub(crate) async fn exchange(
    brick: &Brick,
    port: InputPort,
    tx: &[u8],
    rx_len: u8,
) -> Result<Vec<u8>> {
    brick.ls_write(port, tx, rx_len).await?;
    if rx_len == 0 {
        return Ok(Vec::new());
    }

    let interval = brick.options().ls_poll_interval();
    let attempts = brick.options().ls_poll_attempts;
    for attempt in 0..attempts {
        tokio::time::sleep(interval).await;
        match brick.ls_get_status(port).await {
            Ok(ready) if ready >= rx_len => {
                trace!("Low-speed response ready after {} polls", attempt + 1);
                return brick.ls_read(port).await;
            }
            Ok(_) => {}
            // The firmware reports a still-running transaction as an
            // error status; keep waiting.
            Err(Error::Brick(StatusCode::PendingTransaction)) => {}
            Err(error) => return Err(error),
        }
    }
    Err(Error::timeout("low-speed sensor response"))
}

/// Read the ultrasonic sensor's first measurement byte, the distance in
/// centimeters.
pub(crate) async fn read_distance(brick: &Brick, port: InputPort) -> Result<u8> {
    let data = exchange(brick, port, &[ULTRASONIC_ADDRESS, REG_MEASUREMENT], 1).await?;
    data.first()
        .copied()
        .ok_or(Error::InvalidState("empty low-speed reply"))
}

/// Read one of the ultrasonic sensor's padded ASCII identification
/// registers.
pub(crate) async fn read_string(brick: &Brick, port: InputPort, register: u8) -> Result<String> {
    let data = exchange(brick, port, &[ULTRASONIC_ADDRESS, register], 8).await?;
    Ok(crate::protocol::trim_padding(&data))
}

/// Write a single byte into one of the ultrasonic sensor's registers.
pub(crate) async fn write_register(
    brick: &Brick,
    port: InputPort,
    register: u8,
    value: u8,
) -> Result<()> {
    exchange(brick, port, &[ULTRASONIC_ADDRESS, register, value], 0)
        .await
        .map(drop)
}

/// Discard any bytes a previous, possibly interrupted transaction left
/// in the port's buffer.
pub(crate) async fn drain(brick: &Brick, port: InputPort) {
    if let Ok(ready) = brick.ls_get_status(port).await {
        if ready > 0 {
            let _ = brick.ls_read(port).await;
        }
    }
}
