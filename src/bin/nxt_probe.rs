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

//! Connect to a brick, print its identity and watch the battery.
//!
//! Usage: `nxt-probe [bluetooth-address]`. With no argument the address
//! from the saved configuration is used, and a given address is saved
//! for next time.

use anyhow::{bail, Context, Result};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nxt_remote::config::ProbeConfig;
use nxt_remote::{Brick, Notification, RfcommConnector};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = ProbeConfig::load().context("Failed to load configuration")?;

    if let Some(address) = std::env::args().nth(1) {
        config.brick_address = Some(address);
        config.save().context("Failed to save configuration")?;
    }
    let Some(address) = config.brick_address.clone() else {
        bail!("No brick address given and none saved; run: nxt-probe <bluetooth-address>");
    };
    let address = address
        .parse()
        .with_context(|| format!("Invalid Bluetooth address '{}'", address))?;

    let connector = RfcommConnector::new(address).with_channel(config.rfcomm_channel);
    let brick = Brick::with_options(connector, config.session.clone());
    brick.connect().await.context("Failed to connect")?;

    let firmware = brick.firmware_version().await?;
    let info = brick.device_info().await?;
    info!("Connected to '{}' ({})", info.name, info.bluetooth_address_string());
    info!("Firmware {}", firmware);
    info!("Free flash: {} bytes", info.free_flash);
    info!("Battery: {} mV", brick.get_battery_level().await?);

    // Watch the battery until the link drops or the user interrupts.
    let mut events = brick.subscribe();
    brick.set_polling_interval(Some(Duration::from_millis(config.poll_interval_ms)));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, disconnecting");
                brick.disconnect().await;
                break;
            }
            event = events.recv() => match event {
                Ok(Notification::Polled(_)) => {
                    if let Some(millivolts) = brick.battery_millivolts() {
                        info!("Battery: {} mV", millivolts);
                    } else {
                        info!("Battery: unknown");
                    }
                }
                Ok(Notification::Disconnected) => {
                    info!("Brick disconnected");
                    break;
                }
                Err(_) => break,
            },
        }
    }

    Ok(())
}
