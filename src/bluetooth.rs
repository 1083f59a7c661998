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

//! Bluetooth RFCOMM transport for real bricks.

use async_trait::async_trait;
use bluer::rfcomm::{SocketAddr, Stream};
use bluer::Address;
use tracing::info;

use crate::transport::{Channel, Connector, SPP_UUID};

/// RFCOMM channel the brick publishes its [`SPP_UUID`] service on.
pub const RFCOMM_CHANNEL: u8 = 1;

/// Connects to a brick over Bluetooth RFCOMM.
pub struct RfcommConnector {
    address: Address,
    channel: u8,
}

impl RfcommConnector {
    /// Connector for the brick at `address` on the standard SPP channel.
    pub fn new(address: Address) -> Self {
        RfcommConnector {
            address,
            channel: RFCOMM_CHANNEL,
        }
    }

    /// Override the RFCOMM channel.
    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    /// The brick's Bluetooth address.
    pub fn address(&self) -> Address {
        self.address
    }
}

#[async_trait]
impl Connector for RfcommConnector {
    async fn open(&self) -> std::io::Result<Box<dyn Channel>> {
        info!(
            "Connecting to brick {} (service {}) on RFCOMM channel {}",
            self.address, SPP_UUID, self.channel
        );
        let stream = Stream::connect(SocketAddr::new(self.address, self.channel)).await?;
        info!("RFCOMM channel established");
        Ok(Box::new(stream))
    }
}
