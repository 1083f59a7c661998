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

//! Abstract byte-channel collaborator supplied by the host platform.
//!
//! The session only needs a bidirectional stream; the concrete transport
//! (Bluetooth RFCOMM, an in-memory pipe in tests) is injected through
//! [`Connector`].

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use uuid::Uuid;

/// Serial Port Profile, the well-known service the brick exposes.
pub const SPP_UUID: Uuid = Uuid::from_u128(0x00001101_0000_1000_8000_00805F9B34FB);

/// A connected bidirectional byte channel. Blanket-implemented for any
/// tokio stream, including `bluer::rfcomm::Stream` and the in-memory
/// duplex pipes used in tests.
pub trait Channel: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> Channel for T {}

/// Opens the byte channel to a brick. Implementations encapsulate the
/// host platform's transport; the session calls `open` on every
/// (re)connect.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self) -> std::io::Result<Box<dyn Channel>>;
}
