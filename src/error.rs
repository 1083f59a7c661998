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

//! Error taxonomy for brick communication.

use crate::protocol::StatusCode;

/// Errors raised by the protocol layer and device session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The Bluetooth channel could not be opened. The session stays
    /// unconnected.
    #[error("failed to open channel to the brick: {0}")]
    Connect(#[source] std::io::Error),

    /// An I/O failure occurred during a request/response exchange. The
    /// session transitions to disconnected and must be reconnected
    /// explicitly.
    #[error("communication with the brick failed: {0}")]
    Communication(#[source] std::io::Error),

    /// An operation was attempted while disconnected, or a protocol
    /// precondition was violated. No I/O took place.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// A caller-supplied argument is outside the protocol's legal domain
    /// and clamping is not the documented policy. Rejected before any
    /// bytes are sent.
    #[error("{name} out of range: {value} (expected {min}..={max})")]
    Range {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// The brick answered with a nonzero status byte.
    #[error("brick rejected the command: {0}")]
    Brick(StatusCode),
}

impl Error {
    /// Shorthand for a communication timeout.
    pub(crate) fn timeout(message: &'static str) -> Self {
        Error::Communication(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            message,
        ))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
