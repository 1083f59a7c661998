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

//! Peripheral devices attached to the brick's ports.
//!
//! Devices are cheap cloneable handles; attaching one to a [`Brick`]
//! port binds it to that session until detached. A device holds only a
//! weak back-reference, so dropping the session never leaks through an
//! attached device.
//!
//! [`Brick`]: crate::session::Brick

mod i2c;
mod motor;
mod sensor;

pub use motor::{DriveOptions, Motor};
pub use sensor::{ColorMode, ColorReading, Sensor, SensorKind, SensorSnapshot, UltrasonicMode};

use std::sync::Weak;

use crate::error::{Error, Result};
use crate::session::{Brick, BrickInner};

/// A device's link back to the session it is attached to.
pub(crate) struct Binding<P: Copy> {
    brick: Weak<BrickInner>,
    port: P,
}

impl<P: Copy> Binding<P> {
    pub(crate) fn new(brick: &Brick, port: P) -> Self {
        Binding {
            brick: brick.downgrade(),
            port,
        }
    }

    pub(crate) fn port(&self) -> P {
        self.port
    }

    /// The owning session and port, or `InvalidState` once the session
    /// has been dropped.
    pub(crate) fn session(&self) -> Result<(Brick, P)> {
        let inner = self
            .brick
            .upgrade()
            .ok_or(Error::InvalidState("device is not attached"))?;
        Ok((Brick::from_inner(inner), self.port))
    }
}
