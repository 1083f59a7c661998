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

//! Regulated motor on an output port.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::devices::Binding;
use crate::error::Result;
use crate::poll::Poller;
use crate::protocol::{MotorMode, OutputPort, OutputState, RegulationMode, RunState};
use crate::session::{Brick, Notification, PollSource};

/// Optional drive parameters for [`Motor::run_with`]. The defaults
/// reproduce the plain [`Motor::run`] behavior: speed regulation, no
/// turn, no tacho limit, no brake.
#[derive(Debug, Clone, Copy)]
pub struct DriveOptions {
    pub regulation: RegulationMode,
    /// Steering bias for synchronized driving, clamped to +/-100.
    pub turn_ratio: i8,
    /// Degrees to run before stopping; zero runs forever.
    pub tacho_limit: u32,
    pub brake: bool,
}

impl Default for DriveOptions {
    fn default() -> Self {
        DriveOptions {
            regulation: RegulationMode::MotorSpeed,
            turn_ratio: 0,
            tacho_limit: 0,
            brake: false,
        }
    }
}

/// A motor. Clones share the same device; attach it to a session with
/// [`Brick::attach_motor`](crate::session::Brick::attach_motor).
#[derive(Clone, Default)]
pub struct Motor {
    inner: Arc<MotorInner>,
}

#[derive(Default)]
struct MotorInner {
    binding: Mutex<Option<Binding<OutputPort>>>,
    state: Mutex<Option<OutputState>>,
    poller: Poller,
}

impl Motor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The port this motor is attached to, if any.
    pub fn port(&self) -> Option<OutputPort> {
        self.inner.binding.lock().as_ref().map(Binding::port)
    }

    pub fn is_attached(&self) -> bool {
        self.inner.binding.lock().is_some()
    }

    fn session(&self) -> Result<(Brick, OutputPort)> {
        let binding = self.inner.binding.lock();
        binding
            .as_ref()
            .ok_or(crate::error::Error::InvalidState("motor is not attached"))?
            .session()
    }

    pub(crate) fn bind(&self, brick: &Brick, port: OutputPort) {
        *self.inner.binding.lock() = Some(Binding::new(brick, port));
    }

    /// Detach: stop polling and forget the session. The physical motor
    /// is left in whatever state it was last commanded to.
    pub(crate) async fn release(&self) {
        self.inner.poller.stop();
        *self.inner.binding.lock() = None;
        *self.inner.state.lock() = None;
    }

    /// Run forward at `power` percent (clamped to 100).
    pub async fn forward(&self, power: u8, brake: bool) -> Result<()> {
        self.run(power.min(100) as i8, brake).await
    }

    /// Run forward with explicit drive parameters.
    pub async fn forward_with(&self, power: u8, options: DriveOptions) -> Result<()> {
        self.run_with(power.min(100) as i8, options).await
    }

    /// Run backward at `power` percent (clamped to 100).
    pub async fn backward(&self, power: u8, brake: bool) -> Result<()> {
        self.run(-(power.min(100) as i8), brake).await
    }

    /// Run backward with explicit drive parameters.
    pub async fn backward_with(&self, power: u8, options: DriveOptions) -> Result<()> {
        self.run_with(-(power.min(100) as i8), options).await
    }

    /// Run at a signed power level. Zero power collapses to [`off`] when
    /// braking or [`coast`] otherwise, so "run at zero" and "stop" stay
    /// one code path on the wire.
    ///
    /// [`off`]: Motor::off
    /// [`coast`]: Motor::coast
    pub async fn run(&self, power: i8, brake: bool) -> Result<()> {
        self.run_with(
            power,
            DriveOptions {
                brake,
                ..DriveOptions::default()
            },
        )
        .await
    }

    /// Run at a signed power level with explicit regulation, turn ratio
    /// and tacho limit. Zero power collapses to [`Motor::off`] or
    /// [`Motor::coast`] per the brake flag.
    pub async fn run_with(&self, power: i8, options: DriveOptions) -> Result<()> {
        if power == 0 {
            return if options.brake {
                self.off().await
            } else {
                self.coast().await
            };
        }

        let (brick, port) = self.session()?;
        let mut mode = MotorMode::ON.union(MotorMode::REGULATED);
        if options.brake {
            mode = mode.union(MotorMode::BRAKE);
        }
        brick
            .set_output_state(
                port,
                power,
                mode,
                options.regulation,
                options.turn_ratio,
                RunState::Running,
                options.tacho_limit,
            )
            .await
    }

    /// Actively hold the motor at standstill.
    pub async fn off(&self) -> Result<()> {
        let (brick, port) = self.session()?;
        brick
            .set_output_state(
                port,
                0,
                MotorMode::ON.union(MotorMode::BRAKE).union(MotorMode::REGULATED),
                RegulationMode::Idle,
                0,
                RunState::Running,
                0,
            )
            .await
    }

    /// Cut power and let the motor spin freely.
    pub async fn coast(&self) -> Result<()> {
        let (brick, port) = self.session()?;
        brick
            .set_output_state(
                port,
                0,
                MotorMode::NONE,
                RegulationMode::Idle,
                0,
                RunState::Idle,
                0,
            )
            .await
    }

    /// Reset the position counter, either relative to the last movement
    /// or absolutely.
    pub async fn reset_position(&self, relative: bool) -> Result<()> {
        let (brick, port) = self.session()?;
        brick.reset_motor_position(port, relative).await
    }

    /// Read the output state from the brick, cache it and notify
    /// observers.
    pub async fn poll(&self) -> Result<()> {
        let (brick, port) = self.session()?;
        let state = brick.get_output_state(port).await?;
        *self.inner.state.lock() = Some(state);
        brick.emit(Notification::Polled(PollSource::Motor(port)));
        Ok(())
    }

    /// The last polled output state.
    pub fn state(&self) -> Option<OutputState> {
        *self.inner.state.lock()
    }

    /// Tachometer count since the last reset, from the last poll.
    pub fn tacho_count(&self) -> Option<i32> {
        self.state().map(|state| state.tacho_count)
    }

    /// Program-visible rotation count, from the last poll.
    pub fn rotation_count(&self) -> Option<i32> {
        self.state().map(|state| state.rotation_count)
    }

    pub(crate) fn stop_polling(&self) {
        self.inner.poller.stop();
    }

    /// Enable or disable periodic polling of this motor. `None` or a
    /// zero duration disables it. Ticks while the session is
    /// disconnected do nothing.
    pub fn set_polling_interval(&self, interval: Option<Duration>) {
        match interval.filter(|duration| !duration.is_zero()) {
            None => self.inner.poller.stop(),
            Some(period) => {
                let weak = Arc::downgrade(&self.inner);
                self.inner.poller.start(period, move || {
                    let weak = weak.clone();
                    async move {
                        let Some(inner) = weak.upgrade() else {
                            return false;
                        };
                        let motor = Motor { inner };
                        if !motor.is_attached() {
                            return false;
                        }
                        let _ = motor.poll().await;
                        true
                    }
                });
            }
        }
    }
}
