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

//! The device session: exclusive channel owner, command dispatcher and
//! device attach registry.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::config::BrickOptions;
use crate::devices::{Motor, Sensor};
use crate::error::{Error, Result};
use crate::poll::Poller;
use crate::protocol::{
    self, frame, DeviceInfo, FirmwareVersion, InputPort, InputValues, MotorMode, OutputPort,
    OutputState, RegulationMode, Request, Response, RunState, SensorMode, SensorType,
};
use crate::transport::{Channel, Connector};

/// Which poll produced a [`Notification::Polled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollSource {
    /// The session's own opportunistic battery poll.
    Battery,
    /// A motor on the given output port.
    Motor(OutputPort),
    /// A sensor on the given input port.
    Sensor(InputPort),
}

/// Fire-and-forget notifications delivered to observers in completion
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// A device (or the battery) finished a poll.
    Polled(PollSource),
    /// The session lost its channel, either explicitly or through an I/O
    /// failure.
    Disconnected,
}

/// A session with one NXT brick.
///
/// The session exclusively owns the byte channel. All request/response
/// exchanges pass through a single gate, so commands issued from any
/// task observe global FIFO ordering. Cloning yields another handle to
/// the same session.
#[derive(Clone)]
pub struct Brick {
    inner: Arc<BrickInner>,
}

pub(crate) struct BrickInner {
    connector: Box<dyn Connector>,
    options: BrickOptions,
    /// The exchange gate. Holding this mutex is what serializes
    /// request/response pairs; `None` means disconnected.
    link: tokio::sync::Mutex<Option<Box<dyn Channel>>>,
    /// Mirror of the link state readable without taking the gate.
    connected: AtomicBool,
    battery: Mutex<Option<u16>>,
    motors: Mutex<HashMap<OutputPort, Motor>>,
    sensors: Mutex<HashMap<InputPort, Sensor>>,
    events: broadcast::Sender<Notification>,
    battery_poller: Poller,
}

impl BrickInner {
    pub(crate) fn emit(&self, notification: Notification) {
        // Nobody listening is fine.
        let _ = self.events.send(notification);
    }
}

impl Brick {
    /// Create an unconnected session that will open its channel through
    /// `connector`.
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self::with_options(connector, BrickOptions::default())
    }

    /// Create an unconnected session with explicit tunables.
    pub fn with_options(connector: impl Connector + 'static, options: BrickOptions) -> Self {
        let (events, _) = broadcast::channel(64);
        Brick {
            inner: Arc::new(BrickInner {
                connector: Box::new(connector),
                options,
                link: tokio::sync::Mutex::new(None),
                connected: AtomicBool::new(false),
                battery: Mutex::new(None),
                motors: Mutex::new(HashMap::new()),
                sensors: Mutex::new(HashMap::new()),
                events,
                battery_poller: Poller::default(),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<BrickInner>) -> Self {
        Brick { inner }
    }

    pub(crate) fn downgrade(&self) -> std::sync::Weak<BrickInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn options(&self) -> &BrickOptions {
        &self.inner.options
    }

    pub(crate) fn emit(&self, notification: Notification) {
        self.inner.emit(notification);
    }

    /// Subscribe to [`Notification`]s. Observers must not block
    /// significantly: delivery happens on the polling and
    /// command-completion path.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.inner.events.subscribe()
    }

    /// Whether the session currently holds an open channel.
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Open the channel. Idempotent while connected.
    pub async fn connect(&self) -> Result<()> {
        let mut link = self.inner.link.lock().await;
        if link.is_some() {
            return Ok(());
        }
        let channel = self
            .inner
            .connector
            .open()
            .await
            .map_err(Error::Connect)?;
        *link = Some(channel);
        self.inner.connected.store(true, Ordering::Release);
        debug!("Session connected");
        Ok(())
    }

    /// Close the channel. Device polling stops and attached sensors are
    /// reset to type None on a best-effort basis first. Idempotent.
    pub async fn disconnect(&self) {
        for motor in self.inner.motors.lock().values() {
            motor.stop_polling();
        }
        for sensor in self.inner.sensors.lock().values() {
            sensor.stop_polling();
        }

        if self.is_connected() {
            let sensors: Vec<Sensor> = self.inner.sensors.lock().values().cloned().collect();
            for sensor in sensors {
                sensor.quiesce().await;
            }
        }

        let mut link = self.inner.link.lock().await;
        self.inner.connected.store(false, Ordering::Release);
        if let Some(mut channel) = link.take() {
            let _ = channel.shutdown().await;
            drop(link);
            debug!("Session disconnected");
            self.inner.emit(Notification::Disconnected);
        }
    }

    /// Send one request and, when the command type expects it, read the
    /// framed response.
    ///
    /// While disconnected this fails immediately with `InvalidState`
    /// without touching the channel. Any I/O failure tears the session
    /// down: the channel is dropped, a [`Notification::Disconnected`] is
    /// emitted and the error surfaces as `Communication`.
    pub async fn send(&self, request: &Request) -> Result<Option<Response>> {
        let mut link = self.inner.link.lock().await;
        let channel = link
            .as_mut()
            .ok_or(Error::InvalidState("session is not connected"))?;

        match Self::exchange_on(channel.as_mut(), request).await {
            Ok(reply) => match reply {
                None => Ok(None),
                Some(payload) if payload.is_empty() => {
                    Err(Error::InvalidState("zero-length reply frame"))
                }
                Some(payload) => {
                    trace!("rx {}", hex::encode(&payload));
                    Ok(Some(Response::new(payload)))
                }
            },
            Err(cause) => {
                warn!("Exchange failed, tearing session down: {}", cause);
                *link = None;
                self.inner.connected.store(false, Ordering::Release);
                drop(link);
                self.inner.emit(Notification::Disconnected);
                Err(Error::Communication(cause))
            }
        }
    }

    /// Write the frame, then read the reply frame if one is expected.
    /// The request bytes are fully enqueued before any response byte is
    /// awaited.
    async fn exchange_on(
        channel: &mut dyn Channel,
        request: &Request,
    ) -> std::io::Result<Option<Vec<u8>>> {
        let frame = frame::encode(&request.to_bytes());
        trace!("tx {}", hex::encode(&frame));
        channel.write_all(&frame).await?;
        channel.flush().await?;

        if !request.expects_reply() {
            return Ok(None);
        }

        let mut header = [0u8; frame::HEADER_LEN];
        channel.read_exact(&mut header).await?;
        let length = frame::decode_length(header) as usize;
        let mut payload = vec![0u8; length];
        if length > 0 {
            channel.read_exact(&mut payload).await?;
        }
        Ok(Some(payload))
    }

    /// Send a reply-carrying request and validate the reply preamble.
    async fn query(&self, request: Request) -> Result<Response> {
        let response = self
            .send(&request)
            .await?
            .ok_or(Error::InvalidState("command cannot produce a reply"))?;
        response.check(request.opcode())?;
        Ok(response)
    }

    // Direct commands.

    /// Start the named program on the brick.
    pub async fn start_program(&self, name: &str) -> Result<()> {
        self.query(Request::start_program(name)?).await.map(drop)
    }

    /// Stop the running program.
    pub async fn stop_program(&self) -> Result<()> {
        self.query(Request::stop_program()).await.map(drop)
    }

    /// Name of the running program.
    pub async fn current_program_name(&self) -> Result<String> {
        let response = self.query(Request::get_current_program_name()).await?;
        protocol::decode_program_name(&response)
    }

    /// Play a sound file stored on the brick.
    pub async fn play_sound_file(&self, name: &str, repeat: bool) -> Result<()> {
        self.query(Request::play_sound_file(name, repeat)?)
            .await
            .map(drop)
    }

    /// Play a tone through the brick's speaker.
    pub async fn play_tone(&self, frequency_hz: u16, duration_ms: u16) -> Result<()> {
        self.query(Request::play_tone(frequency_hz, duration_ms))
            .await
            .map(drop)
    }

    /// Stop sound playback.
    pub async fn stop_sound_playback(&self) -> Result<()> {
        self.query(Request::stop_sound_playback()).await.map(drop)
    }

    /// Drive an output port. No reply is requested.
    #[allow(clippy::too_many_arguments)]
    pub async fn set_output_state(
        &self,
        port: OutputPort,
        power: i8,
        mode: MotorMode,
        regulation: RegulationMode,
        turn_ratio: i8,
        run_state: RunState,
        tacho_limit: u32,
    ) -> Result<()> {
        let request = Request::set_output_state(
            port, power, mode, regulation, turn_ratio, run_state, tacho_limit,
        );
        self.send(&request).await.map(drop)
    }

    /// Query an output port's state and counters.
    pub async fn get_output_state(&self, port: OutputPort) -> Result<OutputState> {
        let response = self.query(Request::get_output_state(port)).await?;
        OutputState::decode(&response)
    }

    /// Reset an output port's position counters.
    pub async fn reset_motor_position(&self, port: OutputPort, relative: bool) -> Result<()> {
        self.query(Request::reset_motor_position(port, relative))
            .await
            .map(drop)
    }

    /// Configure an input port's sensor type and mode.
    pub async fn set_input_mode(
        &self,
        port: InputPort,
        sensor_type: SensorType,
        mode: SensorMode,
    ) -> Result<()> {
        self.query(Request::set_input_mode(port, sensor_type, mode))
            .await
            .map(drop)
    }

    /// Read an input port's values.
    pub async fn get_input_values(&self, port: InputPort) -> Result<InputValues> {
        let response = self.query(Request::get_input_values(port)).await?;
        InputValues::decode(&response)
    }

    /// Reset an input port's accumulated scaled value.
    pub async fn reset_input_scaled_value(&self, port: InputPort) -> Result<()> {
        self.query(Request::reset_input_scaled_value(port))
            .await
            .map(drop)
    }

    /// Write a message into a brick mailbox (1-10). No reply is
    /// requested.
    pub async fn message_write(&self, mailbox: u8, message: &str) -> Result<()> {
        self.send(&Request::message_write(mailbox, message)?)
            .await
            .map(drop)
    }

    /// Read a message from a brick response mailbox (1-10).
    pub async fn message_read(&self, mailbox: u8, remove: bool) -> Result<String> {
        let response = self.query(Request::message_read(mailbox, remove)?).await?;
        protocol::decode_message_read(&response)
    }

    /// Battery level in millivolts, read live from the brick.
    pub async fn get_battery_level(&self) -> Result<u16> {
        let response = self.query(Request::get_battery_level()).await?;
        protocol::decode_battery_level(&response)
    }

    /// Reset the brick's sleep timer; returns the sleep limit in
    /// milliseconds.
    pub async fn keep_alive(&self) -> Result<u32> {
        let response = self.query(Request::keep_alive()).await?;
        protocol::decode_sleep_limit(&response)
    }

    /// How many bytes a low-speed sensor has ready.
    pub async fn ls_get_status(&self, port: InputPort) -> Result<u8> {
        let response = self.query(Request::ls_get_status(port)).await?;
        protocol::decode_ls_status(&response)
    }

    /// Start a low-speed transaction. No reply is requested.
    pub async fn ls_write(&self, port: InputPort, data: &[u8], response_len: u8) -> Result<()> {
        self.send(&Request::ls_write(port, data, response_len)?)
            .await
            .map(drop)
    }

    /// Read a low-speed sensor's ready bytes.
    pub async fn ls_read(&self, port: InputPort) -> Result<Vec<u8>> {
        let response = self.query(Request::ls_read(port)).await?;
        protocol::decode_ls_read(&response)
    }

    // System commands.

    /// Protocol and firmware versions.
    pub async fn firmware_version(&self) -> Result<FirmwareVersion> {
        let response = self.query(Request::get_firmware_version()).await?;
        FirmwareVersion::decode(&response)
    }

    /// Brick name, Bluetooth address, signal strength and free flash.
    pub async fn device_info(&self) -> Result<DeviceInfo> {
        let response = self.query(Request::get_device_info()).await?;
        DeviceInfo::decode(&response)
    }

    /// Rename the brick.
    pub async fn set_brick_name(&self, name: &str) -> Result<()> {
        self.query(Request::set_brick_name(name)?).await.map(drop)
    }

    // Polling.

    /// Opportunistically sample the battery level. Failures reset the
    /// cached value to unknown instead of propagating; a
    /// [`Notification::Polled`] fires either way.
    pub async fn poll(&self) {
        match self.get_battery_level().await {
            Ok(millivolts) => *self.inner.battery.lock() = Some(millivolts),
            Err(_) => *self.inner.battery.lock() = None,
        }
        self.inner.emit(Notification::Polled(PollSource::Battery));
    }

    /// Battery level from the last successful poll, if any.
    pub fn battery_millivolts(&self) -> Option<u16> {
        *self.inner.battery.lock()
    }

    /// Enable or disable the periodic battery poll. `None` or a zero
    /// duration disables it; ticks while disconnected are silent no-ops.
    pub fn set_polling_interval(&self, interval: Option<Duration>) {
        match interval.filter(|duration| !duration.is_zero()) {
            None => self.inner.battery_poller.stop(),
            Some(period) => {
                let weak = Arc::downgrade(&self.inner);
                self.inner.battery_poller.start(period, move || {
                    let weak = weak.clone();
                    async move {
                        let Some(inner) = weak.upgrade() else {
                            return false;
                        };
                        if inner.connected.load(Ordering::Acquire) {
                            Brick::from_inner(inner).poll().await;
                        }
                        true
                    }
                });
            }
        }
    }

    // Device attach points.

    /// Attach a motor to an output port. Any prior occupant is detached
    /// first. `OutputPort::All` is not a valid attach point.
    pub async fn attach_motor(&self, motor: &Motor, port: OutputPort) -> Result<()> {
        if port == OutputPort::All {
            return Err(Error::InvalidState("cannot attach a motor to the All port"));
        }

        let previous = self.inner.motors.lock().remove(&port);
        if let Some(previous) = previous {
            previous.release().await;
        }

        // The motor may still be attached elsewhere.
        motor.release().await;
        motor.bind(self, port);
        self.inner.motors.lock().insert(port, motor.clone());
        debug!("Motor attached to port {:?}", port);
        Ok(())
    }

    /// Detach whatever motor occupies the port.
    pub async fn detach_motor(&self, port: OutputPort) {
        let motor = self.inner.motors.lock().remove(&port);
        if let Some(motor) = motor {
            motor.release().await;
            debug!("Motor detached from port {:?}", port);
        }
    }

    /// Attach a sensor to an input port, pushing its type and mode to
    /// the brick. Any prior occupant runs its full detach sequence
    /// (physical reset to None, polling stopped) first.
    pub async fn attach_sensor(&self, sensor: &Sensor, port: InputPort) -> Result<()> {
        let previous = self.inner.sensors.lock().remove(&port);
        if let Some(previous) = previous {
            previous.release(true).await;
        }

        sensor.release(true).await;
        sensor.bind(self, port);
        if let Err(error) = sensor.configure().await {
            sensor.release(false).await;
            return Err(error);
        }
        self.inner.sensors.lock().insert(port, sensor.clone());
        debug!("Sensor attached to port {:?}", port);
        Ok(())
    }

    /// Detach whatever sensor occupies the port, resetting the physical
    /// sensor to None.
    pub async fn detach_sensor(&self, port: InputPort) {
        let sensor = self.inner.sensors.lock().remove(&port);
        if let Some(sensor) = sensor {
            sensor.release(true).await;
            debug!("Sensor detached from port {:?}", port);
        }
    }

    /// The sensor currently attached to a port, if any.
    pub fn sensor_at(&self, port: InputPort) -> Option<Sensor> {
        self.inner.sensors.lock().get(&port).cloned()
    }

    /// The motor currently attached to a port, if any.
    pub fn motor_at(&self, port: OutputPort) -> Option<Motor> {
        self.inner.motors.lock().get(&port).cloned()
    }
}
