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

//! Sensors on the brick's input ports.
//!
//! Analog sensors (touch, light, sound, color) read through
//! GetInputValues; the ultrasonic sensor is an I2C device behind the
//! low-speed commands. Attaching a sensor pushes its type and mode to
//! the brick; detaching resets the port to no sensor.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::devices::{i2c, Binding};
use crate::error::{Error, Result};
use crate::poll::Poller;
use crate::protocol::{InputPort, InputValues, SensorMode, SensorType};
use crate::session::{Brick, Notification, PollSource};

/// What a color sensor measures, and which lamp it lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Full color detection with all lamps cycling.
    Full,
    /// Reflected light under the red lamp.
    Red,
    /// Reflected light under the green lamp.
    Green,
    /// Reflected light under the blue lamp.
    Blue,
    /// Ambient light, lamps off.
    Passive,
}

/// A color detected in [`ColorMode::Full`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorReading {
    Black,
    Blue,
    Green,
    Yellow,
    Red,
    White,
    /// The firmware reported a value outside the detection table.
    Unknown,
}

impl ColorReading {
    fn from_scaled(scaled: i16) -> ColorReading {
        match scaled {
            1 => ColorReading::Black,
            2 => ColorReading::Blue,
            3 => ColorReading::Green,
            4 => ColorReading::Yellow,
            5 => ColorReading::Red,
            6 => ColorReading::White,
            _ => ColorReading::Unknown,
        }
    }
}

/// The kind of physical sensor plugged into a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// Touch (switch) sensor.
    Touch,
    /// Light sensor, with or without its own illumination.
    Light { active: bool },
    /// Sound sensor; `adjusted` applies the ear-like dBA weighting.
    Sound { adjusted: bool },
    /// Color sensor in one of its lamp modes.
    Color { mode: ColorMode },
    /// Ultrasonic distance sensor (I2C).
    Ultrasonic,
}

impl SensorKind {
    /// The SetInputMode bytes this kind configures the port with.
    pub(crate) fn wire(self) -> (SensorType, SensorMode) {
        match self {
            SensorKind::Touch => (SensorType::Switch, SensorMode::Boolean),
            SensorKind::Light { active: true } => {
                (SensorType::LightActive, SensorMode::PercentFullScale)
            }
            SensorKind::Light { active: false } => {
                (SensorType::LightInactive, SensorMode::PercentFullScale)
            }
            SensorKind::Sound { adjusted: true } => {
                (SensorType::SoundDba, SensorMode::PercentFullScale)
            }
            SensorKind::Sound { adjusted: false } => {
                (SensorType::SoundDb, SensorMode::PercentFullScale)
            }
            SensorKind::Color { mode } => {
                let sensor_type = match mode {
                    ColorMode::Full => SensorType::ColorFull,
                    ColorMode::Red => SensorType::ColorRed,
                    ColorMode::Green => SensorType::ColorGreen,
                    ColorMode::Blue => SensorType::ColorBlue,
                    ColorMode::Passive => SensorType::ColorNone,
                };
                (sensor_type, SensorMode::Raw)
            }
            SensorKind::Ultrasonic => (SensorType::LowSpeed9V, SensorMode::Raw),
        }
    }
}

/// Measurement regime of the ultrasonic sensor's command register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UltrasonicMode {
    /// Measurements disabled.
    Off,
    /// One measurement per command.
    SingleShot,
    /// Free-running measurements at the configured interval. The
    /// sensor's power-on default.
    Continuous,
    /// Listen for other ultrasonic sensors without pinging.
    EventCapture,
}

impl UltrasonicMode {
    fn command(self) -> u8 {
        match self {
            UltrasonicMode::Off => i2c::CMD_OFF,
            UltrasonicMode::SingleShot => i2c::CMD_SINGLE_SHOT,
            UltrasonicMode::Continuous => i2c::CMD_CONTINUOUS,
            UltrasonicMode::EventCapture => i2c::CMD_EVENT_CAPTURE,
        }
    }
}

/// The last reading a poll produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorSnapshot {
    /// A GetInputValues reading from an analog sensor.
    Analog(InputValues),
    /// Distance in centimeters from the ultrasonic sensor.
    Distance(u8),
}

/// A sensor. Clones share the same device; attach it to a session with
/// [`Brick::attach_sensor`](crate::session::Brick::attach_sensor).
#[derive(Clone)]
pub struct Sensor {
    inner: Arc<SensorInner>,
}

struct SensorInner {
    kind: Mutex<SensorKind>,
    binding: Mutex<Option<Binding<InputPort>>>,
    snapshot: Mutex<Option<SensorSnapshot>>,
    poller: Poller,
}

impl Sensor {
    pub fn new(kind: SensorKind) -> Self {
        Sensor {
            inner: Arc::new(SensorInner {
                kind: Mutex::new(kind),
                binding: Mutex::new(None),
                snapshot: Mutex::new(None),
                poller: Poller::default(),
            }),
        }
    }

    /// Touch sensor.
    pub fn touch() -> Self {
        Self::new(SensorKind::Touch)
    }

    /// Light sensor; `active` lights its lamp.
    pub fn light(active: bool) -> Self {
        Self::new(SensorKind::Light { active })
    }

    /// Sound sensor; `adjusted` applies dBA weighting.
    pub fn sound(adjusted: bool) -> Self {
        Self::new(SensorKind::Sound { adjusted })
    }

    /// Color sensor.
    pub fn color(mode: ColorMode) -> Self {
        Self::new(SensorKind::Color { mode })
    }

    /// Ultrasonic distance sensor.
    pub fn ultrasonic() -> Self {
        Self::new(SensorKind::Ultrasonic)
    }

    pub fn kind(&self) -> SensorKind {
        *self.inner.kind.lock()
    }

    /// The port this sensor is attached to, if any.
    pub fn port(&self) -> Option<InputPort> {
        self.inner.binding.lock().as_ref().map(Binding::port)
    }

    pub fn is_attached(&self) -> bool {
        self.inner.binding.lock().is_some()
    }

    /// Change the sensor kind. While attached the new type and mode are
    /// pushed to the brick immediately.
    pub async fn set_kind(&self, kind: SensorKind) -> Result<()> {
        *self.inner.kind.lock() = kind;
        *self.inner.snapshot.lock() = None;
        if self.is_attached() {
            self.configure().await?;
        }
        Ok(())
    }

    fn session(&self) -> Result<(Brick, InputPort)> {
        let binding = self.inner.binding.lock();
        binding
            .as_ref()
            .ok_or(Error::InvalidState("sensor is not attached"))?
            .session()
    }

    pub(crate) fn bind(&self, brick: &Brick, port: InputPort) {
        *self.inner.binding.lock() = Some(Binding::new(brick, port));
    }

    /// Push the sensor's type and mode to the brick. The ultrasonic
    /// sensor additionally gets its port buffer drained and a warm
    /// reset, matching its power-on sequence.
    pub(crate) async fn configure(&self) -> Result<()> {
        let (brick, port) = self.session()?;
        let (sensor_type, mode) = self.kind().wire();
        brick.set_input_mode(port, sensor_type, mode).await?;
        if self.kind() == SensorKind::Ultrasonic {
            i2c::drain(&brick, port).await;
            i2c::write_register(&brick, port, i2c::REG_COMMAND, i2c::CMD_WARM_RESET).await?;
        }
        debug!("Sensor configured as {:?} on {:?}", self.kind(), port);
        Ok(())
    }

    /// Detach. With `physical` set the port is reset to no sensor on a
    /// best-effort basis first (and the ultrasonic sensor is commanded
    /// off).
    pub(crate) async fn release(&self, physical: bool) {
        self.inner.poller.stop();
        if physical {
            self.quiesce().await;
        }
        *self.inner.binding.lock() = None;
        *self.inner.snapshot.lock() = None;
    }

    /// Best-effort reset of the physical port to no sensor. Errors are
    /// swallowed: this runs on detach and disconnect paths where the
    /// channel may already be gone.
    pub(crate) async fn quiesce(&self) {
        let Ok((brick, port)) = self.session() else {
            return;
        };
        if !brick.is_connected() {
            return;
        }
        if self.kind() == SensorKind::Ultrasonic {
            let _ = i2c::write_register(&brick, port, i2c::REG_COMMAND, i2c::CMD_OFF).await;
        }
        let _ = brick
            .set_input_mode(port, SensorType::None, SensorMode::Raw)
            .await;
    }

    /// Read the sensor, cache the snapshot and notify observers.
    ///
    /// For the ultrasonic sensor a communication failure inside the I2C
    /// transaction downgrades the snapshot to unknown instead of
    /// propagating; the sensor may simply be mid-measurement.
    pub async fn poll(&self) -> Result<()> {
        let (brick, port) = self.session()?;
        if self.kind() == SensorKind::Ultrasonic {
            match i2c::read_distance(&brick, port).await {
                Ok(distance) => {
                    *self.inner.snapshot.lock() = Some(SensorSnapshot::Distance(distance))
                }
                Err(Error::Communication(_)) => *self.inner.snapshot.lock() = None,
                Err(error) => return Err(error),
            }
        } else {
            let values = brick.get_input_values(port).await?;
            *self.inner.snapshot.lock() = Some(SensorSnapshot::Analog(values));
        }
        brick.emit(Notification::Polled(PollSource::Sensor(port)));
        Ok(())
    }

    /// The last polled reading.
    pub fn snapshot(&self) -> Option<SensorSnapshot> {
        *self.inner.snapshot.lock()
    }

    fn analog(&self) -> Option<InputValues> {
        match self.snapshot()? {
            SensorSnapshot::Analog(values) => Some(values),
            SensorSnapshot::Distance(_) => None,
        }
    }

    /// Touch sensor: whether the button was pressed at the last poll.
    /// `None` for other sensor kinds or before the first poll.
    pub fn is_pressed(&self) -> Option<bool> {
        if self.kind() != SensorKind::Touch {
            return None;
        }
        Some(self.analog()?.scaled == 1)
    }

    /// Light intensity in percent at the last poll. Available for light
    /// sensors and for a color sensor in a single-channel mode; `None`
    /// otherwise.
    pub fn intensity(&self) -> Option<i16> {
        let measures_light = match self.kind() {
            SensorKind::Light { .. } => true,
            SensorKind::Color { mode } => mode != ColorMode::Full,
            _ => false,
        };
        if !measures_light {
            return None;
        }
        Some(self.analog()?.scaled)
    }

    /// Sound sensor: level in percent at the last poll. `None` for other
    /// sensor kinds.
    pub fn sound_level(&self) -> Option<i16> {
        if !matches!(self.kind(), SensorKind::Sound { .. }) {
            return None;
        }
        Some(self.analog()?.scaled)
    }

    /// Color sensor in full detection mode: the detected color at the
    /// last poll. `None` in any other kind or mode.
    pub fn detected_color(&self) -> Option<ColorReading> {
        if !matches!(self.kind(), SensorKind::Color { mode: ColorMode::Full }) {
            return None;
        }
        Some(ColorReading::from_scaled(self.analog()?.scaled))
    }

    /// Ultrasonic sensor: distance in centimeters at the last poll.
    pub fn distance_cm(&self) -> Option<u8> {
        match self.snapshot()? {
            SensorSnapshot::Distance(distance) => Some(distance),
            SensorSnapshot::Analog(_) => None,
        }
    }

    fn ultrasonic_session(&self) -> Result<(Brick, InputPort)> {
        if self.kind() != SensorKind::Ultrasonic {
            return Err(Error::InvalidState("not an ultrasonic sensor"));
        }
        self.session()
    }

    /// Ultrasonic sensor: switch the measurement regime.
    pub async fn set_ultrasonic_mode(&self, mode: UltrasonicMode) -> Result<()> {
        let (brick, port) = self.ultrasonic_session()?;
        i2c::write_register(&brick, port, i2c::REG_COMMAND, mode.command()).await
    }

    /// Ultrasonic sensor: set the continuous-measurement interval.
    pub async fn set_ultrasonic_interval(&self, interval: u8) -> Result<()> {
        let (brick, port) = self.ultrasonic_session()?;
        i2c::write_register(&brick, port, i2c::REG_INTERVAL, interval).await
    }

    /// Ultrasonic sensor: firmware version string (e.g. `V1.0`).
    pub async fn ultrasonic_version(&self) -> Result<String> {
        let (brick, port) = self.ultrasonic_session()?;
        i2c::read_string(&brick, port, i2c::REG_VERSION).await
    }

    /// Ultrasonic sensor: product ID string (e.g. `LEGO`).
    pub async fn ultrasonic_product_id(&self) -> Result<String> {
        let (brick, port) = self.ultrasonic_session()?;
        i2c::read_string(&brick, port, i2c::REG_PRODUCT_ID).await
    }

    /// Ultrasonic sensor: sensor type string (e.g. `Sonar`).
    pub async fn ultrasonic_sensor_type(&self) -> Result<String> {
        let (brick, port) = self.ultrasonic_session()?;
        i2c::read_string(&brick, port, i2c::REG_SENSOR_TYPE).await
    }

    /// Ultrasonic sensor: measurement units string (e.g. `10E-2m`).
    pub async fn ultrasonic_units(&self) -> Result<String> {
        let (brick, port) = self.ultrasonic_session()?;
        i2c::read_string(&brick, port, i2c::REG_UNITS).await
    }

    pub(crate) fn stop_polling(&self) {
        self.inner.poller.stop();
    }

    /// Enable or disable periodic polling of this sensor. `None` or a
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
                        let sensor = Sensor { inner };
                        if !sensor.is_attached() {
                            return false;
                        }
                        let _ = sensor.poll().await;
                        true
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analog_with_scaled(scaled: i16) -> InputValues {
        InputValues {
            valid: true,
            calibrated: false,
            sensor_type: SensorType::ColorFull as u8,
            mode: SensorMode::Raw as u8,
            raw: 0,
            normalized: 0,
            scaled,
            calibrated_value: 0,
        }
    }

    #[test]
    fn test_wire_mapping() {
        assert_eq!(
            SensorKind::Touch.wire(),
            (SensorType::Switch, SensorMode::Boolean)
        );
        assert_eq!(
            SensorKind::Light { active: true }.wire(),
            (SensorType::LightActive, SensorMode::PercentFullScale)
        );
        assert_eq!(
            SensorKind::Sound { adjusted: false }.wire(),
            (SensorType::SoundDb, SensorMode::PercentFullScale)
        );
        assert_eq!(
            SensorKind::Color { mode: ColorMode::Passive }.wire(),
            (SensorType::ColorNone, SensorMode::Raw)
        );
        assert_eq!(
            SensorKind::Ultrasonic.wire(),
            (SensorType::LowSpeed9V, SensorMode::Raw)
        );
    }

    #[test]
    fn test_color_table() {
        assert_eq!(ColorReading::from_scaled(1), ColorReading::Black);
        assert_eq!(ColorReading::from_scaled(6), ColorReading::White);
        assert_eq!(ColorReading::from_scaled(0), ColorReading::Unknown);
        assert_eq!(ColorReading::from_scaled(7), ColorReading::Unknown);
    }

    #[test]
    fn test_touch_accessor_reads_snapshot() {
        let sensor = Sensor::touch();
        assert_eq!(sensor.is_pressed(), None);

        *sensor.inner.snapshot.lock() =
            Some(SensorSnapshot::Analog(analog_with_scaled(1)));
        assert_eq!(sensor.is_pressed(), Some(true));

        *sensor.inner.snapshot.lock() =
            Some(SensorSnapshot::Analog(analog_with_scaled(0)));
        assert_eq!(sensor.is_pressed(), Some(false));
    }

    #[test]
    fn test_accessors_gated_by_kind() {
        // A full-mode color sensor yields detections, not intensities.
        let color = Sensor::color(ColorMode::Full);
        *color.inner.snapshot.lock() = Some(SensorSnapshot::Analog(analog_with_scaled(5)));
        assert_eq!(color.detected_color(), Some(ColorReading::Red));
        assert_eq!(color.intensity(), None);
        assert_eq!(color.is_pressed(), None);
        assert_eq!(color.sound_level(), None);

        // A single-channel mode is a light reading, not a detection.
        let red = Sensor::color(ColorMode::Red);
        *red.inner.snapshot.lock() = Some(SensorSnapshot::Analog(analog_with_scaled(47)));
        assert_eq!(red.detected_color(), None);
        assert_eq!(red.intensity(), Some(47));

        let touch = Sensor::touch();
        *touch.inner.snapshot.lock() = Some(SensorSnapshot::Analog(analog_with_scaled(1)));
        assert_eq!(touch.detected_color(), None);
        assert_eq!(touch.intensity(), None);
    }

    #[test]
    fn test_distance_accessor_rejects_analog_snapshot() {
        let sensor = Sensor::ultrasonic();
        *sensor.inner.snapshot.lock() = Some(SensorSnapshot::Distance(42));
        assert_eq!(sensor.distance_cm(), Some(42));
        assert_eq!(sensor.intensity(), None);
    }
}
