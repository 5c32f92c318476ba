use crate::snapshot::{Buttons, ControllerSnapshot, ControllerSource};
use evdev::{AbsoluteAxisType, AttributeSet, Device, Key};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// How often a missing controller is looked for again.
const RESCAN_INTERVAL: Duration = Duration::from_millis(500);

/// Find a gamepad by enumerating /dev/input/event*.
/// Returns the first device that supports ABS_X, ABS_Y, and BTN_SOUTH.
pub fn find_gamepad_device() -> Option<PathBuf> {
    for i in 0..64 {
        let path = PathBuf::from(format!("/dev/input/event{}", i));
        if !path.exists() {
            continue;
        }
        if let Ok(device) = Device::open(&path) {
            let has_sticks = device.supported_absolute_axes().is_some_and(|axes| {
                axes.contains(AbsoluteAxisType::ABS_X) && axes.contains(AbsoluteAxisType::ABS_Y)
            });
            let has_south = device
                .supported_keys()
                .is_some_and(|keys| keys.contains(Key::BTN_SOUTH));

            if has_sticks && has_south {
                log::info!(
                    "Found gamepad: {} at {}",
                    device.name().unwrap_or("unknown"),
                    path.display()
                );
                return Some(path);
            }
        }
    }
    None
}

/// Samples an evdev gamepad with state ioctls. Never blocks: if the device is
/// gone the snapshot reads as disconnected and the device is reopened later.
pub struct GamepadReader {
    fixed_path: Option<PathBuf>,
    device: Option<Device>,
    last_attempt: Option<Instant>,
}

impl GamepadReader {
    /// `path` pins a specific device; `None` auto-detects on every reconnect.
    pub fn new(path: Option<PathBuf>) -> Self {
        let mut reader = Self {
            fixed_path: path,
            device: None,
            last_attempt: None,
        };
        reader.try_open();
        reader
    }

    fn try_open(&mut self) {
        self.last_attempt = Some(Instant::now());

        let path = match self.fixed_path.clone().or_else(find_gamepad_device) {
            Some(p) => p,
            None => {
                log::debug!("No gamepad found");
                return;
            }
        };

        match Device::open(&path) {
            Ok(device) => {
                log::info!(
                    "Opened gamepad: {} ({})",
                    device.name().unwrap_or("unknown"),
                    path.display()
                );
                self.device = Some(device);
            }
            Err(e) => log::debug!("Failed to open {}: {}", path.display(), e),
        }
    }

    fn rescan_due(&self) -> bool {
        self.last_attempt
            .map_or(true, |t| t.elapsed() >= RESCAN_INTERVAL)
    }
}

impl ControllerSource for GamepadReader {
    fn is_connected(&self) -> bool {
        self.device.is_some()
    }

    fn read_snapshot(&mut self) -> ControllerSnapshot {
        if self.device.is_none() && self.rescan_due() {
            self.try_open();
        }
        let Some(device) = &self.device else {
            return ControllerSnapshot::disconnected();
        };

        let state = device
            .get_abs_state()
            .and_then(|abs| device.get_key_state().map(|keys| (abs, keys)));

        match state {
            Ok((abs, keys)) => snapshot_from_state(&abs, &keys),
            Err(e) => {
                log::warn!("Lost gamepad: {}", e);
                self.device = None;
                self.last_attempt = Some(Instant::now());
                ControllerSnapshot::disconnected()
            }
        }
    }
}

/// Build a snapshot from raw evdev absolute-axis and key state.
pub fn snapshot_from_state(abs: &[libc::input_absinfo], keys: &AttributeSet<Key>) -> ControllerSnapshot {
    let axis = |code: AbsoluteAxisType| abs.get(code.0 as usize).copied();
    let stick = |code: AbsoluteAxisType| axis(code).map_or(0, |a| scale_stick(a.value, a.minimum, a.maximum));
    let trigger = |code: AbsoluteAxisType| axis(code).map_or(0, |a| scale_trigger(a.value, a.minimum, a.maximum));
    let hat = |code: AbsoluteAxisType| axis(code).map_or(0, |a| a.value.signum());

    let mut buttons = Buttons::default();
    let key_map = [
        (Key::BTN_SOUTH, Buttons::A),
        (Key::BTN_EAST, Buttons::B),
        // xpad reports X and Y on the codes evdev calls NORTH and WEST.
        (Key::BTN_NORTH, Buttons::X),
        (Key::BTN_WEST, Buttons::Y),
        (Key::BTN_TL, Buttons::LEFT_SHOULDER),
        (Key::BTN_TR, Buttons::RIGHT_SHOULDER),
        (Key::BTN_SELECT, Buttons::BACK),
        (Key::BTN_START, Buttons::START),
        (Key::BTN_THUMBL, Buttons::LEFT_THUMB),
        (Key::BTN_THUMBR, Buttons::RIGHT_THUMB),
    ];
    for (key, flag) in key_map {
        buttons.set(flag, keys.contains(key));
    }

    let hat_x = hat(AbsoluteAxisType::ABS_HAT0X);
    let hat_y = hat(AbsoluteAxisType::ABS_HAT0Y);
    buttons.set(Buttons::DPAD_LEFT, hat_x < 0);
    buttons.set(Buttons::DPAD_RIGHT, hat_x > 0);
    buttons.set(Buttons::DPAD_UP, hat_y < 0);
    buttons.set(Buttons::DPAD_DOWN, hat_y > 0);

    ControllerSnapshot {
        connected: true,
        left_stick: (
            stick(AbsoluteAxisType::ABS_X),
            stick(AbsoluteAxisType::ABS_Y).saturating_neg(),
        ),
        right_stick: (
            stick(AbsoluteAxisType::ABS_RX),
            stick(AbsoluteAxisType::ABS_RY).saturating_neg(),
        ),
        left_trigger: trigger(AbsoluteAxisType::ABS_Z),
        right_trigger: trigger(AbsoluteAxisType::ABS_RZ),
        buttons,
    }
}

/// Map a device range onto the signed 16-bit stick range.
fn scale_stick(value: i32, min: i32, max: i32) -> i16 {
    if min == i16::MIN as i32 && max == i16::MAX as i32 {
        return value as i16;
    }
    if max <= min {
        return 0;
    }
    let center = (min as f64 + max as f64) / 2.0;
    let half_span = (max as f64 - min as f64) / 2.0;
    let unit = (value as f64 - center) / half_span;
    (unit * 32767.0).round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// Map a device range onto 0..=255.
fn scale_trigger(value: i32, min: i32, max: i32) -> u8 {
    if max <= min {
        return 0;
    }
    let scaled = (value as i64 - min as i64) * 255 / (max as i64 - min as i64);
    scaled.clamp(0, 255) as u8
}
