use crate::injector::{round_delta, InputInjector, KeyId, MouseButton, WHEEL_DELTA};
use evdev::uinput::VirtualDeviceBuilder;
use evdev::{AttributeSet, BusType, EventType, InputEvent, InputId, Key, RelativeAxisType};

pub const DEVICE_NAME: &str = "pad2mouse Virtual Input";

fn button_code(button: MouseButton) -> Key {
    match button {
        MouseButton::Left => Key::BTN_LEFT,
        MouseButton::Right => Key::BTN_RIGHT,
        MouseButton::Middle => Key::BTN_MIDDLE,
    }
}

fn key_code(key: KeyId) -> Key {
    match key {
        KeyId::W => Key::KEY_W,
        KeyId::A => Key::KEY_A,
        KeyId::S => Key::KEY_S,
        KeyId::D => Key::KEY_D,
        KeyId::Up => Key::KEY_UP,
        KeyId::Down => Key::KEY_DOWN,
        KeyId::Left => Key::KEY_LEFT,
        KeyId::Right => Key::KEY_RIGHT,
    }
}

/// Add `amount` wheel units to `remainder` and take out the whole notches.
/// Partial notches carry over so slow scrolling still produces `REL_WHEEL`.
pub fn take_notches(remainder: &mut i32, amount: i32) -> i32 {
    *remainder += amount;
    let notches = *remainder / WHEEL_DELTA;
    *remainder -= notches * WHEEL_DELTA;
    notches
}

/// uinput mouse + keyboard combo device.
pub struct VirtualInput {
    device: evdev::uinput::VirtualDevice,
    wheel_remainder: i32,
}

impl VirtualInput {
    pub fn new() -> std::io::Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        for button in [MouseButton::Left, MouseButton::Right, MouseButton::Middle] {
            keys.insert(button_code(button));
        }
        for key in KeyId::ALL {
            keys.insert(key_code(key));
        }

        let mut axes = AttributeSet::<RelativeAxisType>::new();
        axes.insert(RelativeAxisType::REL_X);
        axes.insert(RelativeAxisType::REL_Y);
        axes.insert(RelativeAxisType::REL_WHEEL);
        axes.insert(RelativeAxisType::REL_WHEEL_HI_RES);

        let device = VirtualDeviceBuilder::new()?
            .name(DEVICE_NAME)
            .input_id(InputId::new(BusType::BUS_VIRTUAL, 0x1234, 0x5679, 1))
            .with_keys(&keys)?
            .with_relative_axes(&axes)?
            .build()?;

        log::info!("Created virtual input device ({})", DEVICE_NAME);

        Ok(Self {
            device,
            wheel_remainder: 0,
        })
    }

    fn emit(&mut self, events: &[InputEvent], what: &str) {
        if let Err(e) = self.device.emit(events) {
            log::warn!("Failed to emit {}: {}", what, e);
        }
    }
}

fn rel(axis: RelativeAxisType, value: i32) -> InputEvent {
    InputEvent::new_now(EventType::RELATIVE, axis.0, value)
}

fn key(code: Key, down: bool) -> InputEvent {
    InputEvent::new_now(EventType::KEY, code.code(), down as i32)
}

fn syn() -> InputEvent {
    InputEvent::new_now(EventType::SYNCHRONIZATION, 0, 0)
}

impl InputInjector for VirtualInput {
    fn move_cursor_by(&mut self, dx: f32, dy: f32) {
        let Some((x, y)) = round_delta(dx, dy) else {
            return;
        };
        self.emit(
            &[
                rel(RelativeAxisType::REL_X, x),
                rel(RelativeAxisType::REL_Y, y),
                syn(),
            ],
            "cursor move",
        );
    }

    fn set_button(&mut self, button: MouseButton, down: bool) {
        self.emit(&[key(button_code(button), down), syn()], "mouse button");
    }

    fn scroll_by(&mut self, amount: i32) {
        if amount == 0 {
            return;
        }
        let notches = take_notches(&mut self.wheel_remainder, amount);
        if notches != 0 {
            self.emit(
                &[
                    rel(RelativeAxisType::REL_WHEEL_HI_RES, amount),
                    rel(RelativeAxisType::REL_WHEEL, notches),
                    syn(),
                ],
                "scroll",
            );
        } else {
            self.emit(&[rel(RelativeAxisType::REL_WHEEL_HI_RES, amount), syn()], "scroll");
        }
    }

    fn set_key(&mut self, key_id: KeyId, down: bool) {
        self.emit(&[key(key_code(key_id), down), syn()], "key");
    }
}
