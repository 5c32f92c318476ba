/// XInput-style digital button mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Buttons(pub u16);

impl Buttons {
    pub const DPAD_UP: u16 = 0x0001;
    pub const DPAD_DOWN: u16 = 0x0002;
    pub const DPAD_LEFT: u16 = 0x0004;
    pub const DPAD_RIGHT: u16 = 0x0008;
    pub const START: u16 = 0x0010;
    pub const BACK: u16 = 0x0020;
    pub const LEFT_THUMB: u16 = 0x0040;
    pub const RIGHT_THUMB: u16 = 0x0080;
    pub const LEFT_SHOULDER: u16 = 0x0100;
    pub const RIGHT_SHOULDER: u16 = 0x0200;
    pub const A: u16 = 0x1000;
    pub const B: u16 = 0x2000;
    pub const X: u16 = 0x4000;
    pub const Y: u16 = 0x8000;

    pub fn contains(self, flag: u16) -> bool {
        self.0 & flag == flag
    }

    pub fn set(&mut self, flag: u16, on: bool) {
        if on {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }
}

/// One sample of the controller, taken once per tick. Stick Y is up-positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub connected: bool,
    pub left_stick: (i16, i16),
    pub right_stick: (i16, i16),
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub buttons: Buttons,
}

impl ControllerSnapshot {
    pub fn disconnected() -> Self {
        Self::default()
    }
}

/// Anything that can be sampled for a snapshot without blocking past one tick.
/// A read failure is reported as a disconnected snapshot, never as an error.
pub trait ControllerSource {
    fn is_connected(&self) -> bool;
    fn read_snapshot(&mut self) -> ControllerSnapshot;
}
