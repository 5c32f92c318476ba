/// Wheel-delta units per scroll notch.
pub const WHEEL_DELTA: i32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyId {
    W,
    A,
    S,
    D,
    Up,
    Down,
    Left,
    Right,
}

impl KeyId {
    pub const ALL: [KeyId; 8] = [
        KeyId::W,
        KeyId::A,
        KeyId::S,
        KeyId::D,
        KeyId::Up,
        KeyId::Down,
        KeyId::Left,
        KeyId::Right,
    ];
}

/// One synthetic input produced by a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Move { dx: f32, dy: f32 },
    Button { button: MouseButton, down: bool },
    Scroll(i32),
    Key { key: KeyId, down: bool },
}

impl Command {
    pub fn apply<I: InputInjector + ?Sized>(self, injector: &mut I) {
        match self {
            Command::Move { dx, dy } => injector.move_cursor_by(dx, dy),
            Command::Button { button, down } => injector.set_button(button, down),
            Command::Scroll(amount) => injector.scroll_by(amount),
            Command::Key { key, down } => injector.set_key(key, down),
        }
    }
}

/// Writes synthetic events to the OS. Calls are fire-and-forget: failures are
/// logged by the implementation and never surface to the caller. No debouncing
/// happens here.
pub trait InputInjector {
    /// Relative move; deltas are rounded and a (0, 0) result emits nothing.
    fn move_cursor_by(&mut self, dx: f32, dy: f32);
    fn set_button(&mut self, button: MouseButton, down: bool);
    /// Wheel-delta units, positive scrolls up.
    fn scroll_by(&mut self, amount: i32);
    fn set_key(&mut self, key: KeyId, down: bool);
}

/// Round a real-valued move to whole pixels, or `None` if nothing would move.
pub fn round_delta(dx: f32, dy: f32) -> Option<(i32, i32)> {
    let x = dx.round() as i32;
    let y = dy.round() as i32;
    if x == 0 && y == 0 {
        None
    } else {
        Some((x, y))
    }
}
