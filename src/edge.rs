/// Trigger readings (0..=255) above this count as a press.
pub const TRIGGER_THRESHOLD: u8 = 50;

/// Threshold-digitize an analog trigger reading.
pub fn trigger_pressed(raw: u8) -> bool {
    raw > TRIGGER_THRESHOLD
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Down,
    Up,
}

impl Transition {
    pub fn is_down(self) -> bool {
        self == Transition::Down
    }
}

/// Whether the tracked input was pressed on the previous tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeState {
    pub pressed: bool,
}

/// Turns a sampled pressed/released level into press and release edges.
/// One tracker per logical input; a held input produces no further events.
#[derive(Debug, Default)]
pub struct ButtonEdgeTracker {
    state: EdgeState,
}

impl ButtonEdgeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure edge step.
    pub fn step(raw_pressed: bool, previous: EdgeState) -> (Option<Transition>, EdgeState) {
        let event = match (previous.pressed, raw_pressed) {
            (false, true) => Some(Transition::Down),
            (true, false) => Some(Transition::Up),
            _ => None,
        };
        (event, EdgeState { pressed: raw_pressed })
    }

    pub fn update(&mut self, raw_pressed: bool) -> Option<Transition> {
        let (event, next) = Self::step(raw_pressed, self.state);
        self.state = next;
        event
    }

    /// Forget the held state, returning the `Up` needed to close it.
    pub fn release(&mut self) -> Option<Transition> {
        self.update(false)
    }
}
