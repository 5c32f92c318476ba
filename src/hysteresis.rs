use crate::edge::Transition;
use crate::settings::ConfigError;

pub const DEFAULT_ACTIVATION: f32 = 0.5;
pub const DEFAULT_DEACTIVATION: f32 = 0.2;

/// Activation/deactivation magnitudes, validated so the release point always
/// sits inside the press point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    activation: f32,
    deactivation: f32,
}

impl Thresholds {
    pub fn new(activation: f32, deactivation: f32) -> Result<Self, ConfigError> {
        let valid = activation.is_finite()
            && deactivation.is_finite()
            && 0.0 <= deactivation
            && deactivation < activation
            && activation <= 1.0;
        if !valid {
            return Err(ConfigError::InvalidThresholds {
                activation,
                deactivation,
            });
        }
        Ok(Self {
            activation,
            deactivation,
        })
    }

    pub fn activation(&self) -> f32 {
        self.activation
    }

    pub fn deactivation(&self) -> f32 {
        self.deactivation
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            activation: DEFAULT_ACTIVATION,
            deactivation: DEFAULT_DEACTIVATION,
        }
    }
}

/// Which half of an axis a mapper watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyEmulationState {
    pub down: bool,
}

/// Emulates one digital key from one half of an analog axis.
#[derive(Debug)]
pub struct HysteresisKeyMapper {
    direction: Direction,
    state: KeyEmulationState,
}

impl HysteresisKeyMapper {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            state: KeyEmulationState::default(),
        }
    }

    /// Pure hysteresis step. Both directions release symmetrically.
    pub fn step(
        direction: Direction,
        value: f32,
        state: KeyEmulationState,
        activation: f32,
        deactivation: f32,
    ) -> (Option<Transition>, KeyEmulationState) {
        // Fold the negative half onto the positive one.
        let v = match direction {
            Direction::Positive => value,
            Direction::Negative => -value,
        };

        if !state.down && v > activation {
            (Some(Transition::Down), KeyEmulationState { down: true })
        } else if state.down && v < deactivation {
            (Some(Transition::Up), KeyEmulationState { down: false })
        } else {
            (None, state)
        }
    }

    pub fn update(&mut self, value: f32, thresholds: Thresholds) -> Option<Transition> {
        let (event, next) = Self::step(
            self.direction,
            value,
            self.state,
            thresholds.activation,
            thresholds.deactivation,
        );
        self.state = next;
        event
    }

    pub fn is_down(&self) -> bool {
        self.state.down
    }

    pub fn release(&mut self) -> Option<Transition> {
        if self.is_down() {
            self.state = KeyEmulationState::default();
            Some(Transition::Up)
        } else {
            None
        }
    }
}
