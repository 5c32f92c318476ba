use crate::axis::AxisId;
use std::sync::atomic::{AtomicU32, Ordering};

pub const DEFAULT_DEADZONE: f32 = 0.15;
pub const DEFAULT_SENSITIVITY: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("deadzone {value} for axis {axis} is outside [0, 1)")]
    DeadzoneOutOfRange { axis: AxisId, value: f32 },

    #[error("sensitivity {0} must be a finite, non-negative number")]
    InvalidSensitivity(f32),

    #[error("hysteresis thresholds need 0 <= deactivation ({deactivation}) < activation ({activation}) <= 1")]
    InvalidThresholds { activation: f32, deactivation: f32 },
}

/// An `f32` stored as its bit pattern so it can be shared without a lock.
#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Values the polling thread reads every tick and any other thread may change
/// at any time. Setters validate first; a rejected value leaves the previous
/// one in place.
#[derive(Debug)]
pub struct Settings {
    deadzones: [AtomicF32; 4],
    sensitivity: AtomicF32,
}

impl Settings {
    pub fn new() -> Self {
        Self {
            deadzones: std::array::from_fn(|_| AtomicF32::new(DEFAULT_DEADZONE)),
            sensitivity: AtomicF32::new(DEFAULT_SENSITIVITY),
        }
    }

    pub fn axis_deadzone(&self, axis: AxisId) -> f32 {
        self.deadzones[axis.index()].load()
    }

    pub fn set_axis_deadzone(&self, axis: AxisId, value: f32) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&value) {
            return Err(ConfigError::DeadzoneOutOfRange { axis, value });
        }
        self.deadzones[axis.index()].store(value);
        log::debug!("Deadzone for {} set to {:.3}", axis, value);
        Ok(())
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity.load()
    }

    pub fn set_sensitivity(&self, value: f32) -> Result<(), ConfigError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::InvalidSensitivity(value));
        }
        self.sensitivity.store(value);
        log::debug!("Sensitivity set to {:.2}", value);
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}
