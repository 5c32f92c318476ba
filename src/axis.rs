/// Full-scale magnitude of a signed 16-bit stick axis. Dividing by 32768 keeps
/// `i16::MIN` at exactly -1.0.
pub const STICK_FULL_SCALE: f32 = 32768.0;

/// Logical stick axes that carry an independently configured deadzone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisId {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

impl AxisId {
    pub const ALL: [AxisId; 4] = [AxisId::LeftX, AxisId::LeftY, AxisId::RightX, AxisId::RightY];

    pub fn index(self) -> usize {
        match self {
            AxisId::LeftX => 0,
            AxisId::LeftY => 1,
            AxisId::RightX => 2,
            AxisId::RightY => 3,
        }
    }
}

impl std::fmt::Display for AxisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AxisId::LeftX => "left-x",
            AxisId::LeftY => "left-y",
            AxisId::RightX => "right-x",
            AxisId::RightY => "right-y",
        };
        f.write_str(name)
    }
}

/// Scale a raw reading to [-1.0, 1.0] and apply a per-axis deadzone.
///
/// Inside the deadzone the result is exactly 0.0. Outside it the remaining
/// travel is stretched so the deadzone edge maps to 0 and full deflection
/// still maps to ±1.0. Each axis is thresholded on its own (square deadzone).
pub fn normalize(raw: i32, full_scale: f32, deadzone: f32) -> f32 {
    if full_scale <= 0.0 || deadzone >= 1.0 {
        return 0.0;
    }
    let deadzone = deadzone.max(0.0);

    let scaled = (raw as f32 / full_scale).clamp(-1.0, 1.0);
    let magnitude = scaled.abs();
    if magnitude < deadzone {
        return 0.0;
    }

    let rescaled = (magnitude - deadzone) / (1.0 - deadzone);
    scaled.signum() * rescaled.min(1.0)
}

/// Normalize a signed 16-bit stick reading.
pub fn normalize_stick(raw: i16, deadzone: f32) -> f32 {
    normalize(raw as i32, STICK_FULL_SCALE, deadzone)
}
