use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// What the left stick drives.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeftStickMode {
    /// Vertical deflection scrolls the wheel
    Scroll,
    /// Four directions emulate keys (see --keys)
    Keys,
    /// Ignored
    Off,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyLayout {
    Wasd,
    Arrows,
}

/// What happens to held buttons/keys when the controller goes away.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisconnectPolicy {
    /// Release everything held and forget it
    Release,
    /// Keep state; the next reading after reconnect decides
    Hold,
}

/// Linux gamepad-to-mouse injector (evdev/uinput).
/// Right stick moves the cursor, triggers click, left stick scrolls or types.
#[derive(Parser, Debug)]
#[command(name = "pad2mouse")]
pub struct Config {
    /// Cursor speed in pixels per tick at full deflection
    #[arg(short, long, default_value_t = 10.0)]
    pub sensitivity: f32,

    /// Deadzone for every stick axis, as a fraction of full scale [0, 1)
    #[arg(long, default_value_t = 0.15)]
    pub deadzone: f32,

    /// Override the deadzone of the right (cursor) stick
    #[arg(long)]
    pub cursor_deadzone: Option<f32>,

    /// Override the deadzone of the left (scroll/keys) stick
    #[arg(long)]
    pub scroll_deadzone: Option<f32>,

    /// Polling interval in milliseconds
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..=50))]
    pub tick_ms: u64,

    /// Specific evdev device path (e.g. /dev/input/event5)
    #[arg(short, long)]
    pub device: Option<PathBuf>,

    /// Left stick function
    #[arg(long, value_enum, default_value_t = LeftStickMode::Scroll)]
    pub left_stick: LeftStickMode,

    /// Key layout for --left-stick keys
    #[arg(long, value_enum, default_value_t = KeyLayout::Wasd)]
    pub keys: KeyLayout,

    /// Deflection that presses an emulated key
    #[arg(long, default_value_t = 0.5)]
    pub activation: f32,

    /// Deflection below which an emulated key is released
    #[arg(long, default_value_t = 0.2)]
    pub deactivation: f32,

    /// Also map A to left click and B to right click
    #[arg(long, default_value_t = false)]
    pub face_buttons: bool,

    /// Handling of held inputs when the controller disconnects
    #[arg(long, value_enum, default_value_t = DisconnectPolicy::Release)]
    pub on_disconnect: DisconnectPolicy,

    /// Print debug diagnostics every 100 ticks (axes, cursor delta, scroll)
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}
