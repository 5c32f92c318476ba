mod axis;
mod config;
mod edge;
mod gamepad;
mod hysteresis;
mod injector;
mod polling;
mod settings;
mod snapshot;
mod virtual_input;

use axis::AxisId;
use clap::Parser;
use config::{Config, LeftStickMode};
use gamepad::GamepadReader;
use hysteresis::Thresholds;
use polling::{LoopOptions, PollingLoop, Status};
use settings::{ConfigError, Settings};
use snapshot::ControllerSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use virtual_input::VirtualInput;

static QUIT: AtomicBool = AtomicBool::new(false);

fn main() {
    // "pad2mouse quit" signals the running instance and exits immediately.
    if std::env::args().nth(1).as_deref() == Some("quit") {
        send_to_running(libc::SIGTERM, "Quit");
        return;
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = Config::parse();

    let settings = Arc::new(Settings::new());
    let thresholds = match apply_config(&config, &settings) {
        Ok(t) => t,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    signal_setup();

    // Create virtual mouse/keyboard
    let injector = match VirtualInput::new() {
        Ok(v) => v,
        Err(e) => {
            log::error!("Failed to create virtual input device: {}", e);
            log::error!("Do you have /dev/uinput access? Try: sudo modprobe uinput");
            std::process::exit(1);
        }
    };

    let reader = GamepadReader::new(config.device.clone());
    if !reader.is_connected() {
        log::warn!("No gamepad yet. Are you in the 'input' group? Waiting for one to appear...");
    }

    let options = LoopOptions {
        tick: Duration::from_millis(config.tick_ms),
        left_stick: config.left_stick,
        keys: config.keys,
        thresholds,
        face_buttons: config.face_buttons,
        on_disconnect: config.on_disconnect,
        debug: config.debug,
    };

    let mut poller = PollingLoop::new(reader, injector, settings, options);

    let (status_tx, status_rx) = mpsc::channel::<Status>();
    poller.add_status_sink(Box::new(status_tx));
    let status_thread = match std::thread::Builder::new()
        .name("status".into())
        .spawn(move || watch_status(status_rx))
    {
        Ok(t) => Some(t),
        Err(e) => {
            log::warn!("Failed to spawn status thread: {}", e);
            None
        }
    };

    let handle = match polling::start(poller) {
        Ok(h) => h,
        Err(e) => {
            log::error!("Failed to spawn polling thread: {}", e);
            std::process::exit(1);
        }
    };

    // Echo what the running loop actually reads.
    let live = handle.settings();
    println!("pad2mouse - Gamepad-to-Mouse");
    println!("  Sensitivity: {:.2}", live.sensitivity());
    println!(
        "  Deadzone:    cursor {:.2}, left {:.2}",
        live.axis_deadzone(AxisId::RightX),
        live.axis_deadzone(AxisId::LeftX)
    );
    println!("  Left stick:  {:?}", config.left_stick);
    if config.left_stick == LeftStickMode::Keys {
        println!(
            "  Keys:        {:?} ({:.2} on / {:.2} off)",
            config.keys,
            thresholds.activation(),
            thresholds.deactivation()
        );
    }
    println!("  Tick:        {} ms", config.tick_ms);
    println!();
    println!("Quit: pad2mouse quit (or Ctrl+C)");
    println!();

    while !QUIT.load(Ordering::Relaxed) && !handle.is_finished() {
        std::thread::sleep(Duration::from_millis(20));
    }

    log::info!("Shutting down...");
    handle.request_stop();
    handle.join();
    if let Some(t) = status_thread {
        let _ = t.join();
    }
    log::info!("Done");
}

/// Push CLI values through the runtime setters and validate key thresholds.
fn apply_config(config: &Config, settings: &Settings) -> Result<Thresholds, ConfigError> {
    settings.set_sensitivity(config.sensitivity)?;
    for axis in AxisId::ALL {
        let value = match axis {
            AxisId::RightX | AxisId::RightY => config.cursor_deadzone,
            AxisId::LeftX | AxisId::LeftY => config.scroll_deadzone,
        };
        settings.set_axis_deadzone(axis, value.unwrap_or(config.deadzone))?;
    }
    Thresholds::new(config.activation, config.deactivation)
}

/// Log connectivity changes. Runs until the polling loop drops its sender.
fn watch_status(rx: mpsc::Receiver<Status>) {
    let mut connected = None;
    for status in rx {
        if connected == Some(status.connected) {
            continue;
        }
        if status.connected {
            log::info!("Controller connected");
        } else {
            log::info!("Controller not detected");
        }
        connected = Some(status.connected);
    }
}

fn signal_setup() {
    unsafe {
        libc::signal(libc::SIGINT, signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGTERM, signal_handler as libc::sighandler_t);
    }
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    QUIT.store(true, Ordering::Relaxed);
}

/// Find PID of a running pad2mouse instance by scanning /proc.
fn find_running_instance() -> Option<i32> {
    let my_pid = std::process::id() as i32;
    for entry in std::fs::read_dir("/proc").ok()? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let pid: i32 = match entry.file_name().to_str().and_then(|s| s.parse().ok()) {
            Some(p) => p,
            None => continue,
        };
        if pid == my_pid {
            continue;
        }
        if let Ok(comm) = std::fs::read_to_string(entry.path().join("comm")) {
            if comm.trim() == "pad2mouse" {
                return Some(pid);
            }
        }
    }
    None
}

/// Send a signal to the running pad2mouse instance, or exit with an error.
fn send_to_running(sig: libc::c_int, action: &str) {
    match find_running_instance() {
        Some(pid) => {
            let ret = unsafe { libc::kill(pid, sig) };
            if ret == 0 {
                eprintln!("{} sent to pad2mouse (pid {})", action, pid);
            } else {
                eprintln!("Failed to send signal to pad2mouse (pid {})", pid);
                std::process::exit(1);
            }
        }
        None => {
            eprintln!("No running pad2mouse instance found");
            std::process::exit(1);
        }
    }
}
