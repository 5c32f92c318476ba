use crate::axis::{normalize_stick, AxisId};
use crate::config::{DisconnectPolicy, KeyLayout, LeftStickMode};
use crate::edge::{trigger_pressed, ButtonEdgeTracker, Transition};
use crate::hysteresis::{Direction, HysteresisKeyMapper, Thresholds};
use crate::injector::{Command, InputInjector, KeyId, MouseButton};
use crate::settings::Settings;
use crate::snapshot::{Buttons, ControllerSnapshot, ControllerSource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

/// Wheel-delta units per tick at full left-stick deflection.
pub const SCROLL_MULTIPLIER: f32 = 40.0;

/// Longest single sleep inside the inter-tick suspension, so a stop request is
/// noticed promptly even with long ticks.
const SLEEP_SLICE: Duration = Duration::from_millis(1);

/// Ticks between `--debug` diagnostic lines.
const DEBUG_EVERY: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Cancelled,
}

/// Shared stop flag, checked between ticks and during the tick sleep.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub connected: bool,
}

/// Receives the per-tick status. Must return immediately.
pub trait StatusSink: Send {
    fn report(&self, status: Status);
}

impl StatusSink for mpsc::Sender<Status> {
    fn report(&self, status: Status) {
        // A closed receiver just means nobody is listening any more.
        let _ = self.send(status);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LoopOptions {
    pub tick: Duration,
    pub left_stick: LeftStickMode,
    pub keys: KeyLayout,
    pub thresholds: Thresholds,
    pub face_buttons: bool,
    pub on_disconnect: DisconnectPolicy,
    pub debug: bool,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(2),
            left_stick: LeftStickMode::Scroll,
            keys: KeyLayout::Wasd,
            thresholds: Thresholds::default(),
            face_buttons: false,
            on_disconnect: DisconnectPolicy::Release,
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DigitalInput {
    LeftTrigger,
    RightTrigger,
    Button(u16),
}

impl DigitalInput {
    fn pressed(self, snapshot: &ControllerSnapshot) -> bool {
        match self {
            DigitalInput::LeftTrigger => trigger_pressed(snapshot.left_trigger),
            DigitalInput::RightTrigger => trigger_pressed(snapshot.right_trigger),
            DigitalInput::Button(flag) => snapshot.buttons.contains(flag),
        }
    }
}

/// One mouse button and every input that drives it. The tracker sees the OR
/// of those inputs, so the button goes down once and up only when all are
/// released.
struct ButtonBinding {
    inputs: Vec<DigitalInput>,
    tracker: ButtonEdgeTracker,
    button: MouseButton,
}

impl ButtonBinding {
    fn new(button: MouseButton, inputs: Vec<DigitalInput>) -> Self {
        Self {
            inputs,
            tracker: ButtonEdgeTracker::new(),
            button,
        }
    }

    fn pressed(&self, snapshot: &ControllerSnapshot) -> bool {
        self.inputs.iter().any(|input| input.pressed(snapshot))
    }

    fn command(&self, transition: Transition) -> Command {
        Command::Button {
            button: self.button,
            down: transition.is_down(),
        }
    }
}

struct KeyBinding {
    axis: AxisId,
    mapper: HysteresisKeyMapper,
    key: KeyId,
}

impl KeyBinding {
    fn command(&self, transition: Transition) -> Command {
        Command::Key {
            key: self.key,
            down: transition.is_down(),
        }
    }
}

fn key_bindings(layout: KeyLayout) -> Vec<KeyBinding> {
    let [up, left, down, right] = match layout {
        KeyLayout::Wasd => [KeyId::W, KeyId::A, KeyId::S, KeyId::D],
        KeyLayout::Arrows => [KeyId::Up, KeyId::Left, KeyId::Down, KeyId::Right],
    };
    [
        (AxisId::LeftY, Direction::Positive, up),
        (AxisId::LeftY, Direction::Negative, down),
        (AxisId::LeftX, Direction::Negative, left),
        (AxisId::LeftX, Direction::Positive, right),
    ]
    .into_iter()
    .map(|(axis, direction, key)| KeyBinding {
        axis,
        mapper: HysteresisKeyMapper::new(direction),
        key,
    })
    .collect()
}

#[derive(Default)]
struct DebugStats {
    ticks: u32,
    moves: u32,
    last_cursor: (f32, f32),
    last_scroll: i32,
}

/// Fixed-rate sampler that turns controller snapshots into injected input.
/// All edge and hysteresis state lives here and is touched only by the thread
/// running the loop.
pub struct PollingLoop<C, I> {
    source: C,
    injector: I,
    settings: Arc<Settings>,
    options: LoopOptions,
    buttons: Vec<ButtonBinding>,
    keys: Vec<KeyBinding>,
    sinks: Vec<Box<dyn StatusSink>>,
    was_connected: bool,
    state: LoopState,
    stats: DebugStats,
}

impl<C: ControllerSource, I: InputInjector> PollingLoop<C, I> {
    pub fn new(source: C, injector: I, settings: Arc<Settings>, options: LoopOptions) -> Self {
        let mut left = vec![DigitalInput::RightTrigger];
        let mut right = vec![DigitalInput::LeftTrigger];
        if options.face_buttons {
            left.push(DigitalInput::Button(Buttons::A));
            right.push(DigitalInput::Button(Buttons::B));
        }
        let buttons = vec![
            ButtonBinding::new(MouseButton::Left, left),
            ButtonBinding::new(MouseButton::Right, right),
        ];
        let keys = match options.left_stick {
            LeftStickMode::Keys => key_bindings(options.keys),
            _ => Vec::new(),
        };

        Self {
            source,
            injector,
            settings,
            options,
            buttons,
            keys,
            sinks: Vec::new(),
            was_connected: false,
            state: LoopState::Running,
            stats: DebugStats::default(),
        }
    }

    pub fn add_status_sink(&mut self, sink: Box<dyn StatusSink>) {
        self.sinks.push(sink);
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Turn one snapshot into this tick's commands, updating tracked state.
    pub fn process(&mut self, snapshot: &ControllerSnapshot) -> Vec<Command> {
        let mut commands = Vec::new();

        if !snapshot.connected {
            if self.was_connected {
                log::debug!("Controller went away ({:?})", self.options.on_disconnect);
                if self.options.on_disconnect == DisconnectPolicy::Release {
                    self.release_all(&mut commands);
                }
            }
            self.was_connected = false;
            return commands;
        }
        self.was_connected = true;

        for binding in &mut self.buttons {
            let pressed = binding.pressed(snapshot);
            if let Some(t) = binding.tracker.update(pressed) {
                commands.push(binding.command(t));
            }
        }

        let settings = &self.settings;
        let axis = |id: AxisId, raw: i16| normalize_stick(raw, settings.axis_deadzone(id));

        let rx = axis(AxisId::RightX, snapshot.right_stick.0);
        let ry = axis(AxisId::RightY, snapshot.right_stick.1);
        let sensitivity = settings.sensitivity();
        // Stick up is positive, screen Y grows downward.
        let dx = rx * sensitivity;
        let dy = -ry * sensitivity;
        if dx != 0.0 || dy != 0.0 {
            commands.push(Command::Move { dx, dy });
            self.stats.moves += 1;
            self.stats.last_cursor = (dx, dy);
        }

        let lx = axis(AxisId::LeftX, snapshot.left_stick.0);
        let ly = axis(AxisId::LeftY, snapshot.left_stick.1);
        match self.options.left_stick {
            LeftStickMode::Scroll => {
                let amount = (ly * SCROLL_MULTIPLIER) as i32;
                if amount != 0 {
                    commands.push(Command::Scroll(amount));
                    self.stats.last_scroll = amount;
                }
            }
            LeftStickMode::Keys => {
                let thresholds = self.options.thresholds;
                for binding in &mut self.keys {
                    let value = if binding.axis == AxisId::LeftX { lx } else { ly };
                    if let Some(t) = binding.mapper.update(value, thresholds) {
                        commands.push(binding.command(t));
                    }
                }
            }
            LeftStickMode::Off => {}
        }

        commands
    }

    /// Close every held button and key, resetting tracked state.
    fn release_all(&mut self, commands: &mut Vec<Command>) {
        for binding in &mut self.buttons {
            if let Some(t) = binding.tracker.release() {
                commands.push(binding.command(t));
            }
        }
        for binding in &mut self.keys {
            if let Some(t) = binding.mapper.release() {
                commands.push(binding.command(t));
            }
        }
    }

    fn dispatch(&mut self, commands: Vec<Command>) {
        for command in commands {
            command.apply(&mut self.injector);
        }
    }

    fn report(&self, connected: bool) {
        let status = Status { connected };
        for sink in &self.sinks {
            sink.report(status);
        }
    }

    /// One iteration: sample, translate, inject, report.
    pub fn tick(&mut self) {
        let snapshot = self.source.read_snapshot();
        let commands = self.process(&snapshot);
        self.dispatch(commands);
        self.report(snapshot.connected);

        if self.options.debug {
            self.debug_line(&snapshot);
        }
    }

    fn debug_line(&mut self, snapshot: &ControllerSnapshot) {
        self.stats.ticks += 1;
        if self.stats.ticks < DEBUG_EVERY {
            return;
        }
        eprintln!(
            "[dbg] conn={} rs({:+6},{:+6}) ls({:+6},{:+6}) lt={:<3} rt={:<3} moves={:<3} last({:+6.2},{:+6.2}) scroll={:+}",
            snapshot.connected,
            snapshot.right_stick.0,
            snapshot.right_stick.1,
            snapshot.left_stick.0,
            snapshot.left_stick.1,
            snapshot.left_trigger,
            snapshot.right_trigger,
            self.stats.moves,
            self.stats.last_cursor.0,
            self.stats.last_cursor.1,
            self.stats.last_scroll,
        );
        self.stats = DebugStats::default();
    }

    /// Run until `cancel` is set. Held inputs are released before returning.
    pub fn run(&mut self, cancel: &CancelToken) {
        log::info!("Polling every {:?}", self.options.tick);

        while self.state() == LoopState::Running {
            let tick_start = Instant::now();

            if cancel.is_cancelled() {
                self.state = LoopState::Cancelled;
                break;
            }

            self.tick();

            if !suspend(tick_start + self.options.tick, cancel) {
                self.state = LoopState::Cancelled;
            }
        }

        let mut commands = Vec::new();
        self.release_all(&mut commands);
        self.dispatch(commands);
        log::info!("Polling loop stopped");
    }
}

/// Sleep until `deadline` in short slices. Returns false if cancelled first.
fn suspend(deadline: Instant, cancel: &CancelToken) -> bool {
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        spin_sleep::sleep((deadline - now).min(SLEEP_SLICE));
    }
}

/// Control surface for a loop running on its own thread.
pub struct LoopHandle {
    cancel: CancelToken,
    settings: Arc<Settings>,
    thread: std::thread::JoinHandle<()>,
}

impl LoopHandle {
    /// Ask the loop to stop. Returns at once; use `join` to wait for it.
    pub fn request_stop(&self) {
        self.cancel.cancel();
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    pub fn join(self) {
        if self.thread.join().is_err() {
            log::error!("Polling thread panicked");
        }
    }
}

/// Spawn `polling` on a dedicated thread.
pub fn start<C, I>(mut polling: PollingLoop<C, I>) -> std::io::Result<LoopHandle>
where
    C: ControllerSource + Send + 'static,
    I: InputInjector + Send + 'static,
{
    let cancel = CancelToken::new();
    let settings = Arc::clone(polling.settings());
    let loop_cancel = cancel.clone();

    let thread = std::thread::Builder::new()
        .name("pad-poller".into())
        .spawn(move || polling.run(&loop_cancel))?;

    Ok(LoopHandle {
        cancel,
        settings,
        thread,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Scripted {
        frames: VecDeque<ControllerSnapshot>,
        connected: bool,
    }

    impl Scripted {
        fn new(frames: impl IntoIterator<Item = ControllerSnapshot>) -> Self {
            Self {
                frames: frames.into_iter().collect(),
                connected: false,
            }
        }
    }

    impl ControllerSource for Scripted {
        fn is_connected(&self) -> bool {
            self.connected
        }

        fn read_snapshot(&mut self) -> ControllerSnapshot {
            let snap = self.frames.pop_front().unwrap_or_default();
            self.connected = snap.connected;
            snap
        }
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Command>>>);

    impl Recorder {
        fn take(&self) -> Vec<Command> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    impl InputInjector for Recorder {
        fn move_cursor_by(&mut self, dx: f32, dy: f32) {
            self.0.lock().unwrap().push(Command::Move { dx, dy });
        }
        fn set_button(&mut self, button: MouseButton, down: bool) {
            self.0.lock().unwrap().push(Command::Button { button, down });
        }
        fn scroll_by(&mut self, amount: i32) {
            self.0.lock().unwrap().push(Command::Scroll(amount));
        }
        fn set_key(&mut self, key: KeyId, down: bool) {
            self.0.lock().unwrap().push(Command::Key { key, down });
        }
    }

    #[derive(Clone, Default)]
    struct StatusLog(Arc<Mutex<Vec<Status>>>);

    impl StatusSink for StatusLog {
        fn report(&self, status: Status) {
            self.0.lock().unwrap().push(status);
        }
    }

    fn connected() -> ControllerSnapshot {
        ControllerSnapshot {
            connected: true,
            ..Default::default()
        }
    }

    fn with_rt(rt: u8) -> ControllerSnapshot {
        ControllerSnapshot {
            right_trigger: rt,
            ..connected()
        }
    }

    fn with_left(x: i16, y: i16) -> ControllerSnapshot {
        ControllerSnapshot {
            left_stick: (x, y),
            ..connected()
        }
    }

    fn polling(options: LoopOptions) -> PollingLoop<Scripted, Recorder> {
        PollingLoop::new(Scripted::new([]), Recorder::default(), Arc::new(Settings::new()), options)
    }

    fn left(down: bool) -> Command {
        Command::Button {
            button: MouseButton::Left,
            down,
        }
    }

    #[test]
    fn half_right_deflection_moves_cursor() {
        let mut p = polling(LoopOptions::default());
        let snap = ControllerSnapshot {
            right_stick: (16384, 0),
            ..connected()
        };
        let cmds = p.process(&snap);
        assert_eq!(cmds.len(), 1);
        let Command::Move { dx, dy } = cmds[0] else {
            panic!("expected move, got {:?}", cmds[0]);
        };
        assert!((dx - 4.1176).abs() < 1e-3, "dx={dx}");
        assert_eq!(dy, 0.0);
    }

    #[test]
    fn stick_up_moves_cursor_up() {
        let mut p = polling(LoopOptions::default());
        let snap = ControllerSnapshot {
            right_stick: (0, i16::MAX),
            ..connected()
        };
        let Command::Move { dx, dy } = p.process(&snap)[0] else {
            panic!("expected move");
        };
        assert_eq!(dx, 0.0);
        assert!(dy < -9.9, "dy={dy}");
    }

    #[test]
    fn resting_sticks_produce_nothing() {
        let mut p = polling(LoopOptions::default());
        let snap = ControllerSnapshot {
            right_stick: (3000, -3000),
            left_stick: (-4000, 4000),
            ..connected()
        };
        assert!(p.process(&snap).is_empty());
    }

    #[test]
    fn trigger_press_is_one_click() {
        let mut p = polling(LoopOptions::default());
        assert_eq!(p.process(&with_rt(0)), vec![]);
        assert_eq!(p.process(&with_rt(80)), vec![left(true)]);
        assert_eq!(p.process(&with_rt(80)), vec![]);
        assert_eq!(p.process(&with_rt(10)), vec![left(false)]);
    }

    #[test]
    fn left_trigger_is_right_button() {
        let mut p = polling(LoopOptions::default());
        let snap = ControllerSnapshot {
            left_trigger: 255,
            ..connected()
        };
        assert_eq!(
            p.process(&snap),
            vec![Command::Button {
                button: MouseButton::Right,
                down: true
            }]
        );
    }

    #[test]
    fn face_buttons_only_when_enabled() {
        let press_a = ControllerSnapshot {
            buttons: Buttons(Buttons::A),
            ..connected()
        };

        let mut p = polling(LoopOptions::default());
        assert!(p.process(&press_a).is_empty());

        let mut p = polling(LoopOptions {
            face_buttons: true,
            ..Default::default()
        });
        assert_eq!(p.process(&press_a), vec![left(true)]);
        assert_eq!(p.process(&connected()), vec![left(false)]);
    }

    #[test]
    fn trigger_and_face_button_share_one_click() {
        let mut p = polling(LoopOptions {
            face_buttons: true,
            ..Default::default()
        });
        let both = ControllerSnapshot {
            buttons: Buttons(Buttons::A),
            ..with_rt(200)
        };
        let a_only = ControllerSnapshot {
            buttons: Buttons(Buttons::A),
            ..connected()
        };

        assert_eq!(p.process(&with_rt(200)), vec![left(true)]);
        assert_eq!(p.process(&both), vec![]);
        assert_eq!(p.process(&a_only), vec![]);
        assert_eq!(p.process(&connected()), vec![left(false)]);
    }

    #[test]
    fn left_stick_scrolls() {
        let mut p = polling(LoopOptions::default());
        assert_eq!(p.process(&with_left(0, i16::MAX)), vec![Command::Scroll(39)]);
        assert_eq!(p.process(&with_left(0, i16::MIN)), vec![Command::Scroll(-40)]);
        assert_eq!(p.process(&with_left(i16::MAX, 0)), vec![]);
    }

    #[test]
    fn left_stick_types_wasd_with_hysteresis() {
        let mut p = polling(LoopOptions {
            left_stick: LeftStickMode::Keys,
            ..Default::default()
        });
        let w = |down| Command::Key { key: KeyId::W, down };

        // 0.6 normalized with a 0.15 deadzone needs raw ~ 0.66 * 32768
        assert_eq!(p.process(&with_left(0, 22000)), vec![w(true)]);
        assert_eq!(p.process(&with_left(0, 22000)), vec![]);
        // ~0.3 normalized: between the thresholds, still held
        assert_eq!(p.process(&with_left(0, 13300)), vec![]);
        assert_eq!(p.process(&with_left(0, 0)), vec![w(false)]);
    }

    #[test]
    fn arrow_layout_covers_all_directions() {
        let mut p = polling(LoopOptions {
            left_stick: LeftStickMode::Keys,
            keys: KeyLayout::Arrows,
            ..Default::default()
        });
        let key = |key, down| Command::Key { key, down };

        assert_eq!(p.process(&with_left(i16::MIN, 0)), vec![key(KeyId::Left, true)]);
        assert_eq!(
            p.process(&with_left(i16::MAX, i16::MIN)),
            vec![
                key(KeyId::Down, true),
                key(KeyId::Left, false),
                key(KeyId::Right, true)
            ]
        );
        assert_eq!(
            p.process(&with_left(0, 0)),
            vec![key(KeyId::Down, false), key(KeyId::Right, false)]
        );
    }

    #[test]
    fn disconnected_tick_computes_nothing_but_reports() {
        let source = Scripted::new([ControllerSnapshot {
            right_stick: (20000, 0),
            right_trigger: 200,
            ..ControllerSnapshot::disconnected()
        }]);
        let recorder = Recorder::default();
        let status = StatusLog::default();
        let mut p = PollingLoop::new(source, recorder.clone(), Arc::new(Settings::new()), LoopOptions::default());
        p.add_status_sink(Box::new(status.clone()));

        p.tick();

        assert!(recorder.take().is_empty());
        assert_eq!(*status.0.lock().unwrap(), vec![Status { connected: false }]);
    }

    #[test]
    fn release_policy_closes_held_inputs_on_disconnect() {
        let mut p = polling(LoopOptions {
            left_stick: LeftStickMode::Keys,
            ..Default::default()
        });
        let held = ControllerSnapshot {
            right_trigger: 200,
            left_stick: (0, i16::MAX),
            ..connected()
        };
        assert_eq!(
            p.process(&held),
            vec![left(true), Command::Key { key: KeyId::W, down: true }]
        );
        assert_eq!(
            p.process(&ControllerSnapshot::disconnected()),
            vec![left(false), Command::Key { key: KeyId::W, down: false }]
        );
        assert_eq!(p.process(&ControllerSnapshot::disconnected()), vec![]);
        // Reconnect with everything released: nothing left to close.
        assert_eq!(p.process(&connected()), vec![]);
    }

    #[test]
    fn hold_policy_keeps_state_until_reconnect() {
        let mut p = polling(LoopOptions {
            on_disconnect: DisconnectPolicy::Hold,
            ..Default::default()
        });
        assert_eq!(p.process(&with_rt(200)), vec![left(true)]);
        assert_eq!(p.process(&ControllerSnapshot::disconnected()), vec![]);
        assert_eq!(p.process(&with_rt(200)), vec![]);
        assert_eq!(p.process(&ControllerSnapshot::disconnected()), vec![]);
        assert_eq!(p.process(&with_rt(0)), vec![left(false)]);
    }

    #[test]
    fn settings_changes_apply_on_next_tick() {
        let mut p = polling(LoopOptions::default());
        let snap = ControllerSnapshot {
            right_stick: (16384, 0),
            ..connected()
        };
        p.settings().set_sensitivity(0.0).unwrap();
        assert!(p.process(&snap).is_empty());

        p.settings().set_sensitivity(10.0).unwrap();
        p.settings().set_axis_deadzone(AxisId::RightX, 0.6).unwrap();
        assert!(p.process(&snap).is_empty());

        p.settings().set_axis_deadzone(AxisId::RightX, 0.0).unwrap();
        let Command::Move { dx, .. } = p.process(&snap)[0] else {
            panic!("expected move");
        };
        assert!((dx - 5.0).abs() < 1e-4);
    }

    #[test]
    fn downs_and_ups_alternate_per_input() {
        let mut p = polling(LoopOptions {
            left_stick: LeftStickMode::Keys,
            face_buttons: true,
            ..Default::default()
        });
        let mut last: Vec<(String, bool)> = Vec::new();
        let mut seed: u32 = 0x2545_f491;
        for _ in 0..2000 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let snap = if seed % 11 == 0 {
                ControllerSnapshot::disconnected()
            } else {
                ControllerSnapshot {
                    connected: true,
                    left_stick: ((seed >> 3) as i16, (seed >> 9) as i16),
                    right_trigger: (seed >> 17) as u8,
                    left_trigger: (seed >> 21) as u8,
                    buttons: Buttons((seed & 0xf000) as u16),
                    ..Default::default()
                }
            };
            for cmd in p.process(&snap) {
                let (id, down) = match cmd {
                    Command::Key { key, down } => (format!("{key:?}"), down),
                    Command::Button { button, down } => (format!("{button:?}"), down),
                    _ => continue,
                };
                match last.iter_mut().find(|(k, _)| *k == id) {
                    Some((_, prev)) => {
                        assert_ne!(*prev, down, "{id} repeated {down}");
                        *prev = down;
                    }
                    None => {
                        assert!(down, "{id} released before press");
                        last.push((id, down));
                    }
                }
            }
        }
    }

    #[test]
    fn cancelled_before_start_runs_no_ticks() {
        let status = StatusLog::default();
        let mut p = polling(LoopOptions::default());
        p.add_status_sink(Box::new(status.clone()));
        let cancel = CancelToken::new();
        cancel.cancel();

        p.run(&cancel);

        assert_eq!(p.state(), LoopState::Cancelled);
        assert!(status.0.lock().unwrap().is_empty());
    }

    #[test]
    fn stop_request_ends_thread_and_releases_buttons() {
        let frames = std::iter::repeat(with_rt(200)).take(100_000);
        let recorder = Recorder::default();
        let status = StatusLog::default();
        let mut p = PollingLoop::new(
            Scripted::new(frames),
            recorder.clone(),
            Arc::new(Settings::new()),
            LoopOptions {
                tick: Duration::from_millis(5),
                ..Default::default()
            },
        );
        p.add_status_sink(Box::new(status.clone()));

        let handle = start(p).unwrap();
        handle.settings().set_sensitivity(3.0).unwrap();
        while status.0.lock().unwrap().len() < 3 {
            std::thread::sleep(Duration::from_millis(1));
        }
        let asked = Instant::now();
        handle.request_stop();
        handle.join();

        assert!(asked.elapsed() < Duration::from_millis(500));
        assert_eq!(recorder.take(), vec![left(true), left(false)]);
    }

    #[test]
    fn suspend_returns_early_on_cancel() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let started = Instant::now();
        assert!(!suspend(started + Duration::from_secs(5), &cancel));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(suspend(Instant::now(), &CancelToken::new()));
    }
}
