//! Tiny Joypad desktop simulator v0.1.1.
//!
//! Runs the real menu core against simulated peripherals:
//!
//! - **GUI mode** (default): Scaled window with buzzer audio, keyboard/gamepad
//!   input, PNG screenshot and mute toggle.
//! - **Headless mode** (`--headless`): Scripted input with ASCII snapshots,
//!   for automated checks.
//!
//! The direction pad is emulated at the ADC level: held directions are turned
//! into the calibration sample the resistor ladder would produce, so the core
//! decodes them exactly as on hardware (diagonals included).

mod logger;

use joypad_core::hal::{DelayProvider, DisplaySurface};
use joypad_core::menu::{draw_startup_logo, LOGO_BYTES};
use joypad_core::sim::{ScriptedAdc, SimClock, SimPin};
use joypad_core::{
    png, settings, waveform, Calibration, DirectionSet, Game, Joypad, MenuContext, PageDisplay,
    Random, SCREEN_HEIGHT, SCREEN_PAGES, SCREEN_WIDTH,
};
use gilrs::{Axis, Button as GilrsButton, Event as GilrsEvent, EventType, Gilrs};
use log::{debug, error, info, warn, LevelFilter};
use minifb::{Key, Scale, ScaleMode, Window, WindowOptions};
use std::collections::VecDeque;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Audio output sample rate in Hz
const AUDIO_SAMPLE_RATE: u32 = 44100;
/// Square wave amplitude (0.0–1.0)
const AUDIO_VOLUME: f32 = 0.15;
/// Analog stick deadzone
const STICK_DEADZONE: f32 = 0.3;
/// Default settings file
const DEFAULT_SETTINGS: &str = "joypad.settings";

type SimJoypad = Joypad<ScriptedAdc, SimPin, SimPin, HostDelay>;
type AudioRing = Arc<Mutex<VecDeque<f32>>>;

// ─── Delay ──────────────────────────────────────────────────────────────────

/// Advances the virtual clock and, in realtime mode, sleeps to match it.
///
/// Microsecond waits are far below the OS timer resolution, so they are
/// accumulated and slept off once they add up to a millisecond.
struct HostDelay {
    clock: SimClock,
    realtime: bool,
    debt_us: u64,
}

impl HostDelay {
    fn new(clock: SimClock, realtime: bool) -> Self {
        HostDelay { clock, realtime, debt_us: 0 }
    }

    fn wait(&mut self, us: u64) {
        self.clock.advance_us(us);
        if !self.realtime {
            return;
        }
        self.debt_us += us;
        if self.debt_us >= 1000 {
            std::thread::sleep(Duration::from_micros(self.debt_us));
            self.debt_us = 0;
        }
    }
}

impl DelayProvider for HostDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.wait(ms as u64 * 1000);
    }

    fn delay_us(&mut self, us: u32) {
        self.wait(us as u64);
    }
}

// ─── Audio ──────────────────────────────────────────────────────────────────

/// Drains rendered buzzer samples; silence when the ring runs dry.
struct BuzzerSource {
    ring: AudioRing,
    sample_rate: u32,
}

impl Iterator for BuzzerSource {
    type Item = f32;
    fn next(&mut self) -> Option<f32> {
        if let Ok(mut ring) = self.ring.try_lock() {
            if let Some(s) = ring.pop_front() {
                return Some(s);
            }
        }
        Some(0.0)
    }
}

impl rodio::Source for BuzzerSource {
    fn current_frame_len(&self) -> Option<usize> { None }
    fn channels(&self) -> u16 { 1 }
    fn sample_rate(&self) -> u32 { self.sample_rate }
    fn total_duration(&self) -> Option<Duration> { None }
}

fn setup_audio(ring: AudioRing) -> Option<(rodio::OutputStream, rodio::OutputStreamHandle, rodio::Sink)> {
    match rodio::OutputStream::try_default() {
        Ok((stream, handle)) => {
            match rodio::Sink::try_new(&handle) {
                Ok(sink) => {
                    sink.append(BuzzerSource { ring, sample_rate: AUDIO_SAMPLE_RATE });
                    Some((stream, handle, sink))
                }
                Err(e) => { warn!("audio sink: {}", e); None }
            }
        }
        Err(e) => { warn!("audio device: {}", e); None }
    }
}

/// Turns the buzzer pin's edge log into PCM, one span per call.
struct BuzzerTap {
    rendered_until_us: u64,
    level: bool,
    pcm: Vec<f32>,
}

impl BuzzerTap {
    fn new() -> Self {
        BuzzerTap { rendered_until_us: 0, level: true, pcm: Vec::with_capacity(16384) }
    }

    fn drain(&mut self, joypad: &mut SimJoypad, now_us: u64, ring: Option<&AudioRing>) {
        let edges = joypad.buzzer.pin_mut().take_edges();
        self.pcm.clear();
        self.level = waveform::render_edges(
            &edges, self.level, self.rendered_until_us, now_us,
            AUDIO_SAMPLE_RATE, AUDIO_VOLUME, &mut self.pcm,
        );
        self.rendered_until_us = now_us;
        if edges.is_empty() {
            return;
        }
        if let Some(ring) = ring {
            if let Ok(mut ring) = ring.lock() {
                // Limit buffer to avoid latency buildup
                let max_buf = AUDIO_SAMPLE_RATE as usize; // ~1s
                if ring.len() < max_buf {
                    ring.extend(self.pcm.iter());
                }
            }
        }
    }
}

// ─── Gamepad ────────────────────────────────────────────────────────────────

struct GamepadState {
    up: bool, down: bool, left: bool, right: bool,
    action: bool, back: bool,
    left_stick_x: f32, left_stick_y: f32,
}

impl GamepadState {
    fn new() -> Self {
        GamepadState {
            up: false, down: false, left: false, right: false,
            action: false, back: false, left_stick_x: 0.0, left_stick_y: 0.0,
        }
    }
    fn eff_up(&self)    -> bool { self.up    || self.left_stick_y < -STICK_DEADZONE }
    fn eff_down(&self)  -> bool { self.down  || self.left_stick_y >  STICK_DEADZONE }
    fn eff_left(&self)  -> bool { self.left  || self.left_stick_x < -STICK_DEADZONE }
    fn eff_right(&self) -> bool { self.right || self.left_stick_x >  STICK_DEADZONE }
}

fn init_gamepad() -> Option<Gilrs> {
    match Gilrs::new() {
        Ok(gilrs) => {
            let mut found = false;
            for (id, gp) in gilrs.gamepads() {
                debug!("gamepad [{}] \"{}\" ({})", id, gp.name(), gp.os_name());
                found = true;
            }
            if !found { debug!("no gamepad (hot-plug supported)"); }
            Some(gilrs)
        }
        Err(e) => { warn!("gamepad: {}", e); None }
    }
}

fn poll_gamepad(gilrs: &mut Gilrs, state: &mut GamepadState) {
    while let Some(GilrsEvent { event, .. }) = gilrs.next_event() {
        match event {
            EventType::ButtonPressed(b, _)  => apply_button(state, b, true),
            EventType::ButtonReleased(b, _) => apply_button(state, b, false),
            EventType::AxisChanged(a, v, _) => apply_axis(state, a, v),
            EventType::Connected => debug!("gamepad connected"),
            EventType::Disconnected => { debug!("gamepad disconnected"); *state = GamepadState::new(); }
            _ => {}
        }
    }
}

fn apply_button(state: &mut GamepadState, btn: GilrsButton, pressed: bool) {
    match btn {
        GilrsButton::DPadUp    => state.up    = pressed,
        GilrsButton::DPadDown  => state.down  = pressed,
        GilrsButton::DPadLeft  => state.left  = pressed,
        GilrsButton::DPadRight => state.right = pressed,
        GilrsButton::South | GilrsButton::Start => state.action = pressed,
        GilrsButton::East | GilrsButton::Select => state.back = pressed,
        _ => {}
    }
}

fn apply_axis(state: &mut GamepadState, axis: Axis, value: f32) {
    match axis {
        Axis::LeftStickX  => state.left_stick_x = value,
        // gilrs reports up as positive
        Axis::LeftStickY  => state.left_stick_y = -value,
        Axis::DPadX => { state.left = value < -STICK_DEADZONE; state.right = value > STICK_DEADZONE; }
        Axis::DPadY => { state.up = value > STICK_DEADZONE; state.down = value < -STICK_DEADZONE; }
        _ => {}
    }
}

// ─── Console ────────────────────────────────────────────────────────────────

/// What the outer loop is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Menu,
    Playing(Game),
}

/// Simulated console: peripherals, menu state and the game dispatcher.
struct Console {
    joypad: SimJoypad,
    display: PageDisplay,
    menu: MenuContext,
    rng: Random,
    calibration: Calibration,
    mode: Mode,
    clock: SimClock,
}

impl Console {
    fn new(realtime: bool, saved: Option<settings::Settings>) -> Self {
        let (menu, rng, calibration) = match saved {
            Some(s) => match s.restore() {
                Ok((menu, rng)) => (menu, rng, s.calibration),
                Err(e) => {
                    warn!("ignoring settings: {}", e);
                    (MenuContext::new(), Random::new(), Calibration::default())
                }
            },
            None => (MenuContext::new(), Random::new(), Calibration::default()),
        };
        let clock = SimClock::new();
        let mut joypad = Joypad::with_calibration(
            ScriptedAdc::new(0),
            SimPin::new(clock.clone(), true),
            SimPin::new(clock.clone(), false),
            HostDelay::new(clock.clone(), realtime),
            calibration,
        );
        joypad.init();
        Console {
            joypad, display: PageDisplay::new(), menu, rng, calibration,
            mode: Mode::Menu, clock,
        }
    }

    /// Optional splash, then the start jingle.
    fn boot(&mut self, logo: Option<&[u8; LOGO_BYTES]>) {
        if let Some(logo) = logo {
            draw_startup_logo(&mut self.display, logo);
        }
        let sound = self.menu.sound_enabled();
        self.joypad.play_start_jingle(sound);
        if logo.is_some() {
            self.display.clear();
        }
    }

    /// Latch the player's input onto the simulated lines.
    fn set_input(&mut self, dirs: DirectionSet, action: bool) {
        // Opposing directions cannot be produced by the ladder; read as released
        let sample = self.calibration.sample_for(dirs).unwrap_or(0);
        self.joypad.pad.adc_mut().set_rest(sample);
        self.joypad.action.pin_mut().force(!action);
    }

    /// One loop tick. `back` leaves a running game.
    fn tick(&mut self, back: bool) {
        match self.mode {
            Mode::Menu => {
                if let Some(game) = self.menu.poll(&mut self.joypad, &mut self.display) {
                    info!("launching {} (state {})", game.label(), game.state() as u8);
                    self.display.clear();
                    self.mode = Mode::Playing(game);
                }
            }
            Mode::Playing(game) => {
                if back {
                    info!("leaving {}", game.label());
                    self.display.clear();
                    self.menu.invalidate();
                    self.mode = Mode::Menu;
                    return;
                }
                self.draw_noise();
                // roughly one frame
                self.joypad.delay.delay_ms(16);
            }
        }
    }

    /// Stand-in for game logic: fill the screen with generator output.
    fn draw_noise(&mut self) {
        for page in 0..SCREEN_PAGES as u8 {
            self.display.data_start(page);
            for _ in 0..SCREEN_WIDTH {
                self.display.send(self.rng.next_u8());
            }
            self.display.data_end();
        }
    }

    fn snapshot_settings(&self) -> settings::Settings {
        settings::Settings::capture(&self.menu, &self.rng, self.calibration)
    }
}

fn save_screenshot(display: &PageDisplay, path: &str) -> Result<(), String> {
    fs::write(path, png::screenshot(display)).map_err(|e| format!("{}: {}", path, e))
}

fn load_logo(path: &str) -> Result<[u8; LOGO_BYTES], String> {
    let data = fs::read(path).map_err(|e| format!("{}: {}", path, e))?;
    <[u8; LOGO_BYTES]>::try_from(data.as_slice())
        .map_err(|_| format!("{}: expected {} bytes, got {}", path, LOGO_BYTES, data.len()))
}

fn load_settings(path: &Path) -> Option<settings::Settings> {
    if !path.exists() {
        return None;
    }
    match settings::load_from_file(path) {
        Ok(s) => { info!("settings loaded from {}", path.display()); Some(s) }
        Err(e) => { warn!("settings {}: {}", path.display(), e); None }
    }
}

fn store_settings(console: &Console, path: &Path) {
    match settings::save_to_file(&console.snapshot_settings(), path) {
        Ok(()) => debug!("settings saved to {}", path.display()),
        Err(e) => error!("settings {}: {}", path.display(), e),
    }
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Tiny Joypad Simulator v0.1.1 - Rust");
        eprintln!("Usage: {} [options]", args[0]);
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --headless           Run without GUI");
        eprintln!("  --frames N           Run N polls (headless, default 60)");
        eprintln!("  --press F:KEYS       Hold KEYS (U D L R A B) during poll F (repeatable)");
        eprintln!("  --snapshot F         Print display after poll F (repeatable)");
        eprintln!("  --mute               Disable audio");
        eprintln!("  --scale N            Initial scale 1-6 (default 6)");
        eprintln!("  --settings PATH      Settings file (default {})", DEFAULT_SETTINGS);
        eprintln!("  --logo PATH          Raw 64x64 page-major startup logo ({} bytes)", LOGO_BYTES);
        eprintln!("  --debug              Verbose logging");
        eprintln!("  --quiet              Warnings and errors only");
        eprintln!();
        eprintln!("GUI keys: Arrows=Pad Z=Action X=Back 1-6=Scale");
        eprintln!("          S=Screenshot M=Mute Esc=Quit");
        std::process::exit(1);
    }

    let level = if args.iter().any(|a| a == "--debug") {
        LevelFilter::Debug
    } else if args.iter().any(|a| a == "--quiet") {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };
    if let Err(e) = logger::StderrLogger::init(level) {
        eprintln!("Warning: logger: {}", e);
    }

    let headless = args.iter().any(|a| a == "--headless");
    let mute = args.iter().any(|a| a == "--mute");
    let initial_scale: usize = arg_value(&args, "--scale")
        .and_then(|s| s.parse().ok())
        .unwrap_or(6).clamp(1, 6);
    let settings_path = PathBuf::from(arg_value(&args, "--settings").unwrap_or(DEFAULT_SETTINGS));
    let logo = arg_value(&args, "--logo").and_then(|p| match load_logo(p) {
        Ok(logo) => Some(logo),
        Err(e) => { warn!("logo {}", e); None }
    });

    if headless {
        // Headless runs are reproducible: no settings file unless asked for
        let saved = arg_value(&args, "--settings").and_then(|_| load_settings(&settings_path));
        let mut console = Console::new(false, saved);
        run_headless(&args, &mut console, logo.as_ref());
    } else {
        let mut console = Console::new(true, load_settings(&settings_path));
        run_gui(&mut console, mute, initial_scale, logo.as_ref());
        store_settings(&console, &settings_path);
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn arg_values<'a>(args: &'a [String], flag: &str) -> Vec<&'a str> {
    args.windows(2)
        .filter(|w| w[0] == flag)
        .map(|w| w[1].as_str())
        .collect()
}

// ─── GUI Mode ───────────────────────────────────────────────────────────────

fn open_window(w: usize, h: usize) -> Result<Window, String> {
    let mut window = Window::new(
        "Tiny Joypad v0.1.1", w, h,
        WindowOptions {
            scale: Scale::X1,
            scale_mode: ScaleMode::AspectRatioStretch,
            resize: true,
            ..Default::default()
        },
    ).map_err(|e| format!("window: {}", e))?;
    window.set_target_fps(60);
    Ok(window)
}

fn run_gui(console: &mut Console, start_muted: bool, initial_scale: usize, logo: Option<&[u8; LOGO_BYTES]>) {
    let mut scale = initial_scale;
    let mut scaled_w = SCREEN_WIDTH * scale;
    let mut scaled_h = SCREEN_HEIGHT * scale;
    let mut window = match open_window(scaled_w, scaled_h) {
        Ok(w) => w,
        Err(e) => { error!("{}", e); return; }
    };

    let audio_ring: AudioRing = Arc::new(Mutex::new(VecDeque::with_capacity(16384)));
    let mut muted = start_muted;
    let mut _audio = if !muted { setup_audio(audio_ring.clone()) } else { None };
    let mut tap = BuzzerTap::new();

    let mut gilrs = init_gamepad();
    let mut gp = GamepadState::new();
    let mut scaled_buf = vec![0u32; scaled_w * scaled_h];
    let mut prev_m = false;
    let mut prev_s = false;
    let mut prev_num = [false; 6];
    let mut screenshot_n = 0u32;
    let mut last_title = Instant::now();

    console.boot(logo);
    tap.drain(&mut console.joypad, console.clock.now_us(), if muted { None } else { Some(&audio_ring) });

    while window.is_open() && !window.is_key_down(Key::Escape) {
        if let Some(ref mut g) = gilrs { poll_gamepad(g, &mut gp); }

        // Scale toggle (1-6)
        let mut rescaled = false;
        let num = [
            window.is_key_down(Key::Key1), window.is_key_down(Key::Key2),
            window.is_key_down(Key::Key3), window.is_key_down(Key::Key4),
            window.is_key_down(Key::Key5), window.is_key_down(Key::Key6),
        ];
        for i in 0..6 {
            if num[i] && !prev_num[i] {
                scale = i + 1;
                scaled_w = SCREEN_WIDTH * scale;
                scaled_h = SCREEN_HEIGHT * scale;
                scaled_buf.resize(scaled_w * scaled_h, 0);
                rescaled = true;
                match open_window(scaled_w, scaled_h) {
                    Ok(w) => window = w,
                    Err(e) => { error!("{}", e); return; }
                }
            }
        }
        prev_num = num;

        // Mute (M)
        let m = window.is_key_down(Key::M);
        if m && !prev_m {
            muted = !muted;
            _audio = if muted { None } else { setup_audio(audio_ring.clone()) };
            info!("audio {}", if muted { "muted" } else { "on" });
        }
        prev_m = m;

        // Screenshot (S)
        let s = window.is_key_down(Key::S);
        if s && !prev_s {
            let f = format!("screenshot_{:04}.png", screenshot_n);
            match save_screenshot(&console.display, &f) {
                Ok(()) => { info!("screenshot: {}", f); screenshot_n += 1; }
                Err(e) => error!("screenshot: {}", e),
            }
        }
        prev_s = s;

        // Input
        let dirs = DirectionSet {
            up:    window.is_key_down(Key::Up)    || gp.eff_up(),
            down:  window.is_key_down(Key::Down)  || gp.eff_down(),
            left:  window.is_key_down(Key::Left)  || gp.eff_left(),
            right: window.is_key_down(Key::Right) || gp.eff_right(),
        };
        let action = window.is_key_down(Key::Z) || gp.action;
        let back = window.is_key_down(Key::X) || gp.back;
        console.set_input(dirs, action);

        console.tick(back);
        tap.drain(&mut console.joypad, console.clock.now_us(), if muted { None } else { Some(&audio_ring) });

        // Render (rescale only when the core drew something)
        let cur_scale = scaled_w / SCREEN_WIDTH;
        if console.display.take_dirty() || rescaled {
            blit_scaled(&console.display, cur_scale, scaled_w, &mut scaled_buf);
        }
        if let Err(e) = window.update_with_buffer(&scaled_buf, scaled_w, scaled_h) {
            error!("window update: {}", e);
            return;
        }

        if last_title.elapsed() >= Duration::from_secs(1) {
            let ms = if muted { " [MUTE]" } else { "" };
            let snd = if console.menu.sound_enabled() { "on" } else { "off" };
            window.set_title(&format!("Tiny Joypad v0.1.1 - {:?} sound:{}{} ({}x)",
                console.mode, snd, ms, cur_scale));
            last_title = Instant::now();
        }
    }
}

/// Nearest-neighbour upscale of the framebuffer into the window buffer.
fn blit_scaled(display: &PageDisplay, scale: usize, scaled_w: usize, out: &mut [u32]) {
    let pixels = display.as_pixel_buffer();
    for y in 0..SCREEN_HEIGHT {
        for x in 0..SCREEN_WIDTH {
            let c = pixels[y * SCREEN_WIDTH + x];
            for sy in 0..scale {
                let base = (y * scale + sy) * scaled_w + x * scale;
                for sx in 0..scale {
                    if base + sx < out.len() { out[base + sx] = c; }
                }
            }
        }
    }
}

// ─── Headless Mode ──────────────────────────────────────────────────────────

/// Parse `F:KEYS` into a poll index and the keys held during it.
fn parse_press(arg: &str) -> Option<(usize, DirectionSet, bool, bool)> {
    let (frame, keys) = arg.split_once(':')?;
    let frame = frame.parse().ok()?;
    let mut dirs = DirectionSet::default();
    let (mut action, mut back) = (false, false);
    for k in keys.chars() {
        match k.to_ascii_uppercase() {
            'U' => dirs.up = true,
            'D' => dirs.down = true,
            'L' => dirs.left = true,
            'R' => dirs.right = true,
            'A' => action = true,
            'B' => back = true,
            _ => return None,
        }
    }
    Some((frame, dirs, action, back))
}

fn run_headless(args: &[String], console: &mut Console, logo: Option<&[u8; LOGO_BYTES]>) {
    let frames: usize = arg_value(args, "--frames")
        .and_then(|s| s.parse().ok())
        .unwrap_or(60);
    let mut presses = Vec::new();
    for arg in arg_values(args, "--press") {
        match parse_press(arg) {
            Some(p) => presses.push(p),
            None => warn!("bad --press {:?} (want F:KEYS)", arg),
        }
    }
    let snapshots: Vec<usize> = arg_values(args, "--snapshot")
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    console.boot(logo);
    debug!("running {} polls", frames);
    for frame in 0..frames {
        let held = presses.iter().find(|p| p.0 == frame);
        let (dirs, action, back) = held
            .map(|&(_, d, a, b)| (d, a, b))
            .unwrap_or((DirectionSet::default(), false, false));
        console.set_input(dirs, action);
        console.display.dbg_reset_counters();
        let t0 = console.clock.now_us();
        console.tick(back);
        let t1 = console.clock.now_us();
        debug!("poll {:3}: +{:7}us rows={} bytes={} mode={:?} pos={} sound={}",
            frame + 1, t1 - t0, console.display.dbg_rows, console.display.dbg_data_count,
            console.mode, console.menu.position(), console.menu.sound_enabled());
        if snapshots.contains(&(frame + 1)) {
            println!("\n  === Poll {} ({} px lit) ===", frame + 1, console.display.lit_pixels());
            print!("{}", console.display.to_ascii());
        }
    }
    println!("mode={:?} position={} sound={} rng=0x{:04X} time={}us",
        console.mode, console.menu.position(), console.menu.sound_enabled(),
        console.rng.state(), console.clock.now_us());
}
