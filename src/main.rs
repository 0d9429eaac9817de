/// Entry point and frame loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::execute;

use config::GameConfig;
use sim::event::GameEvent;
use sim::session::Session;
use ui::gamepad::GamepadState;
use ui::input::{Command, KeyTracker};
use ui::renderer::{Renderer, Screen};
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
/// Longest slice of game time one frame may advance (e.g. after a stall).
const MAX_STEP: Duration = Duration::from_millis(250);

fn main() {
    let config = match GameConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };
    init_logging(&config);

    let session = match Session::start(&config) {
        Ok(s) => s,
        Err(e) => {
            log::error!("could not start: {e}");
            eprintln!("Could not start: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }
    let mut kb = KeyTracker::new();
    kb.honor_release = enable_key_release();

    let mut sound = SoundEngine::new();

    let result = game_loop(session, &mut renderer, &mut kb, sound.as_mut(), &config);

    if kb.honor_release {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game error: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Golemfall!");
}

/// Logs go to a file; the terminal belongs to the game. `RUST_LOG`
/// overrides the configured level.
fn init_logging(config: &GameConfig) {
    let file = match File::create(&config.log_file) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Logging disabled ({}): {e}", config.log_file.display());
            return;
        }
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .target(env_logger::Target::Pipe(Box::new(file)))
    .format_timestamp_millis()
    .init();
}

/// Ask the terminal for Release events. Returns whether it agreed.
fn enable_key_release() -> bool {
    let supported = crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
    if !supported {
        log::info!("keyboard enhancement unsupported, using hold timeout");
        return false;
    }
    execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok()
}

fn game_loop(
    mut session: Session,
    renderer: &mut Renderer,
    kb: &mut KeyTracker,
    mut sound: Option<&mut SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let mut screen = Screen::Title;
    let mut last_step = Instant::now();
    let mut last_frame = Instant::now();
    let frame_rate = config.timing.frame();

    loop {
        kb.drain_events();
        gp.update();

        if kb.pressed(Command::Quit) {
            break;
        }
        if kb.pressed(Command::Mute) || gp.mute_pressed() {
            session.toggle_mute();
        }
        let confirm = kb.pressed(Command::Confirm) || gp.confirm_pressed();

        match screen {
            Screen::Title => {
                if confirm {
                    screen = Screen::Playing;
                    last_step = Instant::now();
                }
            }
            Screen::Playing | Screen::Won | Screen::Lost => {
                let ended = screen != Screen::Playing;
                if kb.pressed(Command::Restart) || (ended && confirm) {
                    let muted = session.is_muted();
                    play_all(&mut sound, &session.request_restart());
                    session = Session::start(config)?;
                    session.set_muted(muted);
                    screen = Screen::Playing;
                    last_step = Instant::now();
                }

                let mut input = kb.snapshot();
                gp.merge_into(&mut input);
                session.set_input(input);

                let dt = last_step.elapsed().min(MAX_STEP);
                last_step = Instant::now();
                let events = session.advance(dt);
                for event in &events {
                    match event {
                        GameEvent::Won => screen = Screen::Won,
                        GameEvent::Lost => screen = Screen::Lost,
                        _ => {}
                    }
                }
                play_all(&mut sound, &events);
            }
        }

        if last_frame.elapsed() >= frame_rate {
            renderer.render(screen, &session)?;
            last_frame = Instant::now();
        }

        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn play_all(sound: &mut Option<&mut SoundEngine>, events: &[GameEvent]) {
    for &event in events {
        if event.is_signal() {
            log::info!("signal: {event:?}");
        } else if let Some(sfx) = sound.as_deref_mut() {
            sfx.play(event);
        }
    }
}
