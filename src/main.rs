mod display;

use std::collections::HashMap;
use std::io::{stdout, BufWriter, Write};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use sky_strike::compute::{
    init_state, player_shoot, restart_game, start_game, tick, toggle_pause, use_bomb, use_laser,
};
use sky_strike::config::Tuning;
use sky_strike::entities::{Controls, GameEvent, GameState, GameStatus, Step};
use sky_strike::random::RngSource;

const FRAME: Duration = Duration::from_millis(16); // ≈60 FPS

/// Min frames between shots while Space is held.
const SHOOT_COOLDOWN: u32 = 10;

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames.  Covers terminals that don't emit key-release events.
const HOLD_WINDOW: u64 = 8;

/// Set to ring the terminal bell whenever an enemy goes down.
const BELL_ENV: &str = "SKY_STRIKE_BELL";

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn any_held(key_frame: &HashMap<KeyCode, u64>, keys: &[KeyCode], frame: u64) -> bool {
    keys.iter().any(|k| is_held(key_frame, k, frame))
}

// ── Audio ─────────────────────────────────────────────────────────────────────

/// Fire-and-forget sound cues.  Write failures are ignored.
struct AudioSink {
    bell: bool,
}

impl AudioSink {
    fn play<W: Write>(&self, out: &mut W, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::Fired { bullets } => log::trace!("sfx: shoot x{}", bullets),
                GameEvent::EnemyDestroyed { tier, .. } => {
                    log::trace!("sfx: explosion ({:?})", tier);
                    if self.bell {
                        let _ = out.write_all(b"\x07");
                    }
                }
                _ => {}
            }
        }
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Drives the engine until the player quits.
///
/// Input model: a `key_frame` map records the frame of the last press/repeat
/// event for every key.  Each frame we check which keys are still "fresh" and
/// apply their effects together, so Space + A/D can be held simultaneously.
/// One-shot actions (pause, bomb, laser, start) fire on the press itself.
fn game_loop<W: Write>(
    out: &mut W,
    state: &mut GameState,
    rx: &mpsc::Receiver<Event>,
    audio: &AudioSink,
) -> std::io::Result<()> {
    let mut rng = RngSource(StdRng::from_entropy());
    let clock = Instant::now();

    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut shoot_cooldown: u32 = 0;
    let mut frame: u64 = 0;
    let mut best_score: u32 = 0;

    loop {
        let frame_start = Instant::now();
        let now = clock.elapsed().as_millis() as u64;
        frame += 1;
        let mut events: Vec<GameEvent> = Vec::new();

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            let Event::Key(KeyEvent {
                code,
                kind,
                modifiers,
                ..
            }) = ev
            else {
                continue;
            };
            match kind {
                KeyEventKind::Press => {
                    key_frame.insert(code, frame);
                    match code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(());
                        }
                        KeyCode::Enter => {
                            *state = match state.status {
                                GameStatus::Menu => start_game(state),
                                GameStatus::GameOver => restart_game(state),
                                _ => state.clone(),
                            };
                        }
                        KeyCode::Esc | KeyCode::Char('p') | KeyCode::Char('P') => {
                            *state = toggle_pause(state);
                        }
                        KeyCode::Char('b') | KeyCode::Char('B') => {
                            let step = use_bomb(state, now);
                            apply(state, step, &mut events);
                        }
                        KeyCode::Char('l') | KeyCode::Char('L') => {
                            let step = use_laser(state, now);
                            apply(state, step, &mut events);
                        }
                        _ => {}
                    }
                }
                KeyEventKind::Repeat => {
                    key_frame.insert(code, frame);
                }
                KeyEventKind::Release => {
                    key_frame.remove(&code);
                }
            }
        }

        // ── Held keys → engine ────────────────────────────────────────────────
        if state.status == GameStatus::Playing {
            let controls = Controls {
                left: any_held(
                    &key_frame,
                    &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')],
                    frame,
                ),
                right: any_held(
                    &key_frame,
                    &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')],
                    frame,
                ),
            };
            let shoot = is_held(&key_frame, &KeyCode::Char(' '), frame);

            if shoot_cooldown == 0 && shoot {
                let step = player_shoot(state, now);
                apply(state, step, &mut events);
                shoot_cooldown = SHOOT_COOLDOWN;
            }
            let step = tick(state, controls, now, &mut rng);
            apply(state, step, &mut events);
        }
        shoot_cooldown = shoot_cooldown.saturating_sub(1);

        if state.status == GameStatus::GameOver {
            best_score = best_score.max(state.score);
        }

        audio.play(out, &events);
        display::render(out, state, now, best_score)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            thread::sleep(FRAME - elapsed);
        }
    }
}

fn apply(state: &mut GameState, step: Step, events: &mut Vec<GameEvent>) {
    *state = step.state;
    events.extend(step.events);
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let tuning = Tuning::from_env().context("loading tuning")?;
    let audio = AudioSink {
        bell: std::env::var_os(BELL_ENV).is_some(),
    };
    log::info!(
        "playfield {}x{}, {} lives",
        tuning.width,
        tuning.height,
        tuning.starting_lives
    );

    let mut out = BufWriter::new(stdout());
    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads so the game loop
    // never blocks on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break; // receiver dropped → program exiting
            }
        }
    });

    let mut state = init_state(tuning);
    let result = game_loop(&mut out, &mut state, &rx, &audio);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    log::info!("exiting with score {}", state.score);
    result.context("terminal I/O")
}
