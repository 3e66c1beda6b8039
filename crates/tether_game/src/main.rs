//! Tether -- headless gameplay runner.
//!
//! Usage: `tether_game [collision.json] [replay.json] [tuning.json] [level.json] [out.jsonl]`
//!
//! Loads a level, then feeds a recorded replay through the same **fixed-timestep**
//! model a windowed build uses (see `TimeState`):
//!
//!   1. `advance()` -- feed one replay frame of time into the accumulator
//!   2. `while should_step()` -- apply that step's input and run one `Session::step`
//!   3. `end_frame()` -- only after the steps, so input edges are never dropped
//!
//! Cues are logged at `debug`; a summary of the run is logged at the end.
//! With an output path, the cue log is written as JSON lines followed by one
//! `run` line holding the timer.
//! Missing files fall back to a flat test level and an idle replay.

mod attach;
mod checkpoint;
mod collision;
mod config;
mod drone;
mod hazard;
mod hook;
mod joint;
mod level;
mod patrol;
mod player;
mod projectile;
mod registry;
mod replay;
mod session;

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::Serialize;
use tether_core::cues::Sound;
use tether_core::input::InputState;
use tether_core::run_timer::RunTimer;
use tether_core::time::TimeState;

use collision::{load_collision_from_path, CollisionGrid, GridOrigin};
use config::{load_tuning_from_path, Tuning};
use level::{load_level_from_path, LevelFile};
use replay::{load_replay_from_path, ReplaySequence};
use session::Session;

const IDLE_REPLAY_STEPS: u32 = 120;

#[derive(Serialize)]
struct RunSummary<'a> {
    steps: u64,
    checkpoint: Vec2,
    run: &'a RunTimer,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Tether runner starting...");

    let args: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if let Err(err) = run(&args) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn run(args: &[PathBuf]) -> Result<(), String> {
    let grid = load_or_default(args.first(), "collision", load_collision_from_path, || {
        CollisionGrid::flat(64, 32, 1.0, GridOrigin { x: -32.0, y: -1.0 })
    })?;
    let replay = load_or_default(args.get(1), "replay", load_replay_from_path, || {
        ReplaySequence::idle(IDLE_REPLAY_STEPS)
    })?;
    let tuning = load_or_default(args.get(2), "tuning", load_tuning_from_path, Tuning::default)?;
    let level = load_or_default(args.get(3), "level", load_level_from_path, || {
        LevelFile::empty(Vec2::ZERO)
    })?;

    log::info!(
        "Collision '{}' loaded: {} solid cell(s), {}x{} @ {}",
        grid.collision_id,
        grid.cell_count(),
        grid.width,
        grid.height,
        grid.cell_size
    );

    let mut time = TimeState::with_fixed_dt(f64::from(tuning.fixed_dt));
    let mut session = Session::new(tuning, grid, &level);
    let mut input = InputState::new();
    let inputs = replay.expanded_inputs();
    let mut next = 0;
    let mut logged = 0;

    while next < inputs.len() {
        time.advance(f64::from(replay.fixed_dt));

        while next < inputs.len() && time.should_step() {
            let step = inputs[next];
            step.apply(&mut input);
            if let Some(active) = step.cutscene {
                session.set_cutscene(active);
            }
            if step.launch {
                session.force_jump();
            }
            session.step(&input);
            input.end_frame();
            next += 1;
        }
        time.end_frame();

        for cue in &session.cues.cues()[logged..] {
            log::debug!("[step {}] {:?}", session.steps(), cue);
        }
        logged = session.cues.cues().len();
    }

    log_summary(&session);
    if let Some(out) = args.get(4) {
        write_run_log(&session, out)?;
        log::info!("Run log written to {}", out.display());
    }
    Ok(())
}

fn write_run_log(session: &Session, path: &Path) -> Result<(), String> {
    let mut out = session.cues.to_json_lines()?;
    let summary = RunSummary {
        steps: session.steps(),
        checkpoint: session.checkpoint(),
        run: &session.timer,
    };
    let line = serde_json::to_string(&summary)
        .map_err(|e| format!("Failed to encode run summary: {e}"))?;
    out.push_str(&line);
    out.push('\n');
    fs::write(path, out).map_err(|e| format!("Failed to write {}: {e}", path.display()))
}

/// Load `path` if one was given and exists, otherwise use the fallback.
/// A file that exists but fails to load is an error.
fn load_or_default<T>(
    path: Option<&PathBuf>,
    what: &str,
    load: impl Fn(&Path) -> Result<T, String>,
    fallback: impl FnOnce() -> T,
) -> Result<T, String> {
    match path {
        Some(path) if path.exists() => {
            let value = load(path)?;
            log::info!("Loaded {} from {}", what, path.display());
            Ok(value)
        }
        Some(path) => {
            log::warn!(
                "{} file '{}' not found. Using built-in default.",
                what,
                path.display()
            );
            Ok(fallback())
        }
        None => {
            log::info!("No {} file given, using built-in default.", what);
            Ok(fallback())
        }
    }
}

fn log_summary(session: &Session) {
    let player = &session.player;
    let position = player.position();
    log::info!("Replay finished after {} step(s)", session.steps());
    log::info!(
        "Player at ({:.2}, {:.2}) moving ({:.2}, {:.2}), mode {:?}",
        position.x,
        position.y,
        player.velocity.x,
        player.velocity.y,
        player.mode()
    );
    log::info!(
        "Hooks: {} live, {}/{} registered, {} joint(s)",
        session.hooks.len(),
        player.registry.len(),
        player.registry.max_hooks(),
        player.joints.len()
    );
    for hook in session.hooks.iter() {
        if let Some(joint) = hook.joint.and_then(|id| player.joints.get(id)) {
            log::info!(
                "{:?} holding at ({:.2}, {:.2}), damping {:.2}",
                hook.id,
                joint.target.x,
                joint.target.y,
                joint.damping_ratio
            );
        }
    }
    if let Some(us) = session.stun_remaining_us() {
        log::info!("Stunned for another {:.2}s", us as f64 / 1_000_000.0);
    }
    log::info!(
        "Level time {}, run time {}, reboots {}",
        session.timer.level_label(),
        session.timer.total_label(),
        session.timer.reboots
    );

    let sounds = [
        Sound::HookFire,
        Sound::HookHit,
        Sound::Cling,
        Sound::Whoosh,
        Sound::Jump,
        Sound::Stun,
        Sound::Shock,
        Sound::Lose,
    ];
    for sound in sounds {
        let count = session.cues.count_sound(sound);
        if count > 0 {
            log::info!("Sound '{}' played {} time(s)", sound, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::cues::CueSink;

    #[test]
    fn run_log_lists_cues_then_the_run() {
        let mut session = Session::new(
            Tuning::default(),
            CollisionGrid::flat(8, 4, 1.0, GridOrigin { x: -4.0, y: -1.0 }),
            &LevelFile::empty(Vec2::ZERO),
        );
        session.cues.sound(Sound::Jump);
        session.step(&InputState::new());

        let path = std::env::temp_dir().join(format!("tether_run_log_{}.jsonl", std::process::id()));
        write_run_log(&session, &path).expect("run log written");
        let text = fs::read_to_string(&path).expect("read run log");
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].contains("jump"));
        let last = lines.last().expect("summary line");
        assert!(last.contains("\"steps\":1"));
        assert!(last.contains("\"run\""));
        let _ = fs::remove_file(path);
    }
}
