//! Recorded input for headless runs.
//!
//! Each frame describes which bindings are *held* for `repeat` fixed steps.
//! Edges fall out of the held state, so `"fire": true` with `"repeat": 10`
//! fires once and holds the button; two separate fires need a released frame
//! in between.

use glam::Vec2;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tether_core::input::{Action, InputState};

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt: f32,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub move_x: f32,
    #[serde(default)]
    pub move_y: f32,
    #[serde(default)]
    pub jump: bool,
    #[serde(default)]
    pub fire: bool,
    #[serde(default)]
    pub boost: bool,
    #[serde(default)]
    pub debug: bool,
    /// New aim direction; the previous aim is kept when absent.
    #[serde(default)]
    pub aim: Option<Vec2>,
    /// Cutscene lock to apply at the start of this frame.
    #[serde(default)]
    pub cutscene: Option<bool>,
    /// Scripted launch (jump pad) at the start of this frame.
    #[serde(default)]
    pub launch: bool,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

/// One fixed step of replayed input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayInput {
    pub move_x: f32,
    pub move_y: f32,
    pub jump: bool,
    pub fire: bool,
    pub boost: bool,
    pub debug: bool,
    pub aim: Option<Vec2>,
    pub cutscene: Option<bool>,
    pub launch: bool,
}

impl ReplayInput {
    /// Drive `input` to this step's held state.
    pub fn apply(&self, input: &mut InputState) {
        input.set(Action::Left, self.move_x < 0.0);
        input.set(Action::Right, self.move_x > 0.0);
        input.set(Action::Down, self.move_y < 0.0);
        input.set(Action::Up, self.move_y > 0.0);
        input.set(Action::Jump, self.jump);
        input.set(Action::Fire, self.fire);
        input.set(Action::Boost, self.boost);
        input.set(Action::ToggleDebug, self.debug);
        if let Some(aim) = self.aim {
            input.aim = aim;
        }
    }
}

impl ReplaySequence {
    /// `steps` fixed steps of doing nothing.
    pub fn idle(steps: u32) -> Self {
        Self {
            fixed_dt: default_dt(),
            frames: vec![ReplayFrame {
                move_x: 0.0,
                move_y: 0.0,
                jump: false,
                fire: false,
                boost: false,
                debug: false,
                aim: None,
                cutscene: None,
                launch: false,
                repeat: steps,
            }],
        }
    }

    pub fn expanded_inputs(&self) -> Vec<ReplayInput> {
        let mut out = Vec::new();
        for frame in &self.frames {
            for i in 0..frame.repeat.max(1) {
                out.push(ReplayInput {
                    move_x: frame.move_x.clamp(-1.0, 1.0),
                    move_y: frame.move_y.clamp(-1.0, 1.0),
                    jump: frame.jump,
                    fire: frame.fire,
                    boost: frame.boost,
                    debug: frame.debug,
                    aim: frame.aim,
                    cutscene: if i == 0 { frame.cutscene } else { None },
                    launch: i == 0 && frame.launch,
                });
            }
        }
        out
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.fixed_dt <= 0.0 {
        return Err("Replay validation failed: fixed_dt must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    if replay
        .frames
        .iter()
        .any(|f| f.aim.is_some_and(|a| a.length_squared() == 0.0))
    {
        return Err("Replay validation failed: aim must be non-zero".to_string());
    }
    Ok(())
}

const fn default_dt() -> f32 {
    1.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionGrid, GridOrigin};
    use crate::config::Tuning;
    use crate::level::LevelFile;
    use crate::session::Session;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "tether_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn run(replay: &ReplaySequence) -> Session {
        let grid = CollisionGrid::flat(40, 20, 1.0, GridOrigin { x: -20.0, y: -1.0 });
        let tuning = Tuning {
            fixed_dt: replay.fixed_dt,
            ..Tuning::default()
        };
        let mut session = Session::new(tuning, grid, &LevelFile::empty(Vec2::ZERO));
        let mut input = InputState::new();
        for step in replay.expanded_inputs() {
            step.apply(&mut input);
            if let Some(active) = step.cutscene {
                session.set_cutscene(active);
            }
            if step.launch {
                session.force_jump();
            }
            session.step(&input);
            input.end_frame();
        }
        session
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "fixed_dt": 0.016666667,
              "frames": [
                { "move_x": 1.0, "repeat": 3 },
                { "fire": true, "aim": [0.0, 1.0], "cutscene": false, "launch": true, "repeat": 2 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let expanded = replay.expanded_inputs();
        assert_eq!(expanded.len(), 5);
        assert!(expanded[3].fire);
        assert_eq!(expanded[3].aim, Some(Vec2::Y));
        assert_eq!(expanded[3].cutscene, Some(false));
        assert_eq!(expanded[4].cutscene, None);
        assert!(expanded[3].launch);
        assert!(!expanded[4].launch);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn held_fire_produces_a_single_edge() {
        let frames = ReplaySequence {
            fixed_dt: default_dt(),
            frames: vec![ReplayFrame {
                fire: true,
                ..ReplaySequence::idle(4).frames[0].clone()
            }],
        };
        let mut input = InputState::new();
        let mut edges = 0;
        for step in frames.expanded_inputs() {
            step.apply(&mut input);
            if input.is_just_pressed(Action::Fire) {
                edges += 1;
            }
            input.end_frame();
        }
        assert_eq!(edges, 1);
    }

    #[test]
    fn zero_aim_is_rejected() {
        let path = temp_file_path("aim");
        fs::write(&path, r#"{ "frames": [ { "aim": [0.0, 0.0] } ] }"#).expect("write replay file");

        let err = load_replay_from_path(&path).expect_err("zero aim should fail");
        assert!(err.contains("aim must be non-zero"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_run_is_deterministic() {
        let path = temp_file_path("deterministic");
        fs::write(
            &path,
            r#"{
              "fixed_dt": 0.016666667,
              "frames": [
                { "move_x": 1.0, "repeat": 60 },
                { "move_x": 1.0, "jump": true, "repeat": 1 },
                { "move_x": 1.0, "repeat": 20 },
                { "fire": true, "aim": [1.0, 1.0], "repeat": 1 },
                { "repeat": 45 },
                { "jump": true, "repeat": 1 },
                { "move_x": -1.0, "repeat": 45 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let run_a = run(&replay);
        let run_b = run(&replay);

        assert!((run_a.player.aabb.center_x - run_b.player.aabb.center_x).abs() < 0.0001);
        assert!((run_a.player.aabb.center_y - run_b.player.aabb.center_y).abs() < 0.0001);
        assert!((run_a.player.velocity - run_b.player.velocity).length() < 0.0001);
        assert_eq!(run_a.player.mode(), run_b.player.mode());
        assert_eq!(run_a.hooks.len(), run_b.hooks.len());
        assert_eq!(run_a.cues.cues(), run_b.cues.cues());
        assert_eq!(run_a.steps(), 173);

        let _ = fs::remove_file(path);
    }
}
