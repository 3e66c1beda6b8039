//! Tuning values injected into entities at setup.
//!
//! Defaults are the values the game shipped with. Most of them were tuned by
//! feel, so they are kept as data rather than derived.

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub fixed_dt: f32,
    pub player: PlayerTuning,
    pub hook: HookTuning,
    pub hazard: HazardTuning,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub half_width: f32,
    pub half_height: f32,
    pub mass: f32,
    pub gravity: f32,
    pub move_speed: f32,
    /// Move direction lerps toward intent by `acceleration / 10` per step.
    pub acceleration: f32,
    pub jump_force: f32,
    /// Horizontal velocity bleed per second while on the ground.
    pub friction_ground: f32,
    /// Extra fall force applies while airborne and `velocity.y` is below this.
    pub fall_boost_below: f32,
    pub ground_probe_radius: f32,
    pub stunned_hop: f32,
    pub stun_slowdown: f32,
    pub debug_speed: f32,
    pub debug_boost_speed: f32,

    pub max_hooks: usize,
    pub airborne_fire_limit: u32,
    /// Joint spring frequency (Hz) while pulled toward a hook.
    pub hook_frequency: f32,
    pub hook_damping: f32,
    /// Joint force cap, also the per-axis velocity cap on release.
    pub hook_force: f32,
    /// Vertical velocity is divided by this when a pull starts.
    pub pull_vertical_divisor: f32,
    /// Below this speed a jump while pulled becomes a hop.
    pub hop_speed_threshold: f32,
    /// Hooks spawn this far from the player centre along the aim.
    pub aim_offset: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HookTuning {
    pub speed: f32,
    /// Max travel for hooks fired by the player.
    pub fire_distance: f32,
    pub return_threshold: f32,
    pub gravity_scale: f32,
    pub contact_radius: f32,
    pub unhookable_kick: f32,
    pub drone_guard_radius: f32,
    pub drone_guard_secs: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HazardTuning {
    pub stun_secs: f32,
    pub recharge_secs: f32,
    pub knockback: f32,
    pub kill_height: f32,
    pub respawn_secs: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            player: PlayerTuning::default(),
            hook: HookTuning::default(),
            hazard: HazardTuning::default(),
        }
    }
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            half_width: 0.4,
            half_height: 0.5,
            mass: 1.0,
            gravity: -9.81,
            move_speed: 8.0,
            acceleration: 2.0,
            jump_force: 12.0,
            friction_ground: 20.0,
            fall_boost_below: 3.0,
            ground_probe_radius: 0.3,
            stunned_hop: 3.0,
            stun_slowdown: 4.0,
            debug_speed: 20.0,
            debug_boost_speed: 40.0,
            max_hooks: 2,
            airborne_fire_limit: 14,
            hook_frequency: 3.0,
            hook_damping: 0.5,
            hook_force: 20.0,
            pull_vertical_divisor: 2.5,
            hop_speed_threshold: 6.0,
            aim_offset: 0.5,
        }
    }
}

impl Default for HookTuning {
    fn default() -> Self {
        Self {
            speed: 35.0,
            fire_distance: 14.0,
            return_threshold: 0.25,
            gravity_scale: 2.0,
            contact_radius: 0.1,
            unhookable_kick: 5.0,
            drone_guard_radius: 1.0,
            drone_guard_secs: 0.5,
        }
    }
}

impl Default for HazardTuning {
    fn default() -> Self {
        Self {
            stun_secs: 3.0,
            recharge_secs: 2.0,
            knockback: 10.0,
            kill_height: -15.0,
            respawn_secs: 1.0,
        }
    }
}

pub fn load_tuning_from_path(path: &Path) -> Result<Tuning, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let tuning: Tuning = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse tuning JSON {}: {e}", path.display()))?;
    validate_tuning(&tuning)?;
    Ok(tuning)
}

pub fn validate_tuning(tuning: &Tuning) -> Result<(), String> {
    // Comparisons are written so NaN fails them.
    if !(tuning.fixed_dt > 0.0) {
        return Err("Tuning validation failed: fixed_dt must be > 0".to_string());
    }
    let p = &tuning.player;
    if p.max_hooks == 0 {
        return Err("Tuning validation failed: player.max_hooks must be > 0".to_string());
    }
    if !(p.mass > 0.0) {
        return Err("Tuning validation failed: player.mass must be > 0".to_string());
    }
    if !(p.half_width > 0.0 && p.half_height > 0.0) {
        return Err("Tuning validation failed: player extents must be > 0".to_string());
    }
    if !(p.stun_slowdown > 0.0 && p.pull_vertical_divisor > 0.0) {
        return Err("Tuning validation failed: player divisors must be > 0".to_string());
    }
    if !(p.hook_force > 0.0) {
        return Err("Tuning validation failed: player.hook_force must be > 0".to_string());
    }
    let h = &tuning.hook;
    if !(h.speed > 0.0 && h.fire_distance > 0.0) {
        return Err("Tuning validation failed: hook speed and distance must be > 0".to_string());
    }
    let z = &tuning.hazard;
    let durations = [z.stun_secs, z.recharge_secs, z.respawn_secs, h.drone_guard_secs];
    if durations.iter().any(|d| !(*d >= 0.0)) {
        return Err("Tuning validation failed: durations must be >= 0".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "tether_tuning_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_tuning(&Tuning::default()).is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let path = temp_file_path("partial");
        fs::write(&path, r#"{ "player": { "max_hooks": 3 }, "hook": { "speed": 40.0 } }"#)
            .expect("write temp file");

        let tuning = load_tuning_from_path(&path).expect("partial tuning should load");
        assert_eq!(tuning.player.max_hooks, 3);
        assert_eq!(tuning.player.airborne_fire_limit, 14);
        assert!((tuning.hook.speed - 40.0).abs() < f32::EPSILON);
        assert!((tuning.hook.fire_distance - 14.0).abs() < f32::EPSILON);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let path = temp_file_path("zero");
        fs::write(&path, r#"{ "player": { "max_hooks": 0 } }"#).expect("write temp file");

        let err = load_tuning_from_path(&path).expect_err("zero capacity should fail");
        assert!(err.contains("max_hooks"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        let path = temp_file_path("bad");
        fs::write(&path, "{ not json").expect("write temp file");

        let err = load_tuning_from_path(&path).expect_err("bad json should fail");
        assert!(err.starts_with("Failed to parse tuning JSON"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn nan_step_and_durations_are_rejected() {
        let tuning = Tuning {
            fixed_dt: f32::NAN,
            ..Tuning::default()
        };
        let err = validate_tuning(&tuning).expect_err("NaN dt should fail");
        assert!(err.contains("fixed_dt"));

        let mut tuning = Tuning::default();
        tuning.hazard.stun_secs = f32::NAN;
        let err = validate_tuning(&tuning).expect_err("NaN stun should fail");
        assert!(err.contains("durations"));
    }
}
