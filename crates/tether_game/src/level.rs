//! Level entity layout: spawn point, mines, drones and checkpoints.
//!
//! Geometry lives in the collision file; this file only places the things
//! that move or trigger on top of it. Positions are world units and every
//! "point" (spawn, checkpoint bottom) is where the player's feet go.

use glam::Vec2;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::checkpoint::Checkpoint;
use crate::collision::Aabb;
use crate::drone::Drone;
use crate::hazard::ElectricMine;
use crate::patrol::Patrol;

#[derive(Debug, Deserialize, Clone)]
pub struct LevelFile {
    pub version: String,
    pub level_id: String,
    pub spawn: Vec2,
    #[serde(default)]
    pub mines: Vec<MineSpec>,
    #[serde(default)]
    pub drones: Vec<DroneSpec>,
    #[serde(default)]
    pub checkpoints: Vec<CheckpointSpec>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MineSpec {
    pub id: String,
    pub patrol: Patrol,
    #[serde(default = "default_mine_radius")]
    pub radius: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DroneSpec {
    pub id: String,
    pub patrol: Patrol,
    #[serde(default = "default_drone_half_w")]
    pub half_w: f32,
    #[serde(default = "default_drone_half_h")]
    pub half_h: f32,
    #[serde(default)]
    pub pulls_hard: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CheckpointSpec {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub half_w: f32,
    pub half_h: f32,
}

impl LevelFile {
    /// A level with nothing in it but a spawn point.
    pub fn empty(spawn: Vec2) -> Self {
        Self {
            version: "0.1".to_string(),
            level_id: "empty".to_string(),
            spawn,
            mines: Vec::new(),
            drones: Vec::new(),
            checkpoints: Vec::new(),
        }
    }

    pub fn build_mines(&self) -> Vec<ElectricMine> {
        self.mines
            .iter()
            .map(|m| ElectricMine::new(settled(&m.patrol), m.radius))
            .collect()
    }

    pub fn build_drones(&self) -> Vec<Drone> {
        self.drones
            .iter()
            .map(|d| Drone::new(settled(&d.patrol), d.half_w, d.half_h, d.pulls_hard))
            .collect()
    }

    pub fn build_checkpoints(&self) -> Vec<Checkpoint> {
        self.checkpoints
            .iter()
            .map(|c| Checkpoint::new(Aabb::from_center(Vec2::new(c.x, c.y), c.half_w, c.half_h)))
            .collect()
    }
}

/// A patrol with nowhere to go stays at its start.
fn settled(patrol: &Patrol) -> Patrol {
    if patrol.points.is_empty() {
        Patrol::stationary(patrol.start)
    } else {
        patrol.clone()
    }
}

pub fn load_level_from_path(path: &Path) -> Result<LevelFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read level file {}: {e}", path.display()))?;
    let level: LevelFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse level JSON {}: {e}", path.display()))?;
    validate_level(&level)?;
    Ok(level)
}

fn validate_level(level: &LevelFile) -> Result<(), String> {
    let mut ids = HashSet::new();
    let all_ids = level
        .mines
        .iter()
        .map(|m| &m.id)
        .chain(level.drones.iter().map(|d| &d.id))
        .chain(level.checkpoints.iter().map(|c| &c.id));
    for id in all_ids {
        if !ids.insert(id.clone()) {
            return Err(format!("Level validation failed: duplicate entity id '{}'", id));
        }
    }

    for mine in &level.mines {
        if mine.radius <= 0.0 {
            return Err(format!(
                "Level validation failed: mine '{}' radius must be > 0",
                mine.id
            ));
        }
        validate_patrol(&mine.id, &mine.patrol)?;
    }
    for drone in &level.drones {
        if drone.half_w <= 0.0 || drone.half_h <= 0.0 {
            return Err(format!(
                "Level validation failed: drone '{}' extents must be > 0",
                drone.id
            ));
        }
        validate_patrol(&drone.id, &drone.patrol)?;
    }
    for cp in &level.checkpoints {
        if cp.half_w <= 0.0 || cp.half_h <= 0.0 {
            return Err(format!(
                "Level validation failed: checkpoint '{}' extents must be > 0",
                cp.id
            ));
        }
    }
    Ok(())
}

fn validate_patrol(id: &str, patrol: &Patrol) -> Result<(), String> {
    if patrol.speed < 0.0 {
        return Err(format!(
            "Level validation failed: '{}' patrol speed must be >= 0",
            id
        ));
    }
    if patrol.speed > 0.0 && patrol.points.is_empty() {
        log::warn!(
            "Entity '{}' has a patrol speed but no points. It will stay put.",
            id
        );
    }
    Ok(())
}

const fn default_mine_radius() -> f32 {
    0.5
}

const fn default_drone_half_w() -> f32 {
    0.5
}

const fn default_drone_half_h() -> f32 {
    0.25
}
