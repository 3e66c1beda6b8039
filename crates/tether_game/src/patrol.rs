//! Looping waypoint movement shared by mines and drones.

use glam::Vec2;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Patrol {
    pub start: Vec2,
    #[serde(default)]
    pub points: Vec<Vec2>,
    #[serde(default)]
    pub speed: f32,
    #[serde(skip)]
    target: usize,
    #[serde(skip)]
    position: Option<Vec2>,
}

impl Patrol {
    pub fn stationary(at: Vec2) -> Self {
        Self::new(at, Vec::new(), 0.0)
    }

    pub fn new(start: Vec2, points: Vec<Vec2>, speed: f32) -> Self {
        Self {
            start,
            points,
            speed,
            target: 0,
            position: None,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position.unwrap_or(self.start)
    }

    pub fn reset(&mut self) {
        self.target = 0;
        self.position = None;
    }

    /// Advance one fixed step. Returns how far the body moved.
    pub fn step(&mut self, dt: f32) -> Vec2 {
        let current = self.position();
        if self.points.is_empty() || self.speed <= 0.0 {
            return Vec2::ZERO;
        }

        if current == self.points[self.target] {
            self.target = (self.target + 1) % self.points.len();
        }

        let next = move_towards(current, self.points[self.target], self.speed * dt);
        self.position = Some(next);
        next - current
    }
}

/// Step from `current` toward `target` by at most `max_delta`, landing
/// exactly on the target when within reach.
pub fn move_towards(current: Vec2, target: Vec2, max_delta: f32) -> Vec2 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_delta || distance == 0.0 {
        target
    } else {
        current + delta / distance * max_delta
    }
}
