//! Hookable patrol drones: moving bodies a hook can grab and ride.

use glam::Vec2;

use crate::collision::Aabb;
use crate::patrol::Patrol;

#[derive(Debug, Clone)]
pub struct Drone {
    pub patrol: Patrol,
    pub half_w: f32,
    pub half_h: f32,
    /// Hooks grabbing this drone pull without damping.
    pub pulls_hard: bool,
    /// Cleared for a moment after the player fires point blank, so the new
    /// hook passes through instead of grabbing the drone.
    tangible: bool,
}

impl Drone {
    pub fn new(patrol: Patrol, half_w: f32, half_h: f32, pulls_hard: bool) -> Self {
        Self {
            patrol,
            half_w,
            half_h,
            pulls_hard,
            tangible: true,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.patrol.position()
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position(), self.half_w, self.half_h)
    }

    pub fn is_tangible(&self) -> bool {
        self.tangible
    }

    pub fn set_tangible(&mut self, tangible: bool) {
        self.tangible = tangible;
    }

    pub fn reset(&mut self) {
        self.patrol.reset();
        self.tangible = true;
    }
}

/// Index of the drone closest to `point`, if it lies within `radius`.
pub fn nearest_within(drones: &[Drone], point: Vec2, radius: f32) -> Option<usize> {
    drones
        .iter()
        .enumerate()
        .map(|(i, d)| (i, d.position().distance(point)))
        .filter(|(_, dist)| *dist <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drone_at(x: f32, y: f32) -> Drone {
        Drone::new(Patrol::stationary(Vec2::new(x, y)), 0.5, 0.25, false)
    }

    #[test]
    fn nearest_drone_must_be_in_range() {
        let drones = vec![drone_at(3.0, 0.0), drone_at(0.8, 0.0), drone_at(-0.5, 0.0)];
        assert_eq!(nearest_within(&drones, Vec2::ZERO, 1.0), Some(2));
        assert_eq!(nearest_within(&drones, Vec2::new(2.5, 0.0), 1.0), Some(0));
        assert_eq!(nearest_within(&drones, Vec2::new(0.0, 5.0), 1.0), None);
        assert_eq!(nearest_within(&[], Vec2::ZERO, 1.0), None);
    }

    #[test]
    fn body_follows_patrol() {
        let mut drone = Drone::new(
            Patrol::new(Vec2::ZERO, vec![Vec2::new(0.0, 4.0)], 2.0),
            0.5,
            0.25,
            true,
        );
        let moved = drone.patrol.step(0.5);
        assert_eq!(moved, Vec2::new(0.0, 1.0));
        assert_eq!(drone.aabb().center(), Vec2::new(0.0, 1.0));
        assert!(drone.aabb().overlaps_circle(Vec2::new(0.4, 1.2), 0.0));
    }

    #[test]
    fn reset_restores_tangibility() {
        let mut drone = drone_at(0.0, 0.0);
        drone.set_tangible(false);
        assert!(!drone.is_tangible());
        drone.reset();
        assert!(drone.is_tangible());
    }
}
