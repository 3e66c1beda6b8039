//! Electric mines: patrolling hazards that stun the player.
//!
//! A mine reacts when the player body or one of the player's hooks enters its
//! trigger radius. Only entries count; something resting inside a recharged
//! mine does not shock again until it leaves and comes back.

use std::collections::HashSet;

use glam::Vec2;

use crate::collision::Aabb;
use crate::hook::HookId;
use crate::patrol::Patrol;

/// What crossed into a mine's trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toucher {
    Player,
    Hook(HookId),
}

#[derive(Debug, Clone)]
pub struct ElectricMine {
    pub patrol: Patrol,
    pub radius: f32,
    charged: bool,
    inside: HashSet<Toucher>,
}

impl ElectricMine {
    pub fn new(patrol: Patrol, radius: f32) -> Self {
        Self {
            patrol,
            radius,
            charged: true,
            inside: HashSet::new(),
        }
    }

    pub fn position(&self) -> Vec2 {
        self.patrol.position()
    }

    pub fn is_charged(&self) -> bool {
        self.charged
    }

    pub fn overlaps_body(&self, body: &Aabb) -> bool {
        body.overlaps_circle(self.position(), self.radius)
    }

    pub fn overlaps_point(&self, point: Vec2, radius: f32) -> bool {
        let reach = self.radius + radius;
        self.position().distance_squared(point) <= reach * reach
    }

    /// Record everything overlapping this step and return the new arrivals.
    pub fn enter(&mut self, current: &[Toucher]) -> Vec<Toucher> {
        let entered = current
            .iter()
            .copied()
            .filter(|t| !self.inside.contains(t))
            .collect();
        self.inside = current.iter().copied().collect();
        entered
    }

    /// Returns false if the mine was already spent.
    pub fn discharge(&mut self) -> bool {
        std::mem::replace(&mut self.charged, false)
    }

    pub fn recharge(&mut self) {
        self.charged = true;
    }

    pub fn reset(&mut self) {
        self.patrol.reset();
        self.charged = true;
        self.inside.clear();
    }
}

/// Sideways shove for a player beside the mine. Nothing when the player is
/// more above or below it than to the side.
pub fn knockback_direction(mine: Vec2, player: Vec2) -> Option<Vec2> {
    let offset = player - mine;
    if offset.x.abs() > offset.y.abs() {
        Some(Vec2::new(offset.x.signum(), 0.0))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mine_at(x: f32, y: f32) -> ElectricMine {
        ElectricMine::new(Patrol::stationary(Vec2::new(x, y)), 0.5)
    }

    #[test]
    fn discharge_is_one_shot_until_recharged() {
        let mut mine = mine_at(0.0, 0.0);
        assert!(mine.is_charged());
        assert!(mine.discharge());
        assert!(!mine.discharge());
        mine.recharge();
        assert!(mine.is_charged());
    }

    #[test]
    fn only_new_overlaps_count() {
        let mut mine = mine_at(0.0, 0.0);
        let hook = Toucher::Hook(HookId(3));
        assert_eq!(mine.enter(&[Toucher::Player]), vec![Toucher::Player]);
        assert_eq!(mine.enter(&[Toucher::Player, hook]), vec![hook]);
        assert!(mine.enter(&[Toucher::Player, hook]).is_empty());
        assert!(mine.enter(&[]).is_empty());
        assert_eq!(mine.enter(&[Toucher::Player]), vec![Toucher::Player]);
    }

    #[test]
    fn body_and_point_overlap() {
        let mine = mine_at(2.0, 0.0);
        let body = Aabb::from_center(Vec2::new(1.2, 0.0), 0.4, 0.5);
        assert!(mine.overlaps_body(&body));
        let far = Aabb::from_center(Vec2::new(0.0, 0.0), 0.4, 0.5);
        assert!(!mine.overlaps_body(&far));
        assert!(mine.overlaps_point(Vec2::new(2.55, 0.0), 0.1));
        assert!(!mine.overlaps_point(Vec2::new(2.7, 0.0), 0.1));
    }

    #[test]
    fn knockback_only_from_the_side() {
        assert_eq!(
            knockback_direction(Vec2::ZERO, Vec2::new(-1.0, 0.3)),
            Some(Vec2::new(-1.0, 0.0))
        );
        assert_eq!(
            knockback_direction(Vec2::ZERO, Vec2::new(2.0, -1.0)),
            Some(Vec2::X)
        );
        assert_eq!(knockback_direction(Vec2::ZERO, Vec2::new(0.2, 1.0)), None);
    }

    #[test]
    fn reset_recharges_and_forgets_overlaps() {
        let mut mine = ElectricMine::new(
            Patrol::new(Vec2::ZERO, vec![Vec2::new(4.0, 0.0)], 2.0),
            0.5,
        );
        mine.patrol.step(1.0);
        mine.enter(&[Toucher::Player]);
        mine.discharge();

        mine.reset();
        assert!(mine.is_charged());
        assert_eq!(mine.position(), Vec2::ZERO);
        assert_eq!(mine.enter(&[Toucher::Player]), vec![Toucher::Player]);
    }
}
