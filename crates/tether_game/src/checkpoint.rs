use glam::Vec2;

use crate::collision::Aabb;

/// Trigger area that moves the respawn point when the player walks in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checkpoint {
    pub area: Aabb,
}

impl Checkpoint {
    pub fn new(area: Aabb) -> Self {
        Self { area }
    }

    /// Respawn point: the bottom centre of the area.
    pub fn spawn_point(&self) -> Vec2 {
        Vec2::new(self.area.center_x, self.area.center_y - self.area.half_h)
    }

    pub fn overlaps(&self, body: &Aabb) -> bool {
        (self.area.center_x - body.center_x).abs() <= self.area.half_w + body.half_w
            && (self.area.center_y - body.center_y).abs() <= self.area.half_h + body.half_h
    }
}
