//! Spring-damper joints pulling the player toward attached hooks.
//!
//! One joint per attached hook, owned by the player. The joint behaves like a
//! target spring: `F = m * (w^2 * (target - p) - 2 * zeta * w * v)` with
//! `w = 2 * pi * frequency`, clamped to `max_force`.

use std::f32::consts::TAU;

use glam::Vec2;

use crate::hook::{Hook, HookId, HookState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joint {
    pub id: JointId,
    pub hook: HookId,
    pub target: Vec2,
    pub frequency: f32,
    pub damping_ratio: f32,
    pub max_force: f32,
}

impl Joint {
    pub fn force_on(&self, position: Vec2, velocity: Vec2, mass: f32) -> Vec2 {
        let omega = TAU * self.frequency;
        let spring = (self.target - position) * omega * omega;
        let damper = velocity * 2.0 * self.damping_ratio * omega;
        ((spring - damper) * mass).clamp_length_max(self.max_force)
    }
}

#[derive(Debug, Default, Clone)]
pub struct JointSet {
    joints: Vec<Joint>,
    next_id: u32,
}

impl JointSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        hook: HookId,
        target: Vec2,
        frequency: f32,
        damping_ratio: f32,
        max_force: f32,
    ) -> JointId {
        self.next_id += 1;
        let id = JointId(self.next_id);
        self.joints.push(Joint {
            id,
            hook,
            target,
            frequency,
            damping_ratio,
            max_force,
        });
        id
    }

    pub fn get(&self, id: JointId) -> Option<&Joint> {
        self.joints.iter().find(|j| j.id == id)
    }

    pub fn get_mut(&mut self, id: JointId) -> Option<&mut Joint> {
        self.joints.iter_mut().find(|j| j.id == id)
    }

    /// Returns false when the joint was already gone.
    pub fn remove(&mut self, id: JointId) -> bool {
        let before = self.joints.len();
        self.joints.retain(|j| j.id != id);
        self.joints.len() != before
    }

    pub fn clear(&mut self) -> usize {
        let released = self.joints.len();
        self.joints.clear();
        released
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn total_force(&self, position: Vec2, velocity: Vec2, mass: f32) -> Vec2 {
        self.joints
            .iter()
            .map(|j| j.force_on(position, velocity, mass))
            .sum()
    }
}

/// Damping ratio for a pull: soft while far from the hook, firmer as the
/// player closes in.
pub fn damping_for(max_distance: f32, distance: f32) -> f32 {
    ((max_distance - distance) / (max_distance * 2.0)).max(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointUpdate {
    NotAttached,
    Updated,
    /// The hook believed it was attached but its joint was gone.
    Recovered,
}

/// Per-step upkeep for an attached hook's joint. `origin` is the owner.
pub fn update_hook_joint(hook: &mut Hook, joints: &mut JointSet, origin: Vec2) -> JointUpdate {
    if hook.state() != HookState::Attached {
        return JointUpdate::NotAttached;
    }

    let Some(joint) = hook.joint.and_then(|id| joints.get_mut(id)) else {
        log::error!(
            "Hook {:?} is attached without a joint, pulling it back",
            hook.id
        );
        hook.pull_back();
        return JointUpdate::Recovered;
    };

    joint.target = hook.position;
    joint.damping_ratio = if hook.no_damping {
        0.0
    } else {
        damping_for(hook.max_distance, hook.distance_to(origin))
    };
    JointUpdate::Updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{GridCell, SurfaceId};

    fn attached_hook_at(x: f32) -> Hook {
        let mut hook = Hook::new(HookId(1), Vec2::ZERO, 0.0, 35.0, 13.0);
        hook.attach(
            Vec2::new(x, 0.0),
            0.0,
            SurfaceId::Cell(GridCell { x: x as i32, y: 0 }),
        );
        hook
    }

    #[test]
    fn damping_grows_as_player_nears_hook() {
        let mut joints = JointSet::new();
        let mut hook = attached_hook_at(5.0);
        hook.joint = Some(joints.create(hook.id, hook.position, 3.0, 0.5, 20.0));

        assert_eq!(update_hook_joint(&mut hook, &mut joints, Vec2::ZERO), JointUpdate::Updated);
        let joint = joints.get(hook.joint.expect("joint id")).expect("joint");
        assert!((joint.damping_ratio - 8.0 / 26.0).abs() < 1e-5);
        assert!((joint.damping_ratio - 0.308).abs() < 1e-3);

        update_hook_joint(&mut hook, &mut joints, Vec2::new(4.0, 0.0));
        let joint = joints.get(hook.joint.expect("joint id")).expect("joint");
        assert!((joint.damping_ratio - 12.0 / 26.0).abs() < 1e-5);
    }

    #[test]
    fn no_damping_forces_zero() {
        let mut joints = JointSet::new();
        let mut hook = attached_hook_at(5.0);
        hook.no_damping = true;
        hook.joint = Some(joints.create(hook.id, hook.position, 3.0, 0.5, 20.0));
        update_hook_joint(&mut hook, &mut joints, Vec2::ZERO);
        let joint = joints.get(hook.joint.expect("joint id")).expect("joint");
        assert_eq!(joint.damping_ratio, 0.0);
    }

    #[test]
    fn missing_joint_forces_retract() {
        let mut joints = JointSet::new();
        let mut hook = attached_hook_at(5.0);
        hook.joint = Some(JointId(99));
        assert_eq!(
            update_hook_joint(&mut hook, &mut joints, Vec2::ZERO),
            JointUpdate::Recovered
        );
        assert_eq!(hook.state(), HookState::Retracting);
        assert_eq!(hook.joint, None);
    }

    #[test]
    fn force_is_clamped_to_max() {
        let joint = Joint {
            id: JointId(1),
            hook: HookId(1),
            target: Vec2::new(100.0, 0.0),
            frequency: 3.0,
            damping_ratio: 0.0,
            max_force: 20.0,
        };
        let force = joint.force_on(Vec2::ZERO, Vec2::ZERO, 1.0);
        assert!((force.length() - 20.0).abs() < 1e-3);
        assert!(force.x > 0.0);
    }

    #[test]
    fn damper_opposes_velocity_at_target() {
        let joint = Joint {
            id: JointId(1),
            hook: HookId(1),
            target: Vec2::ZERO,
            frequency: 1.0,
            damping_ratio: 0.5,
            max_force: 1000.0,
        };
        let force = joint.force_on(Vec2::ZERO, Vec2::new(1.0, 0.0), 1.0);
        assert!(force.x < 0.0);
        assert!((force.x + TAU * 0.5 * 2.0).abs() < 1e-3);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut joints = JointSet::new();
        let id = joints.create(HookId(1), Vec2::ZERO, 1.0, 0.5, 10.0);
        assert!(joints.remove(id));
        assert!(!joints.remove(id));
        assert!(joints.is_empty());
    }
}
