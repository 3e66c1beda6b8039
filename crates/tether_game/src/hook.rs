//! Hook entities and their lifecycle.
//!
//! A hook only ever moves forward through its states:
//!
//!   Flying -> Attached -> Retracting -> Destroyed
//!   Flying -> Retracting -> Destroyed
//!
//! `pull_back` is the one externally forced transition and is a no-op once
//! the hook is already retracting. Every hook belongs to the session's player;
//! that player's position is passed in wherever a hook needs its origin.

use std::collections::{BTreeMap, HashSet};

use glam::Vec2;

use crate::collision::SurfaceId;
use crate::joint::JointId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HookId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookState {
    Flying,
    Attached,
    Retracting,
    Destroyed,
}

/// Keeps an attached hook glued to a moving body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub body: usize,
    pub offset: Vec2,
}

#[derive(Debug, Clone)]
pub struct Hook {
    pub id: HookId,
    state: HookState,
    pub position: Vec2,
    /// Radians, counter-clockwise from +X.
    pub heading: f32,
    pub fire_point: Vec2,
    pub traveled: f32,
    pub max_distance: f32,
    pub speed: f32,
    default_speed: f32,
    pub no_damping: bool,
    pub joint: Option<JointId>,
    pub anchor: Option<Anchor>,
    surface: Option<SurfaceId>,
    /// Set while the hook drops under gravity instead of flying.
    fall_velocity: Option<Vec2>,
    /// Surfaces overlapped last step; contact reactions only fire on entry.
    touching: HashSet<SurfaceId>,
}

impl Hook {
    pub fn new(id: HookId, fire_point: Vec2, heading: f32, speed: f32, max_distance: f32) -> Self {
        Self {
            id,
            state: HookState::Flying,
            position: fire_point,
            heading,
            fire_point,
            traveled: 0.0,
            max_distance,
            speed,
            default_speed: speed,
            no_damping: false,
            joint: None,
            anchor: None,
            surface: None,
            fall_velocity: None,
            touching: HashSet::new(),
        }
    }

    pub fn state(&self) -> HookState {
        self.state
    }

    pub fn direction(&self) -> Vec2 {
        Vec2::from_angle(self.heading)
    }

    pub fn is_falling(&self) -> bool {
        self.fall_velocity.is_some()
    }

    pub fn fall_velocity(&self) -> Option<Vec2> {
        self.fall_velocity
    }

    pub(crate) fn set_fall_velocity(&mut self, velocity: Vec2) {
        if self.fall_velocity.is_some() {
            self.fall_velocity = Some(velocity);
        }
    }

    pub fn is_able_to_grab(&self) -> bool {
        self.state == HookState::Flying && !self.is_falling()
    }

    pub fn is_live(&self) -> bool {
        self.state != HookState::Destroyed
    }

    /// What the hook is holding on to, only while attached.
    pub fn hooked_surface(&self) -> Option<SurfaceId> {
        if self.state == HookState::Attached {
            self.surface
        } else {
            None
        }
    }

    pub fn distance_to(&self, origin: Vec2) -> f32 {
        self.position.distance(origin)
    }

    /// Flying -> Attached. Returns false when the hook can no longer grab.
    pub fn attach(&mut self, grab: Vec2, heading: f32, surface: SurfaceId) -> bool {
        if !self.is_able_to_grab() {
            return false;
        }
        self.state = HookState::Attached;
        self.position = grab;
        self.heading = heading;
        self.surface = Some(surface);
        true
    }

    /// Force the hook home. Returns the joint it was driving, which the
    /// caller must release from the player.
    pub fn pull_back(&mut self) -> Option<JointId> {
        if matches!(self.state, HookState::Flying | HookState::Attached) {
            self.state = HookState::Retracting;
        }
        self.speed = self.default_speed;
        self.fall_velocity = None;
        self.anchor = None;
        self.surface = None;
        self.joint.take()
    }

    /// Drop the hook: it stops flying and falls until its next contact.
    /// Only a flying hook can be dropped.
    pub fn enable_gravity(&mut self, kick: Vec2) -> bool {
        if self.state != HookState::Flying || self.is_falling() {
            return false;
        }
        self.speed = 0.0;
        self.fall_velocity = Some(kick);
        true
    }

    pub(crate) fn destroy(&mut self) {
        self.state = HookState::Destroyed;
        self.joint = None;
        self.anchor = None;
    }

    /// Record this step's overlaps and return the ones that are new.
    pub(crate) fn enter_contacts(&mut self, current: &[SurfaceId]) -> Vec<SurfaceId> {
        let entered = current
            .iter()
            .copied()
            .filter(|s| !self.touching.contains(s))
            .collect();
        self.touching = current.iter().copied().collect();
        entered
    }
}

/// Every live hook in the session, keyed by id in firing order.
#[derive(Debug, Default, Clone)]
pub struct HookSet {
    hooks: BTreeMap<HookId, Hook>,
    next_id: u32,
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, fire_point: Vec2, heading: f32, speed: f32, max_distance: f32) -> HookId {
        self.next_id += 1;
        let id = HookId(self.next_id);
        self.hooks
            .insert(id, Hook::new(id, fire_point, heading, speed, max_distance));
        id
    }

    pub fn get(&self, id: HookId) -> Option<&Hook> {
        self.hooks.get(&id)
    }

    pub fn get_mut(&mut self, id: HookId) -> Option<&mut Hook> {
        self.hooks.get_mut(&id)
    }

    pub fn state(&self, id: HookId) -> Option<HookState> {
        self.hooks.get(&id).map(Hook::state)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hook> {
        self.hooks.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Hook> {
        self.hooks.values_mut()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Drop destroyed hooks from storage. Returns the ids removed.
    pub fn remove_destroyed(&mut self) -> Vec<HookId> {
        let dead: Vec<HookId> = self
            .hooks
            .values()
            .filter(|h| !h.is_live())
            .map(|h| h.id)
            .collect();
        for id in &dead {
            self.hooks.remove(id);
        }
        dead
    }

    pub fn clear(&mut self) {
        self.hooks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::GridCell;

    fn cell() -> SurfaceId {
        SurfaceId::Cell(GridCell { x: 1, y: 1 })
    }

    #[test]
    fn attach_only_from_flying() {
        let mut hook = Hook::new(HookId(1), Vec2::ZERO, 0.0, 35.0, 13.0);
        assert!(hook.attach(Vec2::new(2.0, 0.0), 0.0, cell()));
        assert_eq!(hook.state(), HookState::Attached);
        assert_eq!(hook.hooked_surface(), Some(cell()));
        assert!(!hook.attach(Vec2::new(3.0, 0.0), 0.0, cell()));
        assert_eq!(hook.position, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn pull_back_never_moves_backwards() {
        let mut hook = Hook::new(HookId(1), Vec2::ZERO, 0.0, 35.0, 13.0);
        hook.pull_back();
        assert_eq!(hook.state(), HookState::Retracting);
        assert!(!hook.attach(Vec2::ONE, 0.0, cell()));
        hook.destroy();
        hook.pull_back();
        assert_eq!(hook.state(), HookState::Destroyed);
    }

    #[test]
    fn pull_back_hands_back_joint_once() {
        let mut hook = Hook::new(HookId(1), Vec2::ZERO, 0.0, 35.0, 13.0);
        hook.attach(Vec2::ONE, 0.0, cell());
        hook.joint = Some(JointId(7));
        assert_eq!(hook.pull_back(), Some(JointId(7)));
        assert_eq!(hook.pull_back(), None);
        assert_eq!(hook.hooked_surface(), None);
    }

    #[test]
    fn gravity_stops_flight_and_resets_on_pull_back() {
        let mut hook = Hook::new(HookId(1), Vec2::ZERO, 0.0, 35.0, 13.0);
        assert!(hook.enable_gravity(Vec2::new(-5.0, 0.0)));
        assert!(hook.is_falling());
        assert!(!hook.is_able_to_grab());
        assert_eq!(hook.speed, 0.0);
        hook.pull_back();
        assert!(!hook.is_falling());
        assert_eq!(hook.speed, 35.0);
        assert!(!hook.enable_gravity(Vec2::ZERO));
    }

    #[test]
    fn contacts_only_report_entries() {
        let mut hook = Hook::new(HookId(1), Vec2::ZERO, 0.0, 35.0, 13.0);
        assert_eq!(hook.enter_contacts(&[cell()]), vec![cell()]);
        assert!(hook.enter_contacts(&[cell()]).is_empty());
        assert!(hook.enter_contacts(&[]).is_empty());
        assert_eq!(hook.enter_contacts(&[cell()]), vec![cell()]);
    }

    #[test]
    fn hook_set_assigns_increasing_ids_and_sweeps_dead() {
        let mut set = HookSet::new();
        let a = set.spawn(Vec2::ZERO, 0.0, 35.0, 13.0);
        let b = set.spawn(Vec2::ZERO, 0.0, 35.0, 13.0);
        assert!(a < b);
        set.get_mut(a).expect("hook a").destroy();
        assert_eq!(set.remove_destroyed(), vec![a]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.state(b), Some(HookState::Flying));
    }
}
