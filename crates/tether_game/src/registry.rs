//! The player's bookkeeping of live hooks.
//!
//! Capacity problems are soft backpressure: a refused fire is logged at debug
//! level and simply does nothing, it is never surfaced as an error.

use crate::hook::{HookId, HookSet, HookState};
use crate::joint::JointSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireRejection {
    /// The oldest registered hook is already on its way home.
    AtCapacity,
    AirborneLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireDecision {
    /// Go ahead: spawn a hook and `register` it.
    Fire,
    /// At capacity: this hook was sent home to make room, nothing is fired.
    Evicted(HookId),
    Rejected(FireRejection),
}

#[derive(Debug, Clone)]
pub struct HookRegistry {
    hooks: Vec<HookId>,
    max_hooks: usize,
    airborne_fires: u32,
    airborne_limit: u32,
}

impl HookRegistry {
    pub fn new(max_hooks: usize, airborne_limit: u32) -> Self {
        Self {
            hooks: Vec::with_capacity(max_hooks),
            max_hooks,
            airborne_fires: 0,
            airborne_limit,
        }
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn max_hooks(&self) -> usize {
        self.max_hooks
    }

    pub fn is_full(&self) -> bool {
        self.hooks.len() >= self.max_hooks
    }

    pub fn ids(&self) -> &[HookId] {
        &self.hooks
    }

    pub fn airborne_fires(&self) -> u32 {
        self.airborne_fires
    }

    pub fn reset_airborne(&mut self) {
        self.airborne_fires = 0;
    }

    /// Decide whether a fire request may spawn a hook.
    pub fn request_fire(
        &mut self,
        hooks: &mut HookSet,
        joints: &mut JointSet,
        grounded: bool,
    ) -> FireDecision {
        if self.is_full() {
            let Some(&oldest) = self.hooks.first() else {
                return FireDecision::Rejected(FireRejection::AtCapacity);
            };
            if !matches!(hooks.state(oldest), Some(HookState::Flying | HookState::Attached)) {
                log::debug!("Hook capacity reached, oldest hook already returning");
                return FireDecision::Rejected(FireRejection::AtCapacity);
            }
            retract(hooks, joints, oldest);
            log::debug!("Hook capacity reached, recalling {:?}", oldest);
            return FireDecision::Evicted(oldest);
        }

        if grounded {
            self.airborne_fires = 0;
        } else {
            self.airborne_fires += 1;
        }
        if self.airborne_fires >= self.airborne_limit {
            log::debug!(
                "Airborne fire limit reached ({}/{})",
                self.airborne_fires,
                self.airborne_limit
            );
            return FireDecision::Rejected(FireRejection::AirborneLimit);
        }

        FireDecision::Fire
    }

    pub fn register(&mut self, id: HookId) {
        debug_assert!(!self.is_full(), "registered a hook past capacity");
        self.hooks.push(id);
    }

    /// Send every registered hook home, forget them all, and release every
    /// joint on the player. Hooks already dropping under gravity keep falling.
    pub fn pull_back_all(&mut self, hooks: &mut HookSet, joints: &mut JointSet) -> usize {
        let recalled = self.hooks.len();
        for id in self.hooks.drain(..) {
            let Some(hook) = hooks.get_mut(id) else {
                continue;
            };
            if !hook.is_falling() {
                hook.pull_back();
            }
        }
        joints.clear();
        recalled
    }

    /// Forget hooks that no longer exist or have been destroyed.
    pub fn purge(&mut self, hooks: &HookSet) -> usize {
        let before = self.hooks.len();
        self.hooks
            .retain(|id| hooks.get(*id).is_some_and(|h| h.is_live()));
        let purged = before - self.hooks.len();
        if purged > 0 {
            log::trace!("Purged {} dead hook reference(s)", purged);
        }
        purged
    }
}

fn retract(hooks: &mut HookSet, joints: &mut JointSet, id: HookId) {
    if let Some(joint) = hooks.get_mut(id).and_then(|h| h.pull_back()) {
        joints.remove(joint);
    }
}
