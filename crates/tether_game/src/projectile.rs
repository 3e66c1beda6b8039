//! Unattached hook motion: straight flight, gravity drop, and the trip home.

use glam::Vec2;

use crate::hook::{Hook, HookState};
use crate::patrol::move_towards;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Idle,
    Moved,
    /// The hook reached its origin and was destroyed.
    Returned,
}

/// True when a flying or attached hook has run out of rope:
/// path travelled or distance to the owner beyond `max_distance`, or, while
/// never attached, more than twice that from where it was fired.
pub fn out_of_rope(hook: &Hook, origin: Vec2) -> bool {
    match hook.state() {
        HookState::Flying => {
            hook.traveled > hook.max_distance
                || hook.distance_to(origin) > hook.max_distance
                || hook.position.distance(hook.fire_point) > hook.max_distance * 2.0
        }
        HookState::Attached => hook.distance_to(origin) > hook.max_distance,
        HookState::Retracting | HookState::Destroyed => false,
    }
}

/// Advance one physics step. `gravity` is the world gravity (negative y);
/// falling hooks scale it by `gravity_scale`.
pub fn advance(
    hook: &mut Hook,
    origin: Vec2,
    dt: f32,
    gravity: f32,
    gravity_scale: f32,
    return_threshold: f32,
) -> Motion {
    match hook.state() {
        HookState::Flying => {
            if let Some(mut velocity) = hook.fall_velocity() {
                velocity.y += gravity * gravity_scale * dt;
                let step = velocity * dt;
                hook.position += step;
                hook.traveled += step.length();
                hook.set_fall_velocity(velocity);
            } else {
                let step = hook.speed * dt;
                hook.position += hook.direction() * step;
                hook.traveled += step;
            }
            Motion::Moved
        }
        HookState::Retracting => {
            hook.position = move_towards(hook.position, origin, hook.speed * dt);
            if hook.distance_to(origin) < return_threshold {
                hook.destroy();
                Motion::Returned
            } else {
                Motion::Moved
            }
        }
        HookState::Attached | HookState::Destroyed => Motion::Idle,
    }
}
