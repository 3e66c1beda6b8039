//! Reacting to a hook entering a surface.

use glam::Vec2;

use crate::collision::{Contact, Environment, SurfaceId};
use crate::hook::{Anchor, Hook, HookState};

const DEGENERATE_LEN_SQ: f32 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactOutcome {
    /// Grabbed; the owner should start pulling toward `grab`.
    Attached { grab: Vec2 },
    /// Struck an unhookable surface and started falling.
    Dropped,
    /// A falling hook touched something and is heading home.
    PulledBack,
    Ignored,
}

/// Apply one contact-enter event to `hook`.
///
/// `origin` is the owner's current position and `kick` the impulse given to a
/// hook bouncing off an unhookable surface.
pub fn resolve_contact(
    hook: &mut Hook,
    contact: Contact,
    env: &dyn Environment,
    origin: Vec2,
    kick: f32,
) -> ContactOutcome {
    if hook.is_falling() {
        hook.pull_back();
        return ContactOutcome::PulledBack;
    }
    if hook.state() != HookState::Flying {
        return ContactOutcome::Ignored;
    }

    if !contact.category.is_grabbable() {
        let away = (origin - hook.position).normalize_or_zero() * kick;
        return if hook.enable_gravity(away) {
            ContactOutcome::Dropped
        } else {
            ContactOutcome::Ignored
        };
    }

    let grab = env
        .closest_point(contact.surface, hook.position)
        .unwrap_or(hook.position);
    let heading = grab_heading(hook.position, grab, hook.fire_point, hook.heading);
    if !hook.attach(grab, heading, contact.surface) {
        return ContactOutcome::Ignored;
    }

    if let SurfaceId::Body(body) = contact.surface {
        if let Some(at) = env.body_position(body) {
            hook.anchor = Some(Anchor {
                body,
                offset: grab - at,
            });
        }
    }
    ContactOutcome::Attached { grab }
}

/// Heading for a hook snapping to `grab`. When the hook already sits on the
/// grab point, fall back to its flight direction from the fire point, then to
/// its current heading.
pub fn grab_heading(position: Vec2, grab: Vec2, fire_point: Vec2, current: f32) -> f32 {
    let to_grab = grab - position;
    if to_grab.length_squared() > DEGENERATE_LEN_SQ {
        return to_grab.to_angle();
    }
    let flight = position - fire_point;
    if flight.length_squared() > DEGENERATE_LEN_SQ {
        return flight.to_angle();
    }
    current
}
