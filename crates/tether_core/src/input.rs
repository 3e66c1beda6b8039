//! Action state tracking with both edge-triggered and level-triggered queries.
//!
//! - **Level-triggered (held):** `is_held(action)` is true every frame the
//!   binding is down. Used for horizontal movement and debug flight.
//!
//! - **Edge-triggered (just_pressed / just_released):** true only for the frame
//!   the transition happened. `Fire` and `Jump` are consumed this way. Edges are
//!   cleared by `end_frame()`, which the runner calls only after at least one
//!   fixed step has consumed them, so a press is never lost on a frame with
//!   zero simulation steps.

use std::collections::HashSet;

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
    Jump,
    Fire,
    Boost,
    ToggleDebug,
}

pub struct InputState {
    held: HashSet<Action>,
    just_pressed: HashSet<Action>,
    just_released: HashSet<Action>,

    /// Aim direction relative to the player, in world units. Not normalized.
    pub aim: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
            aim: Vec2::X,
        }
    }

    pub fn press(&mut self, action: Action) {
        if self.held.insert(action) {
            self.just_pressed.insert(action);
        }
    }

    pub fn release(&mut self, action: Action) {
        if self.held.remove(&action) {
            self.just_released.insert(action);
        }
    }

    /// Drive a binding to `down`, producing edges only on change.
    pub fn set(&mut self, action: Action, down: bool) {
        if down {
            self.press(action);
        } else {
            self.release(action);
        }
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    pub fn is_just_pressed(&self, action: Action) -> bool {
        self.just_pressed.contains(&action)
    }

    pub fn is_just_released(&self, action: Action) -> bool {
        self.just_released.contains(&action)
    }

    /// Horizontal intent in [-1, 1] from the held Left/Right bindings.
    pub fn horizontal(&self) -> f32 {
        axis(self.is_held(Action::Left), self.is_held(Action::Right))
    }

    /// Vertical intent in [-1, 1] from the held Down/Up bindings.
    pub fn vertical(&self) -> f32 {
        axis(self.is_held(Action::Down), self.is_held(Action::Up))
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

fn axis(negative: bool, positive: bool) -> f32 {
    match (negative, positive) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}
