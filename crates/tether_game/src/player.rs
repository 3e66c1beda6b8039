//! Player motion: free movement, hook pulls, stun, cutscene lock, debug flight.
//!
//! Exactly one `MotionMode` is active. Stunned and Cutscene override the
//! hook-driven modes; entering either is allowed from any mode. Ground
//! contact is always probed against the environment, never cached.

use glam::Vec2;
use tether_core::cues::{CueSink, Flag, Sound};

use crate::collision::{Aabb, CollisionMoveResult, Environment, SurfaceCategory};
use crate::config::{HookTuning, PlayerTuning};
use crate::hook::{Hook, HookId, HookSet};
use crate::joint::JointSet;
use crate::registry::{FireDecision, HookRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionMode {
    FreeMove,
    Pulled,
    Stunned,
    Cutscene,
    Debug,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOutcome {
    Ignored,
    Jumped,
    /// Stunned on the ground: a short, useless hop.
    Hop,
    /// Released a fast pull instead of jumping.
    Whoosh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StunOutcome {
    Ignored,
    Fresh,
    Extended,
}

/// Held intent for one physics step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveIntent {
    pub horizontal: f32,
    pub vertical: f32,
    pub boost: bool,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub aabb: Aabb,
    pub velocity: Vec2,
    mode: MotionMode,
    pub registry: HookRegistry,
    pub joints: JointSet,
    move_direction: f32,
    pub facing_left: bool,
    pub tuning: PlayerTuning,
}

impl Player {
    pub fn new(position: Vec2, tuning: PlayerTuning) -> Self {
        Self {
            aabb: Aabb::from_center(position, tuning.half_width, tuning.half_height),
            velocity: Vec2::ZERO,
            mode: MotionMode::FreeMove,
            registry: HookRegistry::new(tuning.max_hooks, tuning.airborne_fire_limit),
            joints: JointSet::new(),
            move_direction: 0.0,
            facing_left: false,
            tuning,
        }
    }

    pub fn mode(&self) -> MotionMode {
        self.mode
    }

    pub fn position(&self) -> Vec2 {
        self.aabb.center()
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.aabb.center_x = position.x;
        self.aabb.center_y = position.y;
    }

    /// Put the player down at `position` at rest.
    pub fn respawn_at(&mut self, position: Vec2) {
        self.set_position(position);
        self.velocity = Vec2::ZERO;
        self.move_direction = 0.0;
        self.registry.reset_airborne();
    }

    pub fn is_stunned(&self) -> bool {
        self.mode == MotionMode::Stunned
    }

    pub fn is_in_cutscene(&self) -> bool {
        self.mode == MotionMode::Cutscene
    }

    /// Movement speed after status effects.
    pub fn move_speed(&self) -> f32 {
        if self.is_stunned() {
            self.tuning.move_speed / self.tuning.stun_slowdown
        } else {
            self.tuning.move_speed
        }
    }

    pub fn is_on_ground(&self, env: &dyn Environment) -> bool {
        env.overlap_circle(
            self.aabb.feet(),
            self.tuning.ground_probe_radius,
            SurfaceCategory::Ground,
        )
    }

    /// Aim heading in radians. On the ground the aim cannot point into the
    /// floor: downward angles snap to straight right or straight left.
    pub fn aim_heading(aim: Vec2, grounded: bool) -> f32 {
        let angle = if aim.length_squared() > 0.0 {
            aim.y.atan2(aim.x)
        } else {
            0.0
        };
        if grounded && angle < 0.0 {
            if angle > -std::f32::consts::FRAC_PI_2 {
                0.0
            } else {
                std::f32::consts::PI
            }
        } else {
            angle
        }
    }

    /// Handle a fire press. Returns the new hook, if one was spawned.
    pub fn fire(
        &mut self,
        hooks: &mut HookSet,
        env: &dyn Environment,
        aim: Vec2,
        hook_tuning: &HookTuning,
        cues: &mut dyn CueSink,
    ) -> Option<HookId> {
        if matches!(
            self.mode,
            MotionMode::Stunned | MotionMode::Cutscene | MotionMode::Debug
        ) {
            return None;
        }

        let grounded = self.is_on_ground(env);
        match self
            .registry
            .request_fire(hooks, &mut self.joints, grounded)
        {
            FireDecision::Fire => {}
            FireDecision::Evicted(_) => {
                self.leave_pull(cues);
                return None;
            }
            FireDecision::Rejected(_) => return None,
        }

        let heading = Self::aim_heading(aim, grounded);
        let fire_point = self.position() + Vec2::from_angle(heading) * self.tuning.aim_offset;
        let speed = hook_tuning.speed + self.velocity.x.abs();
        let id = hooks.spawn(fire_point, heading, speed, hook_tuning.fire_distance);
        self.registry.register(id);
        cues.sound(Sound::HookFire);
        log::debug!("Fired {:?} at {:.1} rad, speed {:.1}", id, heading, speed);
        Some(id)
    }

    /// Attachment notification: start pulling toward `hook`.
    pub fn begin_pull(&mut self, hook: &mut Hook, cues: &mut dyn CueSink) {
        let joint = self.joints.create(
            hook.id,
            hook.position,
            self.tuning.hook_frequency,
            self.tuning.hook_damping,
            self.tuning.hook_force,
        );
        hook.joint = Some(joint);
        self.velocity.y /= self.tuning.pull_vertical_divisor;

        if matches!(self.mode, MotionMode::FreeMove | MotionMode::Pulled) {
            self.mode = MotionMode::Pulled;
            cues.flag(Flag::Pulled, true);
        }
    }

    /// Send every hook home and drop out of the pull.
    pub fn release_hooks(&mut self, hooks: &mut HookSet, cues: &mut dyn CueSink) -> usize {
        let recalled = self.registry.pull_back_all(hooks, &mut self.joints);
        self.leave_pull(cues);
        recalled
    }

    fn leave_pull(&mut self, cues: &mut dyn CueSink) {
        if self.mode == MotionMode::Pulled {
            self.mode = MotionMode::FreeMove;
            cues.flag(Flag::Pulled, false);
        }
    }

    fn clamp_to_hook_force(&mut self) {
        let cap = Vec2::splat(self.tuning.hook_force);
        self.velocity = self.velocity.clamp(-cap, cap);
    }

    pub fn jump(
        &mut self,
        hooks: &mut HookSet,
        env: &dyn Environment,
        cues: &mut dyn CueSink,
    ) -> JumpOutcome {
        if matches!(self.mode, MotionMode::Cutscene | MotionMode::Debug) {
            return JumpOutcome::Ignored;
        }

        let mut on_ground = self.is_on_ground(env);
        if self.is_stunned() {
            if on_ground {
                self.velocity.y += self.tuning.stunned_hop / self.tuning.mass;
                return JumpOutcome::Hop;
            }
            return JumpOutcome::Ignored;
        }

        if on_ground {
            self.registry.reset_airborne();
        }

        let mut outcome = JumpOutcome::Ignored;
        if self.mode == MotionMode::Pulled && !self.registry.is_empty() {
            self.release_hooks(hooks, cues);
            if self.velocity.length() < self.tuning.hop_speed_threshold {
                // A weak pull behaves like standing ground.
                on_ground = true;
            } else {
                self.clamp_to_hook_force();
                cues.sound(Sound::Whoosh);
                outcome = JumpOutcome::Whoosh;
            }
        }

        if on_ground {
            self.velocity.y += self.tuning.jump_force / self.tuning.mass;
            cues.sound(Sound::Jump);
            return JumpOutcome::Jumped;
        }
        outcome
    }

    /// Scripted jump that ignores every status, used by launch pads and bosses.
    pub fn force_jump(&mut self, hooks: &mut HookSet, cues: &mut dyn CueSink) {
        self.registry.reset_airborne();
        if self.mode == MotionMode::Pulled && !self.registry.is_empty() {
            self.release_hooks(hooks, cues);
            self.clamp_to_hook_force();
        }
        self.velocity.y += self.tuning.jump_force / self.tuning.mass;
        cues.sound(Sound::Jump);
    }

    /// Enter or extend a stun. A repeated stun only refreshes state so
    /// slowdowns do not stack; the caller owns the timer and restarts it for
    /// anything but `Ignored`. A cutscene lock is never broken by a stun.
    pub fn stun(&mut self, hooks: &mut HookSet, cues: &mut dyn CueSink) -> StunOutcome {
        if self.mode == MotionMode::Cutscene {
            return StunOutcome::Ignored;
        }
        let fresh = !self.is_stunned();
        self.release_hooks(hooks, cues);
        if fresh {
            self.velocity /= self.tuning.stun_slowdown;
            cues.flag(Flag::Stunned, true);
        }
        self.mode = MotionMode::Stunned;
        cues.sound(Sound::Stun);
        if fresh {
            StunOutcome::Fresh
        } else {
            StunOutcome::Extended
        }
    }

    pub fn end_stun(&mut self, cues: &mut dyn CueSink) {
        if self.mode == MotionMode::Stunned {
            self.mode = MotionMode::FreeMove;
            cues.flag(Flag::Stunned, false);
        }
    }

    /// External cutscene lock. Clearing it resumes a pull if joints remain.
    pub fn set_cutscene(&mut self, active: bool, cues: &mut dyn CueSink) {
        if active {
            if self.mode == MotionMode::Stunned {
                cues.flag(Flag::Stunned, false);
            }
            self.mode = MotionMode::Cutscene;
        } else if self.mode == MotionMode::Cutscene {
            self.mode = if self.joints.is_empty() {
                MotionMode::FreeMove
            } else {
                MotionMode::Pulled
            };
        }
    }

    /// Debug flight toggle. Ignored while stunned or in a cutscene.
    pub fn toggle_debug(&mut self) {
        self.mode = match self.mode {
            MotionMode::Debug => MotionMode::FreeMove,
            MotionMode::FreeMove | MotionMode::Pulled => MotionMode::Debug,
            other => {
                log::debug!("Debug toggle ignored in {:?}", other);
                return;
            }
        };
        self.velocity = Vec2::ZERO;
        log::info!("Debug mode: {}", self.mode == MotionMode::Debug);
    }

    pub fn knock_back(&mut self, direction: Vec2, amount: f32) {
        self.velocity += direction * amount / self.tuning.mass;
    }

    /// Integrate one fixed step: control, gravity, joint pull, move-and-slide.
    pub fn physics_step(
        &mut self,
        intent: MoveIntent,
        dt: f32,
        env: &dyn Environment,
        cues: &mut dyn CueSink,
    ) {
        if self.mode == MotionMode::Pulled && self.registry.is_empty() {
            self.leave_pull(cues);
        }

        if self.mode == MotionMode::Debug {
            let speed = if intent.boost {
                self.tuning.debug_boost_speed
            } else {
                self.tuning.debug_speed
            };
            let step = Vec2::new(intent.horizontal, intent.vertical) * speed * dt;
            self.set_position(self.position() + step);
            return;
        }

        let grounded = self.is_on_ground(env);
        let mut walk = 0.0;
        if matches!(self.mode, MotionMode::FreeMove | MotionMode::Stunned) {
            let target = (intent.horizontal * 2.0).clamp(-1.0, 1.0);
            let t = (self.tuning.acceleration / 10.0).clamp(0.0, 1.0);
            self.move_direction += (target - self.move_direction) * t;
            walk = self.move_direction * self.move_speed();
            if self.move_direction != 0.0 {
                self.facing_left = self.move_direction < 0.0;
            }

            if grounded {
                let bleed = self.tuning.friction_ground * dt;
                self.velocity.x = move_towards(self.velocity.x, 0.0, bleed);
            } else if self.velocity.y < self.tuning.fall_boost_below {
                let extra = self.tuning.jump_force / 1.25;
                self.velocity.y -= extra / self.tuning.mass * dt;
            }
        } else if self.velocity.x != 0.0 {
            self.facing_left = self.velocity.x < 0.0;
        }

        self.velocity.y += self.tuning.gravity * dt;
        let pull = self
            .joints
            .total_force(self.position(), self.velocity, self.tuning.mass);
        self.velocity += pull / self.tuning.mass * dt;

        let dx = (self.velocity.x + walk) * dt;
        let dy = self.velocity.y * dt;
        let result = env.move_and_collide(self.aabb, dx, dy);
        self.apply_collision_result(result);
    }

    fn apply_collision_result(&mut self, result: CollisionMoveResult) {
        self.aabb = result.aabb;

        if (result.blocked_left && self.velocity.x < 0.0)
            || (result.blocked_right && self.velocity.x > 0.0)
        {
            self.velocity.x = 0.0;
        }
        if (result.blocked_up && self.velocity.y > 0.0)
            || (result.blocked_down && self.velocity.y < 0.0)
        {
            self.velocity.y = 0.0;
        }
    }
}

fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else if target > current {
        current + max_delta
    } else {
        current - max_delta
    }
}
