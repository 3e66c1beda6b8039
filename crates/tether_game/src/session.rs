//! One level's worth of gameplay, advanced one fixed step at a time.
//!
//! `Session` owns every component and is the only place that wires them
//! together. Timed effects (stun, mine recharge, drone guard, respawn) are
//! scheduler tasks; each effect has its own key, so triggering it again
//! restarts the timer instead of stacking a second one.
//!
//! Step order:
//!   1. due scheduler tasks
//!   2. edge-triggered actions (debug toggle, jump, fire)
//!   3. patrols, and hooks anchored to drones follow them
//!   4. hook flight, contact reactions, rope limits, joint upkeep
//!   5. mine triggers
//!   6. player integration
//!   7. registry purge, destroyed hooks dropped
//!   8. checkpoints and fall-out
//!   9. run timer

use glam::Vec2;
use tether_core::cues::{CueLog, CueSink, Flag, Sound};
use tether_core::input::{Action, InputState};
use tether_core::run_timer::RunTimer;
use tether_core::schedule::Scheduler;
use tether_core::time::secs_to_us;

use crate::attach::{resolve_contact, ContactOutcome};
use crate::checkpoint::Checkpoint;
use crate::collision::{
    Aabb, CollisionGrid, CollisionMoveResult, Contact, Environment, SurfaceCategory, SurfaceId,
};
use crate::config::Tuning;
use crate::drone::{nearest_within, Drone};
use crate::hazard::{knockback_direction, ElectricMine, Toucher};
use crate::hook::{HookId, HookSet, HookState};
use crate::joint::update_hook_joint;
use crate::level::LevelFile;
use crate::player::{MotionMode, MoveIntent, Player, StunOutcome};
use crate::projectile::{self, Motion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TaskKey {
    Stun,
    Respawn,
    MineRecharge(usize),
    DroneGuard(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    EndStun,
    Respawn,
    RechargeMine(usize),
    RestoreDrone(usize),
}

/// The level as gameplay sees it: the static grid plus tangible drones.
pub struct Stage<'a> {
    pub grid: &'a CollisionGrid,
    pub drones: &'a [Drone],
}

impl Environment for Stage<'_> {
    fn contacts_at(&self, point: Vec2, radius: f32) -> Vec<Contact> {
        let mut contacts = self.grid.contacts_at(point, radius);
        for (i, drone) in self.drones.iter().enumerate() {
            if drone.is_tangible() && drone.aabb().overlaps_circle(point, radius) {
                contacts.push(Contact {
                    surface: SurfaceId::Body(i),
                    category: SurfaceCategory::Ground,
                });
            }
        }
        contacts
    }

    fn closest_point(&self, surface: SurfaceId, point: Vec2) -> Option<Vec2> {
        match surface {
            SurfaceId::Cell(_) => self.grid.closest_point(surface, point),
            SurfaceId::Body(i) => self.drones.get(i).map(|d| d.aabb().closest_point(point)),
        }
    }

    // Drones are never footing.
    fn overlap_circle(&self, center: Vec2, radius: f32, category: SurfaceCategory) -> bool {
        self.grid.overlap_circle(center, radius, category)
    }

    fn move_and_collide(&self, aabb: Aabb, dx: f32, dy: f32) -> CollisionMoveResult {
        self.grid.move_and_collide(aabb, dx, dy)
    }

    fn body_position(&self, body: usize) -> Option<Vec2> {
        self.drones.get(body).map(Drone::position)
    }
}

pub struct Session<S: CueSink = CueLog> {
    pub tuning: Tuning,
    pub grid: CollisionGrid,
    pub player: Player,
    pub hooks: HookSet,
    pub mines: Vec<ElectricMine>,
    pub drones: Vec<Drone>,
    pub checkpoints: Vec<Checkpoint>,
    checkpoint: Vec2,
    pub timer: RunTimer,
    scheduler: Scheduler<TaskKey, Resume>,
    pub cues: S,
    dt: f32,
    dt_us: u64,
    steps: u64,
}

impl Session<CueLog> {
    pub fn new(tuning: Tuning, grid: CollisionGrid, level: &LevelFile) -> Self {
        Self::with_sink(tuning, grid, level, CueLog::new())
    }
}

impl<S: CueSink> Session<S> {
    pub fn with_sink(tuning: Tuning, grid: CollisionGrid, level: &LevelFile, cues: S) -> Self {
        let player = Player::new(
            standing_at(level.spawn, tuning.player.half_height),
            tuning.player,
        );
        let dt = tuning.fixed_dt;
        log::info!(
            "Level '{}' ready: {} mine(s), {} drone(s), {} checkpoint(s)",
            level.level_id,
            level.mines.len(),
            level.drones.len(),
            level.checkpoints.len()
        );

        Self {
            tuning,
            grid,
            player,
            hooks: HookSet::new(),
            mines: level.build_mines(),
            drones: level.build_drones(),
            checkpoints: level.build_checkpoints(),
            checkpoint: level.spawn,
            timer: RunTimer::new(),
            scheduler: Scheduler::new(),
            cues,
            dt,
            dt_us: secs_to_us(f64::from(dt)),
            steps: 0,
        }
    }

    pub fn checkpoint(&self) -> Vec2 {
        self.checkpoint
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_respawn_pending(&self) -> bool {
        self.scheduler.is_pending(TaskKey::Respawn)
    }

    pub fn stun_remaining_us(&self) -> Option<u64> {
        self.scheduler.remaining_us(TaskKey::Stun)
    }

    /// External cutscene trigger.
    pub fn set_cutscene(&mut self, active: bool) {
        self.player.set_cutscene(active, &mut self.cues);
    }

    /// External launch (jump pads, scripted throws): jumps no matter the mode.
    pub fn force_jump(&mut self) {
        self.player.force_jump(&mut self.hooks, &mut self.cues);
    }

    /// Stun the player and (re)start the stun timer.
    pub fn stun_player(&mut self) -> StunOutcome {
        let outcome = self.player.stun(&mut self.hooks, &mut self.cues);
        if outcome != StunOutcome::Ignored {
            let duration = secs_to_us(f64::from(self.tuning.hazard.stun_secs));
            if self
                .scheduler
                .schedule(TaskKey::Stun, duration, Resume::EndStun)
                .is_some()
            {
                log::debug!("Stun timer restarted");
            }
        }
        outcome
    }

    pub fn step(&mut self, input: &InputState) {
        for resume in self.scheduler.advance(self.dt_us) {
            self.resume(resume);
        }

        self.handle_actions(input);
        self.move_bodies();
        self.update_hooks();
        self.check_mines();

        let intent = MoveIntent {
            horizontal: input.horizontal(),
            vertical: input.vertical(),
            boost: input.is_held(Action::Boost),
        };
        let stage = Stage {
            grid: &self.grid,
            drones: &self.drones,
        };
        self.player
            .physics_step(intent, self.dt, &stage, &mut self.cues);

        self.player.registry.purge(&self.hooks);
        self.hooks.remove_destroyed();

        self.check_checkpoints();
        self.check_fall_out();
        self.timer.tick(self.dt_us, self.player.is_in_cutscene());
        self.steps += 1;
    }

    fn resume(&mut self, resume: Resume) {
        match resume {
            Resume::EndStun => self.player.end_stun(&mut self.cues),
            Resume::Respawn => self.respawn(),
            Resume::RechargeMine(i) => {
                if let Some(mine) = self.mines.get_mut(i) {
                    mine.recharge();
                    self.cues.flag(Flag::MineCharged(i), true);
                }
            }
            Resume::RestoreDrone(i) => {
                if let Some(drone) = self.drones.get_mut(i) {
                    drone.set_tangible(true);
                }
            }
        }
    }

    fn handle_actions(&mut self, input: &InputState) {
        if input.is_just_pressed(Action::ToggleDebug) {
            self.player.toggle_debug();
        }

        let stage = Stage {
            grid: &self.grid,
            drones: &self.drones,
        };
        if input.is_just_pressed(Action::Jump) {
            let outcome = self.player.jump(&mut self.hooks, &stage, &mut self.cues);
            log::trace!("Jump: {:?}", outcome);
        }
        if input.is_just_pressed(Action::Fire) {
            let fired = self.player.fire(
                &mut self.hooks,
                &stage,
                input.aim,
                &self.tuning.hook,
                &mut self.cues,
            );
            if let Some(id) = fired {
                self.guard_nearest_drone(id);
            }
        }
    }

    /// A point-blank shot must not grab the drone the player is standing next
    /// to, so that drone goes intangible for a moment.
    fn guard_nearest_drone(&mut self, hook: HookId) {
        let Some(fire_point) = self.hooks.get(hook).map(|h| h.fire_point) else {
            return;
        };
        let radius = self.tuning.hook.drone_guard_radius;
        let Some(i) = nearest_within(&self.drones, fire_point, radius) else {
            return;
        };
        self.drones[i].set_tangible(false);
        let duration = secs_to_us(f64::from(self.tuning.hook.drone_guard_secs));
        self.scheduler
            .schedule(TaskKey::DroneGuard(i), duration, Resume::RestoreDrone(i));
        log::debug!("Drone {} intangible after point-blank fire", i);
    }

    fn move_bodies(&mut self) {
        for drone in &mut self.drones {
            drone.patrol.step(self.dt);
        }
        for mine in &mut self.mines {
            mine.patrol.step(self.dt);
        }
        for hook in self.hooks.iter_mut() {
            let Some(anchor) = hook.anchor else {
                continue;
            };
            if let Some(drone) = self.drones.get(anchor.body) {
                hook.position = drone.position() + anchor.offset;
            }
        }
    }

    fn update_hooks(&mut self) {
        let stage = Stage {
            grid: &self.grid,
            drones: &self.drones,
        };
        let origin = self.player.position();
        let hook_tuning = self.tuning.hook;
        let gravity = self.tuning.player.gravity;

        for hook in self.hooks.iter_mut() {
            let motion = projectile::advance(
                hook,
                origin,
                self.dt,
                gravity,
                hook_tuning.gravity_scale,
                hook_tuning.return_threshold,
            );
            if motion == Motion::Returned {
                continue;
            }

            if hook.state() == HookState::Flying {
                let contacts = stage.contacts_at(hook.position, hook_tuning.contact_radius);
                let surfaces: Vec<SurfaceId> = contacts.iter().map(|c| c.surface).collect();
                let entered = hook.enter_contacts(&surfaces);

                for contact in contacts
                    .into_iter()
                    .filter(|c| entered.contains(&c.surface))
                {
                    match resolve_contact(
                        hook,
                        contact,
                        &stage,
                        origin,
                        hook_tuning.unhookable_kick,
                    ) {
                        ContactOutcome::Attached { .. } => {
                            if let Some(SurfaceId::Body(i)) = hook.hooked_surface() {
                                if stage.drones.get(i).is_some_and(|d| d.pulls_hard) {
                                    hook.no_damping = true;
                                }
                            }
                            self.cues.sound(Sound::HookHit);
                            self.player.begin_pull(hook, &mut self.cues);
                            break;
                        }
                        ContactOutcome::Dropped => self.cues.sound(Sound::Cling),
                        ContactOutcome::PulledBack => break,
                        ContactOutcome::Ignored => {}
                    }
                }
            }

            if projectile::out_of_rope(hook, origin) {
                if let Some(joint) = hook.pull_back() {
                    self.player.joints.remove(joint);
                }
                log::trace!("{:?} ran out of rope", hook.id);
            }

            update_hook_joint(hook, &mut self.player.joints, origin);
        }
    }

    fn check_mines(&mut self) {
        let contact_radius = self.tuning.hook.contact_radius;
        for i in 0..self.mines.len() {
            let mine = &mut self.mines[i];
            let mut touching = Vec::new();
            if self.player.mode() != MotionMode::Debug && mine.overlaps_body(&self.player.aabb) {
                touching.push(Toucher::Player);
            }
            touching.extend(
                self.hooks
                    .iter()
                    .filter(|h| h.is_live() && mine.overlaps_point(h.position, contact_radius))
                    .map(|h| Toucher::Hook(h.id)),
            );

            let entered = mine.enter(&touching);
            if entered.is_empty() || !mine.is_charged() {
                continue;
            }
            self.shock(i, &entered);
        }
    }

    fn shock(&mut self, index: usize, entered: &[Toucher]) {
        for toucher in entered {
            let Toucher::Hook(id) = toucher else {
                continue;
            };
            if let Some(hook) = self.hooks.get_mut(*id) {
                if hook.enable_gravity(Vec2::ZERO) {
                    self.cues.sound(Sound::Cling);
                }
            }
        }

        self.stun_player();
        self.cues.sound(Sound::Shock);

        let mine_at = self.mines[index].position();
        if let Some(direction) = knockback_direction(mine_at, self.player.position()) {
            self.player
                .knock_back(direction, self.tuning.hazard.knockback);
        }

        self.mines[index].discharge();
        self.cues.flag(Flag::MineCharged(index), false);
        let recharge = secs_to_us(f64::from(self.tuning.hazard.recharge_secs));
        self.scheduler.schedule(
            TaskKey::MineRecharge(index),
            recharge,
            Resume::RechargeMine(index),
        );
        log::debug!("Mine {} discharged", index);
    }

    fn check_checkpoints(&mut self) {
        for checkpoint in &self.checkpoints {
            if !checkpoint.overlaps(&self.player.aabb) {
                continue;
            }
            let point = checkpoint.spawn_point();
            if point != self.checkpoint {
                self.checkpoint = point;
                log::info!("Checkpoint activated at ({:.2}, {:.2})", point.x, point.y);
            }
        }
    }

    fn check_fall_out(&mut self) {
        if self.player.position().y >= self.tuning.hazard.kill_height || self.is_respawn_pending() {
            return;
        }
        self.player.set_cutscene(true, &mut self.cues);
        self.cues.sound(Sound::Lose);
        let delay = secs_to_us(f64::from(self.tuning.hazard.respawn_secs));
        self.scheduler
            .schedule(TaskKey::Respawn, delay, Resume::Respawn);
        log::info!("Player fell out of the level, respawning");
    }

    /// Reset the level around the player and put them back at the checkpoint.
    pub fn respawn(&mut self) {
        self.player.release_hooks(&mut self.hooks, &mut self.cues);
        self.hooks.clear();
        self.player.end_stun(&mut self.cues);
        self.scheduler.clear();

        for (i, mine) in self.mines.iter_mut().enumerate() {
            if !mine.is_charged() {
                self.cues.flag(Flag::MineCharged(i), true);
            }
            mine.reset();
        }
        for drone in &mut self.drones {
            drone.reset();
        }

        let at = standing_at(self.checkpoint, self.player.tuning.half_height);
        self.player.respawn_at(at);
        self.player.set_cutscene(false, &mut self.cues);
        self.timer.record_reboot();
        log::info!(
            "Respawned at ({:.2}, {:.2}), reboot #{}",
            self.checkpoint.x,
            self.checkpoint.y,
            self.timer.reboots
        );
    }
}

/// Body centre for a player whose feet rest on `feet`.
fn standing_at(feet: Vec2, half_height: f32) -> Vec2 {
    feet + Vec2::new(0.0, half_height)
}
