//! Fixed-timestep clock shared by the physics tick and the render frame.
//!
//! Physics-affecting work (projectile advancement, joint damping, player
//! integration) runs once per `should_step()`; orientation and visual flags
//! run once per frame. Frame time is fed explicitly through `advance` so
//! replays stay deterministic.

pub const DEFAULT_FIXED_DT: f64 = 1.0 / 60.0;

pub struct TimeState {
    pub fixed_dt: f64,
    pub max_accumulator: f64,
    accumulator: f64,
    pub total_time: f64,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    pub real_dt: f64,
    pub interpolation_alpha: f64,
}

impl TimeState {
    pub fn new() -> Self {
        Self::with_fixed_dt(DEFAULT_FIXED_DT)
    }

    pub fn with_fixed_dt(fixed_dt: f64) -> Self {
        Self {
            fixed_dt,
            max_accumulator: 0.25,
            accumulator: 0.0,
            total_time: 0.0,
            fixed_step_count: 0,
            frame_count: 0,
            steps_this_frame: 0,
            real_dt: 0.0,
            interpolation_alpha: 0.0,
        }
    }

    /// Feed one frame's worth of time into the accumulator.
    pub fn advance(&mut self, real_dt: f64) {
        self.real_dt = real_dt;

        // Spiral-of-death cap
        if self.real_dt > self.max_accumulator {
            log::warn!(
                "Frame took {:.1}ms, capping accumulator to {}ms",
                self.real_dt * 1000.0,
                self.max_accumulator * 1000.0
            );
            self.real_dt = self.max_accumulator;
        }

        self.accumulator += self.real_dt;
        self.steps_this_frame = 0;
        self.frame_count += 1;
    }

    pub fn should_step(&mut self) -> bool {
        if self.accumulator >= self.fixed_dt {
            self.accumulator -= self.fixed_dt;
            self.total_time += self.fixed_dt;
            self.fixed_step_count += 1;
            self.steps_this_frame += 1;
            true
        } else {
            false
        }
    }

    pub fn end_frame(&mut self) {
        self.interpolation_alpha = self.accumulator / self.fixed_dt;
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new()
    }
}

/// Seconds to whole microseconds, the unit the scheduler counts in.
/// Negative and NaN durations become zero.
pub fn secs_to_us(secs: f64) -> u64 {
    if !(secs > 0.0) {
        0
    } else {
        (secs * 1_000_000.0).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_runs_whole_steps_only() {
        let mut time = TimeState::with_fixed_dt(0.0625);
        time.advance(0.21875);
        let mut steps = 0;
        while time.should_step() {
            steps += 1;
        }
        time.end_frame();
        assert_eq!(steps, 3);
        assert_eq!(time.steps_this_frame, 3);
        assert!((time.interpolation_alpha - 0.5).abs() < 1e-6);
    }

    #[test]
    fn leftover_time_carries_into_next_frame() {
        let mut time = TimeState::with_fixed_dt(0.0625);
        time.advance(0.03125);
        assert!(!time.should_step());
        time.advance(0.03125);
        assert!(time.should_step());
        assert!(!time.should_step());
        assert_eq!(time.fixed_step_count, 1);
    }

    #[test]
    fn long_frame_is_capped() {
        let mut time = TimeState::with_fixed_dt(0.0625);
        time.advance(5.0);
        let mut steps = 0;
        while time.should_step() {
            steps += 1;
        }
        assert_eq!(steps, 4);
    }

    #[test]
    fn durations_convert_to_microseconds() {
        assert_eq!(secs_to_us(DEFAULT_FIXED_DT), 16_667);
        assert_eq!(secs_to_us(3.0), 3_000_000);
        assert_eq!(secs_to_us(-1.0), 0);
        assert_eq!(secs_to_us(f64::NAN), 0);
    }
}
