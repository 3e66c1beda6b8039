//! Level and run clocks. Cutscene time is not counted.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunTimer {
    level_us: u64,
    /// Completed-level time carried into the current run.
    carried_us: u64,
    pub reboots: u32,
}

impl RunTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, dt_us: u64, in_cutscene: bool) {
        if !in_cutscene {
            self.level_us += dt_us;
        }
    }

    pub fn level_us(&self) -> u64 {
        self.level_us
    }

    pub fn total_us(&self) -> u64 {
        self.carried_us + self.level_us
    }

    /// Close the current level, folding its time into the run total.
    pub fn complete_level(&mut self) {
        self.carried_us += self.level_us;
        self.level_us = 0;
        self.reboots = 0;
    }

    pub fn record_reboot(&mut self) {
        self.reboots += 1;
    }

    pub fn level_label(&self) -> String {
        format_clock(self.level_us)
    }

    pub fn total_label(&self) -> String {
        format_clock(self.total_us())
    }
}

/// `MM:SS.ss`, rounded to the centisecond.
pub fn format_clock(us: u64) -> String {
    let centis = (us + 5_000) / 10_000;
    let minutes = centis / 6_000;
    let rest = centis % 6_000;
    format!("{:02}:{:02}.{:02}", minutes, rest / 100, rest % 100)
}
