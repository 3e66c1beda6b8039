//! Fire-and-forget feedback for the audio and animation collaborators.
//!
//! Gameplay never reads anything back through a sink; it only requests
//! sounds and sets presentation flags.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sound {
    HookFire,
    HookHit,
    Cling,
    Whoosh,
    Jump,
    Stun,
    Shock,
    Lose,
}

impl Sound {
    pub fn label(self) -> &'static str {
        match self {
            Self::HookFire => "hookfire",
            Self::HookHit => "hookhit",
            Self::Cling => "cling",
            Self::Whoosh => "whoosh",
            Self::Jump => "jump",
            Self::Stun => "glitch",
            Self::Shock => "shock",
            Self::Lose => "lose",
        }
    }
}

impl std::fmt::Display for Sound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    Stunned,
    Pulled,
    /// Per mine; carries the mine index.
    MineCharged(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cue {
    Sound { sound: Sound },
    Flag { flag: Flag, on: bool },
}

pub trait CueSink {
    fn emit(&mut self, cue: Cue);

    fn sound(&mut self, sound: Sound) {
        self.emit(Cue::Sound { sound });
    }

    fn flag(&mut self, flag: Flag, on: bool) {
        self.emit(Cue::Flag { flag, on });
    }
}

/// Records every cue in order. The headless runner and tests read it back.
#[derive(Debug, Default, Clone)]
pub struct CueLog {
    cues: Vec<Cue>,
}

impl CueLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn count_sound(&self, sound: Sound) -> usize {
        self.cues
            .iter()
            .filter(|c| matches!(c, Cue::Sound { sound: s } if *s == sound))
            .count()
    }

    /// Latest requested value of `flag`, if it was ever set.
    pub fn last_flag(&self, flag: Flag) -> Option<bool> {
        self.cues.iter().rev().find_map(|c| match c {
            Cue::Flag { flag: f, on } if *f == flag => Some(*on),
            _ => None,
        })
    }

    pub fn drain(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    pub fn to_json_lines(&self) -> Result<String, String> {
        let mut out = String::new();
        for cue in &self.cues {
            let line =
                serde_json::to_string(cue).map_err(|e| format!("Failed to encode cue: {e}"))?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }
}

impl CueSink for CueLog {
    fn emit(&mut self, cue: Cue) {
        log::trace!("cue {:?}", cue);
        self.cues.push(cue);
    }
}
