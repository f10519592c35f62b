//! The focus/break session state machine.
//!
//! State is `phase × {idle, running, paused}` plus the countdown and the
//! number of focus sessions left before a long break. Nothing here is
//! fallible and nothing here does I/O; the owner reacts to the returned
//! [`Transition`] values.

use crate::config::Config;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Phase {
    #[strum(to_string = "Focus Session")]
    Focus,
    #[strum(to_string = "Break Time")]
    ShortBreak,
    #[strum(to_string = "Long Break")]
    LongBreak,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Focus, Phase::ShortBreak, Phase::LongBreak];

    pub fn is_break(self) -> bool {
        !matches!(self, Phase::Focus)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Paused,
}

/// Which phase change a completed countdown caused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    FocusToShortBreak,
    FocusToLongBreak,
    BreakToFocus,
}

impl Transition {
    pub fn completed_focus(self) -> bool {
        matches!(
            self,
            Transition::FocusToShortBreak | Transition::FocusToLongBreak
        )
    }

    pub fn next_phase(self) -> Phase {
        match self {
            Transition::FocusToShortBreak => Phase::ShortBreak,
            Transition::FocusToLongBreak => Phase::LongBreak,
            Transition::BreakToFocus => Phase::Focus,
        }
    }
}

/// Read-only snapshot handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionView {
    pub phase: Phase,
    pub remaining_secs: u32,
    pub total_secs: u32,
    pub is_running: bool,
    pub is_paused: bool,
    pub sessions_until_long_break: u32,
}

impl SessionView {
    pub fn clock_text(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.remaining_secs / 60,
            self.remaining_secs % 60
        )
    }

    /// Fraction of the current phase already elapsed, 0.0 to 1.0.
    pub fn progress(&self) -> f64 {
        if self.total_secs == 0 {
            return 1.0;
        }
        let remaining = self.remaining_secs.min(self.total_secs) as f64;
        (1.0 - remaining / self.total_secs as f64).clamp(0.0, 1.0)
    }

    pub fn phase_label(&self) -> String {
        self.phase.to_string()
    }

    /// Caption for the start control.
    pub fn action_label(&self) -> &'static str {
        if self.is_running {
            "WORKING..."
        } else if self.is_paused {
            "CONTINUE"
        } else {
            match self.phase {
                Phase::Focus => "BEGIN",
                Phase::ShortBreak => "START BREAK",
                Phase::LongBreak => "START LONG BREAK",
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Durations {
    focus: u32,
    short_break: u32,
    long_break: u32,
}

impl Durations {
    fn of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Focus => self.focus,
            Phase::ShortBreak => self.short_break,
            Phase::LongBreak => self.long_break,
        }
    }
}

impl From<&Config> for Durations {
    fn from(cfg: &Config) -> Self {
        Self {
            focus: cfg.focus_secs,
            short_break: cfg.break_secs,
            long_break: cfg.long_break_secs,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    phase: Phase,
    run_state: RunState,
    remaining_secs: u32,
    sessions_until_long_break: u32,
    threshold: u32,
    durations: Durations,
}

impl SessionStateMachine {
    /// Idle in Focus with a full focus countdown.
    pub fn new(cfg: &Config) -> Self {
        let durations = Durations::from(cfg);
        let threshold = cfg.sessions_before_long_break.max(1);
        Self {
            phase: Phase::Focus,
            run_state: RunState::Idle,
            remaining_secs: durations.focus,
            sessions_until_long_break: threshold,
            threshold,
            durations,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn sessions_until_long_break(&self) -> u32 {
        self.sessions_until_long_break
    }

    pub fn is_idle(&self) -> bool {
        self.run_state == RunState::Idle
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.run_state == RunState::Paused
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            total_secs: self.durations.of(self.phase),
            is_running: self.is_running(),
            is_paused: self.is_paused(),
            sessions_until_long_break: self.sessions_until_long_break,
        }
    }

    /// Begin or resume counting down. Calling it while running keeps the
    /// remaining time; the owner re-arms its cadence either way.
    pub fn start(&mut self) {
        if self.run_state != RunState::Running {
            debug!(phase = ?self.phase, remaining = self.remaining_secs, "session running");
        }
        self.run_state = RunState::Running;
    }

    /// Returns `false` when there was nothing to pause.
    pub fn pause(&mut self) -> bool {
        if self.run_state != RunState::Running {
            return false;
        }
        self.run_state = RunState::Paused;
        debug!(phase = ?self.phase, remaining = self.remaining_secs, "session paused");
        true
    }

    /// Back to idle with the current phase's full duration.
    pub fn reset(&mut self) {
        self.run_state = RunState::Idle;
        self.remaining_secs = self.durations.of(self.phase);
        debug!(phase = ?self.phase, remaining = self.remaining_secs, "session reset");
    }

    /// One accepted cadence firing.
    pub fn tick(&mut self) -> Option<Transition> {
        if self.run_state != RunState::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            Some(self.complete_phase())
        } else {
            None
        }
    }

    /// Move to the next phase and go idle there.
    pub fn complete_phase(&mut self) -> Transition {
        let transition = match self.phase {
            Phase::Focus => {
                self.sessions_until_long_break = self.sessions_until_long_break.saturating_sub(1);
                if self.sessions_until_long_break == 0 {
                    self.sessions_until_long_break = self.threshold;
                    Transition::FocusToLongBreak
                } else {
                    Transition::FocusToShortBreak
                }
            }
            Phase::ShortBreak | Phase::LongBreak => Transition::BreakToFocus,
        };

        self.phase = transition.next_phase();
        self.remaining_secs = self.durations.of(self.phase);
        self.run_state = RunState::Idle;
        debug!(?transition, until_long_break = self.sessions_until_long_break, "phase complete");
        transition
    }

    /// Switch to `target` and reset there. Only honoured while idle.
    pub fn change_session_type(&mut self, target: Phase) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.phase = target;
        self.reset();
        true
    }

    /// Take new durations and threshold for later resets and completions.
    /// The running countdown is left alone.
    pub fn apply_config(&mut self, cfg: &Config) {
        self.durations = Durations::from(cfg);
        let threshold = cfg.sessions_before_long_break.max(1);
        if threshold != self.threshold {
            self.threshold = threshold;
            self.sessions_until_long_break = self.sessions_until_long_break.min(threshold);
        }
    }
}
