//! The timer as the user drives it: state machine, cadence, stores and the
//! signals the presentation layer reacts to, owned by one value.

use crate::clock::TickClock;
use crate::config::{Config, ConfigStore, SettingsInput, Theme, ValidationError};
use crate::notice::Notice;
use crate::session::{SessionStateMachine, SessionView, Transition};
use crate::stats::{Stats, StatsStore};
use chrono::{Local, NaiveDate};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info};

/// Something the presentation layer should react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Transition(Transition),
    Notice(Notice),
    /// Once per completed focus session.
    Celebrate,
    /// Feedback tone for an effective pause.
    Chime,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Please pause the timer before changing settings")]
    Busy,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

pub struct Flow<C: ConfigStore, S: StatsStore> {
    config_store: C,
    stats_store: S,
    config: Config,
    stats: Stats,
    machine: SessionStateMachine,
    clock: TickClock,
    signals: Vec<Signal>,
    today: Box<dyn Fn() -> NaiveDate>,
}

impl<C: ConfigStore, S: StatsStore> Flow<C, S> {
    pub fn new(config_store: C, stats_store: S) -> Self {
        let config = config_store.load();
        let stats = stats_store.load();
        let machine = SessionStateMachine::new(&config);
        info!(
            focus = config.focus_secs,
            short_break = config.break_secs,
            long_break = config.long_break_secs,
            threshold = config.sessions_before_long_break,
            total_sessions = stats.total_sessions,
            streak = stats.streak,
            "timer ready"
        );
        Self {
            config_store,
            stats_store,
            config,
            stats,
            machine,
            clock: TickClock::default(),
            signals: Vec::new(),
            today: Box::new(|| Local::now().date_naive()),
        }
    }

    /// Replace the source of "today" used for streaks.
    pub fn with_calendar(mut self, today: impl Fn() -> NaiveDate + 'static) -> Self {
        self.today = Box::new(today);
        self
    }

    /// Replace the tick clock (tests use shorter intervals).
    pub fn with_clock(mut self, clock: TickClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn machine(&self) -> &SessionStateMachine {
        &self.machine
    }

    pub fn clock(&self) -> &TickClock {
        &self.clock
    }

    pub fn view(&self) -> SessionView {
        self.machine.view()
    }

    pub fn start(&mut self, now: Instant) {
        self.machine.start();
        let id = self.clock.arm(now);
        debug!(cadence = ?id, "tick cadence armed");
    }

    pub fn pause(&mut self) {
        if self.machine.pause() {
            self.clock.cancel();
            self.signals.push(Signal::Chime);
        }
    }

    pub fn reset(&mut self) {
        self.clock.cancel();
        self.machine.reset();
    }

    /// Start when idle or paused, pause when running.
    pub fn toggle(&mut self, now: Instant) {
        if self.machine.is_running() {
            self.pause();
        } else {
            self.start(now);
        }
    }

    /// Deliver every firing that is due at `now`. Returns how many ticks
    /// were applied.
    pub fn advance(&mut self, now: Instant) -> u32 {
        let mut applied = 0;
        while self.clock.fire(now) {
            applied += 1;
            self.on_tick();
        }
        applied
    }

    /// Apply one cadence firing.
    pub fn on_tick(&mut self) {
        if let Some(transition) = self.machine.tick() {
            self.clock.cancel();
            self.finish_phase(transition);
        }
    }

    fn finish_phase(&mut self, transition: Transition) {
        if transition.completed_focus() {
            let today = (self.today)();
            self.stats = self.stats.record_focus_completion(today);
            info!(
                total = self.stats.total_sessions,
                streak = self.stats.streak,
                %today,
                "focus session complete"
            );
            if let Err(e) = self.stats_store.save(&self.stats) {
                error!(error = %e, "failed to save progress");
                self.signals
                    .push(Signal::Notice(Notice::error("Failed to save progress")));
            }
            self.signals.push(Signal::Celebrate);
        }

        self.signals.push(Signal::Transition(transition));
        let notice = match transition {
            Transition::FocusToShortBreak => {
                Notice::success("Focus session complete! Take a short break.")
            }
            Transition::FocusToLongBreak => Notice::success("Great job! Time for a longer break."),
            Transition::BreakToFocus => Notice::info("Break's over. Ready to focus?"),
        };
        self.signals.push(Signal::Notice(notice));
    }

    /// Pre-filled settings for the panel, or `None` (with a notice) while a
    /// session is running or paused.
    pub fn open_settings(&mut self) -> Option<SettingsInput> {
        if !self.machine.is_idle() {
            self.signals
                .push(Signal::Notice(Notice::info(SettingsError::Busy.to_string())));
            return None;
        }
        Some(SettingsInput::from_config(&self.config, self.machine.phase()))
    }

    /// Validate and apply the settings panel. On any error nothing changes.
    pub fn save_settings(&mut self, input: SettingsInput) -> Result<(), SettingsError> {
        if !self.machine.is_idle() {
            self.signals
                .push(Signal::Notice(Notice::info(SettingsError::Busy.to_string())));
            return Err(SettingsError::Busy);
        }
        if let Err(e) = input.validate() {
            debug!(error = %e, "settings rejected");
            self.signals.push(Signal::Notice(Notice::error(e.to_string())));
            return Err(e.into());
        }

        self.config = self.config.with_settings(&input);
        self.machine.apply_config(&self.config);
        self.machine.change_session_type(input.session_type);

        match self.config_store.save(&self.config) {
            Ok(()) => {
                info!(
                    focus = self.config.focus_secs,
                    short_break = self.config.break_secs,
                    long_break = self.config.long_break_secs,
                    theme = %self.config.theme,
                    phase = ?input.session_type,
                    "settings saved"
                );
                self.signals
                    .push(Signal::Notice(Notice::success("Settings saved successfully")));
            }
            Err(e) => {
                error!(error = %e, "failed to save settings");
                self.signals
                    .push(Signal::Notice(Notice::error("Failed to save settings")));
            }
        }
        Ok(())
    }

    /// Switch theme immediately and persist it.
    pub fn set_theme(&mut self, theme: Theme) {
        if self.config.theme == theme {
            return;
        }
        self.config.theme = theme;
        if let Err(e) = self.config_store.save(&self.config) {
            error!(error = %e, "failed to save theme");
            self.signals
                .push(Signal::Notice(Notice::error("Failed to save settings")));
        }
    }

    pub fn drain_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.signals)
    }

    /// Release the cadence. Nothing fires afterwards.
    pub fn teardown(&mut self) {
        if let Some(id) = self.clock.cancel() {
            debug!(cadence = ?id, "tick cadence released");
        }
    }
}
