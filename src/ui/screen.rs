use crossterm::event::KeyEvent;
use ratatui::Frame;

use crate::{ui::settings::render_settings, App, AppState};

/// A UI Screen boundary: responsible for rendering and optional key handling
pub trait Screen {
    fn render(&self, app: &mut App, f: &mut Frame);
    /// Optional per-screen key handling. Returns true if the key was handled.
    fn on_key(&mut self, _key: KeyEvent, _app: &mut App) -> bool {
        false
    }
}

/// Countdown screen - renders the App widget
pub struct TimerScreen;

impl Screen for TimerScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

/// Settings panel drawn over the countdown
pub struct SettingsScreen;

impl Screen for SettingsScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
        render_settings(app, f);
    }
}

pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Timer => Box::new(TimerScreen),
        AppState::Settings => Box::new(SettingsScreen),
    }
}
