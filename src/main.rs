mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
    tty::IsTty,
};
use mindflow::{
    app_dirs::AppDirs,
    celebration::Celebration,
    chime::{Chime, TerminalBell},
    config::{FileConfigStore, SettingsInput, Theme},
    flow::{Flow, Signal},
    notice::NoticeBoard,
    runtime::{CrosstermEventSource, FixedTicker, FlowEvent, FlowEventSource, Runner, Ticker},
    session::Phase,
    stats::FileStatsStore,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin, Write},
    path::PathBuf,
    sync::Mutex,
    time::Instant,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const WINDOW_TITLE_SUFFIX: &str = "Mind • Flow";
const MAX_MINUTES: u32 = 999;

/// focus and break timer for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A pomodoro style focus timer: alternate focus sessions with short breaks, take a long break every few sessions, and keep a daily streak going."
)]
pub struct Cli {
    /// keep config, stats and the log file in this directory
    #[clap(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// do not ring the terminal bell when pausing
    #[clap(long)]
    no_sound: bool,
}

impl Cli {
    fn app_dirs(&self) -> AppDirs {
        match &self.data_dir {
            Some(dir) => AppDirs::rooted_at(dir),
            None => AppDirs::resolve(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Timer,
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Focus,
    ShortBreak,
    LongBreak,
    Theme,
    SessionType,
}

impl SettingsField {
    pub const ALL: [SettingsField; 5] = [
        SettingsField::Focus,
        SettingsField::ShortBreak,
        SettingsField::LongBreak,
        SettingsField::Theme,
        SettingsField::SessionType,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingsField::Focus => "Focus length (min)",
            SettingsField::ShortBreak => "Short break (min)",
            SettingsField::LongBreak => "Long break (min)",
            SettingsField::Theme => "Theme",
            SettingsField::SessionType => "Session type",
        }
    }
}

/// Step through `all` from `current` by `delta`, wrapping around.
fn cycle<T: Copy + PartialEq>(all: &[T], current: T, delta: i32) -> T {
    let len = all.len() as i32;
    let idx = all.iter().position(|v| *v == current).unwrap_or(0) as i32;
    all[(idx + delta).rem_euclid(len) as usize]
}

/// Edit state of the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsForm {
    pub input: SettingsInput,
    pub selected: SettingsField,
}

impl SettingsForm {
    pub fn new(input: SettingsInput) -> Self {
        Self {
            input,
            selected: SettingsField::Focus,
        }
    }

    pub fn select(&mut self, delta: i32) {
        self.selected = cycle(&SettingsField::ALL, self.selected, delta);
    }

    /// Range checks happen on save, so minutes may leave the valid range here.
    pub fn adjust(&mut self, delta: i32) {
        let step = |v: u32| (v as i64 + delta as i64).clamp(0, MAX_MINUTES as i64) as u32;
        let input = &mut self.input;
        match self.selected {
            SettingsField::Focus => input.focus_minutes = step(input.focus_minutes),
            SettingsField::ShortBreak => input.break_minutes = step(input.break_minutes),
            SettingsField::LongBreak => {
                input.long_break_minutes = step(input.long_break_minutes)
            }
            SettingsField::Theme => input.theme = cycle(&Theme::ALL, input.theme, delta),
            SettingsField::SessionType => {
                input.session_type = cycle(&Phase::ALL, input.session_type, delta)
            }
        }
    }

    pub fn value_text(&self, field: SettingsField) -> String {
        match field {
            SettingsField::Focus => self.input.focus_minutes.to_string(),
            SettingsField::ShortBreak => self.input.break_minutes.to_string(),
            SettingsField::LongBreak => self.input.long_break_minutes.to_string(),
            SettingsField::Theme => self.input.theme.to_string(),
            SettingsField::SessionType => self.input.session_type.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

pub struct App {
    pub flow: Flow<FileConfigStore, FileStatsStore>,
    pub state: AppState,
    pub settings_form: Option<SettingsForm>,
    pub notices: NoticeBoard,
    pub celebration: Celebration,
    pub chime: Option<Chime<TerminalBell>>,
    last_title: String,
}

impl App {
    pub fn new(dirs: &AppDirs, sound: bool) -> Self {
        let flow = Flow::new(
            FileConfigStore::with_path(dirs.config_path()),
            FileStatsStore::with_path(dirs.stats_path()),
        );
        Self::with_flow(flow, sound)
    }

    pub fn with_flow(flow: Flow<FileConfigStore, FileStatsStore>, sound: bool) -> Self {
        Self {
            flow,
            state: AppState::Timer,
            settings_form: None,
            notices: NoticeBoard::default(),
            celebration: Celebration::new(),
            chime: sound.then(|| Chime::new(TerminalBell)),
            last_title: String::new(),
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> Control {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Control::Quit;
        }

        match self.state {
            AppState::Timer => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => return Control::Quit,
                KeyCode::Char(' ') | KeyCode::Char('s') => self.flow.start(now),
                KeyCode::Char('p') => self.flow.pause(),
                KeyCode::Char('r') => self.flow.reset(),
                KeyCode::Char('o') => {
                    if let Some(input) = self.flow.open_settings() {
                        self.settings_form = Some(SettingsForm::new(input));
                        self.state = AppState::Settings;
                    }
                }
                KeyCode::Char('t') => {
                    let theme = self.flow.config().theme.next();
                    self.flow.set_theme(theme);
                }
                _ => {}
            },
            AppState::Settings => self.on_settings_key(key),
        }
        Control::Continue
    }

    fn on_settings_key(&mut self, key: KeyEvent) {
        let Some(form) = self.settings_form.as_mut() else {
            self.state = AppState::Timer;
            return;
        };

        match key.code {
            KeyCode::Esc => self.close_settings(),
            KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => form.select(-1),
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => form.select(1),
            KeyCode::Left | KeyCode::Char('-') | KeyCode::Char('h') => form.adjust(-1),
            KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Char('l') => {
                form.adjust(1)
            }
            KeyCode::Enter => {
                let input = form.input;
                // a rejected save keeps the panel open; the notice says why
                if self.flow.save_settings(input).is_ok() {
                    self.close_settings();
                }
            }
            _ => {}
        }
    }

    fn close_settings(&mut self) {
        self.settings_form = None;
        self.state = AppState::Timer;
    }

    /// Fire due ticks and route the resulting signals.
    pub fn on_frame(&mut self, now: Instant, width: u16, height: u16) {
        self.flow.advance(now);
        for signal in self.flow.drain_signals() {
            match signal {
                Signal::Notice(notice) => self.notices.show(notice, now),
                Signal::Celebrate => self.celebration.start_at(width, height, now),
                Signal::Chime => {
                    if let Some(chime) = self.chime.as_mut() {
                        chime.play();
                    }
                }
                Signal::Transition(transition) => debug!(?transition, "phase changed"),
            }
        }
        self.celebration.update_at(now);
        self.notices.expire(now);
    }

    pub fn window_title(&self) -> String {
        format!(
            "{} - {}",
            self.flow.view().clock_text(),
            WINDOW_TITLE_SUFFIX
        )
    }

    /// The new title when it differs from the last one handed out.
    fn title_update(&mut self) -> Option<String> {
        let title = self.window_title();
        if title == self.last_title {
            return None;
        }
        self.last_title = title.clone();
        Some(title)
    }

    pub fn shutdown(&mut self) {
        self.flow.teardown();
        if let Some(chime) = self.chime.as_mut() {
            chime.release();
        }
    }
}

fn init_logging(dirs: &AppDirs) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(dirs.state_dir())?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dirs.log_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mindflow=info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let dirs = cli.app_dirs();
    init_logging(&dirs)?;
    info!(
        config = %dirs.config_path().display(),
        stats = %dirs.stats_path().display(),
        sound = !cli.no_sound,
        "mindflow starting"
    );

    let mut app = App::new(&dirs, !cli.no_sound);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let result = start_tui(&mut terminal, &mut app, &runner);

    app.shutdown();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    info!("mindflow stopped");

    result
}

fn start_tui<B, E, T>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>>
where
    B: Backend + Write,
    E: FlowEventSource,
    T: Ticker,
{
    loop {
        if let Some(title) = app.title_update() {
            execute!(terminal.backend_mut(), SetTitle(title))?;
        }
        terminal.draw(|f| ui(app, f))?;

        let wait = app
            .flow
            .clock()
            .until_next(Instant::now())
            .unwrap_or_else(|| runner.interval());
        match runner.step_within(wait) {
            FlowEvent::Key(key) => {
                if app.on_key(key, Instant::now()) == Control::Quit {
                    break;
                }
            }
            FlowEvent::Resize | FlowEvent::Frame => {}
        }

        let size = terminal.size()?;
        app.on_frame(Instant::now(), size.width, size.height);
    }

    Ok(())
}

fn ui(app: &mut App, f: &mut Frame) {
    ui::screen::current_screen(&app.state).render(app, f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use mindflow::notice::Severity;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app() -> (App, TempDir) {
        let dir = tempdir().unwrap();
        let app = App::new(&AppDirs::rooted_at(dir.path()), false);
        (app, dir)
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["mindflow"]);
        assert_eq!(cli.data_dir, None);
        assert!(!cli.no_sound);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from(["mindflow", "--data-dir", "/tmp/flow", "--no-sound"]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/flow")));
        assert!(cli.no_sound);
        assert_eq!(
            cli.app_dirs().stats_path(),
            PathBuf::from("/tmp/flow/stats.json")
        );
    }

    #[test]
    fn test_cli_rejects_unknown_flag() {
        assert!(Cli::try_parse_from(["mindflow", "--focus", "10"]).is_err());
    }

    #[test]
    fn test_cycle_wraps_both_ways() {
        assert_eq!(cycle(&Theme::ALL, Theme::Purple, 1), Theme::Default);
        assert_eq!(cycle(&Theme::ALL, Theme::Default, -1), Theme::Purple);
        assert_eq!(cycle(&Phase::ALL, Phase::Focus, 2), Phase::LongBreak);
    }

    #[test]
    fn test_settings_form_adjust() {
        let (app, _dir) = test_app();
        let input = SettingsInput::from_config(app.flow.config(), Phase::Focus);
        let mut form = SettingsForm::new(input);

        form.adjust(5);
        assert_eq!(form.input.focus_minutes, 30);

        form.select(1);
        assert_eq!(form.selected, SettingsField::ShortBreak);
        form.adjust(-10);
        assert_eq!(form.input.break_minutes, 0);

        form.select(2);
        form.adjust(1);
        assert_eq!(form.input.theme, Theme::Blue);
        assert_eq!(form.value_text(SettingsField::Theme), "blue");

        form.select(1);
        form.adjust(-1);
        assert_eq!(form.input.session_type, Phase::LongBreak);

        form.select(1);
        assert_eq!(form.selected, SettingsField::Focus);
    }

    #[test]
    fn test_start_pause_reset_keys() {
        let (mut app, _dir) = test_app();
        let t0 = Instant::now();

        assert_eq!(app.on_key(key(KeyCode::Char(' ')), t0), Control::Continue);
        assert!(app.flow.view().is_running);

        app.on_frame(t0 + Duration::from_secs(2), 80, 24);
        assert_eq!(app.flow.view().remaining_secs, 1498);

        app.on_key(key(KeyCode::Char('p')), t0);
        assert!(app.flow.view().is_paused);

        app.on_key(key(KeyCode::Char('s')), t0);
        assert!(app.flow.view().is_running);

        app.on_key(key(KeyCode::Char('r')), t0);
        assert!(!app.flow.view().is_running);
        assert_eq!(app.flow.view().remaining_secs, 1500);
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _dir) = test_app();
        let now = Instant::now();
        assert_eq!(app.on_key(key(KeyCode::Esc), now), Control::Quit);
        assert_eq!(app.on_key(key(KeyCode::Char('q')), now), Control::Quit);
        assert_eq!(
            app.on_key(
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
                now
            ),
            Control::Quit
        );
    }

    #[test]
    fn test_settings_blocked_while_running() {
        let (mut app, _dir) = test_app();
        let now = Instant::now();
        app.on_key(key(KeyCode::Char('s')), now);
        app.on_key(key(KeyCode::Char('o')), now);
        assert_eq!(app.state, AppState::Timer);

        app.on_frame(now, 80, 24);
        let notice = app.notices.visible(now).unwrap();
        assert_eq!(notice.severity, Severity::Info);
        assert_eq!(
            notice.message,
            "Please pause the timer before changing settings"
        );
    }

    #[test]
    fn test_settings_save_flow() {
        let (mut app, dir) = test_app();
        let now = Instant::now();
        app.on_key(key(KeyCode::Char('o')), now);
        assert_eq!(app.state, AppState::Settings);

        // focus 25 -> 27, then save
        app.on_key(key(KeyCode::Right), now);
        app.on_key(key(KeyCode::Right), now);
        app.on_key(key(KeyCode::Enter), now);
        assert_eq!(app.state, AppState::Timer);
        assert_eq!(app.flow.config().focus_secs, 27 * 60);
        assert_eq!(app.flow.view().remaining_secs, 27 * 60);
        assert!(dir.path().join("config.json").exists());

        app.on_frame(now, 80, 24);
        assert_eq!(
            app.notices.visible(now).map(|n| n.message.as_str()),
            Some("Settings saved successfully")
        );
    }

    #[test]
    fn test_invalid_settings_keep_panel_open() {
        let (mut app, _dir) = test_app();
        let now = Instant::now();
        app.on_key(key(KeyCode::Char('o')), now);
        app.on_key(key(KeyCode::Down), now);
        app.on_key(key(KeyCode::Down), now);
        // long break 15 -> 4
        for _ in 0..11 {
            app.on_key(key(KeyCode::Left), now);
        }
        app.on_key(key(KeyCode::Enter), now);
        assert_eq!(app.state, AppState::Settings);
        assert_matches!(app.settings_form, Some(form) if form.input.long_break_minutes == 4);
        assert_eq!(app.flow.config().long_break_secs, 15 * 60);

        app.on_frame(now, 80, 24);
        assert_eq!(
            app.notices.visible(now).map(|n| n.severity),
            Some(Severity::Error)
        );

        app.on_key(key(KeyCode::Esc), now);
        assert_eq!(app.state, AppState::Timer);
        assert_eq!(app.settings_form, None);
    }

    #[test]
    fn test_theme_key_cycles_and_persists() {
        let (mut app, dir) = test_app();
        app.on_key(key(KeyCode::Char('t')), Instant::now());
        assert_eq!(app.flow.config().theme, Theme::Blue);
        let saved = fs::read_to_string(dir.path().join("config.json")).unwrap();
        assert!(saved.contains("\"blue\""));
    }

    #[test]
    fn test_completion_starts_celebration() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{"focusTime": 2, "breakTime": 60, "longBreakTime": 300, "sessionsBeforeLongBreak": 4, "theme": "default"}"#,
        )
        .unwrap();
        let mut app = App::new(&AppDirs::rooted_at(dir.path()), false);
        let t0 = Instant::now();
        app.on_key(key(KeyCode::Char('s')), t0);
        app.on_frame(t0 + Duration::from_secs(2), 80, 24);

        assert!(app.celebration.is_active());
        assert_eq!(app.flow.view().phase, Phase::ShortBreak);
        assert_eq!(app.flow.stats().total_sessions, 1);
        let now = t0 + Duration::from_secs(2);
        assert_eq!(
            app.notices.visible(now).map(|n| n.message.as_str()),
            Some("Focus session complete! Take a short break.")
        );
    }

    #[test]
    fn test_window_title_follows_countdown() {
        let (mut app, _dir) = test_app();
        assert_eq!(app.title_update(), Some("25:00 - Mind • Flow".to_string()));
        assert_eq!(app.title_update(), None);

        let t0 = Instant::now();
        app.on_key(key(KeyCode::Char('s')), t0);
        app.on_frame(t0 + Duration::from_secs(1), 80, 24);
        assert_eq!(app.title_update(), Some("24:59 - Mind • Flow".to_string()));
    }

    #[test]
    fn test_shutdown_stops_ticking() {
        let (mut app, _dir) = test_app();
        let t0 = Instant::now();
        app.on_key(key(KeyCode::Char('s')), t0);
        app.shutdown();
        app.on_frame(t0 + Duration::from_secs(5), 80, 24);
        assert_eq!(app.flow.view().remaining_secs, 1500);
    }

    #[test]
    fn test_ui_renders_each_screen() {
        let (mut app, _dir) = test_app();
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal.draw(|f| ui(&mut app, f)).unwrap();
        let content: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(content.contains("25:00"));

        app.on_key(key(KeyCode::Char('o')), Instant::now());
        terminal.draw(|f| ui(&mut app, f)).unwrap();
        let content: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(content.contains("Settings"));
        assert!(content.contains("Focus length"));
    }
}
