use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// How often the screen is redrawn when nothing else happens.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Unified event type consumed by the app loop
#[derive(Clone, Debug)]
pub enum FlowEvent {
    Key(KeyEvent),
    Resize,
    /// No input arrived within the frame interval.
    Frame,
}

/// Source of terminal events (keyboard, resize)
pub trait FlowEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<FlowEvent, RecvTimeoutError>;
}

/// Production event source reading crossterm events on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<FlowEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // Windows reports releases too; only presses drive the timer
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    tx.send(FlowEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => tx.send(FlowEvent::Resize),
                Ok(_) => Ok(()),
                Err(_) => break,
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<FlowEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Redraw cadence of the event loop
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(FRAME_INTERVAL)
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Event source fed from a channel, for tests and scripted runs
pub struct TestEventSource {
    rx: Receiver<FlowEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<FlowEvent>) -> Self {
        Self { rx }
    }
}

impl FlowEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<FlowEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Advances the application one event or frame at a time
pub struct Runner<E: FlowEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: FlowEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn interval(&self) -> Duration {
        self.ticker.interval()
    }

    /// Blocks up to the frame interval and returns the next event, or Frame.
    pub fn step(&self) -> FlowEvent {
        self.step_within(self.ticker.interval())
    }

    /// Like `step`, but never waits longer than `limit`. The app passes the
    /// time left until the next timer tick so ticks are not delivered late.
    pub fn step_within(&self, limit: Duration) -> FlowEvent {
        let timeout = limit.min(self.ticker.interval());
        match self.event_source.recv_timeout(timeout) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                FlowEvent::Frame
            }
        }
    }
}
