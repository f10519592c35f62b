//! Feedback tone played when the timer is paused.
//!
//! The output device is acquired on first use, suspended between tones and
//! released on shutdown. Audio is best effort: nothing here ever surfaces an
//! error to the user.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration: Duration,
}

/// The pause chime: an 800 Hz sine for half a second.
pub const PAUSE_TONE: Tone = Tone {
    frequency_hz: 800.0,
    duration: Duration::from_millis(500),
};

/// An opened audio output.
pub trait ToneOutput {
    fn resume(&mut self) -> io::Result<()>;
    fn play(&mut self, tone: Tone) -> io::Result<()>;
    fn suspend(&mut self) -> io::Result<()>;
    fn close(self);
}

pub trait AudioBackend {
    type Output: ToneOutput;

    /// `None` when no output is available right now.
    fn open(&mut self) -> Option<Self::Output>;
}

pub struct Chime<B: AudioBackend> {
    backend: B,
    output: Option<B::Output>,
}

impl<B: AudioBackend> Chime<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            output: None,
        }
    }

    pub fn is_acquired(&self) -> bool {
        self.output.is_some()
    }

    pub fn play(&mut self) {
        self.play_tone(PAUSE_TONE);
    }

    pub fn play_tone(&mut self, tone: Tone) {
        if self.output.is_none() {
            self.output = self.backend.open();
        }
        let Some(output) = self.output.as_mut() else {
            debug!("no audio output, chime skipped");
            return;
        };

        let played = output
            .resume()
            .and_then(|_| output.play(tone))
            .and_then(|_| output.suspend());
        if let Err(e) = played {
            debug!(error = %e, "chime failed");
        }
    }

    /// Close the output if one was opened.
    pub fn release(&mut self) {
        if let Some(output) = self.output.take() {
            output.close();
            debug!("audio output released");
        }
    }
}

impl<B: AudioBackend> Drop for Chime<B> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Rings the terminal bell. Available only when stdout is a terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

#[derive(Debug)]
pub struct BellOutput {
    suspended: bool,
}

impl AudioBackend for TerminalBell {
    type Output = BellOutput;

    fn open(&mut self) -> Option<BellOutput> {
        io::stdout()
            .is_terminal()
            .then_some(BellOutput { suspended: true })
    }
}

impl ToneOutput for BellOutput {
    fn resume(&mut self) -> io::Result<()> {
        self.suspended = false;
        Ok(())
    }

    fn play(&mut self, _tone: Tone) -> io::Result<()> {
        if self.suspended {
            return Ok(());
        }
        let mut out = io::stdout();
        out.write_all(b"\x07")?;
        out.flush()
    }

    fn suspend(&mut self) -> io::Result<()> {
        self.suspended = true;
        Ok(())
    }

    fn close(self) {}
}
