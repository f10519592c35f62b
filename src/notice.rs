use std::time::{Duration, Instant};

/// How long a notice stays on screen.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// A short user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Holds the notice currently on screen; a newer one replaces it.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    current: Option<(Notice, Instant)>,
}

impl NoticeBoard {
    pub fn show(&mut self, notice: Notice, now: Instant) {
        self.current = Some((notice, now + NOTICE_TTL));
    }

    pub fn visible(&self, now: Instant) -> Option<&Notice> {
        match &self.current {
            Some((notice, until)) if now < *until => Some(notice),
            _ => None,
        }
    }

    /// Drop an expired notice. Returns true when something was removed.
    pub fn expire(&mut self, now: Instant) -> bool {
        if matches!(&self.current, Some((_, until)) if now >= *until) {
            self.current = None;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_expires_after_ttl() {
        let t0 = Instant::now();
        let mut board = NoticeBoard::default();
        board.show(Notice::success("saved"), t0);
        assert_eq!(board.visible(t0).map(|n| n.severity), Some(Severity::Success));
        assert!(board.visible(t0 + Duration::from_millis(2999)).is_some());
        assert!(board.visible(t0 + NOTICE_TTL).is_none());

        assert!(!board.expire(t0 + Duration::from_secs(1)));
        assert!(board.expire(t0 + NOTICE_TTL));
        assert!(!board.expire(t0 + NOTICE_TTL));
    }

    #[test]
    fn newer_notice_replaces_and_restarts_timer() {
        let t0 = Instant::now();
        let mut board = NoticeBoard::default();
        board.show(Notice::info("first"), t0);
        let t1 = t0 + Duration::from_secs(2);
        board.show(Notice::error("second"), t1);
        let shown = board.visible(t0 + Duration::from_secs(4)).unwrap();
        assert_eq!(shown.message, "second");
        assert_eq!(shown.severity, Severity::Error);
    }

    #[test]
    fn severity_names() {
        assert_eq!(Severity::Info.to_string(), "info");
        assert_eq!(Severity::Error.to_string(), "error");
    }
}
