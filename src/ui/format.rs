use chrono::NaiveDate;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
};

use unicode_width::UnicodeWidthChar;

use mindflow::stats::Stats;

/// Cut `text` to at most `max` terminal columns, marking the cut with "…".
pub fn fit_width(text: &str, max: u16) -> String {
    let max = max as usize;
    let mut out = String::new();
    let mut used = 0;
    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max {
        return text.to_string();
    }
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        used += w;
        out.push(c);
    }
    if max > 0 {
        out.push('…');
    }
    out
}

/// "1 session until long break" / "3 sessions until long break"
pub fn until_long_break(n: u32) -> String {
    if n == 1 {
        "1 session until long break".to_string()
    } else {
        format!("{n} sessions until long break")
    }
}

/// Streak caption; a streak that lapsed shows as zero.
pub fn streak_label(stats: &Stats, today: NaiveDate) -> String {
    let streak = if stats.streak_is_live(today) {
        stats.streak
    } else {
        0
    };
    match streak {
        1 => "1 day".to_string(),
        n => format!("{n} days"),
    }
}

/// Spans for the one-line progress panel.
pub fn stat_spans(stats: &Stats, today: NaiveDate, accent: Color) -> Vec<Span<'static>> {
    let value = Style::default().fg(accent).add_modifier(Modifier::BOLD);
    vec![
        Span::raw("total "),
        Span::styled(stats.total_sessions.to_string(), value),
        Span::raw("   today "),
        Span::styled(stats.today_sessions.to_string(), value),
        Span::raw("   streak "),
        Span::styled(streak_label(stats, today), value),
    ]
}

/// A horizontally centred slice of `area`, at most `width` wide.
pub fn centered_width(area: Rect, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    }
}

/// A centred box of at most `width` x `height` inside `area`.
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let height = height.min(area.height);
    let column = centered_width(area, width);
    Rect {
        y: area.y + (area.height - height) / 2,
        height,
        ..column
    }
}
