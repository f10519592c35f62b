pub mod format;
pub mod screen;
pub mod settings;

use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget},
};
use std::time::Instant;

use crate::App;
use mindflow::{celebration::Celebration, config::Theme, notice::Severity, session::Phase};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

/// Colours for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub focus: Color,
    pub rest: Color,
    pub accent: Color,
}

pub fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Default => Palette {
            focus: Color::Red,
            rest: Color::Green,
            accent: Color::Yellow,
        },
        Theme::Blue => Palette {
            focus: Color::Blue,
            rest: Color::Cyan,
            accent: Color::LightBlue,
        },
        Theme::Green => Palette {
            focus: Color::Green,
            rest: Color::LightGreen,
            accent: Color::LightYellow,
        },
        Theme::Purple => Palette {
            focus: Color::Magenta,
            rest: Color::LightMagenta,
            accent: Color::LightCyan,
        },
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::Cyan,
        Severity::Success => Color::Green,
        Severity::Error => Color::Red,
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let view = self.flow.view();
        let colors = palette(self.flow.config().theme);
        let phase_color = if view.phase == Phase::Focus {
            colors.focus
        } else {
            colors.rest
        };

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(0),    // padding
                Constraint::Length(1), // phase label
                Constraint::Length(1), // padding
                Constraint::Length(1), // clock
                Constraint::Length(1), // padding
                Constraint::Length(1), // progress
                Constraint::Length(1), // action label
                Constraint::Length(1), // sessions until long break
                Constraint::Min(0),    // padding
                Constraint::Length(3), // stats panel
                Constraint::Length(1), // notice
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled(
            view.phase_label().to_uppercase(),
            bold_style.fg(phase_color),
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        let mut clock_style = bold_style.fg(phase_color);
        if view.is_paused {
            clock_style = clock_style.add_modifier(Modifier::SLOW_BLINK);
        }
        Paragraph::new(Span::styled(view.clock_text(), clock_style))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        let gauge_area = format::centered_width(chunks[5], 40);
        Gauge::default()
            .gauge_style(Style::default().fg(phase_color))
            .ratio(view.progress())
            .label("")
            .render(gauge_area, buf);

        Paragraph::new(Span::styled(
            format!("[ {} ]", view.action_label()),
            bold_style.fg(colors.accent),
        ))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);

        Paragraph::new(Span::styled(
            format::until_long_break(view.sessions_until_long_break),
            dim_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[7], buf);

        let stats = self.flow.stats();
        let today = Local::now().date_naive();
        Paragraph::new(Line::from(format::stat_spans(stats, today, colors.accent)))
            .block(Block::default().borders(Borders::ALL).title("Progress"))
            .alignment(Alignment::Center)
            .render(chunks[9], buf);

        if let Some(notice) = self.notices.visible(Instant::now()) {
            Paragraph::new(Span::styled(
                format::fit_width(&notice.message, chunks[10].width),
                bold_style.fg(severity_color(notice.severity)),
            ))
            .alignment(Alignment::Center)
            .render(chunks[10], buf);
        }

        Paragraph::new(Span::styled(
            "(s)tart / (p)ause / (r)eset / (o)ptions / (t)heme / (esc)ape",
            italic_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[11], buf);

        if self.celebration.is_active() {
            render_celebration_particles(&self.celebration, area, buf);
        }
    }
}

/// Draw confetti on top of whatever is already in the buffer.
fn render_celebration_particles(celebration: &Celebration, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];

    for particle in &celebration.particles {
        if particle.x < 0.0 || particle.y < 0.0 {
            continue;
        }
        let x = particle.x as u16;
        let y = particle.y as u16;
        if x >= area.width || y >= area.height {
            continue;
        }

        let color = colors[particle.color_index % colors.len()];
        let alpha = 1.0 - (particle.age / particle.max_age);
        let style = if alpha > 0.7 {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else if alpha > 0.3 {
            Style::default().fg(color)
        } else {
            Style::default().fg(color).add_modifier(Modifier::DIM)
        };

        if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
            cell.set_symbol(&particle.symbol.to_string());
            cell.set_style(style);
        }
    }
}
