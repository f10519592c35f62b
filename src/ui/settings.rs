use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};
use std::time::Instant;

use crate::{ui, App, SettingsField, SettingsForm};
use mindflow::config::{FOCUS_MINUTES, LONG_BREAK_MINUTES, SHORT_BREAK_MINUTES};

fn range_hint(field: SettingsField) -> String {
    let range = match field {
        SettingsField::Focus => FOCUS_MINUTES,
        SettingsField::ShortBreak => SHORT_BREAK_MINUTES,
        SettingsField::LongBreak => LONG_BREAK_MINUTES,
        SettingsField::Theme | SettingsField::SessionType => return String::new(),
    };
    format!("{}-{}", range.0, range.1)
}

/// One row of the settings table.
pub fn present_row(form: &SettingsForm, field: SettingsField, accent: Color) -> Row<'static> {
    let selected = form.selected == field;
    let marker = if selected { ">" } else { " " };
    let value = if selected {
        format!("< {} >", form.value_text(field))
    } else {
        form.value_text(field)
    };

    let style = if selected {
        Style::default().fg(accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    Row::new(vec![
        Cell::from(marker),
        Cell::from(field.label()),
        Cell::from(value),
        Cell::from(Span::styled(
            range_hint(field),
            Style::default().add_modifier(Modifier::DIM),
        )),
    ])
    .style(style)
}

pub fn render_settings(app: &mut App, f: &mut Frame) {
    let Some(form) = app.settings_form else {
        return;
    };
    let accent = ui::palette(form.input.theme).accent;
    let area = ui::format::centered_rect(f.area(), 60, 14);

    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Settings")
        .border_style(Style::default().fg(accent));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(SettingsField::ALL.len() as u16),
            Constraint::Min(0),
            Constraint::Length(1), // notice
            Constraint::Length(1), // instructions
        ])
        .split(inner);

    let rows: Vec<Row> = SettingsField::ALL
        .iter()
        .map(|field| present_row(&form, *field, accent))
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(20),
            Constraint::Length(14),
            Constraint::Min(5),
        ],
    );
    f.render_widget(table, chunks[0]);

    if let Some(notice) = app.notices.visible(Instant::now()) {
        let notice = Paragraph::new(Span::styled(
            notice.message.clone(),
            Style::default()
                .fg(ui::severity_color(notice.severity))
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center);
        f.render_widget(notice, chunks[2]);
    }

    let help = Paragraph::new("↑/↓ select  ←/→ change  enter save  esc cancel")
        .style(Style::default().add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center);
    f.render_widget(help, chunks[3]);
}
