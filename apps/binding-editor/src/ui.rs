//! UI rendering for the binding editor.

use crate::app::{App, InputMode};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table},
    Frame,
};
use reel_keybinds::BindingOrigin;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_bindings(f, app, chunks[1]);
    draw_status_bar(f, app, chunks[2]);

    if app.input_mode != InputMode::None {
        draw_input_dialog(f, app);
    }

    if app.show_help {
        draw_help(f);
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let access_indicator = if app.read_only { " [read-only]" } else { "" };
    let header_text = format!(" {}{}", app.conf_path.display(), access_indicator);
    let header = Paragraph::new(header_text)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(header, area);
}

fn draw_bindings(f: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec!["KEY", "ACTION", "SOURCE", "STATUS"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .height(1);

    let rows: Vec<Row> = app
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let source = match row.origin {
                BindingOrigin::ConfFile => row.source_name.clone(),
                BindingOrigin::Extension if row.menu_exposed => {
                    format!("ext:{} (menu)", row.source_name)
                }
                BindingOrigin::Extension => format!("ext:{}", row.source_name),
            };
            let status = match &row.status {
                Some(status) => status.clone(),
                None if row.enabled => "active".to_string(),
                None => String::new(),
            };

            let mut style = if !row.enabled {
                Style::default().fg(Color::DarkGray)
            } else if row.origin == BindingOrigin::Extension {
                Style::default().fg(Color::Magenta)
            } else {
                Style::default()
            };
            if i == app.selected_index {
                style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
            }

            Row::new(vec![
                row.binding.raw_key.clone(),
                row.binding.action_text(),
                source,
                status,
            ])
            .style(style)
            .height(1)
        })
        .collect();

    let filter = app.filter_text();
    let title = if filter.is_empty() {
        format!(" Bindings ({}) ", app.rows.len())
    } else {
        format!(" Bindings ({}) - filter: {} ", app.rows.len(), filter)
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(16),
            Constraint::Min(24),
            Constraint::Length(18),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(table, area);
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let position = if app.rows.is_empty() {
        "0/0".to_string()
    } else {
        format!("{}/{}", app.selected_index + 1, app.rows.len())
    };
    let saved_text = if let Some(saved) = app.last_saved {
        Span::styled(
            format!("saved {}", saved.format(&app.config.display.time_format)),
            Style::default().fg(Color::Green),
        )
    } else {
        Span::styled("no changes", Style::default().fg(Color::DarkGray))
    };

    let info = Line::from(vec![
        Span::raw(format!(" {} | ", position)),
        saved_text,
    ]);
    let info_widget = Paragraph::new(info).block(Block::default().borders(Borders::ALL));
    f.render_widget(info_widget, chunks[0]);

    let msg = app.message.clone().unwrap_or_else(|| {
        "? help | a add | e edit | d delete | / filter | q quit".to_string()
    });
    let msg_widget = Paragraph::new(msg).block(Block::default().borders(Borders::ALL));
    f.render_widget(msg_widget, chunks[1]);
}

fn draw_input_dialog(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 15, f.area());
    f.render_widget(Clear, area);

    let title = match app.input_mode {
        InputMode::Filter => " Filter ",
        InputMode::Add => " Add Binding (key action...) ",
        InputMode::Edit => " Edit Binding ",
        InputMode::None => " Input ",
    };

    let input = Paragraph::new(app.input_buffer.as_str())
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(Color::Yellow));
    f.render_widget(input, area);
}

fn draw_help(f: &mut Frame) {
    let area = centered_rect(60, 60, f.area());
    f.render_widget(Clear, area);

    let help_text = vec![
        Line::from(Span::styled("Navigation", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  j/k          Move up/down"),
        Line::from("  g/G          First/last row"),
        Line::from("  /            Filter by key or action"),
        Line::from(""),
        Line::from(Span::styled("Actions", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  a            Add binding below the cursor"),
        Line::from("  e            Edit binding"),
        Line::from("  d            Delete binding"),
        Line::from("  J/K          Move binding down/up"),
        Line::from("  r            Reload from disk"),
        Line::from("  Esc          Clear filter"),
        Line::from(""),
        Line::from(Span::styled("Other", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  q            Quit"),
    ];

    let help = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title(" Help "));
    f.render_widget(help, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
