//! Rendering of the chat screen

use super::app::App;
use crate::channel::Activity;
use crate::state_machine::{RenderState, WidgetState};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

pub const TITLE: &str = "Bot Framework Chat";
pub const PLACEHOLDER: &str = "Type a message and press Enter";
pub const RELOAD_HINT: &str = "Press Ctrl+R to reload";

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub fn draw(frame: &mut Frame, app: &App, state: &WidgetState) {
    let [title, body, input, help] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    frame.render_widget(Paragraph::new(TITLE.bold()), title);

    if let Some(reason) = app.crashed() {
        draw_crashed(frame, body, reason);
        draw_disabled_input(frame, input, "Chat unavailable");
        frame.render_widget(Paragraph::new("Ctrl+R reload · Esc quit".dark_gray()), help);
        return;
    }

    match state.render_state() {
        RenderState::Connecting => {
            let spinner = SPINNER[app.tick() % SPINNER.len()];
            frame.render_widget(
                Paragraph::new(format!("{spinner} Connecting to bot...")),
                body,
            );
            draw_disabled_input(frame, input, "Connecting...");
            frame.render_widget(Paragraph::new("Esc quit".dark_gray()), help);
        }
        RenderState::Error(error) => {
            let text = vec![
                Line::from(Span::styled(
                    format!("Error: {error}"),
                    Style::default().fg(Color::Red),
                )),
                Line::default(),
                Line::from(RELOAD_HINT),
            ];
            frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), body);
            draw_disabled_input(frame, input, "Chat unavailable");
            frame.render_widget(Paragraph::new("Ctrl+R reload · Esc quit".dark_gray()), help);
        }
        RenderState::Ready => {
            draw_messages(frame, body, &state.messages, app.scroll());
            draw_input(frame, input, app.input());
            frame.render_widget(
                Paragraph::new("Enter send · ↑/↓ scroll · Esc quit".dark_gray()),
                help,
            );
        }
    }
}

/// Display lines for one message: `<name>: <text>`, one line per text line
pub fn message_lines(activity: &Activity) -> Vec<Line<'_>> {
    let mut rows = activity.text_or_empty().lines();
    let first = Line::from(vec![
        Span::styled(
            format!("{}: ", activity.sender_label()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(rows.next().unwrap_or_default()),
    ]);
    std::iter::once(first).chain(rows.map(Line::raw)).collect()
}

/// Wrapped message list, bottom-anchored; `scroll` counts rendered rows
fn draw_messages(frame: &mut Frame, area: Rect, messages: &[Activity], scroll: usize) {
    let lines: Vec<Line> = messages.iter().flat_map(message_lines).collect();
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });

    let rows = paragraph.line_count(area.width);
    let max_top = rows.saturating_sub(usize::from(area.height));
    let top = max_top.saturating_sub(scroll);

    let paragraph = paragraph.scroll((u16::try_from(top).unwrap_or(u16::MAX), 0));
    frame.render_widget(paragraph, area);
}

fn draw_input(frame: &mut Frame, area: Rect, input: &str) {
    let block = Block::default().borders(Borders::ALL);
    let paragraph = if input.is_empty() {
        Paragraph::new(PLACEHOLDER.dark_gray())
    } else {
        Paragraph::new(input)
    };
    frame.render_widget(paragraph.block(block), area);

    let typed = u16::try_from(input.chars().count()).unwrap_or(u16::MAX);
    let max_x = area.right().saturating_sub(2);
    let cursor_x = area.x.saturating_add(1).saturating_add(typed).min(max_x);
    frame.set_cursor_position((cursor_x, area.y.saturating_add(1)));
}

fn draw_disabled_input(frame: &mut Frame, area: Rect, label: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(Paragraph::new(label.dark_gray()).block(block), area);
}

fn draw_crashed(frame: &mut Frame, area: Rect, reason: &str) {
    let text = vec![
        Line::from(Span::styled(
            "Something went wrong.",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(reason.to_string()),
        Line::default(),
        Line::from(RELOAD_HINT),
    ];
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), area);
}
