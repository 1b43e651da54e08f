// Menu and lobby screens.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame, Terminal,
};

use crate::ui::{render_banner, Banner};

use super::state::{CodeEntry, MenuState, Screen};

const TITLE: &str = "N E T P O N G";

pub fn render_menu(frame: &mut Frame, menu: &MenuState) {
    match menu.screen {
        Screen::Main => render_main(frame, menu),
        Screen::CreateSetup => render_setup(frame, menu),
        Screen::JoinEntry => render_code_entry(frame, &menu.code),
    }
}

fn screen_frame(frame: &mut Frame) -> Rect {
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().bg(Color::Rgb(0, 0, 0))),
        area,
    );
    if area.height > 2 {
        frame.render_widget(
            Paragraph::new(TITLE)
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .alignment(Alignment::Center),
            Rect {
                y: area.y + 1,
                height: 1,
                ..area
            },
        );
    }
    area
}

fn render_main(frame: &mut Frame, menu: &MenuState) {
    let area = screen_frame(frame);

    let lines: Vec<Line> = menu
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let selected = i == menu.selected;
            let marker = if selected { "▸ " } else { "  " };
            let style = if selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(format!("{marker}{}", item.display_text()), style))
        })
        .collect();

    let menu_height = lines.len() as u16;
    let block = Rect {
        x: area.x,
        y: area.y + (area.height.saturating_sub(menu_height)) / 2,
        width: area.width,
        height: menu_height.min(area.height),
    };
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), block);

    footer(frame, area, "Up/Down: select   Enter: confirm   Q: quit");
}

fn render_setup(frame: &mut Frame, menu: &MenuState) {
    let area = screen_frame(frame);

    let rows = [
        format!("Difficulty   ◂ {} ▸", menu.setup.difficulty.label()),
        format!("Score limit  ◂ {} ▸", menu.setup.score_limit),
        "Start".to_string(),
    ];
    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if i == menu.setup_row {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(row.clone(), style))
        })
        .collect();

    let block = Rect {
        x: area.x,
        y: area.y + (area.height.saturating_sub(4)) / 2,
        width: area.width,
        height: 4.min(area.height),
    };
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), block);

    footer(
        frame,
        area,
        "Left/Right: adjust   Enter: create match   Esc: back",
    );
}

/// Room-code entry with inline error text; also shown by the lobby when a
/// join fails and the connection is still open for another attempt.
pub fn render_code_entry(frame: &mut Frame, entry: &CodeEntry) {
    let area = screen_frame(frame);

    let mut lines = vec![
        Line::from(Span::styled(
            "Enter room code:",
            Style::default().fg(Color::White),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("[ {}_ ]", entry.buffer),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
    ];
    if let Some(error) = &entry.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::LightRed),
        )));
    }

    let height = lines.len() as u16;
    let block = Rect {
        x: area.x,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width: area.width,
        height: height.min(area.height),
    };
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), block);

    footer(frame, area, "Enter: join   Esc: back");
}

/// Creator's waiting screen: share the room code while the relay finds an
/// opponent.
pub fn render_waiting_room(frame: &mut Frame, room_id: Option<&str>, copy_feedback: &str) {
    let area = screen_frame(frame);

    let mut lines = vec![Line::from(Span::styled(
        "Waiting for an opponent...",
        Style::default().fg(Color::White),
    ))];
    match room_id {
        Some(code) => {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Share this room code:",
                Style::default().fg(Color::DarkGray),
            )));
            lines.push(Line::from(Span::styled(
                code.to_string(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            if !copy_feedback.is_empty() {
                lines.push(Line::from(Span::styled(
                    copy_feedback.to_string(),
                    Style::default().fg(Color::Green),
                )));
            }
        }
        None => {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Contacting the relay...",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    let height = lines.len() as u16;
    let block = Rect {
        x: area.x,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width: area.width,
        height: height.min(area.height),
    };
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), block);

    footer(frame, area, "C: copy code   Q: cancel");
}

pub fn render_connecting(frame: &mut Frame, url: &str) {
    let area = screen_frame(frame);
    let lines = vec![
        Line::from(Span::styled(
            "Connecting...",
            Style::default().fg(Color::White),
        )),
        Line::from(""),
        Line::from(Span::styled(
            url.to_string(),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let block = Rect {
        x: area.x,
        y: area.y + (area.height.saturating_sub(3)) / 2,
        width: area.width,
        height: 3.min(area.height),
    };
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), block);
}

fn footer(frame: &mut Frame, area: Rect, text: &str) {
    if area.height < 2 {
        return;
    }
    frame.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        Rect {
            x: area.x,
            y: area.y + area.height - 2,
            width: area.width,
            height: 1,
        },
    );
}

/// Draw a blocking error box and wait for any key. Used for connection
/// failures, which are surfaced as a retry prompt rather than retried
/// automatically.
pub fn show_error_screen<B: Backend>(terminal: &mut Terminal<B>, message: &str) -> io::Result<()> {
    loop {
        terminal.draw(|frame| {
            let area = screen_frame(frame);
            let banner = Banner::error(vec![
                "Connection Failed".to_string(),
                String::new(),
                message.to_string(),
                String::new(),
                "Press any key to return".to_string(),
            ]);
            render_banner(frame, &banner, area);
        })?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(());
                }
            }
        }
    }
}
