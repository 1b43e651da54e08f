use std::time::Instant;

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::game::physics::{PADDLE_MARGIN, PADDLE_WIDTH};
use crate::game::state::{MatchState, Seat, FIELD_HEIGHT, FIELD_WIDTH};
use crate::game::MatchPhase;
use crate::ui::overlay::{self, Banner};

// Rows above the playable field: scores, hint, latency readout.
const HEADER_ROWS: u16 = 3;

/// Everything the renderer needs besides the match state itself.
pub struct MatchView<'a> {
    /// The local participant's seat; `None` in the offline variant where
    /// both seats share the keyboard.
    pub your_seat: Option<Seat>,
    /// Last measured round-trip time, when networked.
    pub rtt_ms: Option<u64>,
    /// Terminal status line (peer left, connection lost).
    pub status: Option<&'a str>,
    pub now: Instant,
}

pub fn render_match(frame: &mut Frame, state: &MatchState, view: &MatchView) {
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().bg(Color::Rgb(0, 0, 0))),
        area,
    );
    if area.height <= HEADER_ROWS + 2 || area.width < 10 {
        return;
    }

    draw_header(frame, state, view, area);

    let field = Rect {
        x: area.x,
        y: area.y + HEADER_ROWS,
        width: area.width,
        height: area.height - HEADER_ROWS,
    };
    frame.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
        field,
    );
    let inner = field.inner(ratatui::layout::Margin::new(1, 1));
    draw_field(frame, state, inner);

    match state.phase {
        MatchPhase::CountingDown => {
            if let Some(countdown) = state.countdown {
                overlay::render_countdown(
                    frame,
                    countdown.digit(view.now),
                    countdown.digit_fraction(view.now),
                    inner,
                );
            }
        }
        MatchPhase::Paused => {
            overlay::render_banner(frame, &pause_banner(state, view), inner);
        }
        MatchPhase::Ended => {
            overlay::render_banner(frame, &winner_banner(state, view), inner);
        }
        MatchPhase::Playing => {}
    }
}

fn draw_header(frame: &mut Frame, state: &MatchState, view: &MatchView, area: Rect) {
    let score_line = format!("{}   •   {}", state.scores[0], state.scores[1]);
    frame.render_widget(
        Paragraph::new(score_line)
            .style(Style::default().fg(Color::White))
            .alignment(Alignment::Center),
        Rect { height: 1, ..area },
    );

    let hint = match view.your_seat {
        Some(_) => "W/S or Up/Down: move   P: pause   Q: leave",
        None => "W/S: left   Up/Down: right   D/K: pause   Q: quit",
    };
    frame.render_widget(
        Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        Rect {
            y: area.y + 1,
            height: 1,
            ..area
        },
    );

    if let Some(rtt) = view.rtt_ms {
        frame.render_widget(
            Paragraph::new(format!("rtt {rtt} ms "))
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Right),
            Rect {
                y: area.y + 2,
                height: 1,
                ..area
            },
        );
    }
}

/// Paint the field into a character grid, then emit it as one paragraph.
fn draw_field(frame: &mut Frame, state: &MatchState, inner: Rect) {
    let cols = inner.width as usize;
    let rows = inner.height as usize;
    if cols == 0 || rows == 0 {
        return;
    }

    let scale_x = cols as f32 / FIELD_WIDTH;
    let scale_y = rows as f32 / FIELD_HEIGHT;
    let mut grid = vec![vec![' '; cols]; rows];

    // Dashed center line.
    let center = cols / 2;
    for row in grid.iter_mut().step_by(2) {
        row[center] = '┆';
    }

    for seat in [Seat::Left, Seat::Right] {
        let paddle = &state.paddles[seat.index()];
        let x = match seat {
            Seat::Left => PADDLE_MARGIN * scale_x,
            Seat::Right => (FIELD_WIDTH - PADDLE_MARGIN - PADDLE_WIDTH) * scale_x,
        };
        let col = (x as usize).min(cols - 1);
        let top = (paddle.y * scale_y) as usize;
        let len = ((paddle.height * scale_y).round() as usize).max(1);
        for row in grid.iter_mut().skip(top).take(len) {
            row[col] = '█';
        }
    }

    let ball_col = ((state.ball.x * scale_x) as usize).min(cols - 1);
    let ball_row = ((state.ball.y * scale_y) as usize).min(rows - 1);
    grid[ball_row][ball_col] = '●';

    let lines: Vec<Line> = grid
        .into_iter()
        .map(|row| Line::from(row.into_iter().collect::<String>()))
        .collect();
    frame.render_widget(
        Paragraph::new(lines).style(Style::default().fg(Color::White)),
        inner,
    );
}

fn pause_banner(state: &MatchState, view: &MatchView) -> Banner {
    let owner = state.paused_by;
    let lines = match (view.your_seat, owner) {
        (Some(me), Some(who)) if me == who => {
            vec!["PAUSED".to_string(), String::new(), "P to resume".to_string()]
        }
        (Some(_), Some(_)) => vec![
            "PAUSED".to_string(),
            String::new(),
            "Waiting for your opponent to resume".to_string(),
        ],
        // Offline: name the seat that holds the resume key.
        (None, Some(Seat::Left)) => vec![
            "PAUSED by left".to_string(),
            String::new(),
            "D to resume".to_string(),
        ],
        (None, Some(Seat::Right)) => vec![
            "PAUSED by right".to_string(),
            String::new(),
            "K to resume".to_string(),
        ],
        (_, None) => vec!["PAUSED".to_string()],
    };
    Banner::warning(lines)
}

fn winner_banner(state: &MatchState, view: &MatchView) -> Banner {
    let headline = match (view.your_seat, state.winner) {
        (Some(me), Some(winner)) if me == winner => "YOU WIN!".to_string(),
        (Some(_), Some(_)) => "YOU LOSE".to_string(),
        (None, Some(Seat::Left)) => "LEFT WINS".to_string(),
        (None, Some(Seat::Right)) => "RIGHT WINS".to_string(),
        (_, None) => "MATCH OVER".to_string(),
    };

    let mut lines = vec![
        headline,
        format!("{} - {}", state.scores[0], state.scores[1]),
    ];
    if let Some(status) = view.status {
        lines.push(String::new());
        lines.push(status.to_string());
    }
    lines.push(String::new());
    lines.push("R to Rematch  |  Q to Quit".to_string());
    Banner::info(lines)
}
