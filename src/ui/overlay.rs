// Centered overlays drawn on top of the field: countdown digits, pause and
// winner banners, connection status boxes.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// A boxed message rendered in the middle of the screen.
#[derive(Debug, Clone)]
pub struct Banner {
    pub lines: Vec<String>,
    pub tone: Tone,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tone {
    Info,
    Warning,
    Error,
}

impl Banner {
    pub fn info<S: Into<String>>(lines: Vec<S>) -> Self {
        Self::with_tone(lines, Tone::Info)
    }

    pub fn warning<S: Into<String>>(lines: Vec<S>) -> Self {
        Self::with_tone(lines, Tone::Warning)
    }

    pub fn error<S: Into<String>>(lines: Vec<S>) -> Self {
        Self::with_tone(lines, Tone::Error)
    }

    fn with_tone<S: Into<String>>(lines: Vec<S>, tone: Tone) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            tone,
        }
    }

    fn border_color(&self) -> Color {
        match self.tone {
            Tone::Info => Color::Cyan,
            Tone::Warning => Color::Yellow,
            Tone::Error => Color::Red,
        }
    }

    fn text_color(&self) -> Color {
        match self.tone {
            Tone::Info => Color::White,
            Tone::Warning => Color::Yellow,
            Tone::Error => Color::LightRed,
        }
    }
}

/// Draw a banner centered in `area`, clearing what is underneath.
pub fn render_banner(frame: &mut Frame, banner: &Banner, area: Rect) {
    if area.width < 8 || area.height < 3 {
        return;
    }
    let widest = banner.lines.iter().map(|l| l.len()).max().unwrap_or(0);
    let width = (widest as u16 + 6).min(area.width.saturating_sub(2)).max(8);
    let height = (banner.lines.len() as u16 + 2).min(area.height.saturating_sub(2)).max(3);

    let boxed = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    };

    frame.render_widget(Clear, boxed);
    frame.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(banner.border_color()))
            .style(Style::default().bg(Color::Rgb(16, 16, 16))),
        boxed,
    );

    let text: Vec<Line> = banner
        .lines
        .iter()
        .map(|line| {
            Line::from(Span::styled(
                line.clone(),
                Style::default().fg(banner.text_color()),
            ))
        })
        .collect();

    let inner = boxed.inner(ratatui::layout::Margin::new(2, 1));
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), inner);
}

// Countdown digits in three sizes. Terminal cells cannot scale smoothly,
// so the sub-second fraction picks a size: each digit lands big and
// shrinks as its second runs out.
const DIGITS_LARGE: [[&str; 5]; 3] = [
    [
        "  ██   ",
        " ███   ",
        "  ██   ",
        "  ██   ",
        " ████  ",
    ],
    [
        " █████ ",
        "     █ ",
        " █████ ",
        " █     ",
        " █████ ",
    ],
    [
        " █████ ",
        "     █ ",
        "  ████ ",
        "     █ ",
        " █████ ",
    ],
];

const DIGITS_MEDIUM: [[&str; 3]; 3] = [
    [" ██ ", "  █ ", " ███"],
    [" ██ ", " █  ", " ███"],
    [" ██ ", "  ██", " ██ "],
];

/// Render the countdown digit, sized by how much of its second has elapsed.
pub fn render_countdown(frame: &mut Frame, digit: u8, fraction: f32, area: Rect) {
    let digit = digit.clamp(1, 3);
    let lines: Vec<String> = if fraction < 0.45 {
        DIGITS_LARGE[(digit - 1) as usize]
            .iter()
            .map(|row| (*row).to_string())
            .collect()
    } else if fraction < 0.8 {
        DIGITS_MEDIUM[(digit - 1) as usize]
            .iter()
            .map(|row| (*row).to_string())
            .collect()
    } else {
        vec![digit.to_string()]
    };

    let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(1) as u16;
    let height = lines.len() as u16;
    let boxed = Rect {
        x: area.x + area.width.saturating_sub(widest) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: widest.min(area.width),
        height: height.min(area.height),
    };

    frame.render_widget(Clear, boxed);
    let text: Vec<Line> = lines
        .into_iter()
        .map(|row| Line::from(Span::styled(row, Style::default().fg(Color::Yellow))))
        .collect();
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), boxed);
}
