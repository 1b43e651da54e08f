// Menu model: main screen, match setup, room-code entry.

use crossterm::event::KeyCode;

use crate::game_modes::MatchEntry;
use crate::net::protocol::MatchSettings;

const MIN_SCORE_LIMIT: u8 = 1;
const MAX_SCORE_LIMIT: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Screen {
    Main,
    CreateSetup,
    JoinEntry,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuItem {
    CreateMatch,
    JoinMatch,
    LocalMatch,
    Quit,
}

impl MenuItem {
    pub fn display_text(&self) -> &str {
        match self {
            MenuItem::CreateMatch => "Create Online Match",
            MenuItem::JoinMatch => "Join Online Match",
            MenuItem::LocalMatch => "Local 1v1",
            MenuItem::Quit => "Quit",
        }
    }

    pub fn all() -> Vec<MenuItem> {
        vec![
            MenuItem::CreateMatch,
            MenuItem::JoinMatch,
            MenuItem::LocalMatch,
            MenuItem::Quit,
        ]
    }
}

/// What the app loop should do after a menu interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuAction {
    None,
    StartOnline(MatchEntry),
    StartLocal(MatchSettings),
    Quit,
}

/// Room-code input with an inline error slot (room not found / full). Also
/// reused by the lobby for retry on the same connection.
#[derive(Debug, Clone, Default)]
pub struct CodeEntry {
    pub buffer: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CodeEntryAction {
    Pending,
    Submit(String),
    Cancel,
}

impl CodeEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_error(message: String) -> Self {
        Self {
            buffer: String::new(),
            error: Some(message),
        }
    }

    pub fn apply_key(&mut self, code: KeyCode) -> CodeEntryAction {
        match code {
            KeyCode::Enter => {
                if self.buffer.is_empty() {
                    CodeEntryAction::Pending
                } else {
                    self.error = None;
                    CodeEntryAction::Submit(self.buffer.clone())
                }
            }
            KeyCode::Esc => CodeEntryAction::Cancel,
            KeyCode::Backspace => {
                self.buffer.pop();
                CodeEntryAction::Pending
            }
            KeyCode::Char(c) if c.is_alphanumeric() || c == '-' => {
                self.buffer.push(c.to_ascii_uppercase());
                CodeEntryAction::Pending
            }
            _ => CodeEntryAction::Pending,
        }
    }
}

pub struct MenuState {
    pub screen: Screen,
    pub selected: usize,
    pub items: Vec<MenuItem>,
    pub setup: MatchSettings,
    /// Selected row on the setup screen: difficulty, score limit, start.
    pub setup_row: usize,
    pub code: CodeEntry,
}

impl MenuState {
    pub const SETUP_ROWS: usize = 3;

    pub fn new(defaults: MatchSettings) -> Self {
        Self {
            screen: Screen::Main,
            selected: 0,
            items: MenuItem::all(),
            setup: defaults,
            setup_row: 0,
            code: CodeEntry::new(),
        }
    }

    pub fn selected_item(&self) -> MenuItem {
        self.items[self.selected]
    }

    pub fn select_previous(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = self.items.len() - 1;
        }
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % self.items.len();
    }

    pub fn open_setup(&mut self) {
        self.screen = Screen::CreateSetup;
        self.setup_row = 0;
    }

    pub fn open_join(&mut self) {
        self.screen = Screen::JoinEntry;
        self.code = CodeEntry::new();
    }

    pub fn back_to_main(&mut self) {
        self.screen = Screen::Main;
    }

    pub fn setup_previous_row(&mut self) {
        if self.setup_row > 0 {
            self.setup_row -= 1;
        } else {
            self.setup_row = Self::SETUP_ROWS - 1;
        }
    }

    pub fn setup_next_row(&mut self) {
        self.setup_row = (self.setup_row + 1) % Self::SETUP_ROWS;
    }

    /// Left/right adjustment of the highlighted setup row.
    pub fn setup_adjust(&mut self, increase: bool) {
        match self.setup_row {
            0 => self.setup.difficulty = self.setup.difficulty.cycle(),
            1 => {
                let limit = self.setup.score_limit;
                self.setup.score_limit = if increase {
                    limit.saturating_add(1).min(MAX_SCORE_LIMIT)
                } else {
                    limit.saturating_sub(1).max(MIN_SCORE_LIMIT)
                };
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::protocol::Difficulty;

    #[test]
    fn selection_wraps_both_ways() {
        let mut menu = MenuState::new(MatchSettings::default());
        menu.select_previous();
        assert_eq!(menu.selected_item(), MenuItem::Quit);
        menu.select_next();
        assert_eq!(menu.selected_item(), MenuItem::CreateMatch);
    }

    #[test]
    fn score_limit_adjustment_is_bounded() {
        let mut menu = MenuState::new(MatchSettings {
            difficulty: Difficulty::Medium,
            score_limit: 15,
        });
        menu.setup_row = 1;
        menu.setup_adjust(true);
        assert_eq!(menu.setup.score_limit, 15);

        menu.setup.score_limit = 1;
        menu.setup_adjust(false);
        assert_eq!(menu.setup.score_limit, 1);
    }

    #[test]
    fn code_entry_normalizes_and_submits() {
        let mut entry = CodeEntry::new();
        assert_eq!(entry.apply_key(KeyCode::Enter), CodeEntryAction::Pending);
        for c in ['k', '4', 'p', 'q'] {
            entry.apply_key(KeyCode::Char(c));
        }
        entry.apply_key(KeyCode::Char('!'));
        entry.apply_key(KeyCode::Backspace);
        entry.apply_key(KeyCode::Char('q'));
        assert_eq!(
            entry.apply_key(KeyCode::Enter),
            CodeEntryAction::Submit("K4PQ".to_string())
        );
    }
}
