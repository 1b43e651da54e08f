// Menu input handling

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use crate::config::{key_matches, KeyBindings};
use crate::game_modes::MatchEntry;

use super::state::{CodeEntryAction, MenuAction, MenuItem, MenuState, Screen};

pub fn handle_menu_input(menu: &mut MenuState, keys: &KeyBindings) -> io::Result<MenuAction> {
    if event::poll(Duration::from_millis(100))? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(handle_key_press(menu, key.code, keys));
            }
        }
    }

    Ok(MenuAction::None)
}

fn handle_key_press(menu: &mut MenuState, code: KeyCode, keys: &KeyBindings) -> MenuAction {
    match menu.screen {
        Screen::Main => handle_main(menu, code, keys),
        Screen::CreateSetup => handle_setup(menu, code, keys),
        Screen::JoinEntry => handle_join(menu, code),
    }
}

fn handle_main(menu: &mut MenuState, code: KeyCode, keys: &KeyBindings) -> MenuAction {
    if key_matches(&keys.menu_up, code) || code == KeyCode::Char('k') {
        menu.select_previous();
        return MenuAction::None;
    }
    if key_matches(&keys.menu_down, code) || code == KeyCode::Char('j') {
        menu.select_next();
        return MenuAction::None;
    }
    if key_matches(&keys.menu_select, code) || code == KeyCode::Char(' ') {
        return match menu.selected_item() {
            MenuItem::CreateMatch => {
                menu.open_setup();
                MenuAction::None
            }
            MenuItem::JoinMatch => {
                menu.open_join();
                MenuAction::None
            }
            MenuItem::LocalMatch => MenuAction::StartLocal(menu.setup),
            MenuItem::Quit => MenuAction::Quit,
        };
    }
    if key_matches(&keys.quit, code) || code == KeyCode::Esc {
        return MenuAction::Quit;
    }
    MenuAction::None
}

fn handle_setup(menu: &mut MenuState, code: KeyCode, keys: &KeyBindings) -> MenuAction {
    match code {
        KeyCode::Up => menu.setup_previous_row(),
        KeyCode::Down => menu.setup_next_row(),
        KeyCode::Left => menu.setup_adjust(false),
        KeyCode::Right => menu.setup_adjust(true),
        KeyCode::Esc => menu.back_to_main(),
        _ if key_matches(&keys.menu_select, code) => {
            // Enter starts from any row; the start row is a visual anchor.
            return MenuAction::StartOnline(MatchEntry::Create(menu.setup));
        }
        _ => {}
    }
    MenuAction::None
}

fn handle_join(menu: &mut MenuState, code: KeyCode) -> MenuAction {
    match menu.code.apply_key(code) {
        CodeEntryAction::Submit(room_id) => MenuAction::StartOnline(MatchEntry::Join(room_id)),
        CodeEntryAction::Cancel => {
            menu.back_to_main();
            MenuAction::None
        }
        CodeEntryAction::Pending => MenuAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::protocol::{Difficulty, MatchSettings};

    fn menu() -> MenuState {
        MenuState::new(MatchSettings {
            difficulty: Difficulty::Medium,
            score_limit: 5,
        })
    }

    #[test]
    fn create_flow_reaches_setup_then_starts() {
        let mut m = menu();
        let keys = KeyBindings::default();

        assert_eq!(handle_key_press(&mut m, KeyCode::Enter, &keys), MenuAction::None);
        assert_eq!(m.screen, Screen::CreateSetup);

        // Bump difficulty once and start.
        handle_key_press(&mut m, KeyCode::Right, &keys);
        let action = handle_key_press(&mut m, KeyCode::Enter, &keys);
        match action {
            MenuAction::StartOnline(MatchEntry::Create(settings)) => {
                assert_eq!(settings.difficulty, Difficulty::Hard);
                assert_eq!(settings.score_limit, 5);
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn join_flow_submits_entered_code() {
        let mut m = menu();
        let keys = KeyBindings::default();

        handle_key_press(&mut m, KeyCode::Down, &keys);
        handle_key_press(&mut m, KeyCode::Enter, &keys);
        assert_eq!(m.screen, Screen::JoinEntry);

        for c in ['a', 'b', '7'] {
            handle_key_press(&mut m, KeyCode::Char(c), &keys);
        }
        let action = handle_key_press(&mut m, KeyCode::Enter, &keys);
        assert_eq!(
            action,
            MenuAction::StartOnline(MatchEntry::Join("AB7".to_string()))
        );
    }

    #[test]
    fn escape_returns_to_main_from_subscreens() {
        let mut m = menu();
        let keys = KeyBindings::default();
        m.open_setup();
        handle_key_press(&mut m, KeyCode::Esc, &keys);
        assert_eq!(m.screen, Screen::Main);
        m.open_join();
        handle_key_press(&mut m, KeyCode::Esc, &keys);
        assert_eq!(m.screen, Screen::Main);
    }
}
