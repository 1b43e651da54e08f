pub mod input;
pub mod render;
pub mod state;

pub use input::handle_menu_input;
pub use render::{
    render_code_entry, render_connecting, render_menu, render_waiting_room, show_error_screen,
};
pub use state::{CodeEntry, CodeEntryAction, MenuAction, MenuItem, MenuState, Screen};
