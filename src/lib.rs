pub mod config;
pub mod debug;
pub mod game;
pub mod game_modes;
pub mod menu;
pub mod net;
pub mod ui;
