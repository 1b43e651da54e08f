pub mod loader;
pub mod types;

pub use loader::{config_path, load_config};
pub use types::{key_matches, Config, KeyBindings};
