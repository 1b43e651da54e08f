// Configuration file loading and creation

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::types::Config;

pub fn config_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("netpong");
    fs::create_dir_all(&path).ok();
    path.push("config.toml");
    path
}

/// Load the configuration, creating a commented default file on first run.
/// A malformed file falls back to defaults instead of refusing to start.
pub fn load_config() -> Result<Config, io::Error> {
    let path = config_path();

    if path.exists() {
        let contents = fs::read_to_string(&path)?;
        match toml::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                eprintln!("Warning: failed to parse {}: {e}", path.display());
                eprintln!("Using default configuration");
                Ok(Config::default())
            }
        }
    } else {
        write_default_config(&path)?;
        Ok(Config::default())
    }
}

fn write_default_config(path: &Path) -> Result<(), io::Error> {
    let config = Config::default();
    let body = toml::to_string_pretty(&config)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let commented = format!(
        "# netpong configuration\n\
         # Key binding format: \"Up\", \"Down\", \"Left\", \"Right\", \"Enter\", \"Esc\", \"Space\"\n\
         #                     or single characters like \"W\", \"S\", \"Q\"\n\
         # Difficulties: \"easy\", \"medium\", \"hard\"\n\n\
         {body}"
    );

    fs::write(path, commented)?;
    Ok(())
}
