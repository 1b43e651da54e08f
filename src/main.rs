use std::io;
use std::time::Instant;

use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use netpong::config::{self, Config};
use netpong::debug;
use netpong::game_modes::local::LocalMatch;
use netpong::game_modes::online::run_online;
use netpong::game_modes::{ControllerSlot, MatchEntry, MatchLoop};
use netpong::menu::{self, MenuAction};
use netpong::net::protocol::{Difficulty, MatchSettings};

/// Direct routes from the command line; without one, the menu drives.
#[derive(Debug, Clone)]
enum Route {
    Create,
    Join(String),
    Local,
}

struct Options {
    route: Option<Route>,
    server: Option<String>,
    difficulty: Option<Difficulty>,
    score_limit: Option<u8>,
    debug: bool,
}

fn main() -> Result<(), io::Error> {
    let args: Vec<String> = std::env::args().collect();
    let options = parse_args(&args);

    debug::init(options.debug)?;
    debug::log("SESSION_START", "netpong starting");

    let mut config = config::load_config()?;
    if let Some(url) = options.server {
        config.network.relay_url = url;
    }
    if let Some(difficulty) = options.difficulty {
        config.game.difficulty = difficulty;
    }
    if let Some(limit) = options.score_limit {
        config.game.score_limit = limit;
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // Key release events need the enhanced keyboard protocol; without it
    // the held-key tracker falls back to hold-expiry emulation.
    let release_reported =
        crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
    if release_reported {
        execute!(
            io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &config, options.route, release_reported);

    // Restore terminal
    if release_reported {
        let _ = execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags);
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    config: &Config,
    route: Option<Route>,
    release_reported: bool,
) -> io::Result<()> {
    let mut slot = ControllerSlot::new();
    let defaults = MatchSettings {
        difficulty: config.game.difficulty,
        score_limit: config.game.score_limit,
    };

    if let Some(route) = route {
        match route {
            Route::Create => run_online(
                terminal,
                config,
                MatchEntry::Create(defaults),
                &mut slot,
                release_reported,
            )?,
            Route::Join(code) => run_online(
                terminal,
                config,
                MatchEntry::Join(code),
                &mut slot,
                release_reported,
            )?,
            Route::Local => run_local(terminal, config, defaults, &mut slot, release_reported)?,
        }
        return Ok(());
    }

    let mut menu_state = menu::MenuState::new(defaults);
    loop {
        terminal.draw(|frame| menu::render_menu(frame, &menu_state))?;
        match menu::handle_menu_input(&mut menu_state, &config.keys)? {
            MenuAction::None => {}
            MenuAction::StartOnline(entry) => {
                run_online(terminal, config, entry, &mut slot, release_reported)?;
                menu_state.back_to_main();
            }
            MenuAction::StartLocal(settings) => {
                run_local(terminal, config, settings, &mut slot, release_reported)?;
                menu_state.back_to_main();
            }
            MenuAction::Quit => return Ok(()),
        }
    }
}

fn run_local<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    config: &Config,
    settings: MatchSettings,
    slot: &mut ControllerSlot<B>,
    release_reported: bool,
) -> io::Result<()> {
    let mut controller = LocalMatch::new(&settings, release_reported, Instant::now());
    controller.set_surface_probe(netpong::game_modes::common::terminal_surface_probe());
    slot.install(Box::new(controller)).run(terminal, config)?;
    slot.clear();
    Ok(())
}

fn parse_args(args: &[String]) -> Options {
    let mut options = Options {
        route: None,
        server: None,
        difficulty: None,
        score_limit: None,
        debug: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--create" => options.route = Some(Route::Create),
            "--join" => {
                i += 1;
                match args.get(i) {
                    Some(code) => options.route = Some(Route::Join(code.clone())),
                    None => {
                        eprintln!("Error: --join requires a room code");
                        std::process::exit(1);
                    }
                }
            }
            "--local" => options.route = Some(Route::Local),
            "--server" => {
                i += 1;
                match args.get(i) {
                    Some(url) => options.server = Some(url.clone()),
                    None => {
                        eprintln!("Error: --server requires a URL");
                        std::process::exit(1);
                    }
                }
            }
            "--difficulty" => {
                i += 1;
                match args.get(i).map(|d| d.parse()) {
                    Some(Ok(difficulty)) => options.difficulty = Some(difficulty),
                    Some(Err(e)) => {
                        eprintln!("Error: {e}");
                        std::process::exit(1);
                    }
                    None => {
                        eprintln!("Error: --difficulty requires easy, medium or hard");
                        std::process::exit(1);
                    }
                }
            }
            "--score-limit" => {
                i += 1;
                match args.get(i).map(|n| n.parse::<u8>()) {
                    Some(Ok(limit)) if (1..=15).contains(&limit) => {
                        options.score_limit = Some(limit);
                    }
                    _ => {
                        eprintln!("Error: --score-limit requires a number from 1 to 15");
                        std::process::exit(1);
                    }
                }
            }
            "--debug" => options.debug = true,
            "--help" | "-h" => {
                print_usage(&args[0]);
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage(&args[0]);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    options
}

fn print_usage(program: &str) {
    println!("netpong - terminal Pong with relay-hosted online 1v1");
    println!();
    println!("Usage:");
    println!("  {program}                      # Interactive menu");
    println!("  {program} --create             # Create an online match");
    println!("  {program} --join <room-code>   # Join an online match");
    println!("  {program} --local              # Offline 1v1 on this keyboard");
    println!();
    println!("Options:");
    println!("  --difficulty <d>    easy | medium | hard (with --create)");
    println!("  --score-limit <n>   First to n points wins (with --create)");
    println!("  --server <url>      Override the relay URL from config.toml");
    println!("  --debug             Write diagnostics to /tmp/netpong-debug.log");
}
