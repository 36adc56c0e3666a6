//! main.rs
//! Entry point for fe

use fe_tui::app::AppState;
use fe_tui::config::Config;
use fe_tui::core::{CrosstermSource, terminal};
use fe_tui::utils::cli::{Args, cd_line, print_keybinds};
use fe_tui::utils::{init_logging, resolve_start_dir};

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

fn main() {
    std::panic::set_hook(Box::new(|info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let mut stdout = std::io::stdout();
        let _ = crossterm::execute!(
            stdout,
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show
        );

        eprintln!("\n[fe] Error occurred: {}", info);

        #[cfg(debug_assertions)]
        {
            let bt = std::backtrace::Backtrace::force_capture();
            eprintln!("\nStack Backtrace:\n{}", bt);
        }
    }));

    match run(Args::parse()) {
        Ok(Some(dir)) => println!("{}", cd_line(&dir)),
        Ok(None) => {}
        Err(err) => {
            eprintln!("fe: failed at {err}:");
            for cause in err.chain().skip(1) {
                eprintln!("    {cause}");
            }
            std::process::exit(1);
        }
    }
}

/// Runs one session. Returns the directory to `cd` into when the session ended with `#quit_cd`.
fn run(args: Args) -> anyhow::Result<Option<PathBuf>> {
    if let Some(log_path) = &args.log {
        init_logging(log_path, args.log_level)?;
    }

    let config_path = args.config_path();
    if args.init {
        Config::generate_default(&config_path).context("writing default config")?;
        return Ok(None);
    }

    let config = Config::load(&config_path).context("loading config")?;
    if args.keybinds {
        print_keybinds(&config);
        return Ok(None);
    }

    let start = resolve_start_dir(args.path.as_deref()).context("resolving start directory")?;
    let mut app = AppState::new(&config, &start)?;
    terminal::run_terminal(&mut app, CrosstermSource)?;

    log::info!("session ended");
    Ok(app.exit_cd().map(PathBuf::from))
}
