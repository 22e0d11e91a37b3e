use anyhow::Result;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use std::io::stdout;
use std::path::PathBuf;

mod alert;
mod boot;
mod checks;
mod cleanup;
mod clipboard;
mod clock;
mod config;
mod logging;
mod lookup;
mod menu;
mod metrics;
mod monitor;
mod platform;
mod power;
mod privilege;
mod shell;
mod status;
mod ticker;
mod timers;
mod ui;

use boot::StartupOptions;
use checks::{print_preflight, run_preflight};
use platform::Platform;
use privilege::Elevation;
use ui::Term;

#[derive(Parser, Debug)]
#[command(name = "crunchyutils")]
#[command(about = "Terminal utility suite: system monitor, cleanup, timers, lookups")]
#[command(disable_version_flag = true)]
struct Cli {
    /// Skip window title, resize and size check
    #[arg(long)]
    no_init: bool,

    /// Skip startup and cleanup delays
    #[arg(long)]
    skip: bool,

    /// Do not ask for root/administrator rights
    #[arg(long)]
    no_admin: bool,

    /// Do not check for optional tools
    #[arg(long)]
    no_preflight: bool,

    /// Settings file to use instead of the default
    #[arg(long, env = "CRUNCHYUTILS_CONFIG")]
    config: Option<PathBuf>,

    /// Print version and exit
    #[arg(long)]
    version: bool,
}

// ── Terminal setup / teardown ─────────────────────────────────────────────────

fn init_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(ratatui::Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn wait_for_enter() -> Result<()> {
    eprintln!("Press Enter to continue...");
    let mut buf = String::new();
    std::io::stdin().read_line(&mut buf)?;
    Ok(())
}

// ── Main application loop ─────────────────────────────────────────────────────

fn run(terminal: &mut Term, opts: StartupOptions) -> Result<()> {
    boot::startup(terminal, opts)?;
    menu::main_menu(terminal, opts)
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("CrunchyUtils {}", config::VERSION);
        return Ok(());
    }

    if let Some(path) = cli.config.clone() {
        config::set_settings_path(path);
    }
    let log_config = logging::LogConfig::from_env(&config::state_dir());
    if let Err(e) = logging::init(&log_config) {
        eprintln!("[ERROR] Logging disabled: {e:#}");
    }

    config::reload_settings();
    config::ensure_settings_file();
    if cli.skip {
        config::update_settings(|s| s.skip_delays = true);
    }
    tracing::info!(version = config::VERSION, args = ?cli, "starting");

    let platform = Platform::current();
    if !platform.is_supported() {
        eprintln!("[ERROR] OS: {platform} not supported!");
        std::process::exit(1);
    }

    if !cli.no_preflight {
        let report = run_preflight(&platform);
        if !report.warnings.is_empty() {
            print_preflight(&report);
            eprintln!("\nSome tools will be unavailable. Run with --no-preflight to skip this check.");
            wait_for_enter()?;
        }
    }

    if !cli.no_admin {
        match privilege::ensure_privileged(&platform) {
            Elevation::Privileged => {}
            Elevation::Relaunched => return Ok(()),
            Elevation::Failed(msg) => {
                tracing::error!(%msg, "elevation failed");
                eprintln!("[ERROR] {msg}");
                wait_for_enter()?;
            }
        }
    }

    std::panic::set_hook(Box::new(|info| tracing::error!(%info, "panic")));
    let opts = StartupOptions { no_init: cli.no_init };
    let mut terminal = init_terminal()?;

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        run(&mut terminal, opts)
    }));

    // Always restore terminal
    restore_terminal(&mut terminal).ok();

    match result {
        Ok(Ok(())) => {
            tracing::info!("exited");
            println!("[INFO] CrunchyUtils EXITED");
            Ok(())
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "exited with error");
            Err(e)
        }
        Err(_) => {
            tracing::error!("panicked");
            eprintln!("CrunchyUtils crashed. See {}", log_config.file.display());
            std::process::exit(101);
        }
    }
}
