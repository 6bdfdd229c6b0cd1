use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focustodo", version, about = "Pomodoro timer and to-do list")]
struct Cli {
    /// Directory holding the database and config file
    #[arg(long, global = true, env = "FOCUSTODO_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Focus statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("FOCUSTODO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = || focustodo_core::storage::data_dir(cli.data_dir.as_deref());
    match cli.command {
        Commands::Timer { action } => commands::timer::run(action, &data_dir()?),
        Commands::Task { action } => commands::task::run(action, &data_dir()?),
        Commands::Stats { action } => commands::stats::run(action, &data_dir()?),
        Commands::Config { action } => commands::config::run(action, &data_dir()?),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "focustodo", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
