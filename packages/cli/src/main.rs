mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{init, publish, set, show, InitArgs, PublishArgs, SetArgs, ShowArgs};
use tracing_subscriber::EnvFilter;

/// Folio CLI - edit and publish your site configuration
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a folio.config.json in the current directory
    Init(InitArgs),

    /// Print a document as a device would see it
    Show(ShowArgs),

    /// Change one value in the draft and save it
    Set(SetArgs),

    /// Save any pending edits and publish the draft
    Publish(PublishArgs),
}

async fn run(command: Command) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();

    match command {
        Command::Init(args) => init(args, &cwd),
        Command::Show(args) => show(args, &cwd).await,
        Command::Set(args) => set(args, &cwd).await,
        Command::Publish(args) => publish(args, &cwd).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli.command).await {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
