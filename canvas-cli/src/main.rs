//! canvasctl - canvas drawing persistence API
//!
//! Subcommands:
//! - `serve`: run the HTTP API against PostgreSQL (or in memory)
//! - `ping`: check that the configured database is reachable
//! - `completions`: generate shell completion scripts

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "canvasctl",
    author,
    version,
    about = "Save, list, and load canvas drawings over HTTP",
    long_about = "HTTP API that stores canvas drawings as JSON documents in PostgreSQL, \
                  keyed by drawing name and grouped by owner email."
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the telemetry feature)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the canvas HTTP API server
    Serve(commands::ServeArgs),
    /// Check database connectivity
    Ping(commands::PingArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let _tracing = tracing_setup::init(tracing_setup::TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
    })
    .unwrap_or_else(|e| {
        eprintln!("tracing disabled: {e}");
        tracing_setup::TracingGuard::default()
    });

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await,
        Commands::Ping(args) => commands::run_ping(args).await,
        Commands::Completions(args) => run_completions(args),
    }
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
