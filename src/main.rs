//! htmlpolish is an HTTP service that accepts uploaded HTML files and returns
//! them normalized into an indented canonical form.
//!
//! The tool has two commands:
//! 1. `serve` - Runs the HTTP endpoint
//! 2. `normalize` - Prints the normalized form of a local file

use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::{LevelFilter, debug, info, warn};

use htmlpolish::{
    AdvisoryMode, AppState, ModelCli, SupabaseStore,
    constants::{DEFAULT_MODEL, DEFAULT_MODEL_PROGRAM},
    normalize::prettify,
    serve,
};

/// An HTTP service that normalizes uploaded HTML files
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The command to execute (serve or normalize)
    #[command(subcommand)]
    command: Command,

    #[arg(long, short, action = clap::ArgAction::Count, help = "Output v(v...)erbosity: error (0), warn (1), info (2), debug (3), trace (4)", global = true, default_value_t = 2)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP endpoint
    Serve {
        /// Address to listen on
        #[arg(long, short, default_value = "0.0.0.0:8000")]
        addr: SocketAddr,
        /// Advisory path: "dormant" (default) returns the normalized HTML, "active" asks the model and stores the result
        #[arg(long, default_value = "dormant")]
        advisory: AdvisoryMode,
        /// Model runtime executable
        #[arg(long, default_value = DEFAULT_MODEL_PROGRAM)]
        program: String,
        /// Model name passed to the runtime
        #[arg(long, short, default_value = DEFAULT_MODEL)]
        model: String,
        /// Path to the file with a prompt template
        #[arg(long, short = 'p')]
        prompt_file: Option<String>,
    },
    /// Print the normalized form of an HTML file
    Normalize {
        /// Path to the HTML file
        file: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init();

    // Variables already set in the process take precedence over the file.
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => warn!("Ignoring .env file: {err}"),
    }

    match cli.command {
        Command::Serve {
            addr,
            advisory,
            program,
            model,
            prompt_file,
        } => handle_serve_command(addr, advisory, program, model, prompt_file).await,
        Command::Normalize { file } => handle_normalize_command(&file),
    }
}

async fn handle_serve_command(
    addr: SocketAddr,
    advisory: AdvisoryMode,
    program: String,
    model: String,
    prompt_file: Option<String>,
) -> Result<()> {
    let store = SupabaseStore::from_env().context("Unable to configure the records table")?;
    info!("Records go to {}", store.endpoint());

    let prompt_template = match prompt_file {
        Some(file) => {
            let content =
                fs::read_to_string(&file).context(format!("Failed to read prompt file: {file}"))?;
            Some(Arc::from(content))
        }
        None => None,
    };

    let state = AppState {
        advisor: Arc::new(ModelCli::new(program, model)),
        store: Arc::new(store),
        prompt_template,
        advisory,
    };

    serve(addr, state).await
}

fn handle_normalize_command(file: &str) -> Result<()> {
    let content = fs::read(file).context(format!("Failed to read HTML file: {file}"))?;
    print!("{}", prettify(&content));
    Ok(())
}
