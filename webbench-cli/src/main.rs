use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use webbench_replay::ViewMode;

mod commands;
mod workbench;

use workbench::Workbench;

/// Save, replay and diff HTTP requests.
#[derive(Debug, Parser)]
#[command(name = "webbench", version)]
struct Cli {
    /// Project directory holding project.toml and the request database
    #[arg(long, env = "WEBBENCH_PROJECT", default_value = ".webbench", global = true)]
    project_dir: PathBuf,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send a request without saving it
    Send(RequestArgs),
    /// Save a request to the top of the list
    Save(RequestArgs),
    /// List saved requests, newest first
    List {
        #[arg(long)]
        in_scope: bool,
    },
    /// Show one saved request
    Show { id: String },
    /// Replace the fields of a saved request, keeping its id
    Overwrite {
        id: String,
        #[command(flatten)]
        patch: PatchArgs,
    },
    /// Delete one saved request
    Remove { id: String },
    /// Delete every saved request
    Clear,
    /// Replay a saved request, diffing each response against the previous one
    Replay {
        id: String,
        #[arg(long, default_value_t = 1)]
        times: u32,
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,
        #[arg(long, value_enum, default_value_t = ViewArg::Raw)]
        view: ViewArg,
    },
    /// Print the HTTP/1.1 text a request would send
    Preview(RequestArgs),
    /// Replace saved requests with the JSON array in a file
    Import { file: PathBuf },
    /// Write saved requests as JSON, by default into the exports directory
    Export { file: Option<PathBuf> },
    /// Print saved traffic grouped by host and path
    Sitemap {
        #[arg(long)]
        in_scope_only: bool,
    },
    /// Inspect or edit the target scope
    #[command(subcommand)]
    Scope(ScopeCommand),
}

#[derive(Debug, Args)]
struct RequestArgs {
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,
    #[arg(long)]
    url: String,
    /// Header as "Name: value"; repeatable
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,
    #[arg(short = 'd', long = "data", default_value = "")]
    data: String,
}

#[derive(Debug, Args)]
struct PatchArgs {
    #[arg(short = 'X', long)]
    method: Option<String>,
    #[arg(long)]
    url: Option<String>,
    /// Replaces all headers when given; repeatable
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,
    #[arg(short = 'd', long = "data")]
    data: Option<String>,
}

#[derive(Debug, Subcommand)]
enum ScopeCommand {
    Show,
    Enable,
    Disable,
    AddHost { host: String },
    AddPath { prefix: String },
    RemoveHost { host: String },
    RemovePath { prefix: String },
    Clear,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ViewArg {
    Raw,
    Diff,
}

impl From<ViewArg> for ViewMode {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Raw => ViewMode::Raw,
            ViewArg::Diff => ViewMode::Diff,
        }
    }
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let mut bench = Workbench::open(&cli.project_dir)?;
    match cli.command {
        Command::Send(args) => commands::send(&bench, args).await,
        Command::Save(args) => commands::save(&mut bench, args),
        Command::List { in_scope } => commands::list(&mut bench, in_scope),
        Command::Show { id } => commands::show(&mut bench, &id),
        Command::Overwrite { id, patch } => commands::overwrite(&mut bench, &id, patch),
        Command::Remove { id } => commands::remove(&mut bench, &id),
        Command::Clear => commands::clear(&mut bench),
        Command::Replay {
            id,
            times,
            interval_ms,
            view,
        } => commands::replay(&mut bench, &id, times, interval_ms, view.into()).await,
        Command::Preview(args) => commands::preview(&bench, args),
        Command::Import { file } => commands::import(&mut bench, &file),
        Command::Export { file } => commands::export(&mut bench, file),
        Command::Sitemap { in_scope_only } => commands::sitemap(&mut bench, in_scope_only),
        Command::Scope(command) => commands::scope(&mut bench, command),
    }
}
