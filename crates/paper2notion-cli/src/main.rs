mod commands;
mod pdf;
mod pipeline;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use paper2notion_core::ExitCode;
use paper2notion_core::config::StorageBackend;

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "paper2notion",
    about = "Turn a paper PDF into a Notion database page with metadata and a sectioned summary",
    version,
    long_about = None
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format.
    /// Also enabled by setting PAPER2NOTION_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log line format on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Process one PDF and publish it as a Notion page.
    Run(RunArgs),

    /// Publish a session saved by `run` (`--save-session` or after a failed publish).
    Publish {
        session: PathBuf,
        /// Publish again even if the session already produced a page.
        #[arg(long)]
        force: bool,
    },

    /// Look up registry metadata for a DOI or `arxiv:` identifier.
    Lookup { id: String },

    /// Split a `### `-sectioned summary into content blocks (stdin if no file).
    Blocks { file: Option<PathBuf> },

    /// Dropbox authorization.
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args)]
pub(crate) struct RunArgs {
    /// Paper PDF.
    pub pdf: PathBuf,

    /// DOI or `arxiv:<id>`; its registry record is trusted over the PDF.
    #[arg(long)]
    pub doi: Option<String>,

    /// Where to store the PDF (overrides config).
    #[arg(long)]
    pub storage: Option<StorageBackend>,

    /// Keep the abstract in its original language.
    #[arg(long)]
    pub no_translate: bool,

    /// Assemble the page but upload and publish nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Write the session to this file after the run.
    #[arg(long)]
    pub save_session: Option<PathBuf>,
}

#[derive(Subcommand)]
pub(crate) enum AuthAction {
    /// Print the Dropbox authorization URL.
    Url,
    /// Store a Dropbox token, from an authorization code or given directly.
    Login {
        #[arg(long, conflicts_with = "token", required_unless_present = "token")]
        code: Option<String>,
        #[arg(long)]
        token: Option<String>,
    },
    /// Delete the stored token.
    Logout,
    /// Show where a token would come from.
    Status,
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Print the config file path.
    Path,
    /// Show the resolved configuration.
    Show,
    /// Write a config file with defaults.
    Init {
        #[arg(long)]
        force: bool,
    },
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    commands::init_tracing(&cli);

    let json_output = cli.json || std::env::var("PAPER2NOTION_JSON").as_deref() == Ok("1");
    let code = match commands::run(cli, json_output).await {
        Ok(code) => code,
        Err(err) => {
            let code = err
                .downcast_ref::<commands::HardStop>()
                .map(|stop| stop.code)
                .unwrap_or(ExitCode::GeneralError);
            if json_output {
                println!(
                    "{}",
                    serde_json::json!({"status": "error", "message": format!("{err:#}")})
                );
            } else {
                eprintln!("error: {err:#}");
            }
            code
        }
    };
    std::process::exit(code as i32);
}
