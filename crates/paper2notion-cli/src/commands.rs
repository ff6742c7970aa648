use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use paper2notion_ai::GeminiBackend;
use paper2notion_core::config::{StorageBackend, secret_from_env};
use paper2notion_core::{AppConfig, ExitCode, TokenStore, split_sections, to_markdown};
use paper2notion_publish::{
    DropboxAuth, DropboxClient, DropboxStorage, FileStorage, NotionClient, NotionFileStorage,
    Publisher,
};
use paper2notion_science::{PaperIdentifier, Registry, ScholarlyRegistry};
use serde_json::json;
use tracing::info;

use crate::pdf::read_pdf;
use crate::pipeline::{
    ExtractStage, LookupStage, Pipeline, PublishOutcome, PublishStage, Session, SummarizeStage,
    TranslateStage, UploadStage,
};
use crate::{AuthAction, Cli, Commands, ConfigAction, LogFormat, RunArgs};

/// A condition that stops the command before any work is done.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub(crate) struct HardStop {
    pub code: ExitCode,
    pub message: String,
}

impl HardStop {
    fn new(code: ExitCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

fn require_secret(var: &str, what: &str) -> Result<String> {
    secret_from_env(var).ok_or_else(|| {
        HardStop::new(ExitCode::MissingCredential, format!("{what} is not set (${var})")).into()
    })
}

// ─── Tracing ────────────────────────────────────────────────────────────────

pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "paper2notion=info",
        1 => "paper2notion=debug",
        _ => "paper2notion=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ─── Dispatch ───────────────────────────────────────────────────────────────

pub(crate) async fn run(cli: Cli, json_output: bool) -> Result<ExitCode> {
    let config_path = AppConfig::config_path();
    let config = AppConfig::load_from(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;

    match cli.command {
        Commands::Run(args) => cmd_run(&config, args, json_output).await,
        Commands::Publish { session, force } => {
            cmd_publish(&config, &session, force, json_output).await
        }
        Commands::Lookup { id } => cmd_lookup(&config, &id, json_output).await,
        Commands::Blocks { file } => cmd_blocks(file.as_deref(), json_output),
        Commands::Auth { action } => cmd_auth(&config, action, json_output).await,
        Commands::Config { action } => cmd_config(&config, &config_path, action, json_output),
    }
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

// ─── run / publish ──────────────────────────────────────────────────────────

struct NotionTarget {
    api_key: String,
    database_id: String,
}

fn notion_target(config: &AppConfig) -> Result<NotionTarget> {
    Ok(NotionTarget {
        api_key: require_secret(&config.notion.api_key_env, "Notion API key")?,
        database_id: require_secret(&config.notion.database_id_env, "Notion database id")?,
    })
}

fn dropbox_token(config: &AppConfig) -> Option<String> {
    secret_from_env(&config.storage.access_token_env).or_else(|| {
        match TokenStore::at_default_location().load() {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(error = %err, "stored Dropbox token is unreadable");
                None
            }
        }
    })
}

/// Storage for the chosen backend, or the reason there is none.
fn build_storage(
    config: &AppConfig,
    backend: StorageBackend,
    notion: Option<&NotionTarget>,
) -> std::result::Result<Option<Box<dyn FileStorage>>, String> {
    match backend {
        StorageBackend::None => Ok(None),
        StorageBackend::Dropbox => {
            let token = dropbox_token(config).ok_or_else(|| {
                format!(
                    "no Dropbox token (${} or `paper2notion auth login`); PDF will not be uploaded",
                    config.storage.access_token_env
                )
            })?;
            let storage: Box<dyn FileStorage> = Box::new(DropboxStorage::new(
                DropboxClient::new(token),
                config.storage.dropbox_folder.clone(),
            ));
            Ok(Some(storage))
        }
        StorageBackend::Notion => {
            let target = notion.ok_or("Notion credentials unavailable; PDF will not be uploaded")?;
            let storage: Box<dyn FileStorage> = Box::new(NotionFileStorage::new(
                NotionClient::from_config(&config.notion, target.api_key.clone()),
            ));
            Ok(Some(storage))
        }
    }
}

async fn cmd_run(config: &AppConfig, args: RunArgs, json_output: bool) -> Result<ExitCode> {
    if !args.pdf.is_file() {
        return Err(HardStop::new(
            ExitCode::FileSystemError,
            format!("PDF not found: {}", args.pdf.display()),
        )
        .into());
    }
    let pdf = read_pdf(&args.pdf).map_err(|err| HardStop::new(ExitCode::FileSystemError, format!("{err:#}")))?;
    let gemini_key = require_secret(&config.llm.api_key_env, "Gemini API key")?;
    let notion = if args.dry_run {
        None
    } else {
        Some(notion_target(config)?)
    };

    let model = GeminiBackend::from_config(&config.llm, gemini_key);
    let registry = ScholarlyRegistry::from_config(&config.registry)?;

    let identifier = identifier_arg(args.doi.as_deref());
    let mut session = Session::new(pdf, identifier);

    let storage = if args.dry_run {
        None
    } else {
        let backend = args.storage.unwrap_or(config.storage.backend);
        match build_storage(config, backend, notion.as_ref()) {
            Ok(storage) => storage,
            Err(reason) => {
                session.report.add_warning(reason);
                None
            }
        }
    };
    let publisher = notion
        .as_ref()
        .map(|target| NotionClient::from_config(&config.notion, target.api_key.clone()));

    let pipeline = Pipeline::new()
        .stage(LookupStage {
            registry: &registry,
        })
        .stage(ExtractStage {
            model: &model,
            registry: &registry,
        })
        .stage(TranslateStage {
            model: &model,
            enabled: config.translation.enabled && !args.no_translate,
            language: config.translation.target_language.clone(),
        })
        .stage(SummarizeStage {
            model: &model,
            language: config.summary.language.clone(),
        })
        .stage(UploadStage {
            storage: storage.as_deref(),
        })
        .stage(PublishStage {
            publisher: publisher.as_ref().map(|client| client as &dyn Publisher),
            database_id: notion
                .as_ref()
                .map(|target| target.database_id.clone())
                .unwrap_or_default(),
            properties: config.notion.properties.clone(),
        });

    let outcome = pipeline.run(&mut session).await;

    let save_path = args
        .save_session
        .clone()
        .or_else(|| session.publish_failed().then(|| fallback_session_path(&args.pdf)));
    if let Some(path) = &save_path {
        session.save(path)?;
        info!(path = %path.display(), "session saved");
        if args.save_session.is_none() && !json_output {
            println!(
                "Session saved to {0}; retry with `paper2notion publish {0}`",
                path.display()
            );
        }
    }
    report_session(&session, json_output)?;

    match outcome {
        Ok(()) => Ok(ExitCode::Success),
        Err(_) if session.publish_failed() => Ok(ExitCode::PublishFailed),
        Err(err) => Err(err),
    }
}

async fn cmd_publish(
    config: &AppConfig,
    path: &Path,
    force: bool,
    json_output: bool,
) -> Result<ExitCode> {
    let mut session = Session::load(path)
        .map_err(|err| HardStop::new(ExitCode::FileSystemError, format!("{err:#}")))?;
    ensure_republishable(&session, path, force)?;
    let notion = notion_target(config)?;
    let publisher = NotionClient::from_config(&config.notion, notion.api_key.clone());

    let stage = PublishStage {
        publisher: Some(&publisher as &dyn Publisher),
        database_id: notion.database_id,
        properties: config.notion.properties.clone(),
    };
    let outcome = Pipeline::new().stage(stage).run(&mut session).await;

    session.save(path)?;
    report_session(&session, json_output)?;
    match outcome {
        Ok(()) => Ok(ExitCode::Success),
        Err(_) => Ok(ExitCode::PublishFailed),
    }
}

/// Identifier from `--doi`; blank values count as not given.
fn identifier_arg(raw: Option<&str>) -> Option<PaperIdentifier> {
    raw.map(PaperIdentifier::parse).filter(|id| !id.is_blank())
}

/// `paper.pdf` → `paper.session.json` in the same directory.
fn fallback_session_path(pdf: &Path) -> PathBuf {
    let stem = pdf
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "paper".to_string());
    pdf.with_file_name(format!("{stem}.session.json"))
}

fn ensure_republishable(session: &Session, path: &Path, force: bool) -> Result<()> {
    if session.already_published() && !force {
        return Err(HardStop::new(
            ExitCode::InvalidArgs,
            format!("{} was already published (use --force to publish again)", path.display()),
        )
        .into());
    }
    Ok(())
}

fn report_session(session: &Session, json_output: bool) -> Result<()> {
    if json_output {
        let mut data = serde_json::to_value(session)?;
        if let Some(preview) = &session.preview {
            data["preview"] = serde_json::to_value(preview)?;
        }
        let status = if session.publish_failed() { "error" } else { "ok" };
        return print_json(&json!({"status": status, "data": data}));
    }

    println!("{}", session.pdf_name);
    for step in &session.report.steps {
        println!("  ✓ {step}");
    }
    for warning in &session.report.warnings {
        println!("  ! {warning}");
    }
    let meta = &session.metadata;
    println!();
    println!("Title:    {}", meta.title);
    println!("Authors:  {}", meta.authors);
    println!("Journal:  {}", meta.journals);
    match meta.known_year() {
        Some(year) => println!("Year:     {year}"),
        None => println!("Year:     -"),
    }
    println!("DOI:      {}", meta.doi);
    println!();
    match &session.report.publish {
        Some(PublishOutcome::Published { url, .. }) => println!("Published: {url}"),
        Some(PublishOutcome::Skipped { reason }) => println!("Not published: {reason}"),
        Some(PublishOutcome::Failed { message }) => println!("Publish failed: {message}"),
        None => {}
    }
    if let Some(preview) = &session.preview {
        println!("{}", serde_json::to_string_pretty(preview)?);
    }
    Ok(())
}

// ─── lookup / blocks ────────────────────────────────────────────────────────

async fn cmd_lookup(config: &AppConfig, id: &str, json_output: bool) -> Result<ExitCode> {
    let registry = ScholarlyRegistry::from_config(&config.registry)?;
    let identifier = PaperIdentifier::parse(id);
    let Some(meta) = registry.fetch_metadata(&identifier).await else {
        if json_output {
            print_json(&json!({"status": "error", "error": "not_found", "message": format!("no record for {identifier}")}))?;
        } else {
            eprintln!("no record for {identifier}");
        }
        return Ok(ExitCode::GeneralError);
    };

    if json_output {
        print_json(&json!({"status": "ok", "data": meta}))?;
    } else {
        println!("{}", serde_json::to_string_pretty(&meta)?);
    }
    Ok(ExitCode::Success)
}

fn cmd_blocks(file: Option<&Path>, json_output: bool) -> Result<ExitCode> {
    let summary = match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|err| HardStop::new(ExitCode::FileSystemError, format!("{}: {err}", path.display())))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let blocks = split_sections(&summary);
    if json_output {
        print_json(&json!({"status": "ok", "data": blocks}))?;
    } else {
        println!("{}", to_markdown(&blocks));
    }
    Ok(ExitCode::Success)
}

// ─── auth ───────────────────────────────────────────────────────────────────

fn dropbox_auth(config: &AppConfig, need_secret: bool) -> Result<DropboxAuth> {
    let key = require_secret(&config.storage.app_key_env, "Dropbox app key")?;
    let secret = if need_secret {
        require_secret(&config.storage.app_secret_env, "Dropbox app secret")?
    } else {
        String::new()
    };
    Ok(DropboxAuth::new(key, secret, config.storage.redirect_uri.clone()))
}

async fn cmd_auth(config: &AppConfig, action: AuthAction, json_output: bool) -> Result<ExitCode> {
    let store = TokenStore::at_default_location();
    match action {
        AuthAction::Url => {
            let url = dropbox_auth(config, false)?.authorize_url();
            if json_output {
                print_json(&json!({"status": "ok", "data": {"url": url}}))?;
            } else {
                println!("Open this URL, approve access, then run `paper2notion auth login --code <CODE>`:");
                println!("{url}");
            }
        }
        AuthAction::Login { code, token } => {
            let token = match (code, token) {
                (_, Some(token)) => token,
                (Some(code), None) => dropbox_auth(config, true)?.exchange_code(&code).await?,
                (None, None) => {
                    return Err(HardStop::new(ExitCode::InvalidArgs, "pass --code or --token").into());
                }
            };
            store.save(&token)?;
            if json_output {
                print_json(&json!({"status": "ok", "data": {"stored": store.path()}}))?;
            } else {
                println!("Dropbox token stored in {}", store.path().display());
            }
        }
        AuthAction::Logout => {
            let removed = store.delete()?;
            if json_output {
                print_json(&json!({"status": "ok", "data": {"removed": removed}}))?;
            } else if removed {
                println!("Removed {}", store.path().display());
            } else {
                println!("No stored token");
            }
        }
        AuthAction::Status => {
            let from_env = secret_from_env(&config.storage.access_token_env).is_some();
            let stored = store.load()?.is_some();
            if json_output {
                print_json(&json!({"status": "ok", "data": {
                    "env": from_env,
                    "stored": stored,
                    "path": store.path(),
                }}))?;
            } else {
                println!("${}: {}", config.storage.access_token_env, if from_env { "set" } else { "unset" });
                println!("{}: {}", store.path().display(), if stored { "present" } else { "absent" });
            }
        }
    }
    Ok(ExitCode::Success)
}

// ─── config ─────────────────────────────────────────────────────────────────

fn cmd_config(
    config: &AppConfig,
    config_path: &Path,
    action: ConfigAction,
    json_output: bool,
) -> Result<ExitCode> {
    match action {
        ConfigAction::Path => {
            if json_output {
                print_json(&json!({"status": "ok", "data": {"path": config_path}}))?;
            } else {
                println!("{}", config_path.display());
            }
        }
        ConfigAction::Show => {
            if json_output {
                print_json(&json!({"status": "ok", "data": config}))?;
            } else {
                print!("{}", toml::to_string_pretty(config)?);
            }
        }
        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                return Err(HardStop::new(
                    ExitCode::InvalidArgs,
                    format!("{} already exists (use --force)", config_path.display()),
                )
                .into());
            }
            AppConfig::default().save_to(config_path)?;
            if json_output {
                print_json(&json!({"status": "ok", "data": {"path": config_path}}))?;
            } else {
                println!("Wrote {}", config_path.display());
            }
        }
    }
    Ok(ExitCode::Success)
}
