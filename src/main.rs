use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ablage_client::api::HttpRemote;
use ablage_client::app::App;
use ablage_client::config::{self, LoggingSettings};
use ablage_client::directory::{AssumeYes, Confirm, DeleteOutcome};
use ablage_client::state::AppContext;
use ablage_client::transfer::{BatchOutcome, FileReport, ProgressSnapshot, TransferObserver};
use ablage_client::validation::{BatchEntry, PendingFile, UploadBatch};
use ablage_client::view::{render_text, ProgressView};

#[derive(Parser)]
#[command(name = "ablage", version, about = "Upload, list and delete files on an Ablage server")]
struct Cli {
    /// Server base URL, overrides server.base_url
    #[arg(long, global = true)]
    server: Option<String>,
    /// Skip TLS certificate verification (self-signed server certificates)
    #[arg(long, global = true)]
    insecure: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the files stored on the server
    List {
        /// Print the view model as JSON
        #[arg(long)]
        json: bool,
    },
    /// Upload files one after another
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Delete a file on the server
    Delete {
        name: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Keep the listing current until Ctrl-C
    Watch,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration (embedded defaults -> ablage.toml -> env/.env), then CLI overrides
    let mut cfg = config::load()?;
    if let Some(server) = cli.server {
        cfg.server.base_url = server;
    }
    if cli.insecure {
        cfg.server.accept_invalid_certs = true;
    }

    // Guards am Leben halten, damit die Non-Blocking Writer beim Beenden flushen
    let _log_guards = init_logging(&cfg.logging)?;
    // Erst nach den Overrides prüfen, damit --server einen kaputten Wert ersetzen kann
    config::validate(&cfg)?;

    let store = Arc::new(HttpRemote::new(&cfg.server)?);
    info!("Ablage server at {}", store.base_url());
    let ctx = AppContext::new(cfg);
    let app = App::new(ctx.clone(), store);

    let code = match cli.command {
        Command::List { json } => cmd_list(&app, json).await?,
        Command::Upload { files } => cmd_upload(&app, files).await,
        Command::Delete { name, yes } => cmd_delete(&app, &name, yes).await,
        Command::Watch => cmd_watch(&app).await,
    };

    debug!("session metrics: {}", serde_json::to_string(&ctx.metrics.get_snapshot())?);
    Ok(code)
}

fn init_logging(settings: &LoggingSettings) -> anyhow::Result<Vec<WorkerGuard>> {
    // stderr, damit stdout für Listen/JSON frei bleibt; optional Datei-Rotation
    let (stderr_nb, stderr_guard) = tracing_appender::non_blocking(io::stderr());
    let mut guards = vec![stderr_guard];

    let file_layer = match &settings.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "ablage.log");
            let (file_nb, file_guard) = tracing_appender::non_blocking(file_appender);
            guards.push(file_guard);
            Some(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file_nb))
        }
        None => None,
    };

    let default_filter = settings.filter.clone().unwrap_or_else(|| "warn".to_string());
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(stderr_nb))
        .with(file_layer)
        .init();

    Ok(guards)
}

async fn cmd_list(app: &App, json: bool) -> anyhow::Result<ExitCode> {
    if let Err(e) = app.init().await {
        eprintln!("{}", e);
        return Ok(ExitCode::from(2));
    }
    let view = app.view(None).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("{}", render_text(&view));
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_upload(app: &App, paths: Vec<PathBuf>) -> ExitCode {
    if let Err(e) = app.init().await {
        eprintln!("{}", e);
        return ExitCode::from(2);
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match PendingFile::from_path(&path).await {
            Ok(file) => files.push(file),
            Err(e) => {
                eprintln!("{}: {}", path.display(), e.user_message());
                return ExitCode::FAILURE;
            }
        }
    }

    let mut observer = TerminalObserver::default();
    match app.upload(files, &mut observer).await {
        Ok(outcome) if outcome.all_succeeded => {
            println!("{}", app.context().status(std::time::Instant::now()).text);
            ExitCode::SUCCESS
        }
        Ok(outcome) => {
            let failed = outcome.failures().count();
            eprintln!("{} of {} files failed", failed, outcome.files.len());
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn cmd_delete(app: &App, name: &str, yes: bool) -> ExitCode {
    if let Err(e) = app.init().await {
        eprintln!("{}", e);
        return ExitCode::from(2);
    }

    let confirm: Box<dyn Confirm> = if yes { Box::new(AssumeYes) } else { Box::new(StdinConfirm) };
    match app.delete(name, confirm.as_ref()).await {
        Ok(DeleteOutcome::Deleted) => {
            println!("File deleted: {}", name);
            ExitCode::SUCCESS
        }
        Ok(DeleteOutcome::Declined) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn cmd_watch(app: &App) -> ExitCode {
    // Without config the timers keep retrying; nothing is listed until then.
    if let Err(e) = app.init().await {
        warn!("{}", e);
    }

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received. Stopping refresh...");
            shutdown.cancel();
        });
    }

    app.run(shutdown, |view| {
        println!("{}\n", render_text(view));
    })
    .await;
    ExitCode::SUCCESS
}

/// Asks on the terminal; anything but y/yes declines.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        eprint!("{} [y/N] ", prompt);
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Draws a single self-overwriting progress line on stderr.
#[derive(Default)]
struct TerminalObserver {
    total_files: usize,
    current: String,
    line_open: bool,
}

impl TerminalObserver {
    fn close_line(&mut self) {
        if self.line_open {
            eprintln!();
            self.line_open = false;
        }
    }
}

fn progress_bar(percent: f64) -> String {
    const WIDTH: usize = 30;
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(WIDTH - filled))
}

impl TransferObserver for TerminalObserver {
    fn batch_started(&mut self, batch: &UploadBatch) {
        self.total_files = batch.len();
    }

    fn file_started(&mut self, index: usize, entry: &BatchEntry) {
        self.close_line();
        self.current = entry.file.name.clone();
        eprintln!("[{}/{}] {}", index + 1, self.total_files, entry.file.name);
    }

    fn progress(&mut self, snapshot: &ProgressSnapshot) {
        let view = ProgressView::new(self.current.clone(), snapshot);
        eprint!("\r{} {}", progress_bar(view.percent), view.status);
        let _ = io::stderr().flush();
        self.line_open = true;
    }

    fn file_settled(&mut self, report: &FileReport) {
        self.close_line();
        match report.outcome.to_error(&report.raw_name) {
            Some(err) => eprintln!("  {}", err.user_message()),
            None => eprintln!("  stored as {}", report.sanitized_name),
        }
    }

    fn batch_finished(&mut self, _outcome: &BatchOutcome) {
        self.close_line();
    }
}
