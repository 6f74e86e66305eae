//! scopelink: terminal client for a shared scope server
//!
//! Usage:
//!   scopelink                              → connect with ./scopelink.toml or defaults
//!   scopelink --url ws://host:port/ws      → connect to a specific server
//!   scopelink --log-file scopelink.log     → also write logs to a file
//!   scopelink print-config                 → print the effective config as TOML
//!
//! Once connected, type `help` for commands.

use clap::{Parser, Subcommand};
use scopelink_client::{start_client, ClientConfig, Command, CommandError, Renderer};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[derive(Parser)]
#[command(
    name = "scopelink",
    about = "Keeps a live local mirror of remote scopes and answers queries about it",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to config file (TOML)
    #[arg(short, long, default_value = "scopelink.toml")]
    config: PathBuf,

    /// Server WebSocket URL (overrides config)
    #[arg(short, long)]
    url: Option<String>,

    /// Auth token (or set SCOPELINK_TOKEN)
    #[arg(short, long)]
    token: Option<String>,

    /// Make scopes current as soon as they are entered
    #[arg(long, default_value_t = false)]
    autofocus: bool,

    /// Write logs to a file (in addition to stderr)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective config as TOML
    PrintConfig,
    /// Show version
    Version,
}

const HELP: &str = "\
commands:
  scopes            list known scopes
  enter <scope>     ask the server to let you into a scope
  open <scope>      make an entered scope current
  leave <scope>     leave a scope
  clients           clients of the current scope
  vars | funcs      variables / functions of the current scope
  pkgs              loaded packages
  msg <text>        message the current scope
  current           show the current scope
  reconnect         reconnect after the server went away
  quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("scopelink v{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(Commands::PrintConfig) => {
            print!("{}", resolve_config(&cli).to_toml());
            return Ok(());
        }
        None => {}
    }

    let _log_guard = init_tracing(cli.log_file.as_deref())?;
    let config = resolve_config(&cli);
    run_repl(config).await
}

fn resolve_config(cli: &Cli) -> ClientConfig {
    let mut config = ClientConfig::load(&cli.config);
    if let Some(url) = &cli.url {
        config.server.url = url.clone();
    }
    if let Some(token) = cli
        .token
        .clone()
        .or_else(|| std::env::var("SCOPELINK_TOKEN").ok())
    {
        config.server.token = Some(token);
    }
    if cli.autofocus {
        config.session.autofocus = true;
    }
    config
}

fn init_tracing(
    log_file: Option<&Path>,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    const DEFAULT_FILTER: &str = "scopelink=info,scopelink_client=info,scopelink_replica=info";
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| DEFAULT_FILTER.into())
    };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter());

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path.file_name().ok_or_else(|| {
                anyhow::anyhow!("log file path has no file name: {}", path.display())
            })?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(guard)
}

async fn run_repl(config: ClientConfig) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let handle = start_client(&config, cancel.clone()).await?;
    let renderer = Renderer::new(config.output.timestamps);

    println!("Connected to {}. Type `help` for commands.", config.server.url);

    // Print notification-driven observations as they arrive
    let mut observations = handle.subscribe();
    let printer_cancel = cancel.clone();
    let printer = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = printer_cancel.cancelled() => break,
                obs = observations.recv() => match obs {
                    Ok(obs) => {
                        for line in renderer.render(obs.lines()) {
                            println!("{}", line);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("Output lagged, dropped {} observations", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == "help" {
            println!("{}", HELP);
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(CommandError::Empty) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        let quit = command == Command::Quit;
        let reply = handle.execute(command).await?;
        for line in renderer.render(reply.lines()) {
            println!("{}", line);
        }
        if quit {
            break;
        }
    }

    handle.shutdown();
    let _ = printer.await;
    Ok(())
}
