mod check_command;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use yuta_gateway::GatewayOptions;

#[derive(Parser)]
#[command(name = "yuta", version, about = "Yuta: relay chat messages to an NLU agent")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: ./yuta.yaml, then ~/.config/yuta/).
    #[arg(long, short, global = true, env = "YUTA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind the HTTP server to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start every configured session and the HTTP server (default).
    Run,
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Cancel `token` on Ctrl-C.
fn spawn_shutdown_listener(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                token.cancel();
            },
            Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Check { verbose }) => check_command::check(cli.config.as_deref(), verbose),
        None | Some(Commands::Run) => {
            init_telemetry(&cli);
            info!(version = env!("CARGO_PKG_VERSION"), "yuta starting");

            let (path, config) = yuta_config::discover_and_load(cli.config.as_deref())?;
            info!(path = %path.display(), clients = config.clients.len(), "config loaded");

            let cancel = CancellationToken::new();
            spawn_shutdown_listener(cancel.clone());

            yuta_gateway::start_gateway(
                config,
                GatewayOptions {
                    bind: cli.bind,
                    port: cli.port,
                },
                cancel,
            )
            .await?;
            info!("yuta stopped");
            Ok(())
        },
    }
}
