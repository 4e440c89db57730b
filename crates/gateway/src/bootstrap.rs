use std::sync::Arc;

use {
    anyhow::Context,
    tokio::{net::TcpListener, task::JoinHandle},
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use {
    yuta_channels::{Error as ChannelError, SessionFactoryRegistry},
    yuta_common::clock::now_ms,
    yuta_config::{Severity, YutaConfig, check_clients, validate},
    yuta_matrix::MatrixSessionFactory,
    yuta_metrics::{MetricsRecorderConfig, init_metrics},
    yuta_nlu::{DialogflowClient, NluClient},
    yuta_relay::{SessionExit, SessionSupervisor},
};

use crate::server::{AppState, build_app, serve};

/// Command-line overrides for the `server` config section.
#[derive(Debug, Clone, Default)]
pub struct GatewayOptions {
    pub bind: Option<String>,
    pub port: Option<u16>,
}

/// A spawned, supervised session.
pub struct SessionTask {
    pub account_id: String,
    pub handle: JoinHandle<SessionExit>,
}

/// Factories for every chat platform this build can talk to.
#[must_use]
pub fn default_registry() -> SessionFactoryRegistry {
    SessionFactoryRegistry::new().with(Arc::new(MatrixSessionFactory::new()))
}

/// Spawn one supervised relay task per client whose type has a factory.
///
/// Clients with an unsupported type are logged and skipped. A client that
/// fails later does not affect the others.
pub fn spawn_sessions(
    config: &YutaConfig,
    registry: &SessionFactoryRegistry,
    nlu: Arc<dyn NluClient>,
    started_at_ms: i64,
    cancel: &CancellationToken,
) -> Vec<SessionTask> {
    debug!(factories = ?registry.list(), "session factories available");
    let mut tasks = Vec::with_capacity(config.clients.len());
    for client in &config.clients {
        let account_id = client.account_id();
        let Some(factory) = registry.get(&client.client_type) else {
            warn!(
                account_id,
                error = %ChannelError::unsupported(&client.client_type),
                "skipping client"
            );
            #[cfg(feature = "metrics")]
            yuta_metrics::counter!(
                yuta_metrics::sessions::UNSUPPORTED_TOTAL,
                yuta_metrics::labels::CLIENT_TYPE => client.client_type.to_string()
            )
            .increment(1);
            continue;
        };

        info!(account_id, client_type = %client.client_type, "starting session");
        let supervisor = SessionSupervisor::new(
            client.clone(),
            factory,
            Arc::clone(&nlu),
            config.nlu.clone(),
            config.relay.clone(),
            started_at_ms,
        );
        tasks.push(SessionTask {
            account_id,
            handle: tokio::spawn(supervisor.run(cancel.clone())),
        });
    }
    tasks
}

/// Load the production collaborators and run until `cancel` fires.
pub async fn start_gateway(
    config: YutaConfig,
    options: GatewayOptions,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let nlu = DialogflowClient::from_config(&config.nlu).context("failed to build NLU client")?;
    run_gateway(config, options, default_registry(), Arc::new(nlu), cancel).await
}

/// Validate, start every session, then serve HTTP until `cancel` fires.
///
/// Any validation error aborts before a session starts, so `yuta check`
/// exits non-zero exactly when `run` would refuse the config. A listener
/// failure cancels the running sessions and is returned as an error.
pub async fn run_gateway(
    config: YutaConfig,
    options: GatewayOptions,
    registry: SessionFactoryRegistry,
    nlu: Arc<dyn NluClient>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    check_clients(&config).context("invalid client configuration")?;
    let validation = validate(&config);
    for d in &validation.diagnostics {
        match d.severity {
            Severity::Error => error!(path = d.path, category = d.category, "{}", d.message),
            Severity::Warning => warn!(path = d.path, category = d.category, "{}", d.message),
            Severity::Info => info!(path = d.path, category = d.category, "{}", d.message),
        }
    }
    if validation.has_errors() {
        anyhow::bail!(
            "invalid configuration: {} error(s)",
            validation.count(Severity::Error)
        );
    }

    let metrics_handle = match init_metrics(MetricsRecorderConfig {
        enabled: config.metrics.enabled,
    }) {
        Ok(handle) => handle,
        Err(e) => {
            warn!(error = %e, "failed to install metrics recorder, /metrics disabled");
            None
        },
    };

    let started_at_ms = now_ms();
    let tasks = spawn_sessions(&config, &registry, nlu, started_at_ms, &cancel);
    info!(
        sessions = tasks.len(),
        configured = config.clients.len(),
        "sessions spawned"
    );

    let host = options.bind.unwrap_or_else(|| config.server.host.clone());
    let port = options.port.unwrap_or(config.server.port);
    let served = async {
        let listener = TcpListener::bind((host.as_str(), port))
            .await
            .with_context(|| format!("failed to bind {host}:{port}"))?;
        let app = build_app(AppState { metrics_handle }, config.server.timeout());
        serve(listener, app, cancel.clone()).await
    }
    .await;

    if let Err(e) = &served {
        error!(error = %e, "http server failed, stopping sessions");
        cancel.cancel();
    }

    for task in tasks {
        match task.handle.await {
            Ok(SessionExit::Shutdown) => info!(account_id = task.account_id, "session stopped"),
            Ok(SessionExit::Disabled(_)) => {},
            Err(e) => error!(account_id = task.account_id, error = %e, "session task panicked"),
        }
    }

    served
}
