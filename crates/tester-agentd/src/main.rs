mod config;

use std::{process::ExitCode, sync::Arc};

use anyhow::Context;
use axum::{Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use tester_api::ProbeApi;
use tester_core::{Health, Supervisor, WorkloadRegistry};
use tester_load::register_builtin_workloads;
use tester_observe::logger_init;
use tester_prometheus::PrometheusMetrics;
use tester_source::MySqlSource;

use crate::config::{AgentArgs, AgentConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cfg = match AgentArgs::parse().resolve() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("tester-agentd: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logger_init(&cfg.logger) {
        eprintln!("tester-agentd: {e}");
        return ExitCode::FAILURE;
    }

    match run(cfg).await {
        Ok(()) => {
            info!("exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "tester failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: AgentConfig) -> anyhow::Result<()> {
    info!(
        pod = %cfg.pod_name,
        namespace = %cfg.pod_namespace,
        uid = %cfg.source.pod_uuid,
        "starting tester"
    );

    // 1) Workloads
    let mut registry = WorkloadRegistry::new();
    register_builtin_workloads(&mut registry, &cfg.load)?;
    info!(workloads = ?registry.names(), "workloads registered");

    // 2) Desired-set source
    let source = MySqlSource::connect(cfg.source.clone())
        .await
        .context("can't connect to database")?;

    // 3) Health and metrics
    let health = Arc::new(Health::new());
    let metrics = Arc::new(PrometheusMetrics::new().context("can't create metrics")?);

    let shutdown = CancellationToken::new();
    let probe_stop = CancellationToken::new();
    let probe = cfg.probe_addr.map(|addr| {
        let router = ProbeApi::new(Arc::clone(&health))
            .router()
            .merge(metrics_router(Arc::clone(&metrics)));
        let stop = probe_stop.clone();
        tokio::spawn(async move {
            if let Err(e) = tester_api::serve(addr, router, stop).await {
                error!(error = %e, "probe server stopped");
            }
        })
    });

    tokio::spawn(watch_signals(shutdown.clone()));

    // 4) Supervisor
    let supervisor = Supervisor::new(cfg.supervisor.clone(), registry, Arc::new(source))?
        .with_health(Arc::clone(&health))
        .with_metrics(metrics);
    let outcome = supervisor.run(shutdown).await;

    probe_stop.cancel();
    if let Some(probe) = probe
        && let Err(e) = probe.await
    {
        warn!(error = %e, "probe task did not exit cleanly");
    }

    outcome.map(|state| info!(?state, "supervisor finished"))?;
    Ok(())
}

fn metrics_router(metrics: Arc<PrometheusMetrics>) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(metrics)
}

async fn render_metrics(State(metrics): State<Arc<PrometheusMetrics>>) -> impl IntoResponse {
    match metrics.render() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn watch_signals(shutdown: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "can't install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "can't listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c"),
        _ = terminate => info!("received SIGTERM"),
    }
    shutdown.cancel();
}
