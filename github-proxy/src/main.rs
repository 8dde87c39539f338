#![forbid(unsafe_code)]

use clap::Parser;
use github_proxy_lib::config::{read_from_path, validate, Config};
use github_proxy_lib::content::ContentFetcher;
use github_proxy_lib::telemetry::{init_metrics, init_tracing, start_observability_server};
use github_proxy_lib::{
    AppKey, ClientLimiterRegistry, CredentialCache, GitHubAppAuth, GitHubClient, KeySource,
    ProxyContext, ProxyError, RateGate,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(author, version, about = "Anonymous read-only proxy for files in GitHub repositories")]
struct Cli {
    /// Path to configuration TOML file
    #[arg(short, long, value_name = "FILE", env = "GITHUB_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:8080
    #[arg(long, env = "GITHUB_PROXY_LISTEN")]
    listen: Option<SocketAddr>,

    /// GitHub App client ID
    #[arg(long, env = "GH_CLIENT_ID")]
    client_id: Option<String>,

    /// GitHub App installation ID
    #[arg(long, env = "GH_INSTALLATION_ID")]
    installation_id: Option<String>,

    /// Path to the GitHub App private key (PEM); falls back to GH_PRIVATE_KEY
    #[arg(long, value_name = "FILE", env = "GH_PRIVATE_KEY_PATH")]
    private_key: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<Config, ProxyError> {
        let mut cfg = match &self.config {
            Some(path) => read_from_path(path)?,
            None => Config::default(),
        };
        if let Some(listen) = self.listen {
            cfg.listen = listen;
        }
        if let Some(client_id) = self.client_id {
            cfg.github.client_id = client_id;
        }
        if let Some(installation_id) = self.installation_id {
            cfg.github.installation_id = installation_id;
        }
        if let Some(private_key) = self.private_key {
            cfg.github.private_key_path = Some(private_key);
        }
        validate(&cfg)?;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() {
    let cfg = match Cli::parse().into_config() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) =
        init_tracing(&cfg.logging.level, cfg.logging.show_target, &cfg.telemetry.otel_log_level)
    {
        eprintln!("failed to initialize tracing: {err}");
        std::process::exit(1);
    }

    info!(listen = %cfg.listen, api_url = %cfg.github.api_url, "configuration loaded");

    if let Err(err) = run(cfg).await {
        error!(%err, "github proxy exited with error");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<(), BoxError> {
    let shutdown = CancellationToken::new();

    let telemetry = match cfg.telemetry.metrics_port {
        Some(port) => {
            let (metrics, registry) = init_metrics()?;
            Some((metrics, registry, port))
        }
        None => None,
    };
    let metrics = telemetry.as_ref().map(|(metrics, _, _)| Arc::clone(metrics));

    let client = GitHubClient::new(&cfg.github.api_url, cfg.timeout.upstream())?;
    let key_source = KeySource::resolve(cfg.github.private_key_path.as_deref())?;
    let key = AppKey::load(cfg.github.client_id.clone(), &key_source)?;
    let auth = GitHubAppAuth::new(client.clone(), key, cfg.github.installation_id.clone());

    let credentials = Arc::new(
        CredentialCache::new(Arc::new(auth), cfg.credential.safety_margin())
            .with_metrics(metrics.clone()),
    );
    let token = credentials.get().await.map_err(ProxyError::Credential)?;

    let rate_limit = &cfg.security.rate_limit;
    let clients = Arc::new(
        ClientLimiterRegistry::per_minute(
            rate_limit.client_burst,
            rate_limit.client_requests_per_minute,
        )
        .with_metrics(metrics.clone()),
    );
    let gate = Arc::new(RateGate::from_provider(&client, &token, Arc::clone(&clients)).await?);

    let fetcher = Arc::new(
        ContentFetcher::new(Arc::new(client))
            .with_inline_threshold(cfg.content.inline_threshold_bytes)
            .with_metrics(metrics.clone()),
    );

    let sweeper =
        clients.spawn_sweeper(rate_limit.sweep_interval(), rate_limit.idle_ttl(), shutdown.clone());

    if let Some((_, registry, port)) = telemetry {
        let credentials = Arc::clone(&credentials);
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = start_observability_server(port, registry, credentials, shutdown).await
            {
                error!(error = %e, "observability server failed");
            }
        });
    }

    spawn_signal_handler(shutdown.clone())?;

    let ctx = ProxyContext::new(gate, credentials, fetcher, shutdown.clone()).with_metrics(metrics);
    let result = github_proxy_lib::run(&cfg, ctx).await;

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        warn!(error = %e, "client limiter sweeper ended abnormally");
    }

    result?;
    Ok(())
}

/// Cancel `shutdown` on the first SIGINT or SIGTERM.
fn spawn_signal_handler(shutdown: CancellationToken) -> Result<(), ProxyError> {
    let mut sigterm = signal(SignalKind::terminate()).map_err(|e| {
        ProxyError::Io(std::io::Error::other(format!("Failed to setup SIGTERM handler: {e}")))
    })?;
    let mut sigint = signal(SignalKind::interrupt()).map_err(|e| {
        ProxyError::Io(std::io::Error::other(format!("Failed to setup SIGINT handler: {e}")))
    })?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
            _ = sigint.recv() => info!("Received SIGINT, initiating graceful shutdown"),
            _ = shutdown.cancelled() => return,
        }
        shutdown.cancel();
    });
    Ok(())
}
