//! Command-line surface.

use anyhow::Result;
use clap::{Parser, Subcommand};
use pwacache_core::{CacheDb, Request, RequestMode};
use pwacache_engine::{CachePolicyEngine, LifecycleSignal, PolicyEngine};
use serde::Serialize;

use crate::host::Host;

#[derive(Debug, Parser)]
#[command(name = "pwa-cache", version, about = "Offline caching policy engine for a single-page app")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Populate the configured generation's store from the precache manifest.
    Install,
    /// Install, then retire every other generation.
    Activate,
    /// Serve each URL through the engine, running the lifecycle first unless
    /// the configured generation is already active.
    Fetch {
        /// URLs to request, absolute or relative to the scope.
        #[arg(required = true)]
        urls: Vec<String>,
        /// Issue the requests as top-level navigations.
        #[arg(long)]
        navigate: bool,
        /// Issue cross-origin requests in no-cors mode.
        #[arg(long, conflicts_with = "navigate")]
        no_cors: bool,
    },
    /// List cache stores with their entry counts.
    Stores,
}

#[derive(Debug, Serialize)]
struct LifecycleOutput {
    generation: String,
    state: String,
    signals: Vec<String>,
}

#[derive(Debug, Serialize)]
struct FetchOutput {
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct StoreOutput {
    name: String,
    entries: u64,
    active: bool,
}

fn signal_name(signal: LifecycleSignal) -> String {
    match signal {
        LifecycleSignal::SkipWaiting => "skip_waiting".into(),
        LifecycleSignal::ClaimClients => "claim_clients".into(),
    }
}

/// Execute a command, returning its JSON output.
pub async fn run(cli: Cli) -> Result<String> {
    let host = Host::start().await?;
    execute(&host, cli.command).await
}

pub async fn execute(host: &Host, command: Command) -> Result<String> {
    match command {
        Command::Install => {
            let signals = vec![host.engine.on_install().await?];
            lifecycle_output(host, signals).await
        }
        Command::Activate => {
            let signals = vec![host.engine.on_install().await?, host.engine.on_activate().await?];
            lifecycle_output(host, signals).await
        }
        Command::Fetch { urls, navigate, no_cors } => {
            ensure_active(&host.engine).await?;

            let mut outputs = Vec::with_capacity(urls.len());
            for url in &urls {
                outputs.push(fetch_one(host, url, navigate, no_cors).await);
            }
            Ok(serde_json::to_string_pretty(&outputs)?)
        }
        Command::Stores => {
            let stores = list_stores(&host.db, &host.config.generation).await?;
            Ok(serde_json::to_string_pretty(&stores)?)
        }
    }
}

/// Resume a generation activated by an earlier run, or install and activate
/// it now.
async fn ensure_active(engine: &CachePolicyEngine) -> Result<()> {
    if engine.resume().await? {
        tracing::debug!(generation = %engine.lifecycle().generation(), "generation already active");
        return Ok(());
    }
    engine.on_install().await?;
    engine.on_activate().await?;
    Ok(())
}

async fn lifecycle_output(host: &Host, signals: Vec<LifecycleSignal>) -> Result<String> {
    let lifecycle = host.engine.lifecycle();
    let output = LifecycleOutput {
        generation: lifecycle.generation().to_string(),
        state: lifecycle.state().await.to_string(),
        signals: signals.into_iter().map(signal_name).collect(),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

async fn fetch_one(host: &Host, url: &str, navigate: bool, no_cors: bool) -> FetchOutput {
    let failed = |error: String| FetchOutput {
        url: url.to_string(),
        status: None,
        kind: None,
        source: None,
        content_type: None,
        bytes: None,
        error: Some(error),
    };

    let request = match Request::get(url, host.engine.scope()) {
        Ok(request) if navigate => request.with_mode(RequestMode::Navigate),
        Ok(request) if no_cors => request.with_mode(RequestMode::NoCors),
        Ok(request) => request,
        Err(e) => return failed(e.to_string()),
    };

    match host.engine.on_fetch(&request).await {
        Ok(response) => FetchOutput {
            url: request.url.to_string(),
            status: Some(response.status),
            kind: Some(response.kind.as_str()),
            source: Some(response.source.as_str()),
            content_type: response.content_type().map(String::from),
            bytes: Some(response.into_body().len()),
            error: None,
        },
        Err(e) => failed(e.to_string()),
    }
}

async fn list_stores(db: &CacheDb, active: &str) -> Result<Vec<StoreOutput>> {
    let mut stores = Vec::new();
    for name in db.store_names().await? {
        let entries = db.count_entries(&name).await?;
        stores.push(StoreOutput { active: name == active, name, entries });
    }
    Ok(stores)
}
