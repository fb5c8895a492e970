mod config;

use anyhow::{Context, Result};
use config::AppConfig;
use std::sync::Arc;
use std::time::Duration;
use tipster_api::{create_app, AppState};
use tipster_db::{JsonFileLedgerStore, LedgerRepository};
use tipster_ml::ConsensusEngine;
use tipster_models::default_catalog;
use tipster_services::adapters::http::build_client;
use tipster_services::{
    EspnAdapter, FootballDataAdapter, PipelineMetrics, ResolutionRegistry, ResultReconciler, SelectionService,
    SelectionSettings, SourceAdapter, TheSportsDbAdapter,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tipster_rs=debug,tipster_services=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Tipster-RS match prediction service");

    let config = AppConfig::new().context("failed to load configuration")?;
    info!("✅ Configuration loaded successfully");
    info!("📒 Ledger directory: {}", config.ledger.data_dir.display());
    info!("🌐 Server will bind to: {}", config.server_addr());

    let metrics = Arc::new(PipelineMetrics::new().context("failed to register metrics")?);

    // Fallback chain: specialized, then legacy, then generic
    // The client deadline trails the attempt deadline so slow providers surface as timeouts.
    let client = build_client(config.adapter_timeout() + Duration::from_secs(2))?;
    let providers = &config.providers;
    if providers.football_data_api_key.is_none() {
        info!("🔑 No football-data API key configured; soccer resolves through the fallback providers");
    }
    let chain: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(FootballDataAdapter::new(
            client.clone(),
            providers.football_data_base_url.clone(),
            providers.football_data_api_key.clone(),
        )),
        Arc::new(TheSportsDbAdapter::new(
            client.clone(),
            providers.thesportsdb_base_url.clone(),
            providers.thesportsdb_api_key.clone(),
        )),
        Arc::new(EspnAdapter::new(client, providers.espn_base_url.clone())),
    ];

    let registry = Arc::new(ResolutionRegistry::standard(
        default_catalog(),
        chain,
        config.adapter_timeout(),
        Some(metrics.clone()),
    ));
    info!("🗂️ {} leagues registered", registry.leagues().len());

    let engine = Arc::new(ConsensusEngine::new(config.consensus.clone())?);
    let ledger = Arc::new(LedgerRepository::new(Arc::new(JsonFileLedgerStore::new(
        config.ledger.data_dir.clone(),
    ))));

    let reconciler = Arc::new(
        ResultReconciler::new(registry.clone(), ledger.clone(), config.grace_period()).with_metrics(metrics.clone()),
    );

    let selection = Arc::new(
        SelectionService::new(
            registry,
            engine,
            ledger.clone(),
            metrics.clone(),
            SelectionSettings {
                cache_ttl: config.cache_ttl(),
                reconcile_on_select: config.resolution.reconcile_on_select,
            },
        )
        .with_reconciler(reconciler.clone()),
    );

    let state = AppState::new(selection, reconciler, ledger, metrics);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(config.server_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.server_addr()))?;
    info!("✅ All services started successfully");
    info!("⌨️  Press Ctrl+C to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("👋 Shutting down gracefully");
        })
        .await?;

    Ok(())
}
