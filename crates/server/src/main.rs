//! Dwani server entry point

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use dwani_agent::{
    run_dialogue, spawn_scene_monitor, DialogueOrchestrator, JsonTranscriptStore, TranscriptStore,
};
use dwani_config::{load_settings, SafePlaceCatalog, Settings};
use dwani_core::{LanguageModel, SceneCache};
use dwani_llm::{OpenAIBackend, OpenAIConfig, OpenAIVision};
use dwani_navigation::{EvacuationPlanner, NominatimGeocoder, OpenRouteServiceRouter};
use dwani_server::{
    create_router, init_metrics, AppState, ConsoleSpeaker, ConsoleTranscriber, ServerError,
};
use dwani_tools::{create_default_registry, FileFrameSource, SceneCapture};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Priority: env vars > config/{env} > config/default > defaults
    let env = std::env::var("DWANI_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing is not initialized yet
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&settings);
    tracing::info!("Starting Dwani v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?settings.environment,
        config_env = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    if init_metrics().is_some() {
        tracing::info!("Initialized Prometheus metrics at /metrics");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let llm: Arc<dyn LanguageModel> = Arc::new(
        OpenAIBackend::new(OpenAIConfig::from_settings(&settings.llm))
            .map_err(|e| ServerError::Startup(e.to_string()))?,
    );
    tracing::info!(model = llm.model_name(), endpoint = %settings.llm.endpoint, "Chat model configured");

    let catalog = Arc::new(load_catalog(&settings)?);
    let planner = Arc::new(
        EvacuationPlanner::new(
            catalog.clone(),
            Arc::new(NominatimGeocoder::from_settings(&settings.navigation)?),
            Arc::new(OpenRouteServiceRouter::from_settings(&settings.navigation)?),
        )
        .with_timeouts(
            Duration::from_secs(settings.navigation.geocoder_timeout_secs),
            Duration::from_secs(settings.navigation.router_timeout_secs),
        ),
    );
    if settings.navigation.router_api_key.is_empty() {
        tracing::warn!("No routing API key; evacuation guidance will use static directions");
    }

    let scene = SceneCache::new();
    let capture = init_scene_capture(&settings, &scene)?;
    let scene_monitor = capture.clone().map(|capture| {
        spawn_scene_monitor(
            capture,
            Duration::from_secs(settings.vision.scene_interval_secs),
            shutdown_rx.clone(),
        )
    });

    let tools = Arc::new(create_default_registry(planner.clone(), capture));

    let transcript = JsonTranscriptStore::new(&settings.agent.transcript_path);
    let mut builder = DialogueOrchestrator::builder(
        settings.agent.clone(),
        llm,
        tools.clone(),
        planner,
        Arc::new(ConsoleSpeaker::new(settings.agent.persona_name.clone())),
    )
    .scene_cache(scene.clone())
    .generation(settings.llm.max_tokens, settings.llm.temperature);

    match transcript.restore(settings.agent.max_context_turns).await {
        Ok(Some(context)) => {
            tracing::info!(
                path = %transcript.path().display(),
                turns = context.len(),
                "Restored previous conversation"
            );
            builder = builder.context(context);
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable transcript"),
    }

    let console_enabled = settings.server.console_enabled;
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .map_err(|e| ServerError::Startup(format!("invalid listen address: {}", e)))?;

    let state = AppState::new(settings, builder.build(), tools, catalog, scene);
    let orchestrator = state.orchestrator.clone();

    let console = console_enabled.then(|| {
        let orchestrator = orchestrator.clone();
        let shutdown_rx = shutdown_rx.clone();
        let shutdown_tx = shutdown_tx.clone();
        let transcript = JsonTranscriptStore::new(transcript.path());
        tokio::spawn(async move {
            let stt = Arc::new(ConsoleTranscriber::stdin());
            match run_dialogue(orchestrator, stt, shutdown_rx, Some(&transcript)).await {
                Ok(summary) => tracing::info!(
                    stop_reason = ?summary.stop_reason,
                    exchanges = summary.conversation.total_exchanges,
                    emergencies = summary.session.emergency_count,
                    "Console session ended"
                ),
                Err(e) => tracing::error!(error = %e, "Console session failed"),
            }
            // Ending the voice session ends the process
            let _ = shutdown_tx.send(true);
        })
    });

    tokio::spawn({
        let shutdown_tx = shutdown_tx.clone();
        async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        }
    });

    let app = create_router(state);
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx))
        .await?;

    match console {
        Some(handle) => {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Console task panicked");
            }
        }
        None => {
            let agent = orchestrator.lock().await;
            if let Err(e) = transcript.save(agent.context().turns()).await {
                tracing::error!(error = %e, "Failed to save transcript");
            }
        }
    }

    if let Some(handle) = scene_monitor {
        let _ = handle.await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn load_catalog(settings: &Settings) -> Result<SafePlaceCatalog, ServerError> {
    match &settings.navigation.safe_places_path {
        Some(path) => {
            let catalog = SafePlaceCatalog::from_yaml_file(path)
                .map_err(|e| ServerError::Startup(format!("safe places: {}", e)))?;
            tracing::info!(path = %path, places = catalog.places.len(), "Loaded safe places");
            Ok(catalog)
        }
        None => Ok(SafePlaceCatalog::default()),
    }
}

/// Scene capture needs both a vision model and a frame source
fn init_scene_capture(
    settings: &Settings,
    cache: &SceneCache,
) -> Result<Option<Arc<SceneCapture>>, ServerError> {
    let vision = &settings.vision;
    if !vision.enabled {
        return Ok(None);
    }

    let Some(frame_path) = vision.frame_path.as_deref() else {
        tracing::warn!("Vision enabled without vision.frame_path; camera unavailable");
        return Ok(None);
    };

    let model = OpenAIVision::new(OpenAIConfig::for_vision(vision, &settings.llm))
        .map_err(|e| ServerError::Startup(e.to_string()))?;

    tracing::info!(model = %vision.model, frames = %frame_path, "Scene capture enabled");
    Ok(Some(Arc::new(
        SceneCapture::new(
            Arc::new(FileFrameSource::new(frame_path)),
            Arc::new(model),
            Duration::from_secs(vision.timeout_secs),
        )
        .with_prompt(vision.prompt.clone())
        .with_cache(cache.clone()),
    )))
}

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }
    tracing::info!("Shutting down HTTP server");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &settings.observability.log_level;
        format!("dwani={},tower_http=debug", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    // Logs go to stderr so console replies on stdout stay readable
    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    subscriber.with(fmt_layer).init();
}
