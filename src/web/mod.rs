//! Web surface: renders the current generation state and triggers runs.

use std::num::NonZeroU16;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info};

use crate::error::GenerationError;
use crate::orchestrator::ComicPipeline;
use crate::panel::GenerationState;

mod api;
mod prelude;
mod views;

/// Outcome of asking for a new run.
#[derive(Debug)]
pub(crate) enum Launch {
    /// The run is now going on in the background.
    Started,
    /// Another run is still in flight; nothing was started.
    Busy,
    /// The prompt was rejected before any network activity.
    Rejected(GenerationError),
}

#[derive(Clone)]
pub(crate) struct AppState {
    pipeline: Arc<dyn ComicPipeline>,
    generation: watch::Receiver<GenerationState>,
    run_guard: Arc<Mutex<()>>,
}

impl AppState {
    pub(crate) fn new(pipeline: Arc<dyn ComicPipeline>) -> Self {
        let generation = pipeline.subscribe();
        Self {
            pipeline,
            generation,
            run_guard: Arc::new(Mutex::new(())),
        }
    }

    pub(crate) fn snapshot(&self) -> GenerationState {
        self.generation.borrow().clone()
    }

    /// Starts a run for `prompt` unless one is already in flight.
    ///
    /// The guard is held by the background task for the whole run, so two
    /// runs can never overlap no matter how requests interleave. Returns
    /// `Started` only after the new run has published its first state.
    pub(crate) async fn launch(&self, prompt: String) -> Launch {
        let Ok(guard) = Arc::clone(&self.run_guard).try_lock_owned() else {
            info!("Ignoring generate request while a run is active");
            return Launch::Busy;
        };

        if prompt.trim().is_empty() {
            // Validation only; the pipeline returns before any network call.
            let outcome = self.pipeline.run(&prompt).await;
            drop(guard);
            return Launch::Rejected(outcome.err().unwrap_or(GenerationError::Validation));
        }

        let mut published = self.generation.clone();
        published.mark_unchanged();

        let pipeline = Arc::clone(&self.pipeline);
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(err) = pipeline.run(&prompt).await {
                debug!("Background run ended with: {err}");
            }
        });

        // The run's first publish replaces the previous run's state, so once
        // it lands every later snapshot belongs to the new run.
        if published.changed().await.is_err() {
            error!("Generation state sender dropped before the run started");
        }
        Launch::Started
    }
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::get(views::home_handler))
        .route("/generate", axum::routing::post(views::generate_form_handler))
        .route(
            "/panels/{panel}/image",
            axum::routing::get(views::panel_image_handler),
        )
        .route("/api/state", axum::routing::get(api::state_handler))
        .route("/api/generate", axum::routing::post(api::generate_handler))
        .route("/static/styles.css", axum::routing::get(styles_handler))
}

async fn styles_handler() -> impl IntoResponse {
    const STYLES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/styles.css"));
    ([(CONTENT_TYPE, "text/css")], STYLES)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Serves the web UI on `listen_addr:port` until Ctrl-C.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    pipeline: Arc<dyn ComicPipeline>,
) -> Result<(), anyhow::Error> {
    let app = create_router().with_state(AppState::new(pipeline));

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}
