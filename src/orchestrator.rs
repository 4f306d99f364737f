//! The two-phase generation pipeline.
//!
//! A run writes the script, publishes it straight away with image
//! placeholders, then draws every panel concurrently and publishes the
//! finished strip. Any failure aborts the whole run: the panels are cleared
//! and a single user-facing error is published instead.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::error::GenerationError;
use crate::panel::{GenerationState, PanelData, PanelSpec, Phase};
use crate::render::ImageRenderer;
use crate::script::ScriptGenerator;

/// Boxed future returned by [`ComicPipeline::run`].
pub type RunFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<PanelData>, GenerationError>> + Send + 'a>>;

/// Object-safe view of an [`Orchestrator`], so callers need not be generic
/// over its collaborators.
pub trait ComicPipeline: Send + Sync {
    /// Runs the pipeline for `prompt`; see [`Orchestrator::run`].
    fn run<'a>(&'a self, prompt: &'a str) -> RunFuture<'a>;

    /// A read-only handle on the published state.
    fn subscribe(&self) -> watch::Receiver<GenerationState>;
}

/// Sequences the script call and the per-panel image calls, and owns every
/// transition of the published [`GenerationState`].
pub struct Orchestrator<S, I> {
    script: Arc<S>,
    images: Arc<I>,
    state: Arc<watch::Sender<GenerationState>>,
}

impl<S, I> Clone for Orchestrator<S, I> {
    fn clone(&self) -> Self {
        Self {
            script: Arc::clone(&self.script),
            images: Arc::clone(&self.images),
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: ScriptGenerator, I: ImageRenderer> Orchestrator<S, I> {
    /// Wires the orchestrator to its two remote collaborators.
    pub fn new(script: S, images: I) -> Self {
        let (state, _) = watch::channel(GenerationState::default());
        Self {
            script: Arc::new(script),
            images: Arc::new(images),
            state: Arc::new(state),
        }
    }

    /// A read-only handle on the published state.
    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> GenerationState {
        self.state.borrow().clone()
    }

    /// Runs the pipeline for `prompt` and returns the finished panels.
    ///
    /// A blank prompt publishes a validation error without touching the
    /// phase or calling either collaborator. Otherwise every prior panel and
    /// error is discarded before the script call starts.
    pub async fn run(&self, prompt: &str) -> Result<Vec<PanelData>, GenerationError> {
        if prompt.trim().is_empty() {
            info!("Rejected blank story prompt");
            let err = GenerationError::Validation;
            self.state.send_modify(|state| {
                state.error = Some(err.user_message().to_string());
            });
            return Err(err);
        }

        info!("Starting comic run");
        self.state.send_replace(GenerationState {
            phase: Phase::Scripting,
            prompt: Some(prompt.to_string()),
            panels: None,
            error: None,
        });

        match self.generate(prompt).await {
            Ok(panels) => {
                info!(panels = panels.len(), "Comic run succeeded");
                let published = panels.clone();
                self.state.send_modify(|state| {
                    state.phase = Phase::Succeeded;
                    state.panels = Some(published);
                    state.error = None;
                });
                Ok(panels)
            }
            Err(err) => {
                error!("Comic run failed: {err}");
                self.state.send_modify(|state| {
                    state.phase = Phase::Failed;
                    state.panels = None;
                    state.error = Some(err.user_message().to_string());
                });
                Err(err)
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Result<Vec<PanelData>, GenerationError> {
        let script = self.script.generate_script(prompt).await?;
        if script.is_empty() {
            return Err(GenerationError::InvalidScript(
                "script contains no panels".to_string(),
            ));
        }

        info!(panels = script.len(), "Script ready, drawing panels");
        let placeholders: Vec<PanelData> = script.iter().map(PanelData::placeholder).collect();
        self.state.send_modify(|state| {
            state.phase = Phase::Imaging;
            state.panels = Some(placeholders);
        });

        let urls = self.render_all(&script).await?;
        Ok(script
            .into_iter()
            .zip(urls)
            .map(|(spec, url)| PanelData::with_image(spec, url))
            .collect())
    }

    /// Draws every panel at once and returns the images in script order.
    ///
    /// The first failure wins. Requests still in flight are aborted when the
    /// join set is dropped; whatever they already did upstream is not undone.
    async fn render_all(&self, script: &[PanelSpec]) -> Result<Vec<String>, GenerationError> {
        let mut tasks = JoinSet::new();
        for (index, spec) in script.iter().enumerate() {
            let images = Arc::clone(&self.images);
            let description = spec.description.clone();
            tasks.spawn(async move { (index, images.render_panel_image(&description).await) });
        }

        let mut urls: Vec<Option<String>> = vec![None; script.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined?;
            match result {
                Ok(url) => {
                    debug!(panel = index + 1, "Panel image ready");
                    if let Some(slot) = urls.get_mut(index) {
                        *slot = Some(url);
                    }
                }
                Err(err) => {
                    tasks.abort_all();
                    return Err(err);
                }
            }
        }

        urls.into_iter().collect::<Option<Vec<_>>>().ok_or_else(|| {
            GenerationError::Unexpected("a panel image went missing after the join".to_string())
        })
    }
}

impl<S: ScriptGenerator, I: ImageRenderer> ComicPipeline for Orchestrator<S, I> {
    fn run<'a>(&'a self, prompt: &'a str) -> RunFuture<'a> {
        Box::pin(Orchestrator::run(self, prompt))
    }

    fn subscribe(&self) -> watch::Receiver<GenerationState> {
        Orchestrator::subscribe(self)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::constants::SCRIPTING_MESSAGE;
    use crate::data_uri;
    use crate::script::parse_script;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    pub(crate) const FOUR_PANELS: &str = r#"[
        {
            "panel": 1,
            "description": "A robot stares at a blank canvas",
            "dialogue": "Where to begin?"
        },
        {"panel": 2, "description": "The robot spills blue paint", "dialogue": "Oops."},
        {"panel": 3, "description": "The spill looks like the sea", "dialogue": "Wait..."},
        {
            "panel": 4,
            "description": "A gallery crowd admires the robot's seascape",
            "dialogue": "Art!"
        }
    ]"#;

    /// Answers with canned model output, run through the real parser.
    pub(crate) struct FakeScript {
        pub(crate) response: Result<String, GenerationError>,
        pub(crate) calls: Arc<AtomicUsize>,
        pub(crate) observer: Arc<OnceLock<watch::Receiver<GenerationState>>>,
        pub(crate) seen: Arc<Mutex<Vec<GenerationState>>>,
    }

    impl FakeScript {
        pub(crate) fn returning(text: &str) -> Self {
            Self::answering(Ok(text.to_string()))
        }

        pub(crate) fn failing(err: GenerationError) -> Self {
            Self::answering(Err(err))
        }

        fn answering(response: Result<String, GenerationError>) -> Self {
            Self {
                response,
                calls: Arc::new(AtomicUsize::new(0)),
                observer: Arc::new(OnceLock::new()),
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl ScriptGenerator for FakeScript {
        async fn generate_script(&self, _prompt: &str) -> Result<Vec<PanelSpec>, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(rx) = self.observer.get() {
                let snapshot = rx.borrow().clone();
                self.seen.lock().unwrap().push(snapshot);
            }
            match &self.response {
                Ok(text) => parse_script(text),
                Err(err) => Err(err.clone()),
            }
        }
    }

    /// Draws a JPEG data URI tagged with the description, after an optional
    /// per-description delay.
    #[derive(Default)]
    pub(crate) struct FakeRenderer {
        pub(crate) calls: Arc<AtomicUsize>,
        pub(crate) delays_ms: HashMap<String, u64>,
        pub(crate) failing: Option<String>,
        pub(crate) panicking: Option<String>,
        pub(crate) observer: Arc<OnceLock<watch::Receiver<GenerationState>>>,
        pub(crate) seen: Arc<Mutex<Vec<GenerationState>>>,
    }

    pub(crate) fn image_for(description: &str) -> String {
        let mut bytes = data_uri::tests::JPEG_BYTES.to_vec();
        bytes.extend_from_slice(description.as_bytes());
        data_uri::encode_image(&bytes).unwrap_or_default()
    }

    impl ImageRenderer for FakeRenderer {
        async fn render_panel_image(&self, description: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(rx) = self.observer.get() {
                let snapshot = rx.borrow().clone();
                self.seen.lock().unwrap().push(snapshot);
            }
            if let Some(ms) = self.delays_ms.get(description) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            if self.panicking.as_deref() == Some(description) {
                panic!("renderer blew up");
            }
            if self.failing.as_deref() == Some(description) {
                return Err(GenerationError::ImageRequest("HTTP 503".to_string()));
            }
            Ok(image_for(description))
        }
    }

    #[tokio::test]
    async fn robot_prompt_produces_four_finished_panels() {
        let renderer = FakeRenderer::default();
        let image_calls = renderer.calls.clone();
        let orchestrator = Orchestrator::new(FakeScript::returning(FOUR_PANELS), renderer);

        let panels = orchestrator
            .run("a robot learns to paint")
            .await
            .expect("run succeeds");

        assert_eq!(panels.len(), 4);
        assert_eq!(image_calls.load(Ordering::SeqCst), 4);
        let state = orchestrator.state();
        assert_eq!(state.phase, Phase::Succeeded);
        assert!(state.error.is_none());
        assert!(state.loading_message().is_none());
        let published = state.panels.expect("panels published");
        assert_eq!(published, panels);
        assert!(
            published
                .iter()
                .all(|panel| panel.image_url.as_deref().is_some_and(|url| !url.is_empty()))
        );
    }

    #[tokio::test]
    async fn blank_prompt_never_reaches_the_collaborators() {
        for prompt in ["", "   ", "\n\t"] {
            let script = FakeScript::returning(FOUR_PANELS);
            let script_calls = script.calls.clone();
            let renderer = FakeRenderer::default();
            let image_calls = renderer.calls.clone();
            let orchestrator = Orchestrator::new(script, renderer);

            let result = orchestrator.run(prompt).await;

            assert_eq!(result, Err(GenerationError::Validation));
            assert_eq!(script_calls.load(Ordering::SeqCst), 0);
            assert_eq!(image_calls.load(Ordering::SeqCst), 0);
            let state = orchestrator.state();
            assert_eq!(state.phase, Phase::Idle);
            assert_eq!(
                state.error.as_deref(),
                Some(GenerationError::Validation.user_message())
            );
        }
    }

    #[tokio::test]
    async fn script_failure_issues_no_image_calls() {
        let renderer = FakeRenderer::default();
        let image_calls = renderer.calls.clone();
        let orchestrator = Orchestrator::new(
            FakeScript::failing(GenerationError::ScriptRequest("HTTP 500".to_string())),
            renderer,
        );

        let result = orchestrator.run("a robot learns to paint").await;

        assert!(matches!(result, Err(GenerationError::ScriptRequest(_))));
        assert_eq!(image_calls.load(Ordering::SeqCst), 0);
        let state = orchestrator.state();
        assert_eq!(state.phase, Phase::Failed);
        assert!(state.panels.is_none());
        assert!(state.error.is_some());
    }

    #[tokio::test]
    async fn empty_script_is_an_invalid_script_failure() {
        let renderer = FakeRenderer::default();
        let image_calls = renderer.calls.clone();
        let orchestrator = Orchestrator::new(FakeScript::returning("[]"), renderer);

        let result = orchestrator.run("a robot learns to paint").await;

        assert!(matches!(result, Err(GenerationError::InvalidScript(_))));
        assert_eq!(image_calls.load(Ordering::SeqCst), 0);
        let state = orchestrator.state();
        assert_eq!(state.phase, Phase::Failed);
        assert!(state.panels.is_none());
        assert_eq!(
            state.error.as_deref(),
            Some(GenerationError::InvalidScript(String::new()).user_message())
        );
    }

    #[tokio::test]
    async fn placeholders_are_published_before_any_image_exists() {
        let renderer = FakeRenderer::default();
        let observer = renderer.observer.clone();
        let seen = renderer.seen.clone();
        let orchestrator = Orchestrator::new(FakeScript::returning(FOUR_PANELS), renderer);
        assert!(observer.set(orchestrator.subscribe()).is_ok());

        orchestrator
            .run("a robot learns to paint")
            .await
            .expect("run succeeds");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        for snapshot in seen.iter() {
            assert_eq!(snapshot.phase, Phase::Imaging);
            let panels = snapshot.panels.as_ref().expect("placeholders published");
            assert_eq!(panels.len(), 4);
            assert!(panels.iter().all(|panel| !panel.has_image()));
        }
    }

    #[tokio::test]
    async fn one_failed_image_fails_the_whole_run() {
        let renderer = FakeRenderer {
            failing: Some("The spill looks like the sea".to_string()),
            ..Default::default()
        };
        let image_calls = renderer.calls.clone();
        let orchestrator = Orchestrator::new(FakeScript::returning(FOUR_PANELS), renderer);

        let result = orchestrator.run("a robot learns to paint").await;

        assert!(matches!(result, Err(GenerationError::ImageRequest(_))));
        assert_eq!(image_calls.load(Ordering::SeqCst), 4);
        let state = orchestrator.state();
        assert_eq!(state.phase, Phase::Failed);
        assert!(state.panels.is_none(), "no partial comic is ever shown");
        assert_eq!(
            state.error.as_deref(),
            Some(GenerationError::MissingImage.user_message())
        );
    }

    #[tokio::test]
    async fn failure_does_not_wait_for_slow_siblings() {
        let renderer = FakeRenderer {
            failing: Some("The robot spills blue paint".to_string()),
            delays_ms: HashMap::from([
                ("A robot stares at a blank canvas".to_string(), 10_000),
                ("The spill looks like the sea".to_string(), 10_000),
            ]),
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(FakeScript::returning(FOUR_PANELS), renderer);

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            orchestrator.run("a robot learns to paint"),
        )
        .await
        .expect("run settles without waiting for the slow panels");

        assert!(result.is_err());
        assert_eq!(orchestrator.state().phase, Phase::Failed);
    }

    #[tokio::test]
    async fn images_pair_with_panels_by_position_not_completion_order() {
        // First panel finishes last, last panel finishes first.
        let renderer = FakeRenderer {
            delays_ms: HashMap::from([
                ("A robot stares at a blank canvas".to_string(), 120),
                ("The robot spills blue paint".to_string(), 80),
                ("The spill looks like the sea".to_string(), 40),
                ("A gallery crowd admires the robot's seascape".to_string(), 0),
            ]),
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(FakeScript::returning(FOUR_PANELS), renderer);

        let panels = orchestrator
            .run("a robot learns to paint")
            .await
            .expect("run succeeds");

        for (index, panel) in panels.iter().enumerate() {
            assert_eq!(panel.panel as usize, index + 1);
            assert_eq!(
                panel.image_url.as_deref(),
                Some(image_for(&panel.description).as_str())
            );
        }
    }

    #[tokio::test]
    async fn panicking_renderer_is_an_unexpected_error() {
        let renderer = FakeRenderer {
            panicking: Some("The robot spills blue paint".to_string()),
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(FakeScript::returning(FOUR_PANELS), renderer);

        let result = orchestrator.run("a robot learns to paint").await;

        assert!(matches!(result, Err(GenerationError::Unexpected(_))));
        let state = orchestrator.state();
        assert_eq!(state.phase, Phase::Failed);
        assert!(state.panels.is_none());
    }

    #[tokio::test]
    async fn new_run_discards_previous_error_and_panels() {
        let renderer = FakeRenderer::default();
        let orchestrator = Orchestrator::new(FakeScript::returning(FOUR_PANELS), renderer);

        let _ = orchestrator.run("  ").await;
        assert!(orchestrator.state().error.is_some());

        orchestrator
            .run("a robot learns to paint")
            .await
            .expect("run succeeds");
        let state = orchestrator.state();
        assert!(state.error.is_none());
        assert_eq!(state.prompt.as_deref(), Some("a robot learns to paint"));
    }

    #[tokio::test]
    async fn script_call_sees_a_cleared_scripting_state_after_a_failed_run() {
        let script = FakeScript::returning(FOUR_PANELS);
        let observer = script.observer.clone();
        let seen = script.seen.clone();
        let renderer = FakeRenderer {
            failing: Some("The robot spills blue paint".to_string()),
            ..Default::default()
        };
        let orchestrator = Orchestrator::new(script, renderer);
        assert!(observer.set(orchestrator.subscribe()).is_ok());

        let first = orchestrator.run("a robot learns to paint").await;
        assert!(first.is_err());
        assert!(orchestrator.state().error.is_some());

        let _ = orchestrator.run("a cat on mars").await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        let during_second = &seen[1];
        assert_eq!(during_second.phase, Phase::Scripting);
        assert_eq!(during_second.prompt.as_deref(), Some("a cat on mars"));
        assert!(during_second.panels.is_none());
        assert!(during_second.error.is_none());
        assert_eq!(during_second.loading_message(), Some(SCRIPTING_MESSAGE));
    }

    #[tokio::test]
    async fn script_call_never_sees_the_previous_comic() {
        let script = FakeScript::returning(FOUR_PANELS);
        let observer = script.observer.clone();
        let seen = script.seen.clone();
        let orchestrator = Orchestrator::new(script, FakeRenderer::default());
        assert!(observer.set(orchestrator.subscribe()).is_ok());

        orchestrator
            .run("a robot learns to paint")
            .await
            .expect("first run succeeds");
        assert_eq!(orchestrator.state().phase, Phase::Succeeded);

        orchestrator
            .run("a cat on mars")
            .await
            .expect("second run succeeds");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        for snapshot in seen.iter() {
            assert_eq!(snapshot.phase, Phase::Scripting);
            assert!(snapshot.panels.is_none());
            assert!(snapshot.error.is_none());
        }
        assert_eq!(seen[1].prompt.as_deref(), Some("a cat on mars"));
    }

    #[tokio::test]
    async fn subscribers_see_the_terminal_state() {
        let orchestrator =
            Orchestrator::new(FakeScript::returning(FOUR_PANELS), FakeRenderer::default());
        let mut rx = orchestrator.subscribe();

        orchestrator
            .run("a robot learns to paint")
            .await
            .expect("run succeeds");

        assert!(rx.has_changed().expect("sender alive"));
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.phase, Phase::Succeeded);
        assert_eq!(state.panels.map(|panels| panels.len()), Some(4));
    }

    #[tokio::test]
    async fn pipeline_trait_object_runs_the_orchestrator() {
        let pipeline: Arc<dyn ComicPipeline> = Arc::new(Orchestrator::new(
            FakeScript::returning(FOUR_PANELS),
            FakeRenderer::default(),
        ));
        let rx = pipeline.subscribe();

        let panels = pipeline.run("a robot learns to paint").await.expect("run");

        assert_eq!(panels.len(), 4);
        assert_eq!(rx.borrow().phase, Phase::Succeeded);
    }
}
