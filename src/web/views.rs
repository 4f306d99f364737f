use super::prelude::*;
use crate::constants::ACTIVE_REFRESH_SECONDS;
use crate::data_uri;
use crate::panel::PanelData;

#[derive(Deserialize)]
pub(crate) struct GenerateForm {
    #[serde(default)]
    prompt: String,
}

#[derive(Clone, Debug)]
pub(crate) struct PanelCard {
    pub(crate) number: u32,
    pub(crate) dialogue: String,
    pub(crate) description: String,
    pub(crate) has_image: bool,
    pub(crate) image_src: String,
}

impl From<&PanelData> for PanelCard {
    fn from(panel: &PanelData) -> Self {
        Self {
            number: panel.panel,
            dialogue: panel.dialogue.clone(),
            description: panel.description.clone(),
            has_image: panel.has_image(),
            image_src: panel.image_url.clone().unwrap_or_default(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub(crate) struct HomeTemplate {
    pub(crate) prompt: String,
    pub(crate) is_active: bool,
    pub(crate) refresh_seconds: u32,
    pub(crate) loading_message: String,
    pub(crate) has_error: bool,
    pub(crate) error_message: String,
    pub(crate) has_panels: bool,
    pub(crate) panels: Vec<PanelCard>,
}

impl From<&GenerationState> for HomeTemplate {
    fn from(state: &GenerationState) -> Self {
        let panels: Vec<PanelCard> = state
            .panels
            .iter()
            .flatten()
            .map(PanelCard::from)
            .collect();
        Self {
            prompt: state.prompt.clone().unwrap_or_default(),
            is_active: state.is_active(),
            refresh_seconds: ACTIVE_REFRESH_SECONDS,
            loading_message: state.loading_message().unwrap_or_default().to_string(),
            has_error: state.error.is_some(),
            error_message: state.error.clone().unwrap_or_default(),
            has_panels: state.panels.is_some(),
            panels,
        }
    }
}

/// handles the / GET
pub(crate) async fn home_handler(State(state): State<AppState>) -> HomeTemplate {
    HomeTemplate::from(&state.snapshot())
}

/// handles the /generate POST from the prompt form
pub(crate) async fn generate_form_handler(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Redirect {
    match state.launch(form.prompt).await {
        Launch::Started => info!("Comic run started from the form"),
        Launch::Busy => debug!("Form submitted while a run is active"),
        Launch::Rejected(err) => debug!("Form prompt rejected: {err}"),
    }
    Redirect::to("/")
}

/// Serves a finished panel's image as raw bytes.
pub(crate) async fn panel_image_handler(
    State(state): State<AppState>,
    Path(panel): Path<u32>,
) -> Result<Response, WebError> {
    let snapshot = state.snapshot();
    let uri = snapshot
        .panel(panel)
        .and_then(|panel| panel.image_url.as_deref())
        .ok_or_else(|| WebError::NotFound(format!("/panels/{panel}/image")))?;
    let (mime, bytes) = data_uri::decode(uri).ok_or_else(|| {
        WebError::InternalServerError(format!("panel {panel} holds an undecodable image"))
    })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, mime)
        .body(axum::body::Body::from(bytes))
        .map_err(WebError::from)
}
