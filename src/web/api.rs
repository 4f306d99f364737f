//! JSON endpoints for polling clients.

use super::prelude::*;

#[derive(Deserialize)]
pub(crate) struct GenerateRequest {
    prompt: String,
}

#[derive(Serialize)]
pub(crate) struct ValidationBody {
    error: &'static str,
}

/// handles the /api/state GET
pub(crate) async fn state_handler(State(state): State<AppState>) -> Json<GenerationState> {
    Json(state.snapshot())
}

/// handles the /api/generate POST
pub(crate) async fn generate_handler(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Response, WebError> {
    match state.launch(request.prompt).await {
        Launch::Started => {
            info!("Comic run started from the API");
            Ok((StatusCode::ACCEPTED, Json(state.snapshot())).into_response())
        }
        Launch::Busy => Err(WebError::Conflict),
        Launch::Rejected(err @ GenerationError::Validation) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ValidationBody {
                error: err.user_message(),
            }),
        )
            .into_response()),
        Launch::Rejected(err) => {
            debug!("Unexpected rejection: {err}");
            Err(WebError::BadRequest)
        }
    }
}
