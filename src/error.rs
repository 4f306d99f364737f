//! Error handling

use axum::response::IntoResponse;
use tracing::info;

/// Coarse grouping of [`GenerationError`] shown to the user.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorCategory {
    /// The prompt was rejected before any network activity.
    Validation,
    /// A remote call failed or returned something unusable.
    RemoteCall,
    /// Anything else.
    Unexpected,
}

/// Failures of a generation run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GenerationError {
    /// The story prompt was blank.
    Validation,
    /// The script call failed at the transport or HTTP level.
    ScriptRequest(String),
    /// The script payload was not a usable comic script.
    InvalidScript(String),
    /// An image call failed at the transport or HTTP level.
    ImageRequest(String),
    /// The image call came back without an image.
    MissingImage,
    /// A task panicked or was cancelled underneath us.
    Unexpected(String),
}

impl GenerationError {
    /// Which of the user-facing categories this error falls into.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation => ErrorCategory::Validation,
            Self::ScriptRequest(_)
            | Self::InvalidScript(_)
            | Self::ImageRequest(_)
            | Self::MissingImage => ErrorCategory::RemoteCall,
            Self::Unexpected(_) => ErrorCategory::Unexpected,
        }
    }

    /// The message shown to the user. Protocol detail stays in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Validation => "Please write an idea for your comic.",
            Self::ScriptRequest(_) => "Could not write the comic script. Please try again.",
            Self::InvalidScript(_) => {
                "The AI response was not a valid comic script. Please try again."
            }
            Self::ImageRequest(_) | Self::MissingImage => {
                "Could not draw the image for one of the panels. Please try again."
            }
            Self::Unexpected(_) => "An unexpected error occurred.",
        }
    }
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "Story prompt is blank"),
            Self::ScriptRequest(detail) => write!(f, "Script request failed: {detail}"),
            Self::InvalidScript(detail) => write!(f, "Invalid comic script: {detail}"),
            Self::ImageRequest(detail) => write!(f, "Image request failed: {detail}"),
            Self::MissingImage => write!(f, "Image response contained no image"),
            Self::Unexpected(detail) => write!(f, "Unexpected error: {detail}"),
        }
    }
}

impl std::error::Error for GenerationError {}

impl From<tokio::task::JoinError> for GenerationError {
    fn from(err: tokio::task::JoinError) -> Self {
        GenerationError::Unexpected(err.to_string())
    }
}

/// Errors returned by the web handlers.
#[derive(Debug)]
pub enum WebError {
    /// When you didn't do the right thing
    BadRequest,
    /// When a requested resource is not found
    NotFound(String),
    /// A run is already in progress
    Conflict,
    /// When an internal server error occurs
    InternalServerError(String),
}

impl From<axum::http::Error> for WebError {
    fn from(err: axum::http::Error) -> Self {
        WebError::InternalServerError(err.to_string())
    }
}

impl From<askama::Error> for WebError {
    fn from(err: askama::Error) -> Self {
        WebError::InternalServerError(err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        match self {
            WebError::BadRequest => {
                info!("Bad request received");
                let mut response =
                    axum::response::Response::new(axum::body::Body::from("Bad Request"));
                *response.status_mut() = axum::http::StatusCode::BAD_REQUEST;
                response
            }
            WebError::NotFound(url) => {
                tracing::debug!("404 {url}");
                let mut response =
                    axum::response::Response::new(axum::body::Body::from("Not Found"));
                *response.status_mut() = axum::http::StatusCode::NOT_FOUND;
                response
            }
            WebError::Conflict => {
                info!("Generation requested while a run is active");
                let mut response = axum::response::Response::new(axum::body::Body::from(
                    "A comic is already being generated.",
                ));
                *response.status_mut() = axum::http::StatusCode::CONFLICT;
                response
            }
            WebError::InternalServerError(message) => {
                tracing::error!("Internal server error: {}", message);
                let mut response =
                    axum::response::Response::new(axum::body::Body::from("Internal server error"));
                *response.status_mut() = axum::http::StatusCode::INTERNAL_SERVER_ERROR;
                response
            }
        }
    }
}
