pub(crate) use crate::error::{GenerationError, WebError};
pub(crate) use crate::panel::GenerationState;
pub(crate) use crate::web::{AppState, Launch};
pub(crate) use askama::Template;
pub(crate) use askama_web::WebTemplate;
pub(crate) use axum::extract::{Form, Json, Path, State};
pub(crate) use axum::http::{StatusCode, header::CONTENT_TYPE};
pub(crate) use axum::response::{IntoResponse, Redirect, Response};
pub(crate) use serde::{Deserialize, Serialize};
pub(crate) use tracing::{debug, info};
