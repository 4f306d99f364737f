//! Gemini REST client implementing both remote collaborators: the script
//! call (`generateContent` with a response schema) and the panel image call
//! (`predict` on an Imagen model).

use base64::Engine;
use base64::engine::general_purpose;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};

use crate::config::GeminiSettings;
use crate::constants::{GEMINI_API_KEY_HEADER, PANEL_IMAGE_ASPECT_RATIO, PANEL_IMAGE_MIME_TYPE};
use crate::data_uri;
use crate::error::GenerationError;
use crate::panel::PanelSpec;
use crate::render::{ImageRenderer, styled_prompt};
use crate::script::{ScriptGenerator, parse_script, response_schema, script_request_text};

mod types;

use types::{
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, OutputOptions,
    PredictInstance, PredictParameters, PredictRequest, PredictResponse, RequestContent,
    RequestPart,
};

/// Shared Gemini API client. Build once per process and inject it.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    settings: GeminiSettings,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.settings.base_url)
            .field("text_model", &self.settings.text_model)
            .field("image_model", &self.settings.image_model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Builds the HTTP client with the configured request timeout.
    pub fn new(settings: GeminiSettings) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self { http, settings })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.settings.base_url)
    }

    /// POSTs `body` as JSON and decodes a successful JSON answer.
    ///
    /// The error string is for logs only; it may carry the response body.
    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<R, String> {
        let resp = self
            .http
            .post(url)
            .header(GEMINI_API_KEY_HEADER, &self.settings.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    format!("request to {url} timed out")
                } else {
                    format!("request to {url} failed: {err}")
                }
            })?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| format!("failed reading body from {url}: {err}"))?;

        if !status.is_success() {
            return Err(format!(
                "{url} returned {status}: {}",
                String::from_utf8_lossy(&bytes)
            ));
        }

        serde_json::from_slice(&bytes).map_err(|err| {
            format!(
                "failed to parse JSON from {url}: {err}: {}",
                String::from_utf8_lossy(&bytes)
            )
        })
    }
}

impl ScriptGenerator for GeminiClient {
    #[instrument(level = "debug", skip_all, fields(model = %self.settings.text_model))]
    async fn generate_script(&self, prompt: &str) -> Result<Vec<PanelSpec>, GenerationError> {
        let text = script_request_text(prompt);
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: &text }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
            },
        };
        let url = self.endpoint(&self.settings.text_model, "generateContent");

        let response: GenerateContentResponse =
            self.post_json(&url, &body).await.map_err(|detail| {
                error!("Script generation failed: {detail}");
                GenerationError::ScriptRequest(detail)
            })?;

        let Some(output) = response.first_text() else {
            let reason = response
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
                .unwrap_or_else(|| "no candidates".to_string());
            error!("Script response contained no text: {reason}");
            return Err(GenerationError::InvalidScript(format!(
                "response contained no text: {reason}"
            )));
        };

        let panels = parse_script(&output).inspect_err(|err| {
            error!("Rejected script output: {err}; raw output: {output}");
        })?;
        debug!(panels = panels.len(), "Script parsed");
        Ok(panels)
    }
}

impl ImageRenderer for GeminiClient {
    #[instrument(level = "debug", skip_all, fields(model = %self.settings.image_model))]
    async fn render_panel_image(&self, description: &str) -> Result<String, GenerationError> {
        let prompt = styled_prompt(description);
        let body = PredictRequest {
            instances: vec![PredictInstance { prompt: &prompt }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: PANEL_IMAGE_ASPECT_RATIO,
                output_options: OutputOptions {
                    mime_type: PANEL_IMAGE_MIME_TYPE,
                },
            },
        };
        let url = self.endpoint(&self.settings.image_model, "predict");

        let response: PredictResponse = self.post_json(&url, &body).await.map_err(|detail| {
            error!("Panel image generation failed: {detail}");
            GenerationError::ImageRequest(detail)
        })?;

        let encoded = response
            .predictions
            .into_iter()
            .find_map(|prediction| prediction.bytes_base64_encoded)
            .ok_or_else(|| {
                error!("Image response contained no predictions");
                GenerationError::MissingImage
            })?;

        let bytes = general_purpose::STANDARD.decode(encoded.trim()).map_err(|err| {
            error!("Image payload was not valid base64: {err}");
            GenerationError::ImageRequest(format!("invalid base64 image payload: {err}"))
        })?;

        data_uri::encode_image(&bytes).ok_or_else(|| {
            error!("Image payload of {} bytes is not a known image format", bytes.len());
            GenerationError::ImageRequest("payload is not a recognisable image".to_string())
        })
    }
}
