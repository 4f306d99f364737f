//! Gemini REST API request and response bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// -----------------------------
// generateContent (text)
// -----------------------------

/// Request body for POST /models/{model}:generateContent
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest<'a> {
    pub(crate) contents: Vec<RequestContent<'a>>,
    pub(crate) generation_config: GenerationConfig<'a>,
}

#[derive(Serialize, Debug)]
pub(crate) struct RequestContent<'a> {
    pub(crate) parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize, Debug)]
pub(crate) struct RequestPart<'a> {
    pub(crate) text: &'a str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig<'a> {
    pub(crate) response_mime_type: &'a str,
    pub(crate) response_schema: Value,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,
    #[serde(default)]
    pub(crate) prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct Candidate {
    #[serde(default)]
    pub(crate) content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub(crate) parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct CandidatePart {
    #[serde(default)]
    pub(crate) text: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    #[serde(default)]
    pub(crate) block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it has any.
    pub(crate) fn first_text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

// -----------------------------
// predict (images)
// -----------------------------

/// Request body for POST /models/{model}:predict
#[derive(Serialize, Debug)]
pub(crate) struct PredictRequest<'a> {
    pub(crate) instances: Vec<PredictInstance<'a>>,
    pub(crate) parameters: PredictParameters<'a>,
}

#[derive(Serialize, Debug)]
pub(crate) struct PredictInstance<'a> {
    pub(crate) prompt: &'a str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PredictParameters<'a> {
    pub(crate) sample_count: u8,
    pub(crate) aspect_ratio: &'a str,
    pub(crate) output_options: OutputOptions<'a>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OutputOptions<'a> {
    pub(crate) mime_type: &'a str,
}

#[derive(Deserialize, Debug)]
pub(crate) struct PredictResponse {
    #[serde(default)]
    pub(crate) predictions: Vec<Prediction>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Prediction {
    #[serde(default)]
    pub(crate) bytes_base64_encoded: Option<String>,
}
