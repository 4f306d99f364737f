//! Script generation: the request template, the declared output schema and
//! the parsing boundary that turns model output into [`PanelSpec`]s.

use std::future::Future;

use serde_json::{Value, json};

use crate::constants::{SCRIPT_INSTRUCTIONS, SCRIPT_PANEL_COUNT};
use crate::error::GenerationError;
use crate::panel::PanelSpec;

/// Writes a comic script from a story prompt.
///
/// Implementations make exactly one remote call per invocation and never retry.
pub trait ScriptGenerator: Send + Sync + 'static {
    /// Produces the ordered panel specs for `prompt`.
    fn generate_script(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<Vec<PanelSpec>, GenerationError>> + Send;
}

/// The full text sent to the text model for `prompt`.
pub fn script_request_text(prompt: &str) -> String {
    format!(
        "Based on the following story, write the script for a {SCRIPT_PANEL_COUNT}-panel comic \
         strip.\n{SCRIPT_INSTRUCTIONS} \"{}\"",
        prompt.trim()
    )
}

/// JSON schema the text model is asked to answer with.
pub fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "panel": {
                    "type": "INTEGER",
                    "description": "The panel number, starting from 1."
                },
                "description": {
                    "type": "STRING",
                    "description": "The detailed visual description for the image generator."
                },
                "dialogue": {
                    "type": "STRING",
                    "description": "The line of dialogue or narration for the panel."
                }
            },
            "required": ["panel", "description", "dialogue"]
        }
    })
}

/// Parses and validates the model's answer.
///
/// The payload is untrusted: it must be a non-empty JSON array of panels
/// numbered `1..=n` in order, each with a non-blank description.
pub fn parse_script(text: &str) -> Result<Vec<PanelSpec>, GenerationError> {
    let text = text.trim();
    let value: Value = serde_json::from_str(text)
        .map_err(|err| GenerationError::InvalidScript(format!("not JSON: {err}")))?;
    let Value::Array(items) = value else {
        return Err(GenerationError::InvalidScript(
            "expected a JSON array of panels".to_string(),
        ));
    };
    if items.is_empty() {
        return Err(GenerationError::InvalidScript(
            "script contains no panels".to_string(),
        ));
    }

    let mut panels = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let spec: PanelSpec = serde_json::from_value(item).map_err(|err| {
            GenerationError::InvalidScript(format!("panel at position {index}: {err}"))
        })?;
        let expected = u32::try_from(index + 1)
            .map_err(|_| GenerationError::InvalidScript("too many panels".to_string()))?;
        if spec.panel != expected {
            return Err(GenerationError::InvalidScript(format!(
                "panel at position {index} is numbered {}, expected {expected}",
                spec.panel
            )));
        }
        if spec.description.trim().is_empty() {
            return Err(GenerationError::InvalidScript(format!(
                "panel {expected} has an empty description"
            )));
        }
        panels.push(spec);
    }
    Ok(panels)
}
