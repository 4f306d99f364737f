//! Comic data model: panel specs from the script, panel data for display,
//! and the state of the current run.

use serde::{Deserialize, Serialize};

use crate::constants::{IMAGING_MESSAGE, SCRIPTING_MESSAGE};

/// One panel of the script, as written by the text model.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct PanelSpec {
    /// 1-based panel number.
    pub panel: u32,
    /// Visual description handed to the image model.
    pub description: String,
    /// Dialogue or narration line.
    pub dialogue: String,
}

/// A panel as displayed: its script entry plus the image once drawn.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelData {
    /// 1-based panel number.
    pub panel: u32,
    /// Visual description handed to the image model.
    pub description: String,
    /// Dialogue or narration line.
    pub dialogue: String,
    /// `data:` URI of the drawn panel, `None` while still rendering.
    pub image_url: Option<String>,
}

impl PanelData {
    /// A panel still waiting for its image.
    pub fn placeholder(spec: &PanelSpec) -> Self {
        Self {
            panel: spec.panel,
            description: spec.description.clone(),
            dialogue: spec.dialogue.clone(),
            image_url: None,
        }
    }

    /// A panel with its image resolved.
    pub fn with_image(spec: PanelSpec, image_url: String) -> Self {
        Self {
            panel: spec.panel,
            description: spec.description,
            dialogue: spec.dialogue,
            image_url: Some(image_url),
        }
    }

    /// True once the image has been drawn.
    pub fn has_image(&self) -> bool {
        self.image_url.is_some()
    }
}

/// Where the current run is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Nothing has run yet.
    #[default]
    Idle,
    /// Waiting on the script call.
    Scripting,
    /// Waiting on the image calls.
    Imaging,
    /// Every panel has an image.
    Succeeded,
    /// The run failed; see the error.
    Failed,
}

impl Phase {
    /// True while a run is in flight.
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Scripting | Phase::Imaging)
    }

    /// Loader text for the active phases.
    pub fn loading_message(self) -> Option<&'static str> {
        match self {
            Phase::Scripting => Some(SCRIPTING_MESSAGE),
            Phase::Imaging => Some(IMAGING_MESSAGE),
            Phase::Idle | Phase::Succeeded | Phase::Failed => None,
        }
    }
}

/// Snapshot of the generation state published to observers.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationState {
    /// Lifecycle phase.
    pub phase: Phase,
    /// Prompt of the latest run, if any.
    pub prompt: Option<String>,
    /// Published panel sequence; `None` when nothing should be shown.
    pub panels: Option<Vec<PanelData>>,
    /// User-facing error message of the last failure.
    pub error: Option<String>,
}

impl GenerationState {
    /// Loader text for the current phase.
    pub fn loading_message(&self) -> Option<&'static str> {
        self.phase.loading_message()
    }

    /// True while a run is in flight.
    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    /// Looks up a published panel by its number.
    pub fn panel(&self, number: u32) -> Option<&PanelData> {
        self.panels
            .as_ref()?
            .iter()
            .find(|panel| panel.panel == number)
    }
}
