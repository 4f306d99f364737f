//! Panel rendering contract.

use std::future::Future;

use crate::constants::PANEL_STYLE_SUFFIX;
use crate::error::GenerationError;

/// Draws one panel from its visual description.
///
/// Implementations make exactly one remote call per invocation and never retry.
pub trait ImageRenderer: Send + Sync + 'static {
    /// Returns a displayable image reference (a `data:` URI) for `description`.
    fn render_panel_image(
        &self,
        description: &str,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

/// The rendering prompt for a panel: its description plus the house style.
pub fn styled_prompt(description: &str) -> String {
    format!("{}, {PANEL_STYLE_SUFFIX}", description.trim_end())
}
