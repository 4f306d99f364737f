//! Shared constants for the generation pipeline and the web surface
//!

/// Gemini REST API root.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model that writes the comic script.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

/// Model that draws the panels.
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";

/// Default per-request timeout for remote calls, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 120;

/// Header carrying the Gemini API key.
pub const GEMINI_API_KEY_HEADER: &str = "x-goog-api-key";

/// Number of panels the script template asks for.
pub const SCRIPT_PANEL_COUNT: usize = 4;

/// Per-panel instructions placed between the script heading and the user's story.
pub const SCRIPT_INSTRUCTIONS: &str = r#"For each panel, provide:
1. A detailed, vivid visual description optimised for an AI image generation model. Describe the scene, the characters, their actions and their emotions clearly.
2. A single short line of dialogue or narration.

Story:"#;

/// Style directives appended to every panel description.
pub const PANEL_STYLE_SUFFIX: &str = "in the art style of Moebius (Jean Giraud), clear line art, intricate details, science-fiction comic art, limited color palette.";

/// Mime type requested from the image model.
pub const PANEL_IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Aspect ratio requested from the image model.
pub const PANEL_IMAGE_ASPECT_RATIO: &str = "1:1";

/// Loader text while the script is being written.
pub const SCRIPTING_MESSAGE: &str = "Writing your comic script...";

/// Loader text while the panels are being drawn.
pub const IMAGING_MESSAGE: &str = "Drawing the panels...";

/// Seconds between page refreshes while a run is active.
pub const ACTIVE_REFRESH_SECONDS: u32 = 2;
