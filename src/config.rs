//! Config handling

use std::time::Duration;

use tracing::log::LevelFilter;

use crate::cli::CliOptions;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Everything the Gemini client needs to reach the API.
#[derive(Clone, Debug)]
pub struct GeminiSettings {
    /// API key sent with every request.
    pub api_key: String,
    /// REST API root, without a trailing slash.
    pub base_url: String,
    /// Model used for the script call.
    pub text_model: String,
    /// Model used for the image calls.
    pub image_model: String,
    /// Upper bound for a single remote call.
    pub request_timeout: Duration,
}

impl From<&CliOptions> for GeminiSettings {
    fn from(cli: &CliOptions) -> Self {
        Self {
            api_key: cli.gemini_api_key.clone(),
            base_url: cli.api_base_url.trim_end_matches('/').to_string(),
            text_model: cli.text_model.clone(),
            image_model: cli.image_model.clone(),
            request_timeout: Duration::from_secs(cli.request_timeout),
        }
    }
}
