//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_REQUEST_TIMEOUT_SECONDS, DEFAULT_TEXT_MODEL,
};

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "COMICGEN_DEBUG")]
    /// Enable debug logging. Env: COMICGEN_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "9000", env = "COMICGEN_PORT")]
    /// http listener, defaults to `9000`.
    /// Env: COMICGEN_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "COMICGEN_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: COMICGEN_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    /// Gemini API key used for both the script and the image calls.
    /// Env: GEMINI_API_KEY
    pub gemini_api_key: String,

    #[clap(long, default_value = DEFAULT_TEXT_MODEL, env = "COMICGEN_TEXT_MODEL")]
    /// Model that writes the comic script.
    pub text_model: String,

    #[clap(long, default_value = DEFAULT_IMAGE_MODEL, env = "COMICGEN_IMAGE_MODEL")]
    /// Model that draws each panel.
    pub image_model: String,

    #[clap(long, default_value = DEFAULT_API_BASE_URL, env = "COMICGEN_API_BASE_URL")]
    /// Base URL of the Gemini REST API.
    pub api_base_url: String,

    #[clap(
        long,
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECONDS,
        env = "COMICGEN_REQUEST_TIMEOUT"
    )]
    /// Per-request timeout for remote calls, in seconds.
    /// Env: COMICGEN_REQUEST_TIMEOUT
    pub request_timeout: u64,
}
