use std::sync::Arc;

use clap::Parser;
use comicgen::config::{GeminiSettings, setup_logging};
use comicgen::gemini::GeminiClient;
use comicgen::orchestrator::Orchestrator;
use tracing::error;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = comicgen::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let settings = GeminiSettings::from(&cli);
    let client = match GeminiClient::new(settings) {
        Ok(client) => client,
        Err(err) => {
            error!("Failed to build Gemini client: {}", err);
            return;
        }
    };

    let orchestrator = Orchestrator::new(client.clone(), client);

    if let Err(err) =
        comicgen::web::setup_server(&cli.listen_address, cli.port, Arc::new(orchestrator)).await
    {
        error!("Application error: {}", err);
    }
}
