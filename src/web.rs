use sellerdesk::{AppConfig, app};

/// Main entry point for the web application
///
/// Takes no command line arguments. Configuration comes from `sellerdesk.json`
/// in the working directory when present, otherwise the built-in defaults.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load()?;
    app::run(config).await
}
