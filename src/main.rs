use adsync::presentation::cli::CliApp;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; every clone/fetch/checkout is logged at info
    // so operators can audit what changed
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Run the CLI application
    let app = CliApp::new();
    app.run().await
}
