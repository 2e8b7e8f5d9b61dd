use logwarden::cli::parse_cli_commands;
use logwarden::database::initialize_database;
use logwarden::env::get_config;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Validate the environment before anything else touches it
    let config = get_config();

    // Log to stderr so command output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level)
                .unwrap_or_else(|_| EnvFilter::new(logwarden::env::DEFAULT_LOG_LEVEL)),
        )
        .with_writer(std::io::stderr)
        .init();

    config.log_notices();

    let pool = match initialize_database(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open log store at {}: {}", config.database_url, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = parse_cli_commands(&pool, &config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
