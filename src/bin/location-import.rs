use clap::builder::RangedU64ValueParser;
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use ride_matcher::config::{DirectoryConfig, ObservabilityConfig};
use ride_matcher::directory::{DirectoryAuth, HttpLocationDirectory};
use ride_matcher::import::read_locations;
use ride_matcher::observability::logging::init_logging;
use ride_matcher::resilience::timeouts::deadline_after;

#[derive(Parser)]
#[command(name = "location-import")]
#[command(about = "Bulk-load driver locations from CSV into the location service", long_about = None)]
struct Cli {
    /// CSV file with a header row and latitude,longitude columns
    #[arg(short, long)]
    file: PathBuf,

    /// Base URL of the location service
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Login username (requires --password)
    #[arg(long, requires = "password")]
    username: Option<String>,

    /// Login password
    #[arg(long, requires = "username")]
    password: Option<String>,

    /// Static bearer token, instead of logging in
    #[arg(long, conflicts_with = "username")]
    token: Option<String>,

    /// Locations per upload request
    #[arg(long, default_value_t = 10, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    batch_size: usize,

    /// Deadline per request in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&ObservabilityConfig::default())?;

    let file = File::open(&cli.file)?;
    let locations = read_locations(file, chrono::Utc::now())?;
    tracing::info!(path = ?cli.file, count = locations.len(), "Locations parsed");

    let config = DirectoryConfig {
        base_url: cli.url.clone(),
        timeout_ms: cli.timeout_ms,
        username: cli.username.clone(),
        password: cli.password.clone(),
        api_token: cli.token.clone(),
    };
    let timeout = Duration::from_millis(cli.timeout_ms);
    let mut directory = HttpLocationDirectory::from_config(&config)?;

    // Log in once and reuse the token for every batch.
    if let (Some(username), Some(password)) = (&cli.username, &cli.password) {
        let token = directory.login(username, password, deadline_after(timeout)).await?;
        directory = HttpLocationDirectory::new(directory.base_url().clone(), DirectoryAuth::Token(token))?;
    }

    let mut uploaded = 0;
    for batch in locations.chunks(cli.batch_size) {
        directory.save_locations(batch, deadline_after(timeout)).await?;
        uploaded += batch.len();
        tracing::info!(uploaded, total = locations.len(), "Batch uploaded");
    }

    tracing::info!(uploaded, "Driver locations imported");
    Ok(())
}
