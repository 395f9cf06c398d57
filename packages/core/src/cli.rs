use clap::Parser;

/// IoT platform CLI arguments. Each flag overrides its environment variable.
#[derive(Debug, Parser)]
#[command(
    name = "iot-platform",
    version,
    about = "Device registry and sensor data service"
)]
pub struct Cli {
    /// Database URL (overrides DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Address to listen on, e.g. 0.0.0.0:8080
    #[arg(long)]
    pub bind: Option<String>,

    /// Maximum pooled database connections
    #[arg(long)]
    pub max_connections: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub request_timeout: Option<u64>,
}
