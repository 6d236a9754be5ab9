use clap::Parser;

/// Dynamic Datadog API key secrets service
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Keep all state in memory (nothing written to disk)
    #[arg(long)]
    pub ephemeral: bool,
}
