use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "urlshot")]
#[command(
    version,
    about = "Safe URL screenshot service",
    long_about = "urlshot\n\nModes:\n- serve: run the HTTP capture service (validated targets, tier-bounded viewports).\n- capture: render a single URL to a PNG file through the same validation pipeline.\n\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML) setting bind/port/node-command/timeout budgets; CLI flags override config"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP capture service
    Serve {
        #[arg(long, help = "Interface to bind (overrides config)")]
        bind: Option<String>,

        #[arg(long, help = "Port to listen on (overrides config)")]
        port: Option<u16>,

        #[arg(long, help = "Node.js command used to spawn rendering helpers")]
        node_command: Option<String>,
    },

    /// Capture a single URL to a PNG file
    Capture {
        #[arg(long, help = "Target URL (http/https, public addresses only)")]
        url: String,

        #[arg(long, help = "Viewport width in pixels (default 1366, clamped to 200-3000)")]
        width: Option<String>,

        #[arg(long, help = "Viewport height in pixels (default 768, clamped to 200-3000)")]
        height: Option<String>,

        #[arg(long, help = "Capture the full scrollable page height")]
        full_page: bool,

        #[arg(long, short, default_value = "screenshot.png", help = "Output file path")]
        output: PathBuf,

        #[arg(long, default_value = "30", help = "Navigation timeout (seconds)")]
        nav_timeout: u64,

        #[arg(long, default_value = "30", help = "Screenshot timeout (seconds)")]
        capture_timeout: u64,

        #[arg(long, help = "Node.js command used to spawn the rendering helper")]
        node_command: Option<String>,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
