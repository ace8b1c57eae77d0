mod cli;
mod commands;

use std::process::ExitCode;

use cli::Commands;
use commands::{run_capture, run_serve};

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match args.command {
        Commands::Serve {
            bind,
            port,
            node_command,
        } => run_serve(args.config.as_deref(), bind, port, node_command).await,
        Commands::Capture {
            url,
            width,
            height,
            full_page,
            output,
            nav_timeout,
            capture_timeout,
            node_command,
        } => {
            run_capture(
                args.config.as_deref(),
                url,
                width,
                height,
                full_page,
                output,
                nav_timeout,
                capture_timeout,
                node_command,
            )
            .await
        }
    }
}
