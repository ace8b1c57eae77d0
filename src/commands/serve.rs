use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use urlshot_lib::{CaptureBudgets, Orchestrator, PlaywrightEngine, ProxyAuth, ServiceConfig};

/// Run the serve command: build the configuration once, wire the engine and
/// orchestrator, and hand off to the HTTP layer.
pub async fn run_serve(
    config_path: Option<&Path>,
    bind: Option<String>,
    port: Option<u16>,
    node_command: Option<String>,
) -> ExitCode {
    let mut config = match ServiceConfig::load(config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    if let Some(bind) = bind {
        config.bind = bind;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(node_command) = node_command {
        config.node_command = node_command;
    }
    // The secret never comes from the config file; read it exactly once here.
    config.auth = ProxyAuth::from_env();

    let engine = PlaywrightEngine::new(config.node_command.clone());
    if let Err(err) = engine.preflight().await {
        log::warn!("rendering engine preflight failed: {err}");
    }

    let budgets: CaptureBudgets = config.budgets;
    let orchestrator = Orchestrator::new(engine, budgets);

    match urlshot_lib::serve(config, Arc::new(orchestrator)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
    }
}
