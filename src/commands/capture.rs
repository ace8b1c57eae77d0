use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use serde::Serialize;

use urlshot_lib::{
    classify, normalize, validate, CaptureBudgets, CaptureRequest, ErrorCode, ErrorPayload,
    Orchestrator, PlaywrightEngine, ServiceConfig, Viewport,
};

/// Summary printed on a successful one-shot capture.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CaptureSummary<'a> {
    status: &'a str,
    path: &'a Path,
    width: u32,
    height: u32,
    full_page: bool,
    duration_ms: u64,
}

/// Run the capture command: validate, normalize, capture, write the PNG.
#[allow(clippy::too_many_arguments)]
pub async fn run_capture(
    config_path: Option<&Path>,
    url: String,
    width: Option<String>,
    height: Option<String>,
    full_page: bool,
    output: PathBuf,
    nav_timeout: u64,
    capture_timeout: u64,
    node_command: Option<String>,
) -> ExitCode {
    // Rejections short-circuit before the engine is even probed.
    let validated = match validate(Some(url.as_str())) {
        Ok(validated) => validated,
        Err(err) => return render_rejection(err.code(), err.to_string()),
    };
    let viewport: Viewport = normalize(width.as_deref(), height.as_deref(), None);

    let config = match ServiceConfig::load(config_path) {
        Ok(config) => config,
        Err(err) => return render_fatal(err.to_string()),
    };
    let node_command = node_command.unwrap_or(config.node_command);

    let engine = PlaywrightEngine::new(node_command);
    if let Err(err) = engine.preflight().await {
        return render_fatal(err.to_string());
    }

    let budgets = CaptureBudgets {
        navigation: Duration::from_secs(nav_timeout),
        capture: Duration::from_secs(capture_timeout),
        ..config.budgets
    };
    let orchestrator = Orchestrator::new(engine, budgets);

    let request = CaptureRequest {
        url: validated,
        viewport,
        full_page,
    };

    match orchestrator.capture(&request).await {
        Ok(result) => {
            if let Err(err) = std::fs::write(&output, &result.image) {
                return render_fatal(format!("Failed to write {}: {}", output.display(), err));
            }
            let summary = CaptureSummary {
                status: "ok",
                path: &output,
                width: viewport.width,
                height: viewport.height,
                full_page,
                duration_ms: result.duration.as_millis() as u64,
            };
            match serde_json::to_string(&summary) {
                Ok(line) => println!("{line}"),
                Err(err) => eprintln!("Failed to serialize summary: {err}"),
            }
            ExitCode::SUCCESS
        }
        Err(failure) => render_rejection(classify(&failure), failure.message),
    }
}

/// Prints a structured rejection payload to stderr; always a fatal exit.
fn render_rejection(code: ErrorCode, message: String) -> ExitCode {
    let payload = ErrorPayload::new(code, message);
    eprintln!(
        "{}",
        serde_json::to_string(&payload)
            .unwrap_or_else(|_| format!("{{\"code\":\"{}\"}}", code.as_str()))
    );
    ExitCode::from(2)
}

fn render_fatal(message: String) -> ExitCode {
    let payload = ErrorPayload {
        code: "CONFIG".to_string(),
        message,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&payload).unwrap_or_else(|_| "{\"code\":\"CONFIG\"}".to_string())
    );
    ExitCode::from(2)
}
