//! Playwright-backed rendering engine.
//!
//! Each session is one Node.js helper subprocess running the inline script
//! below. The helper is driven over a JSON-line protocol: commands go in on
//! stdin, events come back on stdout, and the screenshot lands in a
//! per-session temp file that is read back after the `captured` event.
//! Teardown asks the helper to close the browser, then kills the process if
//! it does not exit within a short grace period; `kill_on_drop` backstops
//! every other path.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::engine::{EngineError, EngineSession, RenderEngine};
use super::CaptureBudgets;
use crate::viewport::Viewport;

/// Driver script executed with `node -e`. Arguments: width, height,
/// navigation timeout (ms), capture timeout (ms), screenshot path.
const HELPER_SCRIPT: &str = r#"
const readline = require('readline');
const [, width, height, navTimeout, captureTimeout, screenshotPath] = process.argv;

async function run() {
  let browser;
  const rl = readline.createInterface({ input: process.stdin });
  const emit = (event) => process.stdout.write(JSON.stringify(event) + '\n');
  try {
    const { chromium } = require('playwright');
    browser = await chromium.launch({ headless: true });
    const context = await browser.newContext({
      viewport: {
        width: parseInt(width, 10),
        height: parseInt(height, 10)
      }
    });
    const page = await context.newPage();
    emit({ event: 'ready' });
    for await (const line of rl) {
      let cmd;
      try {
        cmd = JSON.parse(line);
      } catch (err) {
        continue;
      }
      try {
        if (cmd.cmd === 'goto') {
          await page.goto(cmd.url, { waitUntil: 'networkidle', timeout: parseInt(navTimeout, 10) });
          emit({ event: 'loaded' });
        } else if (cmd.cmd === 'screenshot') {
          await page.screenshot({ path: screenshotPath, fullPage: !!cmd.fullPage, timeout: parseInt(captureTimeout, 10) });
          emit({ event: 'captured' });
        } else if (cmd.cmd === 'close') {
          break;
        }
      } catch (err) {
        emit({ event: 'error', message: err && err.message ? err.message : String(err) });
      }
    }
  } catch (err) {
    emit({ event: 'error', message: err && err.message ? err.message : String(err) });
    process.exitCode = 1;
  } finally {
    if (browser) {
      await browser.close();
    }
  }
}

run();
"#;

/// Script used by the availability probe.
const PLAYWRIGHT_CHECK_SCRIPT: &str = "require('playwright'); process.stdout.write('ok');";

/// Timeout for checking node/playwright availability.
const AVAILABILITY_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a closing helper gets to shut the browser down before SIGKILL.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

#[derive(Serialize)]
struct HelperCommand<'a> {
    cmd: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(rename = "fullPage", skip_serializing_if = "Option::is_none")]
    full_page: Option<bool>,
}

impl<'a> HelperCommand<'a> {
    fn goto(url: &'a str) -> Self {
        Self {
            cmd: "goto",
            url: Some(url),
            full_page: None,
        }
    }

    fn screenshot(full_page: bool) -> HelperCommand<'static> {
        HelperCommand {
            cmd: "screenshot",
            url: None,
            full_page: Some(full_page),
        }
    }

    fn close() -> HelperCommand<'static> {
        HelperCommand {
            cmd: "close",
            url: None,
            full_page: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HelperEvent {
    event: String,
    #[serde(default)]
    message: Option<String>,
}

/// Engine that spawns one Playwright helper per session.
#[derive(Debug, Clone)]
pub struct PlaywrightEngine {
    node_command: String,
}

impl PlaywrightEngine {
    pub fn new(node_command: impl Into<String>) -> Self {
        Self {
            node_command: node_command.into(),
        }
    }

    /// Fails fast when node or the playwright package is unusable, so a
    /// misconfigured host is reported at startup instead of per request.
    pub async fn preflight(&self) -> Result<(), EngineError> {
        ensure_node_available(&self.node_command).await?;
        ensure_playwright_available(&self.node_command).await
    }
}

#[async_trait]
impl RenderEngine for PlaywrightEngine {
    async fn session(
        &self,
        viewport: Viewport,
        budgets: CaptureBudgets,
    ) -> Result<Box<dyn EngineSession>, EngineError> {
        let shot_file = tempfile::Builder::new()
            .prefix("urlshot-")
            .suffix(".png")
            .tempfile()?;

        let mut cmd = Command::new(&self.node_command);
        cmd.arg("-e")
            .arg(HELPER_SCRIPT)
            .arg(viewport.width.to_string())
            .arg(viewport.height.to_string())
            .arg(budgets.navigation.as_millis().to_string())
            .arg(budgets.capture.as_millis().to_string())
            .arg(shot_file.path().as_os_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|err| map_spawn_error(err, &self.node_command))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Protocol("helper stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Protocol("helper stdout unavailable".to_string()))?;
        let stderr_pipe = child.stderr.take();

        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut err) = stderr_pipe {
                let _ = err.read_to_end(&mut buf).await;
            }
            buf
        });

        let mut session = PlaywrightSession {
            child,
            stdin,
            events: BufReader::new(stdout).lines(),
            stderr_task: Some(stderr_task),
            shot_file,
        };

        // Browser launch errors surface here, before the session is handed out.
        session.expect_event("ready").await?;
        Ok(Box::new(session))
    }
}

struct PlaywrightSession {
    child: Child,
    stdin: ChildStdin,
    events: Lines<BufReader<ChildStdout>>,
    stderr_task: Option<JoinHandle<Vec<u8>>>,
    shot_file: tempfile::NamedTempFile,
}

impl PlaywrightSession {
    async fn send(&mut self, command: &HelperCommand<'_>) -> Result<(), EngineError> {
        let mut frame = serde_json::to_string(command)
            .map_err(|err| EngineError::Protocol(err.to_string()))?;
        frame.push('\n');
        self.stdin.write_all(frame.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Reads events until `want` arrives. An `error` event becomes a
    /// `Page` failure carrying the helper's message; EOF means the helper
    /// died and its stderr is mapped instead.
    async fn expect_event(&mut self, want: &str) -> Result<(), EngineError> {
        loop {
            match self.events.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    // Playwright occasionally chats on stdout; skip anything
                    // that is not a protocol frame.
                    let event: HelperEvent = match serde_json::from_str(line) {
                        Ok(event) => event,
                        Err(_) => continue,
                    };
                    if event.event == want {
                        return Ok(());
                    }
                    if event.event == "error" {
                        return Err(EngineError::Page(event.message.unwrap_or_else(|| {
                            "engine reported an unspecified error".to_string()
                        })));
                    }
                }
                Ok(None) => return Err(self.helper_exited().await),
                Err(err) => return Err(EngineError::Io(err)),
            }
        }
    }

    /// The helper closed stdout. Reap it and turn its stderr into a
    /// launch error with an actionable message where we recognize one.
    async fn helper_exited(&mut self) -> EngineError {
        let _ = self.child.kill().await;
        let _ = self.child.wait().await;
        let stderr = match self.stderr_task.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };
        map_helper_stderr(&String::from_utf8_lossy(&stderr))
    }
}

#[async_trait]
impl EngineSession for PlaywrightSession {
    async fn navigate(&mut self, url: &str) -> Result<(), EngineError> {
        self.send(&HelperCommand::goto(url)).await?;
        self.expect_event("loaded").await
    }

    async fn snapshot(&mut self, full_page: bool) -> Result<Vec<u8>, EngineError> {
        self.send(&HelperCommand::screenshot(full_page)).await?;
        self.expect_event("captured").await?;
        let bytes = tokio::fs::read(self.shot_file.path()).await?;
        if bytes.is_empty() {
            return Err(EngineError::Page(
                "engine produced an empty screenshot".to_string(),
            ));
        }
        Ok(bytes)
    }

    async fn close(&mut self) {
        let _ = self.send(&HelperCommand::close()).await;
        if timeout(SHUTDOWN_GRACE, self.child.wait()).await.is_err() {
            let _ = self.child.kill().await;
            let _ = self.child.wait().await;
        }
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
    }
}

/// Maps a spawn error to an appropriate EngineError.
fn map_spawn_error(err: std::io::Error, command: &str) -> EngineError {
    if err.kind() == std::io::ErrorKind::NotFound {
        EngineError::Launch(format!(
            "Unable to spawn rendering helper; '{}' was not found on PATH",
            command
        ))
    } else {
        EngineError::Io(err)
    }
}

/// Maps helper stderr output to an appropriate EngineError.
fn map_helper_stderr(stderr: &str) -> EngineError {
    let lower = stderr.to_ascii_lowercase();

    if lower.contains("cannot find module 'playwright'") {
        return EngineError::Launch(
            "Playwright npm package is missing; install with `npm install playwright`.".to_string(),
        );
    }

    if lower.contains("executable doesn't exist") {
        return EngineError::Launch(
            "Chromium browser is missing; run `npx playwright install chromium`.".to_string(),
        );
    }

    if stderr.trim().is_empty() {
        return EngineError::Launch("rendering helper exited unexpectedly".to_string());
    }

    EngineError::Launch(format!(
        "rendering helper exited unexpectedly: {}",
        stderr.trim()
    ))
}

/// Ensures Node.js is available on the system.
pub async fn ensure_node_available(node_command: &str) -> Result<(), EngineError> {
    let mut cmd = Command::new(node_command);
    cmd.arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let status = timeout(AVAILABILITY_CHECK_TIMEOUT, cmd.status())
        .await
        .map_err(|_| {
            EngineError::Launch(format!(
                "Timed out checking node availability after {:?}",
                AVAILABILITY_CHECK_TIMEOUT
            ))
        })?
        .map_err(|err| map_spawn_error(err, node_command))?;

    if !status.success() {
        return Err(EngineError::Launch(format!(
            "Node command {:?} is not available (exit {})",
            node_command, status
        )));
    }

    Ok(())
}

/// Ensures the Playwright npm package is installed.
pub async fn ensure_playwright_available(node_command: &str) -> Result<(), EngineError> {
    let mut cmd = Command::new(node_command);
    cmd.arg("-e")
        .arg(PLAYWRIGHT_CHECK_SCRIPT)
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let output = timeout(AVAILABILITY_CHECK_TIMEOUT, cmd.output())
        .await
        .map_err(|_| {
            EngineError::Launch(format!(
                "Timed out checking Playwright availability after {:?}",
                AVAILABILITY_CHECK_TIMEOUT
            ))
        })?
        .map_err(|err| map_spawn_error(err, node_command))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(map_helper_stderr(&stderr));
    }

    Ok(())
}
