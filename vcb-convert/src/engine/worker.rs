//! Subprocess conversion engine
//!
//! Runs the model in a long-lived worker process so weights are loaded once
//! per batch. See [`super::protocol`] for the wire format.

use super::protocol::{WorkerRequest, WorkerResponse};
use super::{ConversionEngine, EngineError, EngineLoader};
use crate::config::EngineSettings;
use crate::job::ConversionJob;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long a worker gets to exit after `shutdown` before it is killed
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Starts a worker process and loads the model into it
#[derive(Debug, Clone)]
pub struct WorkerLoader {
    program: String,
    args: Vec<String>,
}

impl WorkerLoader {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(settings.program.clone(), settings.args.clone())
    }
}

impl EngineLoader for WorkerLoader {
    type Engine = WorkerEngine;

    fn load(&self, job: &ConversionJob) -> Result<WorkerEngine, EngineError> {
        info!(
            program = %self.program,
            f0_condition = job.engine.f0_condition,
            "Starting conversion worker"
        );

        let mut engine = WorkerEngine::spawn(&self.program, &self.args)?;
        let message = engine.request(&WorkerRequest::Load {
            profile: &job.engine,
        })?;

        info!(
            "Conversion worker ready{}",
            message.map(|m| format!(": {}", m)).unwrap_or_default()
        );
        Ok(engine)
    }
}

/// Handle to a running worker process
pub struct WorkerEngine {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl WorkerEngine {
    fn spawn(program: &str, args: &[String]) -> Result<Self, EngineError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| EngineError::Spawn(format!("{}: {}", program, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Spawn("worker stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Spawn("worker stdout not captured".to_string()))?;

        debug!(pid = child.id(), "Worker process started");

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    fn send(&mut self, request: &WorkerRequest<'_>) -> Result<(), EngineError> {
        let line = serde_json::to_string(request)
            .map_err(|e| EngineError::Protocol(format!("Encoding request failed: {}", e)))?;
        writeln!(self.stdin, "{}", line)?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Send one request and wait for its reply
    fn request(&mut self, request: &WorkerRequest<'_>) -> Result<Option<String>, EngineError> {
        self.send(request)?;

        let mut reply = String::new();
        if self.stdout.read_line(&mut reply)? == 0 {
            return Err(EngineError::Protocol(
                "worker exited without replying".to_string(),
            ));
        }

        let response: WorkerResponse = serde_json::from_str(reply.trim()).map_err(|e| {
            EngineError::Protocol(format!("Unreadable reply {:?}: {}", reply.trim(), e))
        })?;

        match response {
            WorkerResponse::Ok { message } => Ok(message),
            WorkerResponse::Error { message } => Err(EngineError::Remote(message)),
        }
    }
}

impl ConversionEngine for WorkerEngine {
    fn convert(&mut self, job: &ConversionJob, output: &Path) -> Result<(), EngineError> {
        self.request(&WorkerRequest::Convert { job, output })?;
        Ok(())
    }

    fn exit_inference(&mut self) {
        if let Err(e) = self.request(&WorkerRequest::Release) {
            warn!("Worker failed to release inference state: {}", e);
        }
    }
}

impl Drop for WorkerEngine {
    fn drop(&mut self) {
        if let Err(e) = self.send(&WorkerRequest::Shutdown) {
            debug!("Shutdown request not delivered: {}", e);
        }

        let deadline = Instant::now() + SHUTDOWN_GRACE;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    debug!(%status, "Worker process exited");
                    return;
                }
                Ok(None) if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(50));
                }
                _ => break,
            }
        }

        warn!("Worker did not exit after shutdown, killing it");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
