//! The interactive session engine: spawn, read, classify, respond.
//!
//! One [`SessionEngine`] owns one spawned connection client (telnet or ssh)
//! and its pseudo-terminal for the whole session. Device output is pumped off
//! the pty by a dedicated reader thread into a channel; the engine drains the
//! channel, classifies lines against the compiled prompt catalog, and hands
//! each match to caller-supplied reaction logic, which writes responses back
//! through the engine.
//!
//! # Main Components
//!
//! - [`SessionEngine`] - Owns the spawned process and runs the expect loop
//! - [`SessionState`] - Privileged-mode and pending-exit flags
//! - [`EngineOptions`] - Read timeout and verbosity, explicit per engine
//! - [`ReadOutcome`] - Result of one read phase

use std::io::{Read, Write};
use std::time::Duration;

use log::{debug, info, trace};
use portable_pty::{Child, CommandBuilder, MasterPty, PtySize, PtySystem, SlavePty, native_pty_system};
use tokio::sync::mpsc::{self, Receiver, Sender};

use crate::error::EngineError;
use crate::host::{HostParameter, spawn_command};
use crate::prompt::{PromptCatalog, PromptCategory, PromptMatch, PromptMatcher};
use crate::template::Templater;

/// Explicit configuration for one engine instance.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// How long one read phase waits for a prompt before reporting
    /// [`ReadOutcome::Timeout`]. Default 60 seconds.
    pub timeout: Duration,
    /// Echo raw device output chunks to the log at trace severity.
    pub verbose: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            verbose: true,
        }
    }
}

/// Lifecycle phase of a session.
///
/// `Closed` is terminal: a new session requires a new engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// Constructed, nothing spawned yet.
    Idle,
    /// Building the connection command and starting the process.
    Spawning,
    /// Waiting on device output.
    Reading,
    /// A match is being handled by reaction logic.
    Dispatching,
    /// Process and pty handles released.
    Closed,
}

/// Mutable per-session flags, owned and mutated exclusively by the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionState {
    /// Whether the session has entered privileged (enable) mode.
    pub enable_mode: bool,
    /// Set the instant an `exit` command is written, cleared by any other
    /// write.
    pub exit_requested: bool,
    /// Whether the single post-exit yes/no confirmation has already been
    /// dispatched.
    pub post_exit_yn_seen: bool,
}

impl SessionState {
    /// The post-exit dispatch rule: once `exit` has been sent, exactly one
    /// yes/no confirmation (a final "save configuration?" prompt) may still
    /// be dispatched; any other prompt, and anything after that
    /// confirmation, ends the session.
    ///
    /// Returns `true` when the matched prompt must terminate the session
    /// instead of being dispatched. Consumes the yn window.
    pub fn post_exit_blocks(&mut self, category: PromptCategory) -> bool {
        if self.post_exit_yn_seen {
            return true;
        }
        if !self.exit_requested {
            return false;
        }
        if category == PromptCategory::Yn {
            self.post_exit_yn_seen = true;
            return false;
        }
        true
    }
}

/// Result of one read phase.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A line of device output matched the prompt catalog.
    Matched(PromptMatch),
    /// No prompt within the configured timeout; not a failure, read again.
    Timeout,
    /// The spawned process closed its output; normal end of session.
    Eof,
}

/// Owned process resources, acquired at spawn and released at close.
struct Transport {
    writer: Box<dyn Write + Send>,
    output: Receiver<String>,
    child: Option<Box<dyn Child + Send + Sync>>,
    master: Option<Box<dyn MasterPty + Send>>,
}

/// Drives one interactive session against one device.
pub struct SessionEngine {
    host: HostParameter,
    matcher: PromptMatcher,
    templater: Templater,
    options: EngineOptions,
    state: SessionState,
    phase: EnginePhase,
    pending: String,
    transport: Option<Transport>,
}

impl SessionEngine {
    /// Creates an engine for one host with default options.
    ///
    /// The catalog is compiled up front; an invalid fragment surfaces here
    /// as a configuration error.
    pub fn new(host: HostParameter, catalog: &PromptCatalog) -> Result<Self, EngineError> {
        Self::with_options(host, catalog, EngineOptions::default())
    }

    /// Creates an engine with explicit options.
    pub fn with_options(
        host: HostParameter,
        catalog: &PromptCatalog,
        options: EngineOptions,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            matcher: catalog.compile()?,
            templater: Templater::process_env(),
            host,
            options,
            state: SessionState::default(),
            phase: EnginePhase::Idle,
            pending: String::new(),
            transport: None,
        })
    }

    /// Replaces the template resolver (tests substitute a fixed dictionary).
    pub fn set_templater(&mut self, templater: Templater) {
        self.templater = templater;
    }

    /// Host parameters this engine was built for.
    pub fn host(&self) -> &HostParameter {
        &self.host
    }

    /// Current session flags.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Marks the session as having entered (or left) privileged mode.
    ///
    /// Enable-mode transitions are caller-controlled: the engine itself only
    /// consumes the flag, e.g. in [`Self::password_for_mode`].
    pub fn set_enable_mode(&mut self, enable: bool) {
        self.state.enable_mode = enable;
    }

    /// The credential appropriate for the current mode: the enable password
    /// in privileged mode, the login password otherwise. Unresolved; pass
    /// the result to [`Self::send_secret`].
    pub fn password_for_mode(&self) -> &str {
        if self.state.enable_mode {
            &self.host.enable
        } else {
            &self.host.password
        }
    }

    /// Builds the connection command for the host and spawns it.
    ///
    /// An unsupported protocol has already been logged by the builder; the
    /// engine then transitions straight to `Closed` and returns `Ok(())`.
    /// Setup aborts without raising, and callers that need a hard failure
    /// check [`Self::phase`].
    pub fn spawn(&mut self) -> Result<(), EngineError> {
        self.phase = EnginePhase::Spawning;
        match spawn_command(&self.host, &self.templater) {
            Some(command) => self.spawn_with_command(&command),
            None => {
                self.phase = EnginePhase::Closed;
                Ok(())
            }
        }
    }

    /// Spawns an explicit command line inside a fresh pseudo-terminal.
    ///
    /// The command is tokenized on whitespace, which is sufficient for the
    /// two produced connection forms.
    pub fn spawn_with_command(&mut self, command: &str) -> Result<(), EngineError> {
        self.phase = EnginePhase::Spawning;
        info!("Begin spawn: {command}");

        let mut parts = command.split_whitespace();
        let Some(program) = parts.next() else {
            return Err(EngineError::Pty(anyhow::anyhow!("empty spawn command")));
        };
        let mut builder = CommandBuilder::new(program);
        for arg in parts {
            builder.arg(arg);
        }

        let pair = native_pty_system().openpty(PtySize {
            rows: 24,
            cols: 80,
            pixel_width: 0,
            pixel_height: 0,
        })?;
        let child = pair.slave.spawn_command(builder)?;
        // The slave side belongs to the spawned process now; holding our copy
        // open would keep the pty alive past the process's exit.
        drop(pair.slave);
        let writer = pair.master.take_writer()?;
        let reader = pair.master.try_clone_reader()?;

        let (tx, rx) = mpsc::channel(256);
        std::thread::spawn(move || pump_output(reader, tx));

        self.state = SessionState::default();
        self.pending.clear();
        self.transport = Some(Transport {
            writer,
            output: rx,
            child: Some(child),
            master: Some(pair.master),
        });
        self.phase = EnginePhase::Reading;
        Ok(())
    }

    /// One read phase: waits for the next device output that matches the
    /// prompt catalog.
    ///
    /// Complete lines are classified first; the trailing partial line is the
    /// usual prompt candidate, since prompts arrive without a newline. A
    /// timeout is reported as [`ReadOutcome::Timeout`] and the session stays
    /// in `Reading`; end-of-output is [`ReadOutcome::Eof`].
    pub async fn expect(&mut self) -> ReadOutcome {
        if self.transport.is_none() {
            return ReadOutcome::Eof;
        }
        self.phase = EnginePhase::Reading;
        loop {
            if let Some(matched) = self.scan_buffered() {
                return ReadOutcome::Matched(matched);
            }
            let timeout = self.options.timeout;
            let Some(transport) = self.transport.as_mut() else {
                return ReadOutcome::Eof;
            };
            match tokio::time::timeout(timeout, transport.output.recv()).await {
                Ok(Some(chunk)) => {
                    if self.options.verbose {
                        trace!("Recv chunk: {chunk:?}");
                    }
                    self.pending.push_str(&chunk);
                }
                Ok(None) => {
                    debug!("End of output from spawned process");
                    return ReadOutcome::Eof;
                }
                Err(_) => return ReadOutcome::Timeout,
            }
        }
    }

    fn scan_buffered(&mut self) -> Option<PromptMatch> {
        while let Some(pos) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=pos).collect();
            let line = line.trim_end_matches(['\r', '\n']);
            if let Some(matched) = self.matcher.classify(line) {
                return Some(matched);
            }
        }
        if !self.pending.is_empty()
            && let Some(matched) = self.matcher.classify(self.pending.trim_end_matches('\r'))
        {
            self.pending.clear();
            return Some(matched);
        }
        None
    }

    /// Runs the expect loop to completion.
    ///
    /// Each match is handed to `react`, which writes responses back through
    /// the engine's send methods. The loop ends on end-of-output, or as soon
    /// as a non-yn prompt arrives after an `exit` command was written; in
    /// that case `react` is not invoked for the terminating prompt.
    pub async fn run<F>(&mut self, mut react: F) -> Result<(), EngineError>
    where
        F: FnMut(&mut SessionEngine, &PromptMatch) -> Result<(), EngineError>,
    {
        loop {
            if self.phase == EnginePhase::Closed {
                return Ok(());
            }
            match self.expect().await {
                ReadOutcome::Timeout => continue,
                ReadOutcome::Eof => {
                    self.close();
                    return Ok(());
                }
                ReadOutcome::Matched(matched) => {
                    self.phase = EnginePhase::Dispatching;
                    debug!(
                        "Matched prompt [{}]: {}",
                        matched.category.name(),
                        matched.text
                    );
                    if self.state.post_exit_blocks(matched.category) {
                        debug!("Prompt after exit command, terminating session");
                        self.close();
                        return Ok(());
                    }
                    react(&mut *self, &matched)?;
                }
            }
        }
    }

    /// Resolves templates in `command`, logs it, and writes it to the
    /// process followed by a line terminator, flushed immediately.
    pub fn send(&mut self, command: &str) -> Result<(), EngineError> {
        let resolved = self.templater.resolve(command);
        info!("Send command: {resolved}");
        self.write_line(&resolved)
    }

    /// Like [`Self::send`], but only a fixed placeholder reaches the log.
    /// Used for passwords: the credential is never written to the log.
    pub fn send_secret(&mut self, command: &str) -> Result<(), EngineError> {
        let resolved = self.templater.resolve(command);
        info!("Send password");
        self.write_line(&resolved)
    }

    /// Writes `text` without template resolution.
    pub fn send_raw(&mut self, text: &str) -> Result<(), EngineError> {
        info!("Send command: {text}");
        self.write_line(text)
    }

    fn write_line(&mut self, text: &str) -> Result<(), EngineError> {
        let Some(transport) = self.transport.as_mut() else {
            return Err(EngineError::NotSpawned);
        };
        transport.writer.write_all(text.as_bytes())?;
        transport.writer.write_all(b"\n")?;
        transport.writer.flush()?;
        self.state.exit_requested = text == "exit";
        Ok(())
    }

    /// Releases the spawned process and its pty handles.
    ///
    /// Idempotent: the first call releases, later calls are no-ops. Reached
    /// from every terminating transition, whether end-of-output, post-exit
    /// termination, or setup failure.
    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.output.close();
            if let Some(mut child) = transport.child.take() {
                let _ = child.try_wait();
            }
            info!("End spawn: {}", self.host.ipaddr);
        }
        self.phase = EnginePhase::Closed;
    }
}

/// Reader-thread body: copies pty output into the engine's channel until the
/// process ends. Dropping the sender is the end-of-output signal.
fn pump_output(mut reader: Box<dyn Read + Send>, tx: Sender<String>) {
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => {
                debug!("Spawned process closed its output");
                break;
            }
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                if tx.blocking_send(chunk).is_err() {
                    break;
                }
            }
            Err(err) => {
                // On Linux a pty read fails with EIO once the spawned
                // process has exited. Normal termination, not an error.
                debug!("Pty read ended: {err}");
                break;
            }
        }
    }
}
