//! UCI engine subprocess bridge.

use crate::AnalysisResult;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uci::{EngineMessage, GuiCommand, UciClient, UciError};

/// Maximum number of lines to read before giving up on a handshake reply.
pub const MAX_UCI_LINES: usize = 1000;

/// Errors that can occur when talking to an engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Engine executable was not found at the specified path.
    #[error("Engine not found at path: {0}")]
    NotFound(String),
    /// Failed to spawn the engine process.
    #[error("Failed to spawn engine: {0}")]
    Spawn(#[source] std::io::Error),
    /// The engine never reached the ready state.
    #[error("Engine failed to start: {0}")]
    Startup(String),
    /// The stream closed or broke in the middle of a request.
    #[error("Engine communication failed: {0}")]
    Communication(String),
    /// An option line could not be written.
    #[error("Could not set engine option '{name}': {reason}")]
    Configuration { name: String, reason: String },
    /// The bridge was closed.
    #[error("Engine is closed")]
    Closed,
}

/// Lifecycle of an [`EngineBridge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Starting,
    Ready,
    Busy,
    Closed,
}

/// Anything that can evaluate a position given as moves from the start position.
///
/// [`EngineBridge`] is the real implementation; tests substitute scripted ones.
pub trait PositionAnalyzer {
    fn analyze(&self, moves: &[String], think_time: Duration)
        -> Result<AnalysisResult, EngineError>;

    /// Tell the analyzer that following requests belong to a different game.
    fn new_game(&self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Release the underlying engine. Later requests fail.
    fn close(&self) {}
}

impl<T: PositionAnalyzer + ?Sized> PositionAnalyzer for Arc<T> {
    fn analyze(
        &self,
        moves: &[String],
        think_time: Duration,
    ) -> Result<AnalysisResult, EngineError> {
        (**self).analyze(moves, think_time)
    }

    fn new_game(&self) -> Result<(), EngineError> {
        (**self).new_game()
    }

    fn close(&self) {
        (**self).close()
    }
}

type Conversation = UciClient<Box<dyn BufRead + Send>, Box<dyn Write + Send>>;

struct Channel {
    client: Option<Conversation>,
    child: Option<Child>,
}

/// One external engine, driven synchronously over its standard streams.
///
/// All requests go through one lock: a second caller blocks until the
/// first request has read its final line.
pub struct EngineBridge {
    channel: Mutex<Channel>,
    state: Mutex<BridgeState>,
    name: String,
}

impl EngineBridge {
    /// Spawn the engine at `path` and complete the handshake.
    ///
    /// # Errors
    ///
    /// - `EngineError::NotFound` if the path doesn't exist
    /// - `EngineError::Spawn` if the process fails to start
    /// - `EngineError::Startup` if the handshake does not complete
    pub fn launch(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EngineError::NotFound(path.display().to_string()));
        }

        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(EngineError::Spawn)?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                terminate(&mut child);
                return Err(EngineError::Startup("engine streams unavailable".to_string()));
            }
        };
        info!(path = %path.display(), pid = child.id(), "engine process spawned");

        let client = UciClient::new(
            Box::new(BufReader::new(stdout)) as Box<dyn BufRead + Send>,
            Box::new(stdin) as Box<dyn Write + Send>,
        );
        Self::start(client, Some(child))
    }

    /// Run the protocol over arbitrary streams instead of a child process.
    pub fn with_streams<R, W>(reader: R, writer: W) -> Result<Self, EngineError>
    where
        R: BufRead + Send + 'static,
        W: Write + Send + 'static,
    {
        let client = UciClient::new(
            Box::new(reader) as Box<dyn BufRead + Send>,
            Box::new(writer) as Box<dyn Write + Send>,
        );
        Self::start(client, None)
    }

    fn start(mut client: Conversation, mut child: Option<Child>) -> Result<Self, EngineError> {
        let name = match handshake(&mut client) {
            Ok(name) => name,
            Err(reason) => {
                warn!(%reason, "engine handshake failed");
                drop(client);
                if let Some(child) = child.as_mut() {
                    terminate(child);
                }
                return Err(EngineError::Startup(reason));
            }
        };
        info!(engine = %name, "engine ready");

        Ok(Self {
            channel: Mutex::new(Channel {
                client: Some(client),
                child,
            }),
            state: Mutex::new(BridgeState::Ready),
            name,
        })
    }

    /// The engine's name as reported by `id name`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> BridgeState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: BridgeState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn channel(&self) -> MutexGuard<'_, Channel> {
        self.channel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one exclusive exchange with the engine.
    fn exchange<T>(
        &self,
        f: impl FnOnce(&mut Conversation) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut channel = self.channel();
        let client = channel.client.as_mut().ok_or(EngineError::Closed)?;
        self.set_state(BridgeState::Busy);
        let outcome = f(client);
        self.set_state(BridgeState::Ready);
        outcome
    }

    /// Send `setoption`. The engine does not acknowledge options, so only
    /// a failed write is reported.
    pub fn configure(&self, name: &str, value: impl ToString) -> Result<(), EngineError> {
        let cmd = GuiCommand::set_option(name, value);
        self.exchange(|client| {
            send(client, &cmd).map_err(|e| {
                warn!(option = name, error = %e, "failed to configure engine");
                EngineError::Configuration {
                    name: name.to_string(),
                    reason: e.to_string(),
                }
            })
        })
    }

    /// Set `Skill Level`, clamped to 0–20.
    pub fn set_skill_level(&self, level: i32) -> Result<(), EngineError> {
        self.configure("Skill Level", level.clamp(0, 20))
    }

    pub fn set_limit_strength(&self, enabled: bool) -> Result<(), EngineError> {
        self.configure("UCI_LimitStrength", enabled)
    }

    /// Set `UCI_Elo`, clamped to 800–2800. Only honoured with `UCI_LimitStrength` on.
    pub fn set_target_elo(&self, elo: u32) -> Result<(), EngineError> {
        self.configure("UCI_Elo", elo.clamp(800, 2800))
    }

    /// Start a fresh game and wait until the engine is ready again.
    pub fn new_game(&self) -> Result<(), EngineError> {
        self.exchange(|client| {
            send(client, &GuiCommand::UciNewGame).map_err(communication)?;
            send(client, &GuiCommand::IsReady).map_err(communication)?;
            wait_for(client, "readyok").map_err(EngineError::Communication)?;
            Ok(())
        })
    }

    /// Search the position reached by `moves` for `think_time` and report the
    /// last score and principal variation seen before `bestmove`.
    pub fn analyze(
        &self,
        moves: &[String],
        think_time: Duration,
    ) -> Result<AnalysisResult, EngineError> {
        let position = GuiCommand::Position {
            moves: moves.to_vec(),
        };
        let movetime = u64::try_from(think_time.as_millis()).unwrap_or(u64::MAX).max(1);

        self.exchange(|client| {
            send(client, &position).map_err(communication)?;
            send(client, &GuiCommand::Go { movetime }).map_err(communication)?;

            let mut result = AnalysisResult::default();
            loop {
                let line = client
                    .read_line()
                    .map_err(communication)?
                    .ok_or_else(|| {
                        EngineError::Communication("stream closed before bestmove".to_string())
                    })?;
                debug!(recv = %line);
                match EngineMessage::parse(&line) {
                    EngineMessage::Info(info) => result.record(&info),
                    EngineMessage::BestMove { mv, .. } => {
                        result.best_move = mv;
                        return Ok(result);
                    }
                    _ => {}
                }
            }
        })
    }

    /// Send `quit` and release the process. Safe to call more than once.
    pub fn close(&self) {
        let mut channel = self.channel();
        if let Some(mut client) = channel.client.take() {
            if let Err(e) = send(&mut client, &GuiCommand::Quit) {
                debug!(error = %e, "quit not delivered");
            }
            drop(client);
        }
        if let Some(mut child) = channel.child.take() {
            terminate(&mut child);
        }
        if self.state() != BridgeState::Closed {
            self.set_state(BridgeState::Closed);
            info!(engine = %self.name, "engine closed");
        }
    }
}

impl PositionAnalyzer for EngineBridge {
    fn analyze(
        &self,
        moves: &[String],
        think_time: Duration,
    ) -> Result<AnalysisResult, EngineError> {
        EngineBridge::analyze(self, moves, think_time)
    }

    fn new_game(&self) -> Result<(), EngineError> {
        EngineBridge::new_game(self)
    }

    fn close(&self) {
        EngineBridge::close(self)
    }
}

impl Drop for EngineBridge {
    fn drop(&mut self) {
        self.close();
    }
}

fn send(client: &mut Conversation, cmd: &GuiCommand) -> Result<(), UciError> {
    debug!(send = %cmd);
    client.send(cmd)
}

fn communication(e: UciError) -> EngineError {
    EngineError::Communication(e.to_string())
}

/// `uci` / `uciok`, `isready` / `readyok`, then `ucinewgame`. Returns the engine name.
fn handshake(client: &mut Conversation) -> Result<String, String> {
    send(client, &GuiCommand::Uci).map_err(|e| e.to_string())?;
    let name = wait_for(client, "uciok")?;
    send(client, &GuiCommand::IsReady).map_err(|e| e.to_string())?;
    wait_for(client, "readyok")?;
    send(client, &GuiCommand::UciNewGame).map_err(|e| e.to_string())?;
    Ok(name.unwrap_or_else(|| "Unknown Engine".to_string()))
}

/// Read until `keyword` arrives, returning any `id name` seen on the way.
fn wait_for(client: &mut Conversation, keyword: &str) -> Result<Option<String>, String> {
    let mut name = None;
    for _ in 0..MAX_UCI_LINES {
        let line = client
            .read_line()
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("stream closed while waiting for {}", keyword))?;
        debug!(recv = %line);
        match EngineMessage::parse(&line) {
            EngineMessage::IdName(id) => name = Some(id),
            _ if line.trim() == keyword => return Ok(name),
            _ => {}
        }
    }
    Err(format!("no {} within {} lines", keyword, MAX_UCI_LINES))
}

fn terminate(child: &mut Child) {
    if !matches!(child.try_wait(), Ok(Some(_))) {
        let _ = child.kill();
    }
    let _ = child.wait();
}
