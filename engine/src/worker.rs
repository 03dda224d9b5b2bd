//! One supervised UCI engine subprocess.
//!
//! A worker owns exactly one child process and accepts one analysis at a
//! time. Protocol state lives in the worker; a background task reads stdout
//! and forwards parsed messages over a channel.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin};
use tokio::sync::mpsc;
use tokio::time::{timeout, Instant};

use crate::uci::{parse_uci_message, UciMessage, UciScore};
use crate::{encode_mate_score, AnalyzeOpts, EngineAnalysis, EngineError, EngineSettings, TopMove};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const QUIT_GRACE: Duration = Duration::from_secs(2);
const STOP_DRAIN: Duration = Duration::from_secs(1);
const DEFAULT_GO_DEPTH: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Initializing,
    Ready,
    Busy,
    Failed,
    Disposed,
}

pub struct EngineWorker {
    id: usize,
    child: Child,
    stdin: ChildStdin,
    events: mpsc::UnboundedReceiver<UciMessage>,
    state: WorkerState,
}

/// Latest line seen for one multipv slot.
#[derive(Debug, Clone)]
struct PvLine {
    uci: String,
    cp: i32,
}

impl EngineWorker {
    /// Spawn the engine binary and run the UCI handshake.
    pub async fn spawn(id: usize, settings: &EngineSettings) -> Result<Self, EngineError> {
        tracing::info!(worker_id = id, path = %settings.engine_path, "Spawning engine worker");

        let mut child = tokio::process::Command::new(&settings.engine_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::SpawnFailed(e.to_string()))?;

        let stdin = child.stdin.take().ok_or(EngineError::ProcessExited)?;
        let stdout = child.stdout.take().ok_or(EngineError::ProcessExited)?;

        let (event_tx, events) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout).lines();
            loop {
                match reader.next_line().await {
                    Ok(Some(line)) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        tracing::trace!(worker_id = id, "UCI << {}", trimmed);
                        match parse_uci_message(trimmed) {
                            Ok(msg) => {
                                if event_tx.send(msg).is_err() {
                                    break;
                                }
                            }
                            Err(_) => {
                                // Engines emit option lists and banners we
                                // have no use for.
                                tracing::trace!(worker_id = id, "Ignoring UCI line: {}", trimmed);
                            }
                        }
                    }
                    Ok(None) => {
                        tracing::warn!(worker_id = id, "Engine stdout closed");
                        break;
                    }
                    Err(e) => {
                        tracing::error!(worker_id = id, "Error reading engine stdout: {}", e);
                        break;
                    }
                }
            }
        });

        let mut worker = Self {
            id,
            child,
            stdin,
            events,
            state: WorkerState::Initializing,
        };

        worker.send_line("uci").await?;
        worker
            .wait_for(HANDSHAKE_TIMEOUT, |msg| matches!(msg, UciMessage::UciOk))
            .await
            .map_err(|_| EngineError::HandshakeTimeout)?;

        for (name, value) in [
            ("Hash", settings.hash_mb.to_string()),
            ("Threads", settings.threads.to_string()),
            ("MultiPV", settings.multipv.to_string()),
        ] {
            worker
                .send_line(&format!("setoption name {} value {}", name, value))
                .await?;
        }

        worker.send_line("isready").await?;
        worker
            .wait_for(HANDSHAKE_TIMEOUT, |msg| matches!(msg, UciMessage::ReadyOk))
            .await
            .map_err(|_| EngineError::HandshakeTimeout)?;

        worker.state = WorkerState::Ready;
        tracing::info!(worker_id = id, "Engine worker ready");
        Ok(worker)
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Analyse one position. The worker must be Ready.
    pub async fn analyze(
        &mut self,
        fen: &str,
        opts: &AnalyzeOpts,
    ) -> Result<EngineAnalysis, EngineError> {
        if self.state != WorkerState::Ready {
            return Err(EngineError::WorkerUnavailable);
        }
        self.state = WorkerState::Busy;

        let result = self.run_analysis(fen, opts).await;

        // A failed transport leaves the worker unusable; anything else and it
        // can serve the next request.
        self.state = match &result {
            Err(e) if !e.is_transient() => WorkerState::Failed,
            _ => WorkerState::Ready,
        };
        result
    }

    async fn run_analysis(
        &mut self,
        fen: &str,
        opts: &AnalyzeOpts,
    ) -> Result<EngineAnalysis, EngineError> {
        self.send_line(&format!("position fen {}", fen)).await?;

        let go = match (opts.depth, opts.movetime_ms) {
            (Some(depth), _) => format!("go depth {}", depth),
            (None, Some(ms)) => format!("go movetime {}", ms),
            (None, None) => format!("go depth {}", DEFAULT_GO_DEPTH),
        };
        self.send_line(&go).await?;

        let deadline = Instant::now() + opts.timeout;
        let mut lines: BTreeMap<u32, PvLine> = BTreeMap::new();
        let mut max_depth: u32 = 0;
        let mut best_move: Option<String> = None;

        loop {
            let received = tokio::time::timeout_at(deadline, self.events.recv()).await;
            let msg = match received {
                Ok(Some(msg)) => msg,
                Ok(None) => return Err(EngineError::ProcessExited),
                Err(_) => {
                    // Tell the engine to wrap up and drain its bestmove so
                    // the next request starts on a clean protocol state.
                    let _ = self.send_line("stop").await;
                    let _ = self
                        .wait_for(STOP_DRAIN, |msg| matches!(msg, UciMessage::BestMove { .. }))
                        .await;
                    return Err(EngineError::AnalysisTimeout);
                }
            };

            match msg {
                UciMessage::Info(info) => {
                    if let Some(depth) = info.depth {
                        max_depth = max_depth.max(depth);
                    }
                    if let (Some(score), false) = (info.score, info.pv.is_empty()) {
                        let cp = match score {
                            UciScore::Centipawns(cp) => cp,
                            UciScore::Mate(m) => encode_mate_score(m),
                        };
                        let slot = info.multipv.unwrap_or(1);
                        lines.insert(
                            slot,
                            PvLine {
                                uci: info.pv[0].clone(),
                                cp,
                            },
                        );
                    }
                }
                UciMessage::BestMove { uci, .. } => {
                    best_move = uci;
                    break;
                }
                _ => {}
            }
        }

        let principal = lines
            .get(&1)
            .ok_or_else(|| EngineError::InvalidOutput("no principal variation".to_string()))?
            .clone();

        let top_moves: Vec<TopMove> = lines
            .range(1..=3)
            .map(|(_, line)| TopMove {
                uci: line.uci.clone(),
                cp: line.cp,
            })
            .collect();

        Ok(EngineAnalysis {
            evaluation: principal.cp,
            best_move: best_move.unwrap_or_else(|| principal.uci.clone()),
            top_moves,
            depth: max_depth,
        })
    }

    /// Interrupt the current search, if any.
    pub async fn stop(&mut self) -> Result<(), EngineError> {
        self.send_line("stop").await
    }

    /// Quit politely, then kill after a grace period.
    pub async fn dispose(mut self) {
        self.state = WorkerState::Disposed;
        let _ = self.send_line("quit").await;
        let _ = timeout(QUIT_GRACE, self.child.wait()).await;
        let _ = self.child.start_kill();
    }

    async fn send_line(&mut self, line: &str) -> Result<(), EngineError> {
        tracing::trace!(worker_id = self.id, "UCI >> {}", line);
        if let Err(e) = write_line(&mut self.stdin, line).await {
            self.state = WorkerState::Failed;
            return Err(EngineError::Io(e));
        }
        Ok(())
    }

    async fn wait_for(
        &mut self,
        limit: Duration,
        mut predicate: impl FnMut(&UciMessage) -> bool,
    ) -> Result<UciMessage, EngineError> {
        let deadline = Instant::now() + limit;
        loop {
            match tokio::time::timeout_at(deadline, self.events.recv()).await {
                Ok(Some(msg)) if predicate(&msg) => return Ok(msg),
                Ok(Some(_)) => continue,
                Ok(None) => return Err(EngineError::ProcessExited),
                Err(_) => return Err(EngineError::AnalysisTimeout),
            }
        }
    }
}

async fn write_line(stdin: &mut ChildStdin, line: &str) -> std::io::Result<()> {
    stdin.write_all(line.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await
}

impl Drop for EngineWorker {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
    }
}
