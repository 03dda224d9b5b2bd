pub mod pool;
pub mod uci;
pub mod worker;

pub use pool::{EnginePool, PoolStatus, WorkerStatus};
pub use uci::{UciError, UciMessage};
pub use worker::{EngineWorker, WorkerState};

use std::time::Duration;

/// Scores at or beyond this magnitude encode a forced mate.
pub const MATE_THRESHOLD: i32 = 97_000;

/// Base of the mate encoding: mate-in-N maps to `±(100_000 - 100·N)`.
pub const MATE_SCORE_BASE: i32 = 100_000;

/// Convert a raw UCI `score mate V` into the project's centipawn encoding.
pub fn encode_mate_score(mate_in: i32) -> i32 {
    if mate_in >= 0 {
        MATE_SCORE_BASE - 100 * mate_in
    } else {
        -MATE_SCORE_BASE - 100 * mate_in
    }
}

/// One engine line: a candidate move with its centipawn score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopMove {
    pub uci: String,
    pub cp: i32,
}

/// The result of analysing one position.
///
/// Scores are in the perspective of the side to move, exactly as the engine
/// reports them; the review driver normalises to White's perspective.
#[derive(Debug, Clone, Default)]
pub struct EngineAnalysis {
    pub evaluation: i32,
    pub best_move: String,
    pub top_moves: Vec<TopMove>,
    pub depth: u32,
}

/// Per-request analysis limits.
#[derive(Debug, Clone)]
pub struct AnalyzeOpts {
    pub depth: Option<u32>,
    pub movetime_ms: Option<u64>,
    pub timeout: Duration,
}

impl Default for AnalyzeOpts {
    fn default() -> Self {
        Self {
            depth: None,
            movetime_ms: None,
            timeout: Duration::from_secs(8),
        }
    }
}

impl AnalyzeOpts {
    pub fn depth(depth: u32) -> Self {
        Self {
            depth: Some(depth),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Configuration for the engine binary and the worker fleet.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub engine_path: String,
    pub pool_size: usize,
    pub hash_mb: u32,
    pub threads: u32,
    pub multipv: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            engine_path: "/usr/games/stockfish".to_string(),
            pool_size: 4,
            hash_mb: 128,
            threads: 1,
            multipv: 3,
        }
    }
}

impl EngineSettings {
    /// Read settings from the environment, falling back to defaults.
    ///
    /// Recognised variables: `GAMEREVIEW_ENGINE_PATH`, `GAMEREVIEW_POOL_SIZE`,
    /// `GAMEREVIEW_HASH_MB`, `GAMEREVIEW_THREADS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            engine_path: std::env::var("GAMEREVIEW_ENGINE_PATH")
                .unwrap_or(defaults.engine_path),
            pool_size: env_parse("GAMEREVIEW_POOL_SIZE", defaults.pool_size),
            hash_mb: env_parse("GAMEREVIEW_HASH_MB", defaults.hash_mb),
            threads: env_parse("GAMEREVIEW_THREADS", defaults.threads),
            multipv: defaults.multipv,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Everything that can go wrong talking to the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Failed to spawn engine process: {0}")]
    SpawnFailed(String),
    #[error("Engine did not complete the UCI handshake in time")]
    HandshakeTimeout,
    #[error("Analysis exceeded its timeout")]
    AnalysisTimeout,
    #[error("Worker is not ready to accept an analysis")]
    WorkerUnavailable,
    #[error("Engine process exited unexpectedly")]
    ProcessExited,
    #[error("Engine produced invalid output: {0}")]
    InvalidOutput(String),
    #[error("No live workers remain in the pool")]
    PoolExhausted,
    #[error("Pool has been disposed")]
    PoolDisposed,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Errors that do not invalidate the worker: it can serve the next
    /// request after them.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::AnalysisTimeout | Self::InvalidOutput(_) | Self::WorkerUnavailable
        )
    }
}
