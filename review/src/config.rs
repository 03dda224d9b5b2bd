//! Tunable knobs for the review pipeline.
//!
//! Every number the classification cascade compares against lives here, so a
//! deployment can pick its own profile. The defaults are the depth-18
//! profile. All values are env-overridable through `from_env`.

use std::time::Duration;

/// Centipawn-loss boundaries of the fallback loss-to-marker table.
#[derive(Debug, Clone)]
pub struct Thresholds {
    pub best: i32,
    pub great: i32,
    pub good: i32,
    pub inaccuracy: i32,
    pub miss: i32,
    pub mistake: i32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            best: 15,
            great: 30,
            good: 50,
            inaccuracy: 100,
            miss: 150,
            mistake: 250,
        }
    }
}

/// "Still winning" cutoffs differ between detectors on purpose; they are not
/// to be unified.
#[derive(Debug, Clone)]
pub struct StillWinning {
    pub blunder: i32,
    pub mistake: i32,
    pub brilliant: i32,
}

impl Default for StillWinning {
    fn default() -> Self {
        Self {
            blunder: 200,
            mistake: 150,
            brilliant: 300,
        }
    }
}

/// Depth schedule as a function of ply index.
#[derive(Debug, Clone)]
pub struct ProgressiveDepth {
    pub start: u32,
    pub increment: u32,
    pub every: u32,
    pub min: u32,
    pub max: u32,
}

impl Default for ProgressiveDepth {
    fn default() -> Self {
        Self {
            start: 12,
            increment: 2,
            every: 8,
            min: 10,
            max: 18,
        }
    }
}

impl ProgressiveDepth {
    pub fn depth_for(&self, ply_index: usize) -> u32 {
        let steps = (ply_index as u32) / self.every.max(1);
        (self.start + self.increment * steps).clamp(self.min, self.max)
    }
}

/// Limits for the puzzle solution generator.
#[derive(Debug, Clone)]
pub struct SolutionConfig {
    pub depth: u32,
    pub max_moves: usize,
    pub timeout: Duration,
}

impl Default for SolutionConfig {
    fn default() -> Self {
        Self {
            depth: 18,
            max_moves: 8,
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReviewConfig {
    pub thresholds: Thresholds,
    pub still_winning: StillWinning,
    pub progressive: ProgressiveDepth,
    /// Per-attempt analysis timeout; the retry wrapper scales it.
    pub analysis_timeout: Duration,
    pub movetime_ms: Option<u64>,
    pub max_book_moves: u32,
    /// Depth floor after retries; invariant: no non-book evaluation below it.
    pub min_depth: u32,
    pub retry_attempts: u32,
    /// Multiplier applied to cp loss on plies 1..=8.
    pub early_ply_forgiveness: f64,
    pub winner_loss_factor: f64,
    pub loser_loss_factor: f64,
    pub max_centipawn_loss: i32,
    /// Top-two gap under which a puzzle answer stops being unique.
    pub unique_move_threshold: i32,
    pub min_quality_score: u32,
    pub solution: SolutionConfig,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            still_winning: StillWinning::default(),
            progressive: ProgressiveDepth::default(),
            analysis_timeout: Duration::from_secs(8),
            movetime_ms: None,
            max_book_moves: 25,
            min_depth: 6,
            retry_attempts: 3,
            early_ply_forgiveness: 0.95,
            winner_loss_factor: 0.9,
            loser_loss_factor: 1.1,
            max_centipawn_loss: 1000,
            unique_move_threshold: 75,
            min_quality_score: 50,
            solution: SolutionConfig::default(),
        }
    }
}

impl ReviewConfig {
    /// Read overrides from the environment.
    ///
    /// Recognised variables: `GAMEREVIEW_DEPTH_START`, `GAMEREVIEW_DEPTH_MAX`,
    /// `GAMEREVIEW_MOVETIME_MS`, `GAMEREVIEW_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(start) = env_parse("GAMEREVIEW_DEPTH_START") {
            config.progressive.start = start;
        }
        if let Some(max) = env_parse("GAMEREVIEW_DEPTH_MAX") {
            config.progressive.max = max;
        }
        if let Some(ms) = env_parse("GAMEREVIEW_MOVETIME_MS") {
            config.movetime_ms = Some(ms);
        }
        if let Some(ms) = env_parse("GAMEREVIEW_TIMEOUT_MS") {
            config.analysis_timeout = Duration::from_millis(ms);
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
