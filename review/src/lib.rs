//! Game review core: engine-driven move classification, accuracy, tactical
//! themes, puzzle extraction and solution generation.

pub mod book;
pub mod brilliant;
pub mod classify;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod mate;
pub mod orchestrator;
pub mod puzzles;
pub mod sacrifice;
pub mod score;
pub mod solution;
pub mod themes;
pub mod top_move;
pub mod types;

pub use config::{ProgressiveDepth, ReviewConfig, SolutionConfig, StillWinning, Thresholds};
pub use driver::{review_game, AnalysisProvider, Cancelled, ReviewOptions};
pub use error::ReviewError;
pub use orchestrator::{classify_move, Classification};
pub use puzzles::{extract_puzzles, PuzzleCandidates};
pub use solution::{generate_solution, quality_score, solve_puzzles};
pub use types::{
    Accuracy, GameRecord, MarkerSummary, MarkerType, MoveEvaluation, MoveReport, Puzzle,
    RecordedMove, ReviewEvent, ReviewResult, SolutionMove,
};
