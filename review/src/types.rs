//! Data model of the review pipeline: markers, evaluations, results,
//! puzzles, and the JSON event shapes emitted to hosts.

use std::time::{SystemTime, UNIX_EPOCH};

use chess::{PieceColor, ReplayedMove};
use serde::Serialize;

/// The closed set of move labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerType {
    Book,
    Brilliant,
    Great,
    Best,
    Good,
    Inaccuracy,
    Miss,
    Mistake,
    Blunder,
}

impl MarkerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Brilliant => "brilliant",
            Self::Great => "great",
            Self::Best => "best",
            Self::Good => "good",
            Self::Inaccuracy => "inaccuracy",
            Self::Miss => "miss",
            Self::Mistake => "mistake",
            Self::Blunder => "blunder",
        }
    }
}

impl std::fmt::Display for MarkerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified ply. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveEvaluation {
    /// FEN of the position the move was played from.
    pub fen: String,
    pub move_san: String,
    pub eval_before: i32,
    pub eval_after: i32,
    /// Engine best move in UCI.
    pub best_move: String,
    pub best_move_san: String,
    pub marker: MarkerType,
    pub centipawn_loss: i32,
    pub depth: u32,
    pub timestamp: u64,
}

/// Marker counts for one game.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerSummary {
    pub book: u32,
    pub brilliant: u32,
    pub great: u32,
    pub best: u32,
    pub good: u32,
    pub inaccuracy: u32,
    pub miss: u32,
    pub mistake: u32,
    pub blunder: u32,
}

impl MarkerSummary {
    pub fn record(&mut self, marker: MarkerType) {
        match marker {
            MarkerType::Book => self.book += 1,
            MarkerType::Brilliant => self.brilliant += 1,
            MarkerType::Great => self.great += 1,
            MarkerType::Best => self.best += 1,
            MarkerType::Good => self.good += 1,
            MarkerType::Inaccuracy => self.inaccuracy += 1,
            MarkerType::Miss => self.miss += 1,
            MarkerType::Mistake => self.mistake += 1,
            MarkerType::Blunder => self.blunder += 1,
        }
    }

    pub fn count(&self, marker: MarkerType) -> u32 {
        match marker {
            MarkerType::Book => self.book,
            MarkerType::Brilliant => self.brilliant,
            MarkerType::Great => self.great,
            MarkerType::Best => self.best,
            MarkerType::Good => self.good,
            MarkerType::Inaccuracy => self.inaccuracy,
            MarkerType::Miss => self.miss,
            MarkerType::Mistake => self.mistake,
            MarkerType::Blunder => self.blunder,
        }
    }

    pub fn total(&self) -> u32 {
        self.book
            + self.brilliant
            + self.great
            + self.best
            + self.good
            + self.inaccuracy
            + self.miss
            + self.mistake
            + self.blunder
    }
}

/// Per-side accuracy on the 0–100 scale.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Accuracy {
    pub white: f64,
    pub black: f64,
}

/// Everything the review of one game produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    pub accuracy: Accuracy,
    pub summary: MarkerSummary,
    pub total_moves: u32,
    /// Evaluations in ply order; each entry is keyed by its `fen` (the
    /// position before the move).
    pub evaluations: Vec<MoveEvaluation>,
}

/// One ply of the input game.
#[derive(Debug, Clone)]
pub struct RecordedMove {
    pub san: String,
    pub uci: String,
    pub fen_before: String,
    pub fen_after: String,
}

impl From<ReplayedMove> for RecordedMove {
    fn from(mv: ReplayedMove) -> Self {
        Self {
            san: mv.san,
            uci: mv.uci,
            fen_before: mv.fen_before,
            fen_after: mv.fen_after,
        }
    }
}

/// A parsed game, ready for review.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub start_fen: String,
    pub moves: Vec<RecordedMove>,
    pub winner: Option<PieceColor>,
    pub opening: Option<String>,
    pub rating: Option<u32>,
}

impl GameRecord {
    pub fn new(start_fen: String, moves: Vec<RecordedMove>) -> Self {
        Self {
            start_fen,
            moves,
            winner: None,
            opening: None,
            rating: None,
        }
    }
}

/// Per-move event payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveReport {
    pub move_number: u32,
    pub fen: String,
    #[serde(rename = "move")]
    pub move_san: String,
    pub marker_type: MarkerType,
    pub centipawn_loss: i32,
    pub evaluation_before: i32,
    pub evaluation_after: i32,
    pub best_move: String,
}

/// The event stream a host consumes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReviewEvent {
    #[serde(rename_all = "camelCase")]
    Progress {
        current_move: u32,
        total_moves: u32,
        percentage: f64,
    },
    Move(MoveReport),
    #[serde(rename_all = "camelCase")]
    Complete {
        review_id: String,
        accuracy: Accuracy,
        summary: MarkerSummary,
        total_moves: u32,
    },
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
}

/// One step of a puzzle solution line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionMove {
    pub uci: String,
    pub is_user_move: bool,
    pub fen_before_this_move: String,
}

/// A teaching puzzle mined from the review.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Puzzle {
    pub fen: String,
    /// The move that was actually played, UCI.
    pub played: String,
    /// The engine's best move, UCI.
    pub best: String,
    pub cp_loss: i32,
    pub marker: MarkerType,
    pub move_number: u32,
    pub player_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u32>,
    pub is_positive: bool,
    pub is_missed_tactic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tactical_theme: Option<String>,
    pub material_gain: i32,
    pub solution: Vec<SolutionMove>,
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
