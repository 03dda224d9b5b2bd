//! Tactical theme detection on a candidate move.
//!
//! Each theme is a zero-sized detector implementing [`ThemeDetector`]. The
//! pipeline evaluates them in a fixed priority order and stops at the first
//! match, falling back to a low-confidence `winningMaterial` tag.

pub mod attack_map;
pub mod back_rank;
pub mod deflection;
pub mod discovered;
pub mod double_check;
pub mod fork;
pub mod helpers;
pub mod material;
pub mod pin_skewer;
pub mod smothered;
pub mod trapped;
pub mod zwischenzug;

use cozy_chess::{Board, Color, Move, Piece};

pub use attack_map::{AttackMap, Attacker};

use back_rank::BackRankDetector;
use deflection::DeflectionDetector;
use discovered::DiscoveredAttackDetector;
use double_check::DoubleCheckDetector;
use fork::ForkDetector;
use material::{MateThreatDetector, WinningMaterialDetector};
use pin_skewer::PinSkewerDetector;
use smothered::SmotheredMateDetector;
use trapped::TrappedPieceDetector;
use zwischenzug::ZwischenzugDetector;

/// The recognised tactical themes, ordered by detection priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Theme {
    SmotheredMate,
    BackRankMate,
    DoubleCheck,
    DiscoveredAttack,
    Deflection,
    Fork,
    Pin,
    Skewer,
    TrappedPiece,
    Zwischenzug,
    MateThreat,
    WinningMaterial,
}

impl Theme {
    /// Wire tag, camelCase as downstream consumers expect.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::SmotheredMate => "smotheredMate",
            Self::BackRankMate => "backRankMate",
            Self::DoubleCheck => "doubleCheck",
            Self::DiscoveredAttack => "discoveredAttack",
            Self::Deflection => "deflection",
            Self::Fork => "fork",
            Self::Pin => "pin",
            Self::Skewer => "skewer",
            Self::TrappedPiece => "trappedPiece",
            Self::Zwischenzug => "zwischenzug",
            Self::MateThreat => "mate",
            Self::WinningMaterial => "winning_material",
        }
    }
}

/// A detected theme with a 0–100 confidence and a short description.
#[derive(Debug, Clone)]
pub struct ThemeMatch {
    pub theme: Theme,
    pub confidence: u8,
    pub description: String,
}

/// Pre-computed context passed to every theme detector.
pub struct ThemeContext {
    pub before: Board,
    pub after: Board,
    pub mv: Move,
    pub moved_piece: Piece,
    pub captured: Option<Piece>,
    pub mover: Color,
    pub before_attacks: AttackMap,
    pub after_attacks: AttackMap,
    /// White-perspective evaluations, when the caller has them.
    pub eval_before: Option<i32>,
    pub eval_after: Option<i32>,
}

impl ThemeContext {
    pub fn build(
        fen_before: &str,
        candidate_uci: &str,
        eval_before: Option<i32>,
        eval_after: Option<i32>,
    ) -> Option<Self> {
        let before: Board = fen_before.parse().ok()?;
        let mv = chess::parse_uci_on(&before, candidate_uci).ok()?;

        let moved_piece = before.piece_on(mv.from)?;
        let mover = before.side_to_move();
        let en_passant = moved_piece == Piece::Pawn
            && mv.from.file() != mv.to.file()
            && before.piece_on(mv.to).is_none();
        let captured = if en_passant {
            Some(Piece::Pawn)
        } else {
            match (before.piece_on(mv.to), before.color_on(mv.to)) {
                (Some(p), Some(c)) if c != mover => Some(p),
                _ => None,
            }
        };

        let mut after = before.clone();
        after.try_play(mv).ok()?;

        let before_attacks = AttackMap::compute(&before);
        let after_attacks = AttackMap::compute(&after);

        Some(Self {
            before,
            after,
            mv,
            moved_piece,
            captured,
            mover,
            before_attacks,
            after_attacks,
            eval_before,
            eval_after,
        })
    }

    /// The opponent of the side that played the candidate move.
    pub fn opponent(&self) -> Color {
        !self.mover
    }

    /// Evaluation swing in the mover's perspective, if both evals are known.
    pub fn eval_swing(&self) -> Option<i32> {
        let (before, after) = (self.eval_before?, self.eval_after?);
        Some(match self.mover {
            Color::White => after - before,
            Color::Black => before - after,
        })
    }
}

/// A modular tactical theme detector.
pub trait ThemeDetector {
    fn detect(&self, ctx: &ThemeContext) -> Option<ThemeMatch>;
}

/// Run the prioritized detector list on a candidate move; the first match
/// wins. Returns `None` only when the FEN or move cannot be interpreted.
pub fn detect_theme(
    fen_before: &str,
    candidate_uci: &str,
    eval_before: Option<i32>,
    eval_after: Option<i32>,
) -> Option<ThemeMatch> {
    let ctx = ThemeContext::build(fen_before, candidate_uci, eval_before, eval_after)?;

    let detectors: Vec<Box<dyn ThemeDetector>> = vec![
        Box::new(SmotheredMateDetector),
        Box::new(BackRankDetector),
        Box::new(DoubleCheckDetector),
        Box::new(DiscoveredAttackDetector),
        Box::new(DeflectionDetector),
        Box::new(ForkDetector),
        Box::new(PinSkewerDetector),
        Box::new(TrappedPieceDetector),
        Box::new(ZwischenzugDetector),
        Box::new(WinningMaterialDetector),
        Box::new(MateThreatDetector),
    ];

    for detector in &detectors {
        if let Some(found) = detector.detect(&ctx) {
            return Some(found);
        }
    }

    Some(ThemeMatch {
        theme: Theme::WinningMaterial,
        confidence: 30,
        description: "material advantage".to_string(),
    })
}

/// Material gained by the candidate move: the captured piece's value, or the
/// evaluation swing when both evals are given, whichever is larger.
pub fn material_gain(
    fen: &str,
    candidate_uci: &str,
    eval_before: Option<i32>,
    eval_after: Option<i32>,
) -> i32 {
    let Some(ctx) = ThemeContext::build(fen, candidate_uci, eval_before, eval_after) else {
        return 0;
    };
    let captured = ctx.captured.map(helpers::piece_value).unwrap_or(0);
    let swing = ctx.eval_swing().unwrap_or(0);
    captured.max(swing).max(0)
}
