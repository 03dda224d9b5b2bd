//! Per-ply context construction and the raw centipawn-loss calculator.

use chess::{PieceColor, Position, VerboseMove};
use engine::{EngineAnalysis, TopMove};

use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::score::{is_mate, is_mate_for_player, to_player_perspective};

/// Everything the classification cascade needs to know about one ply.
/// Built once, immutable afterwards.
#[derive(Debug, Clone)]
pub struct MoveContext {
    pub fen_before: String,
    pub fen_after: String,
    /// False when applying the played move failed and `fen_after` fell back
    /// to `fen_before`; detectors needing the after-position degrade then.
    pub fen_after_valid: bool,
    pub played: VerboseMove,
    pub played_uci: String,
    pub is_white_move: bool,
    /// White-perspective evaluations.
    pub eval_before: i32,
    pub eval_after: i32,
    /// Evaluation the player would have kept by playing the engine's best.
    pub eval_if_best_move: i32,
    pub is_eval_if_best_unreliable: bool,
    pub best_move_uci: String,
    pub is_in_top_moves: bool,
    pub move_number: u32,
    pub top_moves: Vec<TopMove>,
    pub top_moves_after: Vec<TopMove>,
}

impl MoveContext {
    pub fn player_eval_before(&self) -> i32 {
        to_player_perspective(self.eval_before, self.is_white_move)
    }

    pub fn player_eval_after(&self) -> i32 {
        to_player_perspective(self.eval_after, self.is_white_move)
    }

    pub fn player_eval_if_best(&self) -> i32 {
        to_player_perspective(self.eval_if_best_move, self.is_white_move)
    }

    pub fn player_color(&self) -> PieceColor {
        if self.is_white_move {
            PieceColor::White
        } else {
            PieceColor::Black
        }
    }

    /// Position before the move. Context construction proved it parses.
    pub fn position_before(&self) -> Option<Position> {
        Position::from_fen(&self.fen_before).ok()
    }

    /// Only one legal reply existed before this move.
    pub fn was_forced(&self) -> bool {
        self.position_before()
            .map(|p| p.is_forced())
            .unwrap_or(false)
    }
}

/// Build the per-ply context from the two engine analyses.
///
/// `analysis_before` and `analysis_after` must already be normalized to
/// White's perspective.
pub fn build_context(
    fen_before: &str,
    played_uci: &str,
    analysis_before: &EngineAnalysis,
    analysis_after: &EngineAnalysis,
    move_number: u32,
) -> Result<MoveContext, ReviewError> {
    let position = Position::from_fen(fen_before)
        .map_err(|_| ReviewError::invalid_input(format!("bad FEN: {fen_before}")))?;
    let is_white_move = position.side_to_move() == PieceColor::White;

    let played = position
        .find_uci(played_uci)
        .ok_or_else(|| ReviewError::invalid_input(format!("illegal move {played_uci}")))?;

    // Applying the move may still fail on pathological inputs; fall back to
    // the before-position and let downstream detectors degrade.
    let (fen_after, fen_after_valid) = match position.apply(played.mv) {
        Ok(after) => (after.fen(), true),
        Err(_) => (fen_before.to_string(), false),
    };

    let eval_after = analysis_after.evaluation;
    let top_moves = analysis_before.top_moves.clone();

    let best_entry = top_moves
        .iter()
        .find(|t| t.uci == analysis_before.best_move)
        .or_else(|| top_moves.first());
    let (eval_if_best_move, is_eval_if_best_unreliable) = match best_entry {
        Some(entry) => (entry.cp, false),
        None => (eval_after, true),
    };

    let is_in_top_moves = top_moves.iter().any(|t| t.uci == played.uci);

    Ok(MoveContext {
        fen_before: fen_before.to_string(),
        fen_after,
        fen_after_valid,
        played_uci: played.uci.clone(),
        played,
        is_white_move,
        eval_before: analysis_before.evaluation,
        eval_after,
        eval_if_best_move,
        is_eval_if_best_unreliable,
        best_move_uci: analysis_before.best_move.clone(),
        is_in_top_moves,
        move_number,
        top_moves,
        top_moves_after: analysis_after.top_moves.clone(),
    })
}

/// Raw centipawn loss with the losing-position and winner/loser adjustments.
/// The game-phase forgiveness multiplier is applied later, by the cascade.
pub fn centipawn_loss(
    ctx: &MoveContext,
    game_winner: Option<PieceColor>,
    config: &ReviewConfig,
) -> i32 {
    let cap = config.max_centipawn_loss;
    let before = ctx.player_eval_before();
    let after = ctx.player_eval_after();
    let improvement = after - before;

    let mut loss: i32;

    if ctx.is_eval_if_best_unreliable && ctx.is_in_top_moves {
        // The engine agreed with the move even though its best-line score is
        // unusable; charge only the raw swing.
        loss = improvement.abs().min(cap);
    } else if ctx.is_eval_if_best_unreliable
        && (is_mate(ctx.eval_before) || is_mate(ctx.eval_after))
    {
        let kept_mate = is_mate_for_player(ctx.eval_after, ctx.is_white_move)
            && (!is_mate_for_player(ctx.eval_before, ctx.is_white_move)
                || mate_distance(ctx.eval_after) <= mate_distance(ctx.eval_before));
        loss = if kept_mate { 0 } else { improvement.abs().min(cap) };
    } else {
        loss = (ctx.player_eval_if_best() - after).max(0).min(cap);
    }

    // Losing-position adjustment: in a position that was already lost and
    // stays lost, a non-improving move is charged a flat token penalty
    // instead of the full gap.
    if loss > 0 && before < -100 && after < -100 && improvement <= 0 {
        loss = 15;
    }

    // Winner/loser adjustment, never applied to a zero loss.
    if loss > 0 {
        if let Some(winner) = game_winner {
            let factor = if winner == ctx.player_color() {
                config.winner_loss_factor
            } else {
                config.loser_loss_factor
            };
            loss = (loss as f64 * factor).round() as i32;
        }
    }

    loss.clamp(0, cap)
}

fn mate_distance(score: i32) -> i32 {
    crate::score::extract_mate_in(score).map(i32::abs).unwrap_or(i32::MAX)
}
