//! Classification of moves that appear in the engine's top-k list, plus the
//! fallback loss-to-marker table.

use crate::config::Thresholds;
use crate::context::MoveContext;
use crate::types::MarkerType;

/// Map a centipawn loss onto a marker via the threshold table.
pub fn marker_for_loss(cp_loss: i32, thresholds: &Thresholds) -> MarkerType {
    if cp_loss <= thresholds.best {
        MarkerType::Best
    } else if cp_loss <= thresholds.good {
        MarkerType::Good
    } else if cp_loss <= thresholds.inaccuracy {
        MarkerType::Inaccuracy
    } else if cp_loss <= thresholds.miss {
        MarkerType::Miss
    } else if cp_loss <= thresholds.mistake {
        MarkerType::Mistake
    } else {
        MarkerType::Blunder
    }
}

/// Classify a move by its rank in the engine's top list.
///
/// Returns `None` when the move is not in the list, or when the engine's own
/// numbers are too inconsistent to trust the rank.
pub fn classify_top_move(
    ctx: &MoveContext,
    cp_loss: i32,
    thresholds: &Thresholds,
) -> Option<(MarkerType, i32)> {
    let index = ctx
        .top_moves
        .iter()
        .position(|t| t.uci == ctx.played_uci)?;

    match index {
        0 => {
            // The engine's own first choice. If the after-analysis disagrees
            // wildly with what the engine promised, trust the numbers.
            let promised = ctx.top_moves[0].cp;
            if (ctx.eval_after - promised).abs() > 100 {
                return None;
            }
            if cp_loss <= 100 {
                Some((MarkerType::Best, cp_loss.min(thresholds.best)))
            } else {
                Some((marker_for_loss(cp_loss, thresholds), cp_loss))
            }
        }
        1 if cp_loss <= thresholds.good => Some((MarkerType::Good, cp_loss)),
        _ => Some((marker_for_loss(cp_loss, thresholds), cp_loss)),
    }
}
