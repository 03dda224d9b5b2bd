//! Inaccuracy: a mild slip in a position that was still balanced.

use super::{game_phase, phase_forgiveness, Detection};
use crate::context::MoveContext;
use crate::types::MarkerType;

pub fn detect_inaccuracy(ctx: &MoveContext, cp_loss: i32) -> Option<Detection> {
    if ctx.move_number < 3 {
        return None;
    }
    // In a position already decided either way, small slips are noise.
    if ctx.eval_before.abs() >= 500 {
        return None;
    }

    let phase = game_phase(ctx.move_number, &ctx.fen_before);
    let adjusted = (cp_loss as f64 * phase_forgiveness(phase)).round() as i32;

    if (35..100).contains(&adjusted) {
        return Some(Detection::new(MarkerType::Inaccuracy, "evaluation slipped"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::build_context;
    use engine::{EngineAnalysis, TopMove};

    fn ctx(move_number: u32, eval_before: i32, eval_after: i32) -> MoveContext {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        build_context(
            fen,
            "e2e4",
            &EngineAnalysis {
                evaluation: eval_before,
                best_move: "d2d4".into(),
                top_moves: vec![TopMove {
                    uci: "d2d4".into(),
                    cp: eval_before,
                }],
                depth: 14,
            },
            &EngineAnalysis {
                evaluation: eval_after,
                best_move: String::new(),
                top_moves: vec![],
                depth: 14,
            },
            move_number,
        )
        .unwrap()
    }

    #[test]
    fn band_is_respected_after_forgiveness() {
        // 60cp in the opening is forgiven to 48, still an inaccuracy.
        let c = ctx(6, 20, -40);
        assert!(detect_inaccuracy(&c, 60).is_some());

        // 40cp in the opening is forgiven to 32, below the band.
        assert!(detect_inaccuracy(&c, 40).is_none());
    }

    #[test]
    fn decided_positions_are_skipped() {
        let c = ctx(20, 520, 430);
        assert!(detect_inaccuracy(&c, 70).is_none());
    }

    #[test]
    fn first_moves_are_skipped() {
        let c = ctx(2, 20, -40);
        assert!(detect_inaccuracy(&c, 60).is_none());
    }
}
