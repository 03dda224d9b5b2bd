//! Mistake: a real concession (material or a won position given back)
//! short of a blunder.

use super::Detection;
use crate::config::ReviewConfig;
use crate::context::MoveContext;
use crate::score::is_mate;
use crate::types::MarkerType;

pub fn detect_mistake(ctx: &MoveContext, cp_loss: i32, config: &ReviewConfig) -> Option<Detection> {
    if ctx.move_number < 4 {
        return None;
    }
    // Already losing: the gap to best stops meaning much.
    if ctx.player_eval_before() <= -300 {
        return None;
    }
    // Still clearly winning afterwards: not a mistake in any useful sense.
    if ctx.player_eval_after() >= config.still_winning.mistake {
        return None;
    }
    // Mate sequences are graded by the mate handler, not here.
    if is_mate(ctx.eval_before) || is_mate(ctx.eval_after) || is_mate(ctx.eval_if_best_move) {
        return None;
    }

    if (100..250).contains(&cp_loss) {
        return Some(Detection::new(MarkerType::Mistake, "significant loss"));
    }

    // Advantage loss: a clear plus evaporated into equality.
    let before = ctx.player_eval_before();
    if before >= 80 && ctx.eval_after.abs() <= 60 && cp_loss >= 70 {
        return Some(Detection::new(MarkerType::Mistake, "advantage given back"));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::build_context;
    use engine::{EngineAnalysis, TopMove};

    fn ctx(move_number: u32, eval_before: i32, eval_after: i32, best_cp: i32) -> MoveContext {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        build_context(
            fen,
            "e2e4",
            &EngineAnalysis {
                evaluation: eval_before,
                best_move: "d2d4".into(),
                top_moves: vec![TopMove {
                    uci: "d2d4".into(),
                    cp: best_cp,
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
    fn band_loss_is_a_mistake() {
        let c = ctx(10, 50, -130, 60);
        let config = ReviewConfig::default();
        assert!(detect_mistake(&c, 180, &config).is_some());
    }

    #[test]
    fn advantage_loss_triggers_below_band() {
        let c = ctx(15, 120, 10, 130);
        let config = ReviewConfig::default();
        let found = detect_mistake(&c, 85, &config).expect("mistake");
        assert_eq!(found.reason, "advantage given back");
    }

    #[test]
    fn still_winning_is_forgiven() {
        let c = ctx(15, 600, 320, 620);
        let config = ReviewConfig::default();
        assert!(detect_mistake(&c, 200, &config).is_none());
    }

    #[test]
    fn already_losing_is_skipped() {
        let c = ctx(15, -350, -550, -340);
        let config = ReviewConfig::default();
        assert!(detect_mistake(&c, 200, &config).is_none());
    }
}
