use cozy_chess::{GameStatus, Piece};

use super::{Theme, ThemeContext, ThemeDetector, ThemeMatch};

/// Material gain: capturing a piece (not a pawn), or an evaluation swing big
/// enough to mean material fell off the board.
pub struct WinningMaterialDetector;

impl ThemeDetector for WinningMaterialDetector {
    fn detect(&self, ctx: &ThemeContext) -> Option<ThemeMatch> {
        if let Some(victim) = ctx.captured {
            if victim != Piece::Pawn {
                return Some(ThemeMatch {
                    theme: Theme::WinningMaterial,
                    confidence: 65,
                    description: format!("wins the {} on {}", victim, ctx.mv.to),
                });
            }
        }

        if ctx.eval_swing().unwrap_or(0) >= 300 {
            return Some(ThemeMatch {
                theme: Theme::WinningMaterial,
                confidence: 65,
                description: "decisive evaluation swing".to_string(),
            });
        }

        None
    }
}

/// Mate threat: the move delivers mate outright, or the evaluation says a
/// forced mate is on the board.
pub struct MateThreatDetector;

impl ThemeDetector for MateThreatDetector {
    fn detect(&self, ctx: &ThemeContext) -> Option<ThemeMatch> {
        let delivered = ctx.after.status() == GameStatus::Won;
        let forced = ctx.eval_after.map(|e| e.abs() > 10_000).unwrap_or(false);

        if !delivered && !forced {
            return None;
        }

        Some(ThemeMatch {
            theme: Theme::MateThreat,
            confidence: 95,
            description: if delivered {
                "checkmate".to_string()
            } else {
                "forced mate on the board".to_string()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capturing_a_rook_is_winning_material() {
        let ctx = ThemeContext::build("4k3/8/8/8/3r4/8/8/3RK3 w - - 0 1", "d1d4", None, None)
            .expect("valid position");
        let found = WinningMaterialDetector.detect(&ctx).expect("material");
        assert_eq!(found.theme, Theme::WinningMaterial);
        assert_eq!(found.confidence, 65);
    }

    #[test]
    fn pawn_grab_needs_an_eval_swing() {
        let ctx = ThemeContext::build(
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2",
            "e4d5",
            Some(20),
            Some(40),
        )
        .expect("valid position");
        assert!(WinningMaterialDetector.detect(&ctx).is_none());

        let swung = ThemeContext::build(
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2",
            "e4d5",
            Some(0),
            Some(350),
        )
        .expect("valid position");
        assert!(WinningMaterialDetector.detect(&swung).is_some());
    }

    #[test]
    fn mate_threat_fires_on_forced_mate_eval() {
        let ctx = ThemeContext::build(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "e2e4",
            Some(0),
            Some(99_700),
        )
        .expect("valid position");
        let found = MateThreatDetector.detect(&ctx).expect("mate threat");
        assert_eq!(found.theme, Theme::MateThreat);
    }
}
