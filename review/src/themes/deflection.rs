use cozy_chess::Piece;

use super::helpers::{piece_attacks, piece_value};
use super::{Theme, ThemeContext, ThemeDetector, ThemeMatch};

/// Deflection: capturing a defender so that the piece it guarded is left
/// attacked.
pub struct DeflectionDetector;

impl ThemeDetector for DeflectionDetector {
    fn detect(&self, ctx: &ThemeContext) -> Option<ThemeMatch> {
        let victim = ctx.captured?;
        if victim == Piece::Pawn {
            return None;
        }
        let opponent = ctx.opponent();

        // What did the captured piece defend from its square?
        let defended = piece_attacks(&ctx.before, ctx.mv.to, victim, opponent)
            & ctx.before.colors(opponent);

        for guarded_sq in defended {
            let Some(guarded_piece) = ctx.before.piece_on(guarded_sq) else {
                continue;
            };
            if piece_value(guarded_piece) < 500 {
                continue;
            }
            // The guarded piece must still be there and now under attack.
            if ctx.after.piece_on(guarded_sq) != Some(guarded_piece) {
                continue;
            }
            if !ctx.after_attacks.is_attacked(guarded_sq, ctx.mover) {
                continue;
            }

            return Some(ThemeMatch {
                theme: Theme::Deflection,
                confidence: 70,
                description: format!(
                    "deflection: removing the defender of {} on {}",
                    guarded_piece, guarded_sq
                ),
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capturing_the_guard_is_deflection() {
        // Black knight on d4 guards the rook on c6; Bxd4 removes the guard
        // while our rook on c1 attacks down the c-file.
        let ctx = ThemeContext::build(
            "4k3/8/2r5/8/3n4/4B3/8/2R1K3 w - - 0 1",
            "e3d4",
            None,
            None,
        )
        .expect("valid position");
        let found = DeflectionDetector.detect(&ctx).expect("deflection");
        assert_eq!(found.theme, Theme::Deflection);
    }

    #[test]
    fn plain_capture_is_not_deflection() {
        // Pawn takes pawn, nothing guarded.
        let ctx = ThemeContext::build(
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2",
            "e4d5",
            None,
            None,
        )
        .expect("valid position");
        assert!(DeflectionDetector.detect(&ctx).is_none());
    }
}
