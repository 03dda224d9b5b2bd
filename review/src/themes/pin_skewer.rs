use cozy_chess::Piece;

use super::helpers::{piece_value, ray_occupants, BISHOP_DIRS, ROOK_DIRS};
use super::{Theme, ThemeContext, ThemeDetector, ThemeMatch};

/// Pin and skewer: from its new square, a slider lines up two enemy pieces.
/// Less valuable in front → pin; more valuable in front → skewer.
pub struct PinSkewerDetector;

impl ThemeDetector for PinSkewerDetector {
    fn detect(&self, ctx: &ThemeContext) -> Option<ThemeMatch> {
        let mut dirs: Vec<(i8, i8)> = Vec::with_capacity(8);
        match ctx.moved_piece {
            Piece::Bishop => dirs.extend(BISHOP_DIRS),
            Piece::Rook => dirs.extend(ROOK_DIRS),
            Piece::Queen => {
                dirs.extend(ROOK_DIRS);
                dirs.extend(BISHOP_DIRS);
            }
            _ => return None,
        }

        let opponent = ctx.opponent();

        for &(df, dr) in &dirs {
            let occupants = ray_occupants(&ctx.after, ctx.mv.to, df, dr);
            if occupants.len() < 2 {
                continue;
            }
            let (front_sq, back_sq) = (occupants[0], occupants[1]);

            // Both pieces on the ray must be the opponent's.
            if !(ctx.after.colors(opponent).has(front_sq) && ctx.after.colors(opponent).has(back_sq))
            {
                continue;
            }
            let front = ctx.after.piece_on(front_sq)?;
            let back = ctx.after.piece_on(back_sq)?;

            let front_value = piece_value(front);
            let back_value = piece_value(back);

            if front_value < back_value {
                return Some(ThemeMatch {
                    theme: Theme::Pin,
                    confidence: 70,
                    description: format!("{} on {} pinned to {} on {}", front, front_sq, back, back_sq),
                });
            }
            if front_value > back_value {
                return Some(ThemeMatch {
                    theme: Theme::Skewer,
                    confidence: 75,
                    description: format!("{} on {} skewered against {} on {}", front, front_sq, back, back_sq),
                });
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bishop_pins_knight_to_king() {
        // Bb5 pins the c6 knight against the e8 king.
        let ctx = ThemeContext::build("4k3/8/2n5/8/B7/8/8/4K3 w - - 0 1", "a4b5", None, None)
            .expect("valid position");
        let found = PinSkewerDetector.detect(&ctx).expect("pin");
        assert_eq!(found.theme, Theme::Pin);
    }

    #[test]
    fn rook_skewers_queen_against_rook() {
        // Re1 hits the queen on e5 with the rook on e8 behind it.
        let ctx = ThemeContext::build("4r1k1/8/8/4q3/8/8/8/R5K1 w - - 0 1", "a1e1", None, None)
            .expect("valid position");
        let found = PinSkewerDetector.detect(&ctx).expect("skewer");
        assert_eq!(found.theme, Theme::Skewer);
    }

    #[test]
    fn knight_cannot_pin() {
        let ctx = ThemeContext::build("4k3/8/8/8/8/8/8/N3K3 w - - 0 1", "a1b3", None, None)
            .expect("valid position");
        assert!(PinSkewerDetector.detect(&ctx).is_none());
    }
}
