use cozy_chess::{GameStatus, Piece};

use super::{Theme, ThemeContext, ThemeDetector, ThemeMatch};

/// Smothered mate: a knight delivers checkmate to a king whose escape
/// squares are blocked by its own pieces.
pub struct SmotheredMateDetector;

impl ThemeDetector for SmotheredMateDetector {
    fn detect(&self, ctx: &ThemeContext) -> Option<ThemeMatch> {
        if ctx.moved_piece != Piece::Knight {
            return None;
        }
        if ctx.after.status() != GameStatus::Won {
            return None;
        }

        let opponent = ctx.opponent();
        let king_sq = ctx.after.king(opponent);

        let own_blockers = cozy_chess::get_king_moves(king_sq)
            & ctx.after.colors(opponent)
            & !ctx.after.pieces(Piece::King);

        if own_blockers.len() < 3 {
            return None;
        }

        Some(ThemeMatch {
            theme: Theme::SmotheredMate,
            confidence: 95,
            description: format!("smothered mate on {}", ctx.mv.to),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_smothered_mate_is_detected() {
        // Black king h8 boxed in by Rg8, pawns g7/h7; Nf7 is mate.
        let ctx = ThemeContext::build("6rk/6pp/8/8/8/8/8/1K4N1 w - - 0 1", "g1f3", None, None);
        // A quiet knight move is not a smothered mate.
        assert!(SmotheredMateDetector.detect(&ctx.unwrap()).is_none());

        let ctx = ThemeContext::build("6rk/6pp/7N/8/8/8/8/1K6 w - - 0 1", "h6f7", None, None)
            .expect("valid position");
        let found = SmotheredMateDetector.detect(&ctx).expect("smothered mate");
        assert_eq!(found.theme, Theme::SmotheredMate);
    }

    #[test]
    fn open_king_mate_is_not_smothered() {
        // Mate where the king is not smothered by its own pieces.
        let ctx = ThemeContext::build("7k/8/5N1K/8/8/8/8/6R1 w - - 0 1", "g1g8", None, None)
            .expect("valid position");
        assert!(SmotheredMateDetector.detect(&ctx).is_none());
    }
}
