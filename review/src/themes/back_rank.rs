use cozy_chess::{BitBoard, Color, File, GameStatus, Piece, Rank, Square};

use super::{Theme, ThemeContext, ThemeDetector, ThemeMatch};

/// Back-rank tactics: mate or check delivered on the opponent's back rank,
/// or a heavy piece landing there against a trapped king.
pub struct BackRankDetector;

impl ThemeDetector for BackRankDetector {
    fn detect(&self, ctx: &ThemeContext) -> Option<ThemeMatch> {
        let opponent = ctx.opponent();
        let back_rank = if opponent == Color::White {
            Rank::First
        } else {
            Rank::Eighth
        };

        if ctx.mv.to.rank() != back_rank {
            return None;
        }

        let king_sq = ctx.after.king(opponent);
        if king_sq.rank() != back_rank {
            return None;
        }

        let is_mate = ctx.after.status() == GameStatus::Won;
        let gives_check = !ctx.after.checkers().is_empty();

        if is_mate {
            return Some(ThemeMatch {
                theme: Theme::BackRankMate,
                confidence: 90,
                description: format!("back-rank mate on {}", ctx.mv.to),
            });
        }
        if gives_check {
            return Some(ThemeMatch {
                theme: Theme::BackRankMate,
                confidence: 75,
                description: format!("back-rank check on {}", ctx.mv.to),
            });
        }

        // A rook or queen invading the back rank against a trapped king is
        // still a back-rank motif, at lower confidence.
        if matches!(ctx.moved_piece, Piece::Rook | Piece::Queen) && king_trapped(ctx, opponent) {
            return Some(ThemeMatch {
                theme: Theme::BackRankMate,
                confidence: 55,
                description: format!("back-rank invasion on {}", ctx.mv.to),
            });
        }

        None
    }
}

/// All of the king's off-rank escape squares are blocked by its own pieces.
fn king_trapped(ctx: &ThemeContext, side: Color) -> bool {
    let king_sq = ctx.after.king(side);
    let escapes = cozy_chess::get_king_moves(king_sq) & !rank_bitboard(king_sq.rank());
    !escapes.is_empty() && (escapes & !ctx.after.colors(side)).is_empty()
}

fn rank_bitboard(rank: Rank) -> BitBoard {
    let mut bb = BitBoard::EMPTY;
    for file in File::ALL {
        bb |= BitBoard::from(Square::new(file, rank));
    }
    bb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_rank_mate_is_detected() {
        // Ra8# against a king boxed in by its own pawns.
        let ctx = ThemeContext::build("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", "a1a8", None, None)
            .expect("valid position");
        let found = BackRankDetector.detect(&ctx).expect("back rank mate");
        assert_eq!(found.theme, Theme::BackRankMate);
        assert_eq!(found.confidence, 90);
    }

    #[test]
    fn back_rank_check_scores_lower() {
        // Same motif but the king has a flight square on h7.
        let ctx = ThemeContext::build("6k1/5pp1/8/8/8/8/8/R5K1 w - - 0 1", "a1a8", None, None)
            .expect("valid position");
        let found = BackRankDetector.detect(&ctx).expect("back rank check");
        assert_eq!(found.confidence, 75);
    }

    #[test]
    fn unrelated_move_is_ignored() {
        let ctx = ThemeContext::build("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", "a1a4", None, None)
            .expect("valid position");
        assert!(BackRankDetector.detect(&ctx).is_none());
    }
}
