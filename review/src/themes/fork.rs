use cozy_chess::Piece;

use super::helpers::{piece_attacks, piece_value};
use super::{Theme, ThemeContext, ThemeDetector, ThemeMatch};

/// Fork: the moved piece attacks two or more enemy pieces at once.
///
/// Knight forks get the highest confidence; heavier forking pieces must
/// attack enough total value (rook + knight) to matter.
pub struct ForkDetector;

impl ThemeDetector for ForkDetector {
    fn detect(&self, ctx: &ThemeContext) -> Option<ThemeMatch> {
        let mover = ctx.mover;
        let opponent = ctx.opponent();

        let landed = ctx.after.piece_on(ctx.mv.to)?;
        let targets =
            piece_attacks(&ctx.after, ctx.mv.to, landed, mover) & ctx.after.colors(opponent);

        let mut attacked: Vec<(Piece, i32)> = Vec::new();
        for sq in targets {
            if let Some(piece) = ctx.after.piece_on(sq) {
                attacked.push((piece, piece_value(piece)));
            }
        }
        if attacked.len() < 2 {
            return None;
        }

        let total: i32 = attacked.iter().map(|(_, v)| v).sum();
        let has_king = attacked.iter().any(|(p, _)| *p == Piece::King);

        match landed {
            Piece::Knight => Some(ThemeMatch {
                theme: Theme::Fork,
                confidence: if has_king { 90 } else { 85 },
                description: format!("knight fork on {}", ctx.mv.to),
            }),
            _ => {
                // Rook + knight worth of targets, or it is not a real fork.
                if total >= 820 || has_king {
                    Some(ThemeMatch {
                        theme: Theme::Fork,
                        confidence: 75,
                        description: format!("{} fork on {}", landed, ctx.mv.to),
                    })
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn royal_knight_fork() {
        // Nc7+ forks the king on e8 and the rook on a8.
        let ctx = ThemeContext::build("r3k3/8/8/3N4/8/8/8/4K3 w - - 0 1", "d5c7", None, None)
            .expect("valid position");
        let found = ForkDetector.detect(&ctx).expect("fork");
        assert_eq!(found.theme, Theme::Fork);
        assert_eq!(found.confidence, 90);
    }

    #[test]
    fn pawn_fork_needs_heavy_targets_too() {
        // d4-d5 forking two minor pieces is not worth the tag...
        let ctx = ThemeContext::build("4k3/8/2n1b3/8/3P4/8/8/4K3 w - - 0 1", "d4d5", None, None)
            .expect("valid position");
        assert!(ForkDetector.detect(&ctx).is_none());

        // ...but forking a rook and a knight is.
        let heavy = ThemeContext::build("4k3/8/2r1n3/8/3P4/8/8/4K3 w - - 0 1", "d4d5", None, None)
            .expect("valid position");
        let found = ForkDetector.detect(&heavy).expect("pawn fork");
        assert_eq!(found.confidence, 75);
    }

    #[test]
    fn queen_needs_heavy_targets() {
        // Queen attacking two pawns is not a fork worth the name.
        let ctx = ThemeContext::build("4k3/8/1p3p2/8/8/8/8/Q3K3 w - - 0 1", "a1d4", None, None)
            .expect("valid position");
        assert!(ForkDetector.detect(&ctx).is_none());
    }
}
