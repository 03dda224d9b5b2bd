use cozy_chess::{Piece, Square};

use super::helpers::piece_attacks;
use super::{Theme, ThemeContext, ThemeDetector, ThemeMatch};

/// Discovered attack: moving a piece off a line reveals a slider attack on a
/// heavy piece or the king.
pub struct DiscoveredAttackDetector;

impl ThemeDetector for DiscoveredAttackDetector {
    fn detect(&self, ctx: &ThemeContext) -> Option<ThemeMatch> {
        let mover = ctx.mover;
        let opponent = ctx.opponent();

        let valuable = (ctx.after.pieces(Piece::Rook)
            | ctx.after.pieces(Piece::Queen)
            | ctx.after.pieces(Piece::King))
            & ctx.after.colors(opponent);

        for slider_piece in [Piece::Bishop, Piece::Rook, Piece::Queen] {
            let sliders = ctx.after.pieces(slider_piece) & ctx.after.colors(mover);
            for slider_sq in sliders {
                if slider_sq == ctx.mv.to {
                    continue;
                }

                let now = piece_attacks(&ctx.after, slider_sq, slider_piece, mover) & valuable;
                let then = piece_attacks(&ctx.before, slider_sq, slider_piece, mover);

                for target in now {
                    if then.has(target) {
                        continue;
                    }
                    // The reveal must come from our own piece leaving the line.
                    if !squares_between(slider_sq, target).contains(&ctx.mv.from) {
                        continue;
                    }

                    let target_piece = ctx.after.piece_on(target)?;
                    return Some(ThemeMatch {
                        theme: Theme::DiscoveredAttack,
                        confidence: 80,
                        description: format!(
                            "discovered attack: {} on {} hits {} on {}",
                            slider_piece, slider_sq, target_piece, target
                        ),
                    });
                }
            }
        }

        None
    }
}

/// Squares strictly between two aligned squares; empty when not aligned.
fn squares_between(from: Square, to: Square) -> Vec<Square> {
    let df = (to.file() as i8 - from.file() as i8).signum();
    let dr = (to.rank() as i8 - from.rank() as i8).signum();

    let aligned = from.file() == to.file()
        || from.rank() == to.rank()
        || (to.file() as i8 - from.file() as i8).abs() == (to.rank() as i8 - from.rank() as i8).abs();
    if !aligned || (df == 0 && dr == 0) {
        return Vec::new();
    }

    let mut between = Vec::new();
    let mut current = from;
    while let Some(next) = super::helpers::offset_square(current, df, dr) {
        if next == to {
            break;
        }
        between.push(next);
        current = next;
    }
    between
}
