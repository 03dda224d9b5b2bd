use super::helpers::piece_value;
use super::{Theme, ThemeContext, ThemeDetector, ThemeMatch};

/// Trapped piece: winning a minor piece or better that was already being
/// hunted suggests it had nowhere to go.
pub struct TrappedPieceDetector;

impl ThemeDetector for TrappedPieceDetector {
    fn detect(&self, ctx: &ThemeContext) -> Option<ThemeMatch> {
        let victim = ctx.captured?;
        if piece_value(victim) < 330 {
            return None;
        }

        // The piece must have been under attack before the capture: we were
        // hunting it, not just trading.
        if !ctx.before_attacks.is_attacked(ctx.mv.to, ctx.mover) {
            return None;
        }

        Some(ThemeMatch {
            theme: Theme::TrappedPiece,
            confidence: 55,
            description: format!("won the trapped {} on {}", victim, ctx.mv.to),
        })
    }
}
