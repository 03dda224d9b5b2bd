use super::{Theme, ThemeContext, ThemeDetector, ThemeMatch};

/// Zwischenzug: a capture that also gives check, forcing the reply before
/// the opponent can recapture elsewhere.
pub struct ZwischenzugDetector;

impl ThemeDetector for ZwischenzugDetector {
    fn detect(&self, ctx: &ThemeContext) -> Option<ThemeMatch> {
        if ctx.captured.is_none() {
            return None;
        }
        if ctx.after.checkers().is_empty() {
            return None;
        }

        Some(ThemeMatch {
            theme: Theme::Zwischenzug,
            confidence: 60,
            description: format!("in-between capture with check on {}", ctx.mv.to),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_with_check_matches() {
        // Rxe7+ picks up a pawn with check.
        let ctx = ThemeContext::build("4k3/4p3/8/8/8/8/8/4RK2 w - - 0 1", "e1e7", None, None)
            .expect("valid position");
        let found = ZwischenzugDetector.detect(&ctx).expect("zwischenzug");
        assert_eq!(found.theme, Theme::Zwischenzug);
    }

    #[test]
    fn quiet_check_is_not_zwischenzug() {
        let ctx = ThemeContext::build("4k3/3p4/8/8/8/8/8/R3K3 w - - 0 1", "a1a8", None, None)
            .expect("valid position");
        assert!(ZwischenzugDetector.detect(&ctx).is_none());
    }
}
