use super::{Theme, ThemeContext, ThemeDetector, ThemeMatch};

/// Double check: two pieces give check at once, so the king must move.
pub struct DoubleCheckDetector;

impl ThemeDetector for DoubleCheckDetector {
    fn detect(&self, ctx: &ThemeContext) -> Option<ThemeMatch> {
        let checkers = ctx.after.checkers();
        if checkers.len() < 2 {
            return None;
        }

        Some(ThemeMatch {
            theme: Theme::DoubleCheck,
            confidence: 90,
            description: format!("double check from {} pieces", checkers.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovered_double_check_is_detected() {
        // Rook on e1 behind a knight on e4; Nf6 gives check while the rook
        // checks along the opened e-file.
        let ctx = ThemeContext::build("4k3/8/8/8/4N3/8/8/4RK2 w - - 0 1", "e4f6", None, None)
            .expect("valid position");
        let found = DoubleCheckDetector.detect(&ctx).expect("double check");
        assert_eq!(found.theme, Theme::DoubleCheck);
    }

    #[test]
    fn single_check_is_not_double() {
        let ctx = ThemeContext::build("4k3/8/8/8/4N3/8/8/5K2 w - - 0 1", "e4f6", None, None)
            .expect("valid position");
        assert!(DoubleCheckDetector.detect(&ctx).is_none());
    }
}
