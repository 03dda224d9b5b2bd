//! Great: a strong, active near-best move (checks, material-winning
//! captures, discovered attacks) that is not merely a routine mate finish.

use super::Detection;
use crate::context::MoveContext;
use crate::score::{extract_mate_in, is_mate};
use crate::themes::{detect_theme, Theme};
use crate::types::MarkerType;

pub fn detect_great(ctx: &MoveContext, cp_loss: i32) -> Option<Detection> {
    // 35 is the widest any acceptance branch below allows.
    if cp_loss > 35 || ctx.move_number < 5 {
        return None;
    }

    // Checking along a forced mate line is routine, not great.
    let best_mates_soon = extract_mate_in(ctx.eval_if_best_move)
        .map(|m| m.abs() <= 2)
        .unwrap_or(false);
    if best_mates_soon || ctx.eval_before.abs() >= 10_000 || is_mate(ctx.eval_before) {
        return None;
    }

    let gives_check = ctx.played.gives_check;
    let is_capture = ctx.played.is_capture;

    if is_capture && gives_check && cp_loss <= 35 {
        return Some(Detection::new(MarkerType::Great, "capture with check"));
    }
    if gives_check && cp_loss <= 25 {
        return Some(Detection::new(MarkerType::Great, "strong check"));
    }

    let swing = ctx.player_eval_after() - ctx.player_eval_before();
    if is_capture && swing >= 50 && cp_loss <= 30 {
        return Some(Detection::new(MarkerType::Great, "capture winning material"));
    }

    if cp_loss <= 30 {
        if let Some(found) = detect_theme(
            &ctx.fen_before,
            &ctx.played_uci,
            Some(ctx.eval_before),
            Some(ctx.eval_after),
        ) {
            if matches!(found.theme, Theme::DiscoveredAttack | Theme::Pin) {
                return Some(Detection::new(MarkerType::Great, "discovered attack or pin"));
            }
        }
    }

    None
}
