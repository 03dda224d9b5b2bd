//! Miss: a tactical opportunity the player walked past while the position
//! was still theirs to win.

use super::{game_phase, phase_forgiveness, Detection};
use crate::context::MoveContext;
use crate::score::is_mate_for_player;
use crate::themes::{detect_theme, Theme};
use crate::types::MarkerType;

pub fn detect_miss(ctx: &MoveContext, cp_loss: i32) -> Option<Detection> {
    // Hopeless or already-decided positions produce no misses.
    let before = ctx.player_eval_before();
    if before <= -200 || before >= 500 {
        return None;
    }

    let phase = game_phase(ctx.move_number, &ctx.fen_before);
    let adjusted = (cp_loss as f64 * phase_forgiveness(phase)).round() as i32;
    if !(100..150).contains(&adjusted) {
        return None;
    }

    // The engine's move has to have been worth finding.
    if is_mate_for_player(ctx.eval_if_best_move, ctx.is_white_move) {
        return Some(Detection::new(MarkerType::Miss, "missed forced mate"));
    }

    let best = ctx
        .position_before()
        .and_then(|p| p.find_uci(&ctx.best_move_uci))?;

    if best.is_capture {
        return Some(Detection::new(MarkerType::Miss, "missed capture"));
    }
    if best.gives_check {
        return Some(Detection::new(MarkerType::Miss, "missed check"));
    }

    let looks_like_fork = detect_theme(&ctx.fen_before, &ctx.best_move_uci, None, None)
        .map(|t| t.theme == Theme::Fork)
        .unwrap_or(false);
    if looks_like_fork {
        return Some(Detection::new(MarkerType::Miss, "missed fork"));
    }

    None
}
