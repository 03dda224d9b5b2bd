//! Blunder: the move that changes who is winning. Mate allowed, a piece
//! hung, or a won game thrown.

use super::Detection;
use crate::config::ReviewConfig;
use crate::context::MoveContext;
use crate::score::{extract_mate_in, is_mate, is_mate_against_player, is_mate_for_player};
use crate::types::MarkerType;

const HANGING_TOLERANCE: i32 = 80;
const HANGABLE_VALUES: [i32; 4] = [320, 330, 500, 900];

pub fn detect_blunder(ctx: &MoveContext, cp_loss: i32, config: &ReviewConfig) -> Option<Detection> {
    if cp_loss < 250 || ctx.move_number < 3 {
        return None;
    }
    // Deep in a lost position there is nothing left to blunder away.
    if ctx.player_eval_before() <= -600 {
        return None;
    }
    // Getting mated before the move: the mate handler owns this.
    if is_mate_against_player(ctx.eval_before, ctx.is_white_move) {
        return None;
    }
    // Still winning comfortably afterwards.
    if ctx.player_eval_after() >= config.still_winning.blunder {
        return None;
    }

    let before = ctx.player_eval_before();
    let after = ctx.player_eval_after();
    let swing = after - before;

    // Mate blindness.
    let allowed_mate = is_mate_against_player(ctx.eval_after, ctx.is_white_move)
        && extract_mate_in(ctx.eval_after).map(i32::abs).unwrap_or(99) <= 5;
    let threw_mate = is_mate_for_player(ctx.eval_before, ctx.is_white_move)
        && extract_mate_in(ctx.eval_before).map(i32::abs).unwrap_or(99) <= 5
        && !is_mate(ctx.eval_after);
    let mate_scale_swing = ctx.eval_after.abs() >= 10_000 && swing <= -500;
    if allowed_mate || threw_mate || mate_scale_swing {
        return Some(Detection::new(MarkerType::Blunder, "mate blindness"));
    }

    // Hanging piece: the loss matches a piece value too well to be anything
    // else.
    if HANGABLE_VALUES
        .iter()
        .any(|v| (cp_loss - v).abs() <= HANGING_TOLERANCE)
    {
        return Some(Detection::new(MarkerType::Blunder, "hanging piece"));
    }

    // Game-turning swing.
    let turned = before >= 200 && after <= -200 && swing <= -400;
    let collapsed = before.abs() <= 60 && after <= -200;
    if turned || collapsed {
        return Some(Detection::new(MarkerType::Blunder, "game-turning swing"));
    }

    None
}
