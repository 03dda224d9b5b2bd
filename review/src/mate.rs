//! Classification of moves where a forced mate is on the board at either
//! endpoint. Returning `None` means "mate handling does not apply", and the
//! cascade continues.

use crate::context::MoveContext;
use crate::score::{extract_mate_in, is_mate, is_mate_for_player, to_player_perspective};
use crate::types::MarkerType;

/// Run the mate rules top to bottom.
pub fn classify_mate(ctx: &MoveContext) -> Option<(MarkerType, i32)> {
    let w = ctx.is_white_move;
    let before = ctx.eval_before;
    let after = ctx.eval_after;
    let best = ctx.eval_if_best_move;

    let mate_for_player = |v: i32| is_mate_for_player(v, w);
    let mate_for_opponent = |v: i32| is_mate(v) && to_player_perspective(v, w) < 0;
    let distance = |v: i32| extract_mate_in(v).map(i32::abs).unwrap_or(0);

    // 1. Delivered mate.
    if ctx.played.san.contains('#') {
        return Some((MarkerType::Best, 0));
    }

    // 2. The move hands the opponent a mate that was not already there.
    if is_mate(after) && mate_for_opponent(after) && !mate_for_opponent(before) {
        return Some((MarkerType::Blunder, 1000));
    }

    // 3. The player was getting mated before the move: no blame to assign.
    if mate_for_opponent(before) {
        if mate_for_player(after) {
            return Some((MarkerType::Best, 0));
        }
        return if ctx.was_forced() {
            Some((MarkerType::Best, 0))
        } else {
            Some((MarkerType::Good, 0))
        };
    }

    // 4. Both the played line and the best line mate for the player:
    //    grade by how many moves longer the chosen mate is. A mate that
    //    flipped sides against the engine line is a full blunder.
    if mate_for_player(after) && is_mate(best) {
        if !mate_for_player(best) {
            return Some((MarkerType::Blunder, 1000));
        }
        return Some(grade_longer_mate(distance(after) - distance(best)));
    }

    // 5. Mate at both endpoints of the played move.
    if is_mate(before) && is_mate(after) {
        if mate_for_player(before) && mate_for_player(after) {
            return Some(grade_longer_mate(distance(after) - distance(before)));
        }
        // Side changed: forced moves are blameless, anything else is left
        // for the brilliant detector to inspect.
        return if ctx.was_forced() {
            Some((MarkerType::Best, 0))
        } else {
            None
        };
    }

    // 6. Player had a mate and let it slip into a normal evaluation.
    if mate_for_player(before) && !is_mate(after) {
        let kept = ctx.player_eval_after();
        if kept >= 500 {
            return Some((MarkerType::Inaccuracy, 100));
        }
        if kept >= 200 {
            return Some((MarkerType::Mistake, 150));
        }
        return None;
    }

    // 7. A mate appeared out of a forced move.
    if mate_for_player(after) && ctx.was_forced() {
        return Some((MarkerType::Best, 0));
    }

    None
}

fn grade_longer_mate(moves_longer: i32) -> (MarkerType, i32) {
    if moves_longer <= 0 {
        (MarkerType::Best, 0)
    } else if moves_longer <= 2 {
        (MarkerType::Good, 50)
    } else if moves_longer <= 4 {
        (MarkerType::Inaccuracy, 150)
    } else {
        (MarkerType::Mistake, 250)
    }
}
