//! Sacrifice analysis: direct material sacrifices and hanging-piece traps.
//!
//! Pure and infallible: missing inputs degrade to "not a sacrifice" rather
//! than errors.

use chess::{PieceKind, Position, VerboseMove};
use cozy_chess::{Color, Piece};
use engine::TopMove;

use crate::score::{
    extract_mate_in, is_mate_for_player, piece_value, to_player_perspective,
};
use crate::themes::helpers::{piece_attacks, piece_value as cozy_value};

/// How the sacrificed material is paid back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompensationType {
    Mate,
    Material,
    Positional,
    Trap,
    None,
}

#[derive(Debug, Clone)]
pub struct SacrificeReport {
    pub is_sacrifice: bool,
    pub sac_value: i32,
    pub immediate_return: i32,
    pub net: i32,
    pub has_compensation: bool,
    pub compensation: CompensationType,
    pub leads_to_mate: bool,
    pub mate_in: Option<i32>,
    pub is_hanging_piece_sacrifice: bool,
    pub taking_is_mistake: bool,
}

impl SacrificeReport {
    fn none(sac_value: i32, immediate_return: i32) -> Self {
        Self {
            is_sacrifice: false,
            sac_value,
            immediate_return,
            net: sac_value - immediate_return,
            has_compensation: false,
            compensation: CompensationType::None,
            leads_to_mate: false,
            mate_in: None,
            is_hanging_piece_sacrifice: false,
            taking_is_mistake: false,
        }
    }
}

pub struct SacrificeInput<'a> {
    pub played: &'a VerboseMove,
    pub fen_before: &'a str,
    pub fen_after: Option<&'a str>,
    /// White-perspective evaluations.
    pub eval_before: i32,
    pub eval_after: i32,
    pub is_white: bool,
    /// Normalized top moves of the position after the move, when available.
    pub top_moves_after: Option<&'a [TopMove]>,
}

/// Analyse a move for sacrifice content.
pub fn analyze(input: &SacrificeInput) -> SacrificeReport {
    let sac_value = piece_value(input.played.piece);
    let immediate_return = input.played.captured.map(piece_value).unwrap_or(0);
    let net = sac_value - immediate_return;

    let swing = to_player_perspective(input.eval_after, input.is_white)
        - to_player_perspective(input.eval_before, input.is_white);
    let leads_to_mate = is_mate_for_player(input.eval_after, input.is_white);
    let mate_in = extract_mate_in(input.eval_after).map(i32::abs);

    // Direct sacrifice: giving up at least a minor piece for nearly nothing.
    if net >= 300 && immediate_return <= 100 && input.played.piece != PieceKind::King {
        let required = match input.played.piece {
            PieceKind::Queen => 600,
            PieceKind::Rook => 400,
            PieceKind::Knight | PieceKind::Bishop => 250,
            _ => 300,
        };

        let mate_compensates = leads_to_mate && mate_in.map(|m| m <= 8).unwrap_or(false);
        let swing_compensates = swing >= 0 && swing >= required;
        let has_compensation = mate_compensates || swing_compensates;

        let compensation = if mate_compensates {
            CompensationType::Mate
        } else if swing_compensates && swing >= 300 {
            CompensationType::Material
        } else if swing_compensates {
            CompensationType::Positional
        } else {
            CompensationType::None
        };

        return SacrificeReport {
            is_sacrifice: true,
            sac_value,
            immediate_return,
            net,
            has_compensation,
            compensation,
            leads_to_mate,
            mate_in,
            is_hanging_piece_sacrifice: false,
            taking_is_mistake: false,
        };
    }

    // Hanging-piece sacrifice: only a capture that leaves the capturing
    // piece en prise qualifies; a quiet move hanging a piece does not.
    if input.played.is_capture && net >= 300 {
        if let Some(fen_after) = input.fen_after {
            if capture_is_mistake_for_opponent(input, fen_after) {
                return SacrificeReport {
                    is_sacrifice: true,
                    sac_value,
                    immediate_return,
                    net,
                    has_compensation: true,
                    compensation: CompensationType::Trap,
                    leads_to_mate,
                    mate_in,
                    is_hanging_piece_sacrifice: true,
                    taking_is_mistake: true,
                };
            }
        }
    }

    SacrificeReport::none(sac_value, immediate_return)
}

/// Is there an opponent capture of our just-moved piece, and is taking it
/// demonstrably a mistake? Shared with the brilliant detector's relaxed
/// tactical-trap check.
pub fn capture_is_mistake_for_opponent(input: &SacrificeInput, fen_after: &str) -> bool {
    let Ok(after) = Position::from_fen(fen_after) else {
        return false;
    };
    let destination = input.played.mv.to;

    let recaptures: Vec<VerboseMove> = after
        .legal_moves()
        .into_iter()
        .filter(|mv| mv.mv.to == destination && mv.is_capture)
        .collect();
    if recaptures.is_empty() {
        return false;
    }

    for recapture in &recaptures {
        if taking_is_mistake(input, &after, recapture) {
            return true;
        }
    }
    false
}

fn taking_is_mistake(input: &SacrificeInput, after: &Position, recapture: &VerboseMove) -> bool {
    // (a) The engine already knows: the capture is missing from the top
    // moves, or scores at least 100cp below the best reply.
    if let Some(top) = input.top_moves_after {
        if !top.is_empty() {
            let opponent_is_white = !input.is_white;
            let found = top.iter().position(|t| t.uci == recapture.uci);
            match found {
                None => return true,
                Some(0) => {}
                Some(idx) => {
                    let best = to_player_perspective(top[0].cp, opponent_is_white);
                    let taken = to_player_perspective(top[idx].cp, opponent_is_white);
                    if best - taken >= 100 {
                        return true;
                    }
                }
            }
        }
    }

    // (b) One ply of tactics: after the capture, do we have a mate, a check
    // that forks something heavy, or a double attack?
    if let Ok(position) = after.apply(recapture.mv) {
        if punishing_reply_exists(&position) {
            return true;
        }
    }

    // (c) Weak signal: the evaluation says the position is ours anyway.
    to_player_perspective(input.eval_after, input.is_white) >= 100
        || is_mate_for_player(input.eval_after, input.is_white)
}

/// Search our replies one ply deep for a tactical refutation.
fn punishing_reply_exists(position: &Position) -> bool {
    let board = position.board();
    let us: Color = board.side_to_move();
    let them = !us;

    for reply in position.legal_moves() {
        let Ok(next) = position.apply(reply.mv) else {
            continue;
        };
        if next.is_checkmate() {
            return true;
        }

        let next_board = next.board();
        let Some(landed) = next_board.piece_on(reply.mv.to) else {
            continue;
        };
        let targets = piece_attacks(next_board, reply.mv.to, landed, us) & next_board.colors(them);

        let mut values: Vec<i32> = Vec::new();
        for sq in targets {
            if let Some(piece) = next_board.piece_on(sq) {
                if piece != Piece::King {
                    values.push(cozy_value(piece));
                }
            }
        }

        if reply.gives_check {
            // Check plus an attack on something heavy: the opponent cannot
            // save both.
            if values.iter().any(|v| *v >= 500) {
                return true;
            }
        } else if values.len() >= 2 {
            let total: i32 = values.iter().sum();
            if total >= 900 {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verbose(fen: &str, uci: &str) -> VerboseMove {
        Position::from_fen(fen)
            .unwrap()
            .find_uci(uci)
            .expect("legal move")
    }

    // -----------------------------------------------------------------------
    // Direct sacrifices
    // -----------------------------------------------------------------------

    #[test]
    fn queen_sac_with_mate_has_compensation() {
        let fen = "6k1/5ppp/8/8/8/8/1Q6/4K3 w - - 0 1";
        let played = verbose(fen, "b2b7");
        let report = analyze(&SacrificeInput {
            played: &played,
            fen_before: fen,
            fen_after: None,
            eval_before: 200,
            eval_after: engine::encode_mate_score(3),
            is_white: true,
            top_moves_after: None,
        });
        assert!(report.is_sacrifice);
        assert!(report.has_compensation);
        assert_eq!(report.compensation, CompensationType::Mate);
        assert!(report.leads_to_mate);
    }

    #[test]
    fn queen_sac_without_swing_has_no_compensation() {
        let fen = "6k1/5ppp/8/8/8/8/1Q6/4K3 w - - 0 1";
        let played = verbose(fen, "b2b7");
        let report = analyze(&SacrificeInput {
            played: &played,
            fen_before: fen,
            fen_after: None,
            eval_before: 200,
            eval_after: -350,
            is_white: true,
            top_moves_after: None,
        });
        assert!(report.is_sacrifice);
        assert!(!report.has_compensation);
        assert_eq!(report.compensation, CompensationType::None);
    }

    #[test]
    fn minor_piece_swing_compensates() {
        let fen = "4k3/8/8/8/8/8/8/1N2K3 w - - 0 1";
        let played = verbose(fen, "b1c3");
        let report = analyze(&SacrificeInput {
            played: &played,
            fen_before: fen,
            fen_after: None,
            eval_before: 0,
            eval_after: 280,
            is_white: true,
            top_moves_after: None,
        });
        assert!(report.is_sacrifice);
        assert!(report.has_compensation);
    }

    #[test]
    fn pawn_push_is_not_a_sacrifice() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let played = verbose(fen, "e2e4");
        let report = analyze(&SacrificeInput {
            played: &played,
            fen_before: fen,
            fen_after: None,
            eval_before: 0,
            eval_after: 30,
            is_white: true,
            top_moves_after: None,
        });
        assert!(!report.is_sacrifice);
    }

    #[test]
    fn even_capture_is_not_a_sacrifice() {
        // Rook takes rook: immediate return too high.
        let fen = "4k3/8/8/8/3r4/8/8/3RK3 w - - 0 1";
        let played = verbose(fen, "d1d4");
        let report = analyze(&SacrificeInput {
            played: &played,
            fen_before: fen,
            fen_after: None,
            eval_before: 0,
            eval_after: 0,
            is_white: true,
            top_moves_after: None,
        });
        assert!(!report.is_sacrifice);
        assert_eq!(report.net, 0);
    }

    // -----------------------------------------------------------------------
    // Hanging-piece traps
    // -----------------------------------------------------------------------

    #[test]
    fn poisoned_capture_flagged_when_engine_refuses_it() {
        // Queen takes a pawn and can be recaptured by the rook; the engine's
        // top replies do not include the recapture at all.
        let fen = "4k3/p3rp2/8/8/8/8/8/Q3K3 w - - 0 1";
        let played = verbose(fen, "a1a7");
        let fen_after = Position::from_fen(fen)
            .unwrap()
            .apply_uci("a1a7")
            .unwrap()
            .fen();
        let top = vec![
            TopMove {
                uci: "e8d8".into(),
                cp: -50,
            },
            TopMove {
                uci: "f7f6".into(),
                cp: -80,
            },
        ];
        let report = analyze(&SacrificeInput {
            played: &played,
            fen_before: fen,
            fen_after: Some(&fen_after),
            eval_before: 100,
            eval_after: 150,
            is_white: true,
            top_moves_after: Some(&top),
        });
        assert!(report.is_sacrifice);
        assert!(report.is_hanging_piece_sacrifice);
        assert!(report.taking_is_mistake);
        assert_eq!(report.compensation, CompensationType::Trap);
    }
}
