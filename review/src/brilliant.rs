//! Brilliant-move detection: an unexpected sacrifice with proven
//! compensation. Built as a gauntlet of rejections; every exit records its
//! reason so a rejected candidate can be explained.

use chess::{PieceKind, Position};

use crate::config::ReviewConfig;
use crate::context::MoveContext;
use crate::sacrifice::{self, SacrificeInput};
use crate::score::{extract_mate_in, is_mate_for_player, piece_value};
use crate::themes::helpers::attackers_of;

const NEAR_BEST_TOLERANCE: i32 = 20;
const NORMAL_LOSS_CEILING: i32 = 25;
const TRAP_LOSS_CEILING: i32 = 60;
const BOOK_PHASE_MOVES: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrilliantKind {
    Sacrifice,
}

#[derive(Debug, Clone)]
pub struct BrilliantReport {
    pub is_brilliant: bool,
    pub kind: Option<BrilliantKind>,
    pub reason: &'static str,
    pub confidence: u8,
}

impl BrilliantReport {
    fn reject(reason: &'static str) -> Self {
        Self {
            is_brilliant: false,
            kind: None,
            reason,
            confidence: 0,
        }
    }

    fn accept(reason: &'static str, confidence: u8) -> Self {
        Self {
            is_brilliant: true,
            kind: Some(BrilliantKind::Sacrifice),
            reason,
            confidence,
        }
    }
}

pub fn detect_brilliant(ctx: &MoveContext, cp_loss: i32, config: &ReviewConfig) -> BrilliantReport {
    let Some(position_before) = ctx.position_before() else {
        return BrilliantReport::reject("position unavailable");
    };

    // 1–2. Forced contexts can contain no brilliance.
    if position_before.is_check() {
        return BrilliantReport::reject("response to check is forced");
    }
    if position_before.is_forced() {
        return BrilliantReport::reject("only legal move");
    }

    let had_mate = is_mate_for_player(ctx.eval_before, ctx.is_white_move);

    // 3. Queen sacrifice that forces mate: accepted outright, no loss ceiling.
    if queen_sac_with_mate(ctx) {
        return BrilliantReport::accept("queen sacrifice forcing mate", 99);
    }

    // 4. Already winning big: strong moves are expected, not brilliant.
    if ctx.player_eval_before() > config.still_winning.brilliant {
        return BrilliantReport::reject("already winning");
    }

    // 5. Tactical trap: a capture left en prise on purpose, with a relaxed
    //    loss ceiling.
    let trap_eligible =
        cp_loss <= TRAP_LOSS_CEILING && ctx.player_eval_before() >= -200 && !had_mate;
    if trap_eligible && tactical_trap(ctx) {
        return finish(ctx, BrilliantReport::accept("tactical trap sacrifice", 85));
    }

    // 6. Must be the best move or within a whisker of it.
    if !near_best(ctx, cp_loss) {
        return BrilliantReport::reject("not close enough to best");
    }

    // 7. Normal loss ceiling.
    if cp_loss > NORMAL_LOSS_CEILING {
        return BrilliantReport::reject("too much loss");
    }

    // 8. Opening theory phase.
    if ctx.move_number <= BOOK_PHASE_MOVES {
        return BrilliantReport::reject("book phase");
    }

    // 9. Simple pawn push.
    if ctx.played.piece == PieceKind::Pawn
        && !ctx.played.is_capture
        && ctx.played.promotion.is_none()
    {
        return BrilliantReport::reject("simple pawn push");
    }

    // 10. Continuing a mate already on the board.
    if had_mate {
        let before_dist = extract_mate_in(ctx.eval_before).map(i32::abs).unwrap_or(0);
        let after_dist = extract_mate_in(ctx.eval_after).map(i32::abs);
        let still_on_track = is_mate_for_player(ctx.eval_after, ctx.is_white_move)
            && after_dist.map(|d| d >= before_dist - 1).unwrap_or(false);
        if still_on_track {
            return BrilliantReport::reject("mate was already there");
        }
    }

    // 11–14. Ordinary good captures dressed up as sacrifices.
    if let Some(rejection) = routine_capture(ctx, &position_before) {
        return BrilliantReport::reject(rejection);
    }

    // The gauntlet is passed; now the move has to actually be a sacrifice
    // with compensation.
    let report = sacrifice::analyze(&SacrificeInput {
        played: &ctx.played,
        fen_before: &ctx.fen_before,
        fen_after: ctx.fen_after_valid.then_some(ctx.fen_after.as_str()),
        eval_before: ctx.eval_before,
        eval_after: ctx.eval_after,
        is_white: ctx.is_white_move,
        top_moves_after: Some(&ctx.top_moves_after),
    });

    let swing = ctx.player_eval_after() - ctx.player_eval_before();
    let new_mate = report.leads_to_mate && !had_mate;
    let not_losing = ctx.player_eval_before() >= -200;

    let accepted = report.is_sacrifice
        && report.has_compensation
        && not_losing
        && !had_mate
        && (report.is_hanging_piece_sacrifice || new_mate || swing >= 150);

    if !accepted {
        return BrilliantReport::reject("no proven sacrifice");
    }

    finish(
        ctx,
        BrilliantReport::accept("sacrifice with compensation", 90),
    )
}

/// Post-acceptance false-positive filters.
fn finish(ctx: &MoveContext, report: BrilliantReport) -> BrilliantReport {
    let moved = ctx.played.piece;
    let captured = ctx.played.captured;

    if moved == PieceKind::Queen && captured == Some(PieceKind::Queen) {
        return BrilliantReport::reject("automatic queen trade");
    }

    let sac_value = piece_value(moved);
    let immediate_return = captured.map(piece_value).unwrap_or(0);
    if immediate_return > sac_value {
        return BrilliantReport::reject("move wins material outright");
    }
    if ctx.played.is_capture && (sac_value - immediate_return).abs() < 50 {
        return BrilliantReport::reject("regular trade");
    }

    report
}

/// Rejections 11–14: free captures, king recaptures, trades and plain
/// material wins.
fn routine_capture(ctx: &MoveContext, position_before: &Position) -> Option<&'static str> {
    let Some(captured) = ctx.played.captured else {
        return None;
    };
    let board = position_before.board();
    let destination = ctx.played.mv.to;
    let opponent = !board.side_to_move();

    // 11. Free capture: the victim had no defender.
    if attackers_of(board, destination, opponent).is_empty() {
        return Some("free capture");
    }

    // 12. King recapture in a near-forced position.
    if ctx.played.piece == PieceKind::King {
        let near_forced = position_before.legal_move_count() <= 3 || top_gap(ctx) > 200;
        if near_forced {
            return Some("king recapture");
        }
    }

    let moved_value = piece_value(ctx.played.piece);
    let captured_value = piece_value(captured);

    // 13. Even trade, or a capture our own piece backs up.
    if captured_value >= moved_value - 100 {
        return Some("even or winning trade");
    }
    if ctx.fen_after_valid {
        if let Ok(after) = Position::from_fen(&ctx.fen_after) {
            let us = !after.board().side_to_move();
            if !attackers_of(after.board(), destination, us).is_empty() {
                return Some("backed-up capture");
            }
        }
    }

    // 14. The eval swing is just the captured material.
    let swing = ctx.player_eval_after() - ctx.player_eval_before();
    if captured_value >= moved_value && (swing - captured_value).abs() <= 150 {
        return Some("simple material gain");
    }

    None
}

/// Gap between the engine's first and second choices, when known.
fn top_gap(ctx: &MoveContext) -> i32 {
    match (ctx.top_moves.first(), ctx.top_moves.get(1)) {
        (Some(first), Some(second)) => {
            let sign = if ctx.is_white_move { 1 } else { -1 };
            (sign * (first.cp - second.cp)).max(0)
        }
        _ => 0,
    }
}

/// The played move is the engine's best, or scores within tolerance of it.
fn near_best(ctx: &MoveContext, cp_loss: i32) -> bool {
    if ctx.played_uci == ctx.best_move_uci {
        return true;
    }
    if let Some(entry) = ctx.top_moves.iter().find(|t| t.uci == ctx.played_uci) {
        if let Some(first) = ctx.top_moves.first() {
            let sign = if ctx.is_white_move { 1 } else { -1 };
            return sign * (first.cp - entry.cp) <= NEAR_BEST_TOLERANCE;
        }
    }
    cp_loss <= NEAR_BEST_TOLERANCE
}

/// A capture left en prise whose acceptance loses: the relaxed trap check.
fn tactical_trap(ctx: &MoveContext) -> bool {
    if !ctx.played.is_capture || !ctx.fen_after_valid {
        return false;
    }
    let moved_value = piece_value(ctx.played.piece);
    let return_value = ctx.played.captured.map(piece_value).unwrap_or(0);
    if moved_value - return_value < 100 {
        return false;
    }

    // The moved piece must actually be capturable where it landed.
    let Ok(after) = Position::from_fen(&ctx.fen_after) else {
        return false;
    };
    let opponent = after.board().side_to_move();
    if attackers_of(after.board(), ctx.played.mv.to, opponent).is_empty() {
        return false;
    }

    sacrifice::capture_is_mistake_for_opponent(
        &SacrificeInput {
            played: &ctx.played,
            fen_before: &ctx.fen_before,
            fen_after: Some(&ctx.fen_after),
            eval_before: ctx.eval_before,
            eval_after: ctx.eval_after,
            is_white: ctx.is_white_move,
            top_moves_after: Some(&ctx.top_moves_after),
        },
        &ctx.fen_after,
    )
}

/// The queen-sacrifice-with-mate short-circuit.
///
/// A checking queen move that the opponent either must take into a
/// recapture, or may take only at the price of immediate mate while a
/// quiet alternative exists, making the capture a genuine mistake.
fn queen_sac_with_mate(ctx: &MoveContext) -> bool {
    if ctx.played.piece != PieceKind::Queen || !ctx.played.gives_check {
        return false;
    }
    if !ctx.fen_after_valid {
        return false;
    }
    let Ok(after) = Position::from_fen(&ctx.fen_after) else {
        return false;
    };

    let queen_square = ctx.played.mv.to;
    let responses = after.legal_moves();

    // Single forced reply that takes the queen: brilliant if we recapture.
    if responses.len() == 1 {
        let only = &responses[0];
        if only.mv.to == queen_square && only.is_capture {
            if let Ok(next) = after.apply(only.mv) {
                return next
                    .legal_moves()
                    .iter()
                    .any(|reply| reply.mv.to == queen_square && reply.is_capture);
            }
        }
        return false;
    }

    // Taking must be possible but punished by mate next ply, and declining
    // must also be possible: the opponent had a real choice.
    let has_non_capture_reply = responses.iter().any(|r| !r.is_capture);
    if !has_non_capture_reply {
        return false;
    }

    let queen_captures: Vec<_> = responses
        .iter()
        .filter(|r| r.mv.to == queen_square && r.is_capture)
        .collect();
    if queen_captures.is_empty() {
        return false;
    }

    queen_captures.iter().any(|capture| {
        after
            .apply(capture.mv)
            .map(|next| {
                next.legal_moves()
                    .iter()
                    .any(|reply| next.apply(reply.mv).map(|p| p.is_checkmate()).unwrap_or(false))
            })
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::build_context;
    use engine::{encode_mate_score, EngineAnalysis, TopMove};

    fn analysis(evaluation: i32, best: &str, tops: &[(&str, i32)]) -> EngineAnalysis {
        EngineAnalysis {
            evaluation,
            best_move: best.to_string(),
            top_moves: tops
                .iter()
                .map(|(uci, cp)| TopMove {
                    uci: uci.to_string(),
                    cp: *cp,
                })
                .collect(),
            depth: 18,
        }
    }

    // -----------------------------------------------------------------------
    // Mandatory rejections
    // -----------------------------------------------------------------------

    #[test]
    fn forced_moves_are_never_brilliant() {
        // Only one legal move: Kxg2.
        let fen = "7k/8/8/8/8/8/6q1/7K w - - 0 1";
        let ctx = build_context(
            fen,
            "h1g2",
            &analysis(-50, "h1g2", &[("h1g2", -50)]),
            &analysis(-40, "", &[]),
            30,
        )
        .unwrap();
        let report = detect_brilliant(&ctx, 0, &ReviewConfig::default());
        assert!(!report.is_brilliant);
    }

    #[test]
    fn winning_positions_are_rejected() {
        let fen = "4k3/8/8/8/8/8/8/RN2K3 w - - 0 1";
        let ctx = build_context(
            fen,
            "b1c3",
            &analysis(450, "b1c3", &[("b1c3", 450)]),
            &analysis(460, "", &[]),
            20,
        )
        .unwrap();
        let report = detect_brilliant(&ctx, 5, &ReviewConfig::default());
        assert!(!report.is_brilliant);
        assert_eq!(report.reason, "already winning");
    }

    #[test]
    fn book_phase_is_rejected() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let ctx = build_context(
            fen,
            "b1c3",
            &analysis(20, "b1c3", &[("b1c3", 20)]),
            &analysis(25, "", &[]),
            4,
        )
        .unwrap();
        let report = detect_brilliant(&ctx, 5, &ReviewConfig::default());
        assert!(!report.is_brilliant);
        assert_eq!(report.reason, "book phase");
    }

    #[test]
    fn pawn_pushes_are_rejected() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let ctx = build_context(
            fen,
            "e2e4",
            &analysis(20, "e2e4", &[("e2e4", 20)]),
            &analysis(25, "", &[]),
            15,
        )
        .unwrap();
        let report = detect_brilliant(&ctx, 0, &ReviewConfig::default());
        assert!(!report.is_brilliant);
        assert_eq!(report.reason, "simple pawn push");
    }

    #[test]
    fn free_captures_are_rejected() {
        // Rook takes an undefended knight: good, not brilliant.
        let fen = "4k3/8/8/3n4/8/8/8/3RK3 w - - 0 1";
        let ctx = build_context(
            fen,
            "d1d5",
            &analysis(100, "d1d5", &[("d1d5", 100)]),
            &analysis(380, "", &[]),
            20,
        )
        .unwrap();
        let report = detect_brilliant(&ctx, 0, &ReviewConfig::default());
        assert!(!report.is_brilliant);
        assert_eq!(report.reason, "free capture");
    }

    // -----------------------------------------------------------------------
    // Acceptance
    // -----------------------------------------------------------------------

    #[test]
    fn compensated_knight_sacrifice_is_brilliant() {
        // Quiet knight move into a capturable square, compensation confirmed
        // by the evaluations.
        let fen = "r3k3/8/8/8/8/2N5/8/4K3 w - - 0 1";
        let ctx = build_context(
            fen,
            "c3b5",
            &analysis(-50, "c3b5", &[("c3b5", -50), ("e1d2", -80)]),
            &analysis(260, "", &[]),
            20,
        )
        .unwrap();
        let report = detect_brilliant(&ctx, 0, &ReviewConfig::default());
        assert!(report.is_brilliant, "rejected for: {}", report.reason);
        assert_eq!(report.kind, Some(BrilliantKind::Sacrifice));
    }

    #[test]
    fn queen_sac_forcing_mate_short_circuits() {
        // Philidor's legacy, one move early: Qg8+!! forces Rxg8 (the king
        // cannot take, the h6 knight guards g8) and the knight recaptures.
        let fen = "5r1k/6pp/7N/3Q4/8/8/8/6K1 w - - 0 1";
        let ctx = build_context(
            fen,
            "d5g8",
            &analysis(300, "d5g8", &[("d5g8", 300)]),
            &analysis(encode_mate_score(2), "", &[]),
            18,
        )
        .unwrap();
        let report = detect_brilliant(&ctx, 40, &ReviewConfig::default());
        assert!(report.is_brilliant, "rejected for: {}", report.reason);
        assert_eq!(report.confidence, 99);
    }
}
