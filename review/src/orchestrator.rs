//! The classification cascade: one label per ply, first detector to speak
//! wins, a threshold table as the final word.

use chess::PieceColor;
use engine::EngineAnalysis;

use crate::book::classify_book;
use crate::brilliant::detect_brilliant;
use crate::classify::{
    detect_blunder, detect_great, detect_inaccuracy, detect_miss, detect_mistake,
};
use crate::config::ReviewConfig;
use crate::context::{build_context, centipawn_loss, MoveContext};
use crate::error::ReviewError;
use crate::mate::classify_mate;
use crate::score::is_mate_for_player;
use crate::top_move::{classify_top_move, marker_for_loss};
use crate::types::MarkerType;

/// The cascade's verdict for one ply.
#[derive(Debug, Clone)]
pub struct Classification {
    pub marker: MarkerType,
    pub centipawn_loss: i32,
    pub context: MoveContext,
}

/// Classify one played move from its surrounding analyses.
///
/// Both analyses must already be in White's perspective. This function never
/// fails on *chess* grounds, only on unusable input.
pub fn classify_move(
    fen_before: &str,
    played_uci: &str,
    analysis_before: &EngineAnalysis,
    analysis_after: &EngineAnalysis,
    move_number: u32,
    winner: Option<PieceColor>,
    config: &ReviewConfig,
) -> Result<Classification, ReviewError> {
    let ctx = build_context(
        fen_before,
        played_uci,
        analysis_before,
        analysis_after,
        move_number,
    )?;

    let done = |marker: MarkerType, loss: i32| {
        Ok(Classification {
            marker,
            centipawn_loss: loss,
            context: ctx.clone(),
        })
    };

    // 1. Opening theory needs no engine opinion.
    if classify_book(
        &ctx.fen_before,
        &ctx.fen_after,
        move_number,
        config.max_book_moves,
    )
    .is_some()
    {
        return done(MarkerType::Book, 0);
    }

    // 2. Checkmate delivered.
    if ctx.played.san.contains('#') {
        return done(MarkerType::Best, 0);
    }

    // 3–4. Raw loss, softened slightly for the first few plies.
    let mut loss = centipawn_loss(&ctx, winner, config);
    if move_number <= 4 {
        loss = (loss as f64 * config.early_ply_forgiveness).round() as i32;
    }

    // 5. Mate sequences get their own grading.
    if let Some((marker, mate_loss)) = classify_mate(&ctx) {
        return done(marker, mate_loss);
    }

    // 6. Brilliance.
    let brilliant = detect_brilliant(&ctx, loss, config);
    if brilliant.is_brilliant {
        tracing::debug!(
            move_number,
            uci = %ctx.played_uci,
            reason = brilliant.reason,
            confidence = brilliant.confidence,
            "Brilliant move"
        );
        return done(MarkerType::Brilliant, loss);
    }

    // 7. A lossless move is Best, unless the engine contradicted itself.
    if loss == 0 {
        let inconsistent = (ctx.eval_after - ctx.eval_if_best_move).abs() > 500;
        if !inconsistent {
            return done(MarkerType::Best, 0);
        }
    }

    // 8. The move was on the engine's shortlist.
    if let Some((marker, top_loss)) = classify_top_move(&ctx, loss, &config.thresholds) {
        return done(marker, top_loss);
    }

    // 9. Great.
    if detect_great(&ctx, loss).is_some() {
        return done(MarkerType::Great, loss);
    }

    // 10–11. Negative tiers, worst first; a mate still in hand downgrades
    // any of them to Good.
    let candidate = detect_blunder(&ctx, loss, config)
        .or_else(|| detect_mistake(&ctx, loss, config))
        .or_else(|| detect_miss(&ctx, loss))
        .or_else(|| detect_inaccuracy(&ctx, loss));

    let mate_in_hand = is_mate_for_player(ctx.eval_after, ctx.is_white_move);

    if let Some(found) = candidate {
        let marker = if mate_in_hand && is_negative(found.marker) {
            MarkerType::Good
        } else {
            found.marker
        };
        return done(marker, loss);
    }

    // 12. Threshold table, same mate-safety net, plus the still-winning
    // leniency the dedicated detectors already apply.
    let mut fallback = marker_for_loss(loss, &config.thresholds);
    if mate_in_hand && is_negative(fallback) {
        fallback = MarkerType::Good;
    }
    let after = ctx.player_eval_after();
    if fallback == MarkerType::Blunder && after >= config.still_winning.blunder {
        fallback = MarkerType::Mistake;
    }
    if fallback == MarkerType::Mistake && after >= config.still_winning.mistake {
        fallback = MarkerType::Good;
    }
    done(fallback, loss)
}

fn is_negative(marker: MarkerType) -> bool {
    matches!(
        marker,
        MarkerType::Inaccuracy | MarkerType::Mistake | MarkerType::Blunder
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{encode_mate_score, TopMove};

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

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
            depth: 16,
        }
    }

    #[test]
    fn opening_theory_is_book() {
        let result = classify_move(
            START_FEN,
            "e2e4",
            &analysis(30, "e2e4", &[("e2e4", 30)]),
            &analysis(-25, "", &[]),
            1,
            None,
            &ReviewConfig::default(),
        )
        .unwrap();
        assert_eq!(result.marker, MarkerType::Book);
        assert_eq!(result.centipawn_loss, 0);
    }

    #[test]
    fn delivered_mate_is_best() {
        let fen = "rnbqkbnr/ppppp2p/5p2/6p1/4P3/8/PPPP1PPP/RNBQKBNR w KQkq g6 0 3";
        let result = classify_move(
            fen,
            "d1h5",
            &analysis(encode_mate_score(1), "d1h5", &[("d1h5", encode_mate_score(1))]),
            &analysis(encode_mate_score(0), "", &[]),
            3,
            None,
            &ReviewConfig::default(),
        )
        .unwrap();
        assert_eq!(result.marker, MarkerType::Best);
        assert_eq!(result.centipawn_loss, 0);
    }

    #[test]
    fn zero_loss_outside_book_is_best() {
        // A middlegame position, engine agrees with the move.
        let fen = "r1bq1rk1/pppp1ppp/2n2n2/2b1p3/2B1P3/2NP1N2/PPP2PPP/R1BQ1RK1 w - - 6 6";
        let result = classify_move(
            fen,
            "c1g5",
            &analysis(40, "c1g5", &[("c1g5", 40), ("a2a3", 30), ("d1e2", 25)]),
            &analysis(40, "", &[]),
            14,
            None,
            &ReviewConfig::default(),
        )
        .unwrap();
        assert_eq!(result.marker, MarkerType::Best);
    }

    #[test]
    fn large_loss_falls_to_blunder() {
        let fen = "r1bq1rk1/pppp1ppp/2n2n2/2b1p3/2B1P3/2NP1N2/PPP2PPP/R1BQ1RK1 w - - 6 6";
        let result = classify_move(
            fen,
            "c4f7",
            &analysis(40, "c1g5", &[("c1g5", 40), ("a2a3", 30)]),
            &analysis(-420, "", &[]),
            14,
            None,
            &ReviewConfig::default(),
        )
        .unwrap();
        assert_eq!(result.marker, MarkerType::Blunder);
        assert!(result.centipawn_loss >= 250);
    }

    #[test]
    fn mate_in_hand_never_reads_as_negative() {
        // The engine's before-line had no mate, the after-position suddenly
        // does; whatever the bands say, a mate in hand is not punished.
        let fen = "r1bq1rk1/pppp1ppp/2n2n2/2b1p3/2B1P3/2NP1N2/PPP2PPP/R1BQ1RK1 w - - 6 6";
        let result = classify_move(
            fen,
            "a2a3",
            &analysis(300, "c1g5", &[("c1g5", 300), ("a2a3", 250)]),
            &analysis(encode_mate_score(6), "", &[]),
            14,
            None,
            &ReviewConfig::default(),
        )
        .unwrap();
        assert!(
            !matches!(
                result.marker,
                MarkerType::Blunder | MarkerType::Mistake | MarkerType::Inaccuracy
            ),
            "got {:?}",
            result.marker
        );
    }

    #[test]
    fn winner_adjustment_changes_loss() {
        let fen = "r1bq1rk1/pppp1ppp/2n2n2/2b1p3/2B1P3/2NP1N2/PPP2PPP/R1BQ1RK1 w - - 6 6";
        let base = classify_move(
            fen,
            "a2a3",
            &analysis(40, "c1g5", &[("c1g5", 40)]),
            &analysis(-40, "", &[]),
            14,
            None,
            &ReviewConfig::default(),
        )
        .unwrap();
        let as_winner = classify_move(
            fen,
            "a2a3",
            &analysis(40, "c1g5", &[("c1g5", 40)]),
            &analysis(-40, "", &[]),
            14,
            Some(PieceColor::White),
            &ReviewConfig::default(),
        )
        .unwrap();
        assert!(as_winner.centipawn_loss < base.centipawn_loss);
    }
}
