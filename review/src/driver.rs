//! The review driver: walks a parsed game ply by ply, asks the engine pool
//! for the two surrounding analyses, runs the cascade, and aggregates
//! accuracy and summary counts.

use std::future::Future;

use chess::{PieceColor, Position};
use engine::{AnalyzeOpts, EngineAnalysis, EngineError, EnginePool};

use crate::book::classify_book;
use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::orchestrator::classify_move;
use crate::types::{
    now_millis, Accuracy, GameRecord, MarkerSummary, MarkerType, MoveEvaluation, MoveReport,
    ReviewResult,
};

/// Synthetic evaluation magnitude for an already-decided position.
const TERMINAL_MATE_SCORE: i32 = 99_999;

/// Where per-position analyses come from. The pool implements it; tests
/// substitute a scripted stand-in.
pub trait AnalysisProvider: Sync {
    fn analyze(
        &self,
        fen: &str,
        opts: AnalyzeOpts,
    ) -> impl Future<Output = Result<EngineAnalysis, EngineError>> + Send;
}

impl AnalysisProvider for EnginePool {
    async fn analyze(&self, fen: &str, opts: AnalyzeOpts) -> Result<EngineAnalysis, EngineError> {
        EnginePool::analyze(self, fen, opts).await
    }
}

/// Signals that the host no longer wants events; the driver aborts.
#[derive(Debug)]
pub struct Cancelled;

pub type ProgressFn = Box<dyn FnMut(u32, u32) -> Result<(), Cancelled> + Send>;
pub type MoveFn = Box<dyn FnMut(&MoveReport) -> Result<(), Cancelled> + Send>;

#[derive(Default)]
pub struct ReviewOptions {
    /// Fixed depth override; otherwise the progressive schedule applies.
    pub depth: Option<u32>,
    pub on_progress: Option<ProgressFn>,
    pub on_move: Option<MoveFn>,
}

/// Review a whole game. All-or-nothing: a ply failing terminally aborts the
/// review with no partial result.
pub async fn review_game<P: AnalysisProvider>(
    provider: &P,
    game: &GameRecord,
    config: &ReviewConfig,
    mut options: ReviewOptions,
) -> Result<ReviewResult, ReviewError> {
    let total = game.moves.len() as u32;
    tracing::info!(plies = total, "Starting game review");

    let mut evaluations: Vec<MoveEvaluation> = Vec::with_capacity(game.moves.len());
    let mut summary = MarkerSummary::default();
    let mut white_scores: Vec<f64> = Vec::new();
    let mut black_scores: Vec<f64> = Vec::new();

    for (index, recorded) in game.moves.iter().enumerate() {
        let move_number = (index / 2 + 1) as u32;
        let is_white = chess::fen::side_to_move(&recorded.fen_before)
            .map(PieceColor::is_white)
            .unwrap_or(index % 2 == 0);

        // Book shortcut: no engine calls at all.
        let evaluation = if classify_book(
            &recorded.fen_before,
            &recorded.fen_after,
            move_number,
            config.max_book_moves,
        )
        .is_some()
        {
            MoveEvaluation {
                fen: recorded.fen_before.clone(),
                move_san: recorded.san.clone(),
                eval_before: 0,
                eval_after: 0,
                best_move: String::new(),
                best_move_san: String::new(),
                marker: MarkerType::Book,
                centipawn_loss: 0,
                depth: 0,
                timestamp: now_millis(),
            }
        } else {
            let depth = options
                .depth
                .unwrap_or_else(|| config.progressive.depth_for(index));

            let before = normalize(
                analyze_with_retry(provider, &recorded.fen_before, depth, config).await?,
                &recorded.fen_before,
            );
            let after = normalize(
                analyze_or_terminal(provider, &recorded.fen_after, depth, config).await?,
                &recorded.fen_after,
            );

            let classification = classify_move(
                &recorded.fen_before,
                &recorded.uci,
                &before,
                &after,
                move_number,
                game.winner,
                config,
            )?;

            tracing::debug!(
                ply = index + 1,
                san = %recorded.san,
                marker = %classification.marker,
                cp_loss = classification.centipawn_loss,
                "Ply classified"
            );

            MoveEvaluation {
                fen: recorded.fen_before.clone(),
                move_san: recorded.san.clone(),
                eval_before: before.evaluation,
                eval_after: after.evaluation,
                best_move: before.best_move.clone(),
                best_move_san: uci_to_san(&recorded.fen_before, &before.best_move),
                marker: classification.marker,
                centipawn_loss: classification.centipawn_loss,
                depth: before.depth,
                timestamp: now_millis(),
            }
        };

        let accuracy = move_accuracy(evaluation.marker, evaluation.centipawn_loss);
        if is_white {
            white_scores.push(accuracy);
        } else {
            black_scores.push(accuracy);
        }
        summary.record(evaluation.marker);

        let report = MoveReport {
            move_number,
            fen: evaluation.fen.clone(),
            move_san: evaluation.move_san.clone(),
            marker_type: evaluation.marker,
            centipawn_loss: evaluation.centipawn_loss,
            evaluation_before: evaluation.eval_before,
            evaluation_after: evaluation.eval_after,
            best_move: evaluation.best_move.clone(),
        };
        evaluations.push(evaluation);

        if let Some(on_progress) = options.on_progress.as_mut() {
            on_progress((index + 1) as u32, total).map_err(|_| ReviewError::CancelledByClient)?;
        }
        if let Some(on_move) = options.on_move.as_mut() {
            on_move(&report).map_err(|_| ReviewError::CancelledByClient)?;
        }
    }

    let result = ReviewResult {
        accuracy: Accuracy {
            white: average(&white_scores),
            black: average(&black_scores),
        },
        summary,
        total_moves: total,
        evaluations,
    };

    tracing::info!(
        white_accuracy = result.accuracy.white,
        black_accuracy = result.accuracy.black,
        "Review complete"
    );
    Ok(result)
}

/// Per-move accuracy contribution: exponential decay in the loss, book and
/// lossless moves counting as a full hundred.
fn move_accuracy(marker: MarkerType, cp_loss: i32) -> f64 {
    if marker == MarkerType::Book {
        return 100.0;
    }
    let capped = cp_loss.clamp(0, 200);
    (100.0 * 0.995f64.powi(capped)).clamp(0.0, 100.0)
}

fn average(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 100.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Flip an analysis into White's perspective when Black was to move.
fn normalize(mut analysis: EngineAnalysis, fen: &str) -> EngineAnalysis {
    if chess::fen::side_to_move(fen) == Some(PieceColor::Black) {
        analysis.evaluation = -analysis.evaluation;
        for top in &mut analysis.top_moves {
            top.cp = -top.cp;
        }
    }
    analysis
}

/// Three attempts, widening timeout and shrinking depth. An attempt without
/// top moves counts as a failure.
async fn analyze_with_retry<P: AnalysisProvider>(
    provider: &P,
    fen: &str,
    depth: u32,
    config: &ReviewConfig,
) -> Result<EngineAnalysis, ReviewError> {
    let mut last_error: Option<EngineError> = None;

    for attempt in 1..=config.retry_attempts.max(1) {
        let attempt_depth = depth.saturating_sub(attempt - 1).max(config.min_depth);
        let opts = AnalyzeOpts {
            depth: config.movetime_ms.is_none().then_some(attempt_depth),
            movetime_ms: config.movetime_ms,
            timeout: config.analysis_timeout * attempt,
        };

        match provider.analyze(fen, opts).await {
            Ok(analysis) if !analysis.top_moves.is_empty() => return Ok(analysis),
            Ok(_) => {
                tracing::warn!(fen, attempt, "Analysis returned no top moves, retrying");
                last_error = Some(EngineError::InvalidOutput("no top moves".to_string()));
            }
            Err(e) => {
                tracing::warn!(fen, attempt, error = %e, "Analysis attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(ReviewError::Engine(last_error.unwrap_or(
        EngineError::InvalidOutput("analysis never ran".to_string()),
    )))
}

/// Decided positions get a synthetic analysis instead of an engine call;
/// engines answer `bestmove (none)` there.
async fn analyze_or_terminal<P: AnalysisProvider>(
    provider: &P,
    fen: &str,
    depth: u32,
    config: &ReviewConfig,
) -> Result<EngineAnalysis, ReviewError> {
    if let Ok(position) = Position::from_fen(fen) {
        if position.is_game_over() {
            let evaluation = if position.is_checkmate() {
                // The side to move is the side that got mated.
                -TERMINAL_MATE_SCORE
            } else {
                0
            };
            return Ok(EngineAnalysis {
                evaluation,
                best_move: String::new(),
                top_moves: vec![],
                depth,
            });
        }
    }
    analyze_with_retry(provider, fen, depth, config).await
}

/// Best-effort SAN for the engine's move; falls back to the UCI string.
fn uci_to_san(fen: &str, uci: &str) -> String {
    if uci.is_empty() {
        return String::new();
    }
    let Ok(board) = fen.parse::<cozy_chess::Board>() else {
        return uci.to_string();
    };
    match chess::parse_uci_on(&board, uci) {
        Ok(mv) => chess::format_san(&board, mv).unwrap_or_else(|_| uci.to_string()),
        Err(_) => uci.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chess::{parse_pgn, replay};
    use engine::TopMove;

    use crate::types::RecordedMove;

    /// Scripted provider: side-to-move-perspective evaluations per FEN.
    struct StubProvider {
        analyses: HashMap<String, EngineAnalysis>,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new() -> Self {
            Self {
                analyses: HashMap::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn with(mut self, fen: &str, evaluation: i32, best: &str, tops: &[(&str, i32)]) -> Self {
            self.analyses.insert(
                fen.to_string(),
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
                },
            );
            self
        }
    }

    impl AnalysisProvider for StubProvider {
        async fn analyze(
            &self,
            fen: &str,
            _opts: AnalyzeOpts,
        ) -> Result<EngineAnalysis, EngineError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.analyses
                .get(fen)
                .cloned()
                .ok_or(EngineError::AnalysisTimeout)
        }
    }

    fn game_from_pgn(pgn: &str) -> GameRecord {
        let parsed = parse_pgn(pgn).unwrap();
        let moves = replay(&parsed)
            .unwrap()
            .into_iter()
            .map(RecordedMove::from)
            .collect();
        let mut record = GameRecord::new(parsed.start_fen(), moves);
        record.winner = parsed.winner();
        record
    }

    #[tokio::test]
    async fn book_openings_need_no_engine() {
        // Ruy Lopez through 4...Nf6: all book, engine never consulted.
        let game = game_from_pgn("1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 4. Ba4 Nf6 *");
        let provider = StubProvider::new();

        let result = review_game(&provider, &game, &ReviewConfig::default(), ReviewOptions::default())
            .await
            .unwrap();

        assert_eq!(result.total_moves, 8);
        assert_eq!(result.summary.book, 8);
        assert_eq!(provider.calls.load(Ordering::Relaxed), 0);
        assert_eq!(result.accuracy.white, 100.0);
        assert_eq!(result.accuracy.black, 100.0);
    }

    #[tokio::test]
    async fn non_book_game_is_classified_and_normalized() {
        // Single ply from a custom (non-book) position, Black to move: the
        // stub answers in Black's perspective, the driver flips signs.
        let start = "r1bq1rk1/pppp1ppp/2n2n2/2b1p3/2B1P3/2NP1N2/PPP2PPP/R1BQ1RK1 b - - 6 6";
        let game = {
            let pos = Position::from_fen(start).unwrap();
            let verbose = pos.find_uci("d7d6").unwrap();
            let after = pos.apply(verbose.mv).unwrap();
            GameRecord::new(
                start.to_string(),
                vec![RecordedMove {
                    san: verbose.san.clone(),
                    uci: verbose.uci.clone(),
                    fen_before: start.to_string(),
                    fen_after: after.fen(),
                }],
            )
        };

        let fen_after = game.moves[0].fen_after.clone();
        // Black to move before: +20 for Black. White to move after: +10 for White.
        let provider = StubProvider::new()
            .with(start, 20, "d7d6", &[("d7d6", 20), ("c5b4", 10), ("a7a6", 5)])
            .with(&fen_after, 10, "c1g5", &[("c1g5", 10)]);

        let result = review_game(&provider, &game, &ReviewConfig::default(), ReviewOptions::default())
            .await
            .unwrap();

        let evaluation = &result.evaluations[0];
        // Normalized to White's perspective: Black's +20 becomes -20.
        assert_eq!(evaluation.eval_before, -20);
        assert_eq!(evaluation.eval_after, 10);
        assert_eq!(evaluation.best_move, "d7d6");
        assert_eq!(evaluation.best_move_san, "d6");
        assert!(result.summary.total() == 1);
    }

    #[tokio::test]
    async fn engine_failure_aborts_the_review() {
        let start = "r1bq1rk1/pppp1ppp/2n2n2/2b1p3/2B1P3/2NP1N2/PPP2PPP/R1BQ1RK1 b - - 6 6";
        let pos = Position::from_fen(start).unwrap();
        let verbose = pos.find_uci("d7d6").unwrap();
        let after = pos.apply(verbose.mv).unwrap();
        let game = GameRecord::new(
            start.to_string(),
            vec![RecordedMove {
                san: verbose.san,
                uci: verbose.uci,
                fen_before: start.to_string(),
                fen_after: after.fen(),
            }],
        );

        // Provider knows nothing: every attempt times out.
        let provider = StubProvider::new();
        let result =
            review_game(&provider, &game, &ReviewConfig::default(), ReviewOptions::default()).await;
        assert!(matches!(result, Err(ReviewError::Engine(_))));
        // Three retries were made for the first analysis.
        assert_eq!(provider.calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn callbacks_fire_in_ply_order() {
        let game = game_from_pgn("1. e4 e5 2. Nf3 Nc6 *");
        let provider = StubProvider::new();

        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_in_cb = seen.clone();
        let options = ReviewOptions {
            depth: None,
            on_progress: Some(Box::new(move |current, total| {
                seen_in_cb.lock().unwrap().push((current, total));
                Ok(())
            })),
            on_move: None,
        };

        review_game(&provider, &game, &ReviewConfig::default(), options)
            .await
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    }

    #[tokio::test]
    async fn cancelling_callback_aborts() {
        let game = game_from_pgn("1. e4 e5 2. Nf3 Nc6 *");
        let provider = StubProvider::new();

        let options = ReviewOptions {
            depth: None,
            on_progress: Some(Box::new(|_, _| Err(Cancelled))),
            on_move: None,
        };

        let result = review_game(&provider, &game, &ReviewConfig::default(), options).await;
        assert!(matches!(result, Err(ReviewError::CancelledByClient)));
    }

    #[tokio::test]
    async fn checkmate_position_gets_synthetic_analysis() {
        // A game ending in mate: the final after-position needs no engine.
        let start = "rnbqkbnr/ppppp2p/5p2/6p1/4P3/8/PPPP1PPP/RNBQKBNR w KQkq g6 0 3";
        let pos = Position::from_fen(start).unwrap();
        let verbose = pos.find_uci("d1h5").unwrap();
        let after = pos.apply(verbose.mv).unwrap();
        let fen_after = after.fen();
        let game = GameRecord::new(
            start.to_string(),
            vec![RecordedMove {
                san: verbose.san,
                uci: verbose.uci,
                fen_before: start.to_string(),
                fen_after: fen_after.clone(),
            }],
        );

        let provider = StubProvider::new().with(
            start,
            engine::encode_mate_score(1),
            "d1h5",
            &[("d1h5", engine::encode_mate_score(1))],
        );

        let result = review_game(&provider, &game, &ReviewConfig::default(), ReviewOptions::default())
            .await
            .unwrap();
        let evaluation = &result.evaluations[0];
        assert_eq!(evaluation.marker, MarkerType::Best);
        // Black was to move in the mated position; normalized to White: +99999.
        assert_eq!(evaluation.eval_after, 99_999);
    }
}
