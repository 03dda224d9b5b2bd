//! Solution line generation: re-drive the engine from a puzzle position to
//! produce a short, forcing sequence with a unique answer at every user ply.

use chess::{PieceColor, Position};
use engine::AnalyzeOpts;

use crate::config::ReviewConfig;
use crate::driver::AnalysisProvider;
use crate::puzzles::PuzzleCandidates;
use crate::score::to_player_perspective;
use crate::types::{Puzzle, SolutionMove};

/// Advantage at which a line is considered decided.
const DECIDED_EVAL: i32 = 500;
/// Beyond this magnitude the engine is announcing a forced mate.
const FORCED_MATE_EVAL: i32 = 10_000;
/// Termination checks only apply once a line has substance.
const MIN_MOVES_BEFORE_TERMINATION: usize = 3;

/// Generate the solution line for one puzzle position.
///
/// The first move is the user's (for positive puzzles, the move actually
/// played; otherwise the engine's best). Any engine failure mid-line returns
/// what was collected so far.
pub async fn generate_solution<P: AnalysisProvider>(
    provider: &P,
    fen: &str,
    first_move_uci: &str,
    config: &ReviewConfig,
) -> Vec<SolutionMove> {
    let Ok(start) = Position::from_fen(fen) else {
        return Vec::new();
    };
    let player_is_white = start.side_to_move() == PieceColor::White;

    let Ok(mut position) = start.apply_uci(first_move_uci) else {
        return Vec::new();
    };

    let mut moves = vec![SolutionMove {
        uci: first_move_uci.to_string(),
        is_user_move: true,
        fen_before_this_move: fen.to_string(),
    }];

    for loop_index in 0..config.solution.max_moves.saturating_sub(1) {
        if position.is_game_over() {
            break;
        }

        let opts = AnalyzeOpts {
            depth: Some(config.solution.depth),
            movetime_ms: None,
            timeout: config.solution.timeout,
        };
        let analysis = match provider.analyze(&position.fen(), opts).await {
            Ok(analysis) if !analysis.top_moves.is_empty() => analysis,
            _ => break,
        };

        // Normalise to White, then to the puzzle solver.
        let side_is_black = position.side_to_move() == PieceColor::Black;
        let sign = if side_is_black { -1 } else { 1 };
        let white_eval = sign * analysis.evaluation;
        let player_eval = to_player_perspective(white_eval, player_is_white);

        let next_is_user_move = loop_index % 2 == 1;

        if moves.len() >= MIN_MOVES_BEFORE_TERMINATION {
            if player_eval.abs() >= DECIDED_EVAL {
                break;
            }
            if player_eval.abs() > FORCED_MATE_EVAL {
                break;
            }
            // A user ply must have a unique answer, or the puzzle is mush.
            if next_is_user_move && analysis.top_moves.len() >= 2 {
                let gap = (analysis.top_moves[0].cp - analysis.top_moves[1].cp).abs();
                if gap < config.unique_move_threshold {
                    break;
                }
            }
        }

        let best = if analysis.best_move.is_empty() {
            analysis.top_moves[0].uci.clone()
        } else {
            analysis.best_move.clone()
        };

        let fen_before = position.fen();
        let Ok(next) = position.apply_uci(&best) else {
            break;
        };
        moves.push(SolutionMove {
            uci: best,
            is_user_move: next_is_user_move,
            fen_before_this_move: fen_before,
        });
        position = next;
    }

    moves
}

/// Score a finished puzzle; anything under `min_quality_score` is dropped.
pub fn quality_score(puzzle: &Puzzle) -> u32 {
    let mut score = 0;
    if puzzle.tactical_theme.is_some() {
        score += 30;
    }
    if puzzle.material_gain >= 100 {
        score += 20;
    }
    // The solution generator stops at ambiguous user plies, so a finished
    // line has a unique best move by construction.
    score += 25;
    if (2..=4).contains(&puzzle.solution.len()) {
        score += 15;
    }
    if puzzle.cp_loss >= 200 || puzzle.material_gain >= 200 {
        score += 10;
    }
    score
}

/// Generate solutions for every candidate and drop the ones that fail the
/// quality bar.
pub async fn solve_puzzles<P: AnalysisProvider>(
    provider: &P,
    candidates: PuzzleCandidates,
    config: &ReviewConfig,
) -> Vec<Puzzle> {
    let mut solved = Vec::new();

    for mut puzzle in candidates.into_vec() {
        let first_move = if puzzle.is_positive {
            puzzle.played.clone()
        } else {
            puzzle.best.clone()
        };

        puzzle.solution = generate_solution(provider, &puzzle.fen, &first_move, config).await;

        let score = quality_score(&puzzle);
        if score >= config.min_quality_score {
            solved.push(puzzle);
        } else {
            tracing::debug!(
                fen = %puzzle.fen,
                score,
                "Dropping low-quality puzzle"
            );
        }
    }

    solved
}
