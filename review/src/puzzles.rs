//! Puzzle extraction: mine the annotated move list for teachable moments.
//! Best-effort throughout: a candidate that cannot be analysed is dropped,
//! never an error.

use chess::{PieceColor, PieceKind, Position};

use crate::config::ReviewConfig;
use crate::score::{is_mate_against_player, to_player_perspective};
use crate::themes::helpers::attackers_of;
use crate::themes::{detect_theme, material_gain, ThemeMatch};
use crate::types::{MarkerType, MoveEvaluation, Puzzle, ReviewResult};

const MAX_MISTAKE_PUZZLES: usize = 5;
const MAX_MISSED_TACTIC_PUZZLES: usize = 3;
const MAX_POSITIVE_PUZZLES: usize = 2;
const MIN_PUZZLE_MOVE_NUMBER: u32 = 6;
const TOO_LOST_EVAL: i32 = -500;

/// Theme tags that justify a puzzle on their own. Both camelCase and
/// snake_case spellings circulate in stored data; membership is checked on
/// the normalised form.
const VALID_TACTICAL_THEMES: &[&str] = &[
    "fork",
    "pin",
    "skewer",
    "discoveredAttack",
    "doubleCheck",
    "doubleAttack",
    "backRankMate",
    "smotheredMate",
    "mateInN",
    "mate",
    "deflection",
    "decoy",
    "clearance",
    "sacrifice",
    "interference",
    "trappedPiece",
    "hangingPiece",
    "overloaded",
    "undermining",
    "zwischenzug",
    "quietMove",
    "desperado",
    "intermezzo",
    "promotion",
    "advancedPawn",
    "passedPawn",
    "discovery",
];

const GENERIC_THEMES: &[&str] = &["advantage", "crushing", "endgame", "equality", "winning_material"];

#[derive(Debug, Default)]
pub struct PuzzleCandidates {
    pub mistakes: Vec<Puzzle>,
    pub missed_tactics: Vec<Puzzle>,
    pub brilliancies: Vec<Puzzle>,
}

impl PuzzleCandidates {
    pub fn total(&self) -> usize {
        self.mistakes.len() + self.missed_tactics.len() + self.brilliancies.len()
    }

    pub fn into_vec(self) -> Vec<Puzzle> {
        let mut all = self.mistakes;
        all.extend(self.missed_tactics);
        all.extend(self.brilliancies);
        all
    }
}

/// Mine a finished review for puzzles, from the given player's side.
pub fn extract_puzzles(
    result: &ReviewResult,
    player_color: PieceColor,
    opening: Option<&str>,
    rating: Option<u32>,
    _config: &ReviewConfig,
) -> PuzzleCandidates {
    let mut candidates = PuzzleCandidates::default();
    let puzzle_rating = rating.map(|r| r + 300);

    for evaluation in &result.evaluations {
        let Some(ply) = PlyView::build(evaluation, player_color) else {
            continue;
        };
        if !ply.common_filters_pass() {
            continue;
        }

        if candidates.mistakes.len() < MAX_MISTAKE_PUZZLES {
            if let Some(puzzle) =
                mistake_puzzle(&ply, candidates.total(), opening, puzzle_rating)
            {
                candidates.mistakes.push(puzzle);
                continue;
            }
        }

        if candidates.missed_tactics.len() < MAX_MISSED_TACTIC_PUZZLES {
            if let Some(puzzle) = missed_tactic_puzzle(&ply, opening, puzzle_rating) {
                candidates.missed_tactics.push(puzzle);
                continue;
            }
        }

        if candidates.brilliancies.len() < MAX_POSITIVE_PUZZLES {
            if let Some(puzzle) = positive_puzzle(&ply, opening, puzzle_rating) {
                candidates.brilliancies.push(puzzle);
            }
        }
    }

    candidates
}

/// One evaluation re-read from the puzzle extractor's point of view.
struct PlyView<'a> {
    evaluation: &'a MoveEvaluation,
    player_color: PieceColor,
    is_player_ply: bool,
    move_number: u32,
    played_uci: String,
    position: Position,
}

impl<'a> PlyView<'a> {
    fn build(evaluation: &'a MoveEvaluation, player_color: PieceColor) -> Option<Self> {
        let position = Position::from_fen(&evaluation.fen).ok()?;
        let side = position.side_to_move();

        // Recover the played move in UCI from its SAN.
        let played = chess::parse_san(position.board(), &evaluation.move_san).ok()?;
        let played_uci = chess::format_uci_on(position.board(), played);

        let move_number = evaluation
            .fen
            .split_whitespace()
            .nth(5)
            .and_then(|n| n.parse().ok())
            .unwrap_or(1);

        Some(Self {
            evaluation,
            player_color,
            is_player_ply: side == player_color,
            move_number,
            played_uci,
            position,
        })
    }

    fn is_white(&self) -> bool {
        self.player_color == PieceColor::White
    }

    fn player_eval_before(&self) -> i32 {
        to_player_perspective(self.evaluation.eval_before, self.is_white())
    }

    fn common_filters_pass(&self) -> bool {
        self.is_player_ply
            && self.move_number >= MIN_PUZZLE_MOVE_NUMBER
            && self.player_eval_before() >= TOO_LOST_EVAL
            && !is_mate_against_player(self.evaluation.eval_before, self.is_white())
    }

    fn theme_for(&self, uci: &str) -> Option<ThemeMatch> {
        detect_theme(
            &self.evaluation.fen,
            uci,
            Some(self.evaluation.eval_before),
            Some(self.evaluation.eval_after),
        )
    }

    fn material_gain_for(&self, uci: &str) -> i32 {
        material_gain(
            &self.evaluation.fen,
            uci,
            Some(self.evaluation.eval_before),
            Some(self.evaluation.eval_after),
        )
    }

    fn make_puzzle(
        &self,
        theme: Option<&ThemeMatch>,
        gain: i32,
        marker: MarkerType,
        is_positive: bool,
        is_missed_tactic: bool,
        opening: Option<&str>,
        rating: Option<u32>,
    ) -> Puzzle {
        Puzzle {
            fen: self.evaluation.fen.clone(),
            played: self.played_uci.clone(),
            best: self.evaluation.best_move.clone(),
            cp_loss: self.evaluation.centipawn_loss,
            marker,
            move_number: self.move_number,
            player_color: self.player_color.as_str().to_string(),
            opening: opening.map(str::to_string),
            rating,
            is_positive,
            is_missed_tactic,
            tactical_theme: theme.map(|t| t.theme.tag().to_string()),
            material_gain: gain,
            solution: Vec::new(),
        }
    }
}

fn mistake_puzzle(
    ply: &PlyView,
    collected_so_far: usize,
    opening: Option<&str>,
    rating: Option<u32>,
) -> Option<Puzzle> {
    let marker = ply.evaluation.marker;
    if !matches!(
        marker,
        MarkerType::Inaccuracy | MarkerType::Mistake | MarkerType::Miss | MarkerType::Blunder
    ) {
        return None;
    }
    if ply.played_uci == ply.evaluation.best_move {
        return None;
    }

    let floor = match marker {
        MarkerType::Miss => 100,
        MarkerType::Mistake => 150,
        MarkerType::Blunder => 250,
        _ => 0,
    };
    let effective_loss = ply.evaluation.centipawn_loss.max(floor);
    if effective_loss < 100 {
        return None;
    }

    if trivial_recapture(ply) {
        return None;
    }

    // A winning player drowning in puzzles does not need more of them.
    if collected_so_far >= 5 && ply.player_eval_before() > 600 && marker != MarkerType::Blunder {
        return None;
    }

    // Mistake puzzles teach the move that should have been played.
    let theme = ply.theme_for(&ply.evaluation.best_move);
    let gain = ply.material_gain_for(&ply.evaluation.best_move);
    let puzzle = ply.make_puzzle(theme.as_ref(), gain, marker, false, false, opening, rating);

    passes_quality_gate(&puzzle).then_some(puzzle)
}

fn missed_tactic_puzzle(
    ply: &PlyView,
    opening: Option<&str>,
    rating: Option<u32>,
) -> Option<Puzzle> {
    let marker = ply.evaluation.marker;
    if !matches!(
        marker,
        MarkerType::Inaccuracy | MarkerType::Miss | MarkerType::Good
    ) {
        return None;
    }
    if ply.played_uci == ply.evaluation.best_move || ply.evaluation.best_move.is_empty() {
        return None;
    }

    let theme = ply.theme_for(&ply.evaluation.best_move);
    let gain = ply.material_gain_for(&ply.evaluation.best_move);

    let genuine_theme = theme
        .as_ref()
        .map(|t| t.confidence >= 50 && is_valid_tactical(t.theme.tag()))
        .unwrap_or(false);
    let justified = genuine_theme || gain >= 100 || ply.evaluation.centipawn_loss >= 150;
    if !justified {
        return None;
    }

    if obvious_capture(ply) && !genuine_theme {
        return None;
    }

    let puzzle = ply.make_puzzle(
        theme.as_ref(),
        gain,
        MarkerType::Miss,
        false,
        true,
        opening,
        rating,
    );
    passes_quality_gate(&puzzle).then_some(puzzle)
}

fn positive_puzzle(ply: &PlyView, opening: Option<&str>, rating: Option<u32>) -> Option<Puzzle> {
    if ply.evaluation.marker != MarkerType::Brilliant {
        return None;
    }
    // A brilliancy played from a lost position makes a depressing puzzle.
    if ply.player_eval_before() < TOO_LOST_EVAL
        || is_mate_against_player(ply.evaluation.eval_before, ply.is_white())
    {
        return None;
    }

    let theme = ply.theme_for(&ply.played_uci);
    let gain = ply.material_gain_for(&ply.played_uci);
    let puzzle = ply.make_puzzle(
        theme.as_ref(),
        gain,
        MarkerType::Brilliant,
        true,
        false,
        opening,
        rating,
    );
    passes_quality_gate(&puzzle).then_some(puzzle)
}

/// A queen snapping a pawn back when it was the only capture on the board:
/// not a puzzle, just bookkeeping.
fn trivial_recapture(ply: &PlyView) -> bool {
    let Some(played) = ply.position.find_uci(&ply.played_uci) else {
        return false;
    };
    if played.piece != PieceKind::Queen || played.captured != Some(PieceKind::Pawn) {
        return false;
    }
    let capture_count = ply
        .position
        .legal_moves()
        .iter()
        .filter(|m| m.is_capture)
        .count();
    capture_count == 1
}

/// The best move is a capture anyone would see: an even-or-better trade of
/// a defended piece, or a free pawn grab. Winning an *undefended* piece of
/// equal or greater value still counts as a find.
fn obvious_capture(ply: &PlyView) -> bool {
    let Some(best) = ply.position.find_uci(&ply.evaluation.best_move) else {
        return false;
    };
    let Some(captured) = best.captured else {
        return false;
    };
    let target_value = crate::score::piece_value(captured);
    let mover_value = crate::score::piece_value(best.piece);

    let board = ply.position.board();
    let opponent = !board.side_to_move();
    let defended = !attackers_of(board, best.mv.to, opponent).is_empty();

    if defended {
        return target_value >= mover_value;
    }
    // No recapture exists: only a pawn-value target is an obvious grab.
    target_value <= 100
}

/// The quality gate applied to every candidate.
fn passes_quality_gate(puzzle: &Puzzle) -> bool {
    if puzzle.marker == MarkerType::Blunder {
        return true;
    }
    match puzzle.tactical_theme.as_deref() {
        Some(tag) if is_valid_tactical(tag) => true,
        Some(tag) if is_generic(tag) => puzzle.material_gain >= 200,
        Some(_) => false,
        None => puzzle.material_gain >= 200,
    }
}

fn is_generic(tag: &str) -> bool {
    let normalized = normalize_tag(tag);
    GENERIC_THEMES.iter().any(|g| normalize_tag(g) == normalized)
}

fn is_valid_tactical(tag: &str) -> bool {
    let normalized = normalize_tag(tag);
    VALID_TACTICAL_THEMES
        .iter()
        .any(|t| normalize_tag(t) == normalized)
}

/// Fold snake_case spellings onto camelCase so both vocabularies match.
fn normalize_tag(tag: &str) -> String {
    let mut out = String::with_capacity(tag.len());
    let mut upper_next = false;
    for c in tag.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Accuracy, MarkerSummary};

    fn evaluation(
        fen: &str,
        san: &str,
        best: &str,
        marker: MarkerType,
        cp_loss: i32,
        eval_before: i32,
        eval_after: i32,
    ) -> MoveEvaluation {
        MoveEvaluation {
            fen: fen.to_string(),
            move_san: san.to_string(),
            eval_before,
            eval_after,
            best_move: best.to_string(),
            best_move_san: String::new(),
            marker,
            centipawn_loss: cp_loss,
            depth: 16,
            timestamp: 0,
        }
    }

    fn result_with(evaluations: Vec<MoveEvaluation>) -> ReviewResult {
        ReviewResult {
            accuracy: Accuracy {
                white: 90.0,
                black: 90.0,
            },
            summary: MarkerSummary::default(),
            total_moves: evaluations.len() as u32,
            evaluations,
        }
    }

    // A white-to-move position at move 14 where Rxd4 wins a rook.
    const HANGING_ROOK: &str = "4k3/8/8/8/3r4/8/8/3RK3 w - - 0 14";

    #[test]
    fn blunder_becomes_a_mistake_puzzle() {
        // The player shuffled the king while the rook capture was on.
        let result = result_with(vec![evaluation(
            HANGING_ROOK,
            "Kf2",
            "d1d4",
            MarkerType::Blunder,
            480,
            120,
            -380,
        )]);
        let found = extract_puzzles(
            &result,
            PieceColor::White,
            Some("Test Opening"),
            Some(1500),
            &ReviewConfig::default(),
        );
        assert_eq!(found.mistakes.len(), 1);
        let puzzle = &found.mistakes[0];
        assert_eq!(puzzle.best, "d1d4");
        assert_eq!(puzzle.played, "e1f2");
        assert_eq!(puzzle.rating, Some(1800));
        assert!(!puzzle.is_positive);
    }

    #[test]
    fn opponent_plies_are_ignored() {
        let result = result_with(vec![evaluation(
            HANGING_ROOK,
            "Kf2",
            "d1d4",
            MarkerType::Blunder,
            480,
            120,
            -380,
        )]);
        let found = extract_puzzles(
            &result,
            PieceColor::Black,
            None,
            None,
            &ReviewConfig::default(),
        );
        assert_eq!(found.total(), 0);
    }

    #[test]
    fn early_moves_are_ignored() {
        let early = "4k3/8/8/8/3r4/8/8/3RK3 w - - 0 3";
        let result = result_with(vec![evaluation(
            early,
            "Kf2",
            "d1d4",
            MarkerType::Blunder,
            480,
            120,
            -380,
        )]);
        let found = extract_puzzles(
            &result,
            PieceColor::White,
            None,
            None,
            &ReviewConfig::default(),
        );
        assert_eq!(found.total(), 0);
    }

    #[test]
    fn hopeless_positions_are_ignored() {
        let result = result_with(vec![evaluation(
            HANGING_ROOK,
            "Kf2",
            "d1d4",
            MarkerType::Blunder,
            480,
            -700,
            -1200,
        )]);
        let found = extract_puzzles(
            &result,
            PieceColor::White,
            None,
            None,
            &ReviewConfig::default(),
        );
        assert_eq!(found.total(), 0);
    }

    #[test]
    fn brilliant_move_becomes_positive_puzzle() {
        // Nxb5!?, a knight sacrifice; the theme detector sees the played
        // move.
        let fen = "r3k3/8/8/1p6/8/2N5/8/4K3 w - - 0 16";
        let result = result_with(vec![evaluation(
            fen,
            "Nxb5",
            "c3b5",
            MarkerType::Brilliant,
            10,
            -50,
            260,
        )]);
        let found = extract_puzzles(
            &result,
            PieceColor::White,
            None,
            None,
            &ReviewConfig::default(),
        );
        assert_eq!(found.brilliancies.len(), 1);
        assert!(found.brilliancies[0].is_positive);
    }

    #[test]
    fn caps_are_respected() {
        let mut evaluations = Vec::new();
        for _ in 0..9 {
            evaluations.push(evaluation(
                HANGING_ROOK,
                "Kf2",
                "d1d4",
                MarkerType::Blunder,
                480,
                120,
                -380,
            ));
        }
        let result = result_with(evaluations);
        let found = extract_puzzles(
            &result,
            PieceColor::White,
            None,
            None,
            &ReviewConfig::default(),
        );
        assert!(found.mistakes.len() <= MAX_MISTAKE_PUZZLES);
    }

    #[test]
    fn undefended_target_is_not_an_obvious_capture() {
        // Best is Rxd4 winning an unprotected rook: still a find.
        let eval = evaluation(HANGING_ROOK, "Kf2", "d1d4", MarkerType::Good, 160, 120, -40);
        let ply = PlyView::build(&eval, PieceColor::White).unwrap();
        assert!(!obvious_capture(&ply));
    }

    #[test]
    fn defended_even_trade_is_obvious() {
        // The d4 rook is guarded by the e5 pawn: Rxd4 is a plain trade.
        let fen = "4k3/8/8/4p3/3r4/8/8/3RK3 w - - 0 14";
        let eval = evaluation(fen, "Kf2", "d1d4", MarkerType::Good, 160, 120, -40);
        let ply = PlyView::build(&eval, PieceColor::White).unwrap();
        assert!(obvious_capture(&ply));
    }

    #[test]
    fn free_pawn_grab_is_obvious() {
        // Rxd4 on a bare pawn with no recapture.
        let fen = "4k3/8/8/8/3p4/8/8/3RK3 w - - 0 14";
        let eval = evaluation(fen, "Kf2", "d1d4", MarkerType::Good, 60, 120, 100);
        let ply = PlyView::build(&eval, PieceColor::White).unwrap();
        assert!(obvious_capture(&ply));
    }

    #[test]
    fn tag_normalisation_unifies_spellings() {
        assert!(is_valid_tactical("discoveredAttack"));
        assert!(is_valid_tactical("discovered_attack"));
        assert!(is_valid_tactical("back_rank_mate"));
        assert!(!is_valid_tactical("winning_material"));
    }
}
