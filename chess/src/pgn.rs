//! Minimal PGN reading: tag pairs, movetext, result.
//!
//! This is deliberately a narrow contract: enough to turn an exported game
//! into a replayable move list. Variations in parentheses, comments in braces
//! and NAG glyphs are skipped, not preserved.

use std::collections::HashMap;

use crate::position::Position;
use crate::types::PieceColor;

/// A parsed PGN game: tags, SAN move list, result token.
#[derive(Debug, Clone, Default)]
pub struct PgnGame {
    pub tags: HashMap<String, String>,
    pub moves: Vec<String>,
    pub result: Option<String>,
}

/// One replayed ply with the positions around it.
#[derive(Debug, Clone)]
pub struct ReplayedMove {
    pub san: String,
    pub uci: String,
    pub fen_before: String,
    pub fen_after: String,
}

impl PgnGame {
    /// The winner encoded in the result token, if decisive.
    pub fn winner(&self) -> Option<PieceColor> {
        match self.result.as_deref() {
            Some("1-0") => Some(PieceColor::White),
            Some("0-1") => Some(PieceColor::Black),
            _ => None,
        }
    }

    /// Starting position: the FEN tag when present, otherwise the standard
    /// initial position.
    pub fn start_fen(&self) -> String {
        self.tags
            .get("FEN")
            .cloned()
            .unwrap_or_else(|| Position::startpos().fen())
    }
}

/// Parse one game from PGN text.
pub fn parse_pgn(text: &str) -> Result<PgnGame, PgnError> {
    let mut game = PgnGame::default();
    let mut movetext = String::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix('[') {
            let inner = rest.trim_end_matches(']');
            if let Some((key, value)) = inner.split_once(' ') {
                game.tags
                    .insert(key.to_string(), value.trim_matches('"').to_string());
            }
            continue;
        }
        movetext.push(' ');
        movetext.push_str(trimmed);
    }

    let mut depth = 0usize;
    let mut in_comment = false;
    for token in movetext.split_whitespace() {
        if in_comment {
            if token.ends_with('}') {
                in_comment = false;
            }
            continue;
        }
        match token {
            t if t.starts_with('{') => {
                if !t.ends_with('}') {
                    in_comment = true;
                }
            }
            t if t.starts_with('(') => depth += t.chars().filter(|c| *c == '(').count(),
            t if t.ends_with(')') => {
                let closes = t.chars().filter(|c| *c == ')').count();
                depth = depth.saturating_sub(closes);
            }
            _ if depth > 0 => {}
            "1-0" | "0-1" | "1/2-1/2" | "*" => game.result = Some(token.to_string()),
            t if t.starts_with('$') => {}
            t => {
                // Strip a leading move number ("12." or "12...Nf6"), taking
                // care not to chew up "0-0" castling spellings.
                let stripped = t.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.');
                let san = if stripped.starts_with('-') { t } else { stripped };
                if !san.is_empty() {
                    game.moves.push(san.to_string());
                }
            }
        }
    }

    if game.moves.is_empty() {
        return Err(PgnError::NoMoves);
    }
    Ok(game)
}

/// Replay a parsed game from its starting position, yielding the FEN before
/// and after every ply.
pub fn replay(game: &PgnGame) -> Result<Vec<ReplayedMove>, PgnError> {
    let mut position = Position::from_fen(&game.start_fen())
        .map_err(|_| PgnError::InvalidStartFen(game.start_fen()))?;

    let mut replayed = Vec::with_capacity(game.moves.len());
    for (index, san) in game.moves.iter().enumerate() {
        let fen_before = position.fen();
        let (next, verbose) = position
            .apply_san(san)
            .map_err(|_| PgnError::IllegalSan {
                index,
                san: san.clone(),
            })?;
        replayed.push(ReplayedMove {
            san: verbose.san,
            uci: verbose.uci,
            fen_before,
            fen_after: next.fen(),
        });
        position = next;
    }
    Ok(replayed)
}

#[derive(Debug, thiserror::Error)]
pub enum PgnError {
    #[error("PGN contains no moves")]
    NoMoves,
    #[error("Invalid FEN tag: {0}")]
    InvalidStartFen(String),
    #[error("Illegal move at ply {index}: {san}")]
    IllegalSan { index: usize, san: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT_GAME: &str = r#"[Event "Test"]
[White "Alice"]
[Black "Bob"]
[Result "1-0"]

1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 4. Ba4 Nf6 1-0"#;

    #[test]
    fn parses_tags_moves_and_result() {
        let game = parse_pgn(SHORT_GAME).unwrap();
        assert_eq!(game.tags.get("White").map(String::as_str), Some("Alice"));
        assert_eq!(game.moves.len(), 8);
        assert_eq!(game.result.as_deref(), Some("1-0"));
        assert_eq!(game.winner(), Some(PieceColor::White));
    }

    #[test]
    fn replay_threads_fens() {
        let game = parse_pgn(SHORT_GAME).unwrap();
        let moves = replay(&game).unwrap();
        assert_eq!(moves.len(), 8);
        assert_eq!(moves[0].uci, "e2e4");
        assert_eq!(moves[0].fen_before, Position::startpos().fen());
        assert_eq!(moves[1].fen_before, moves[0].fen_after);
        assert_eq!(moves[7].san, "Nf6");
    }

    #[test]
    fn skips_comments_and_variations() {
        let text = "1. e4 {best by test} e5 (1... c5 2. Nf3) 2. Nf3 Nc6 1/2-1/2";
        let game = parse_pgn(text).unwrap();
        assert_eq!(game.moves, vec!["e4", "e5", "Nf3", "Nc6"]);
        assert_eq!(game.winner(), None);
    }

    #[test]
    fn illegal_move_reports_ply() {
        let game = parse_pgn("1. e4 Qh4").unwrap();
        let err = replay(&game).unwrap_err();
        match err {
            PgnError::IllegalSan { index, san } => {
                assert_eq!(index, 1);
                assert_eq!(san, "Qh4");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_empty_movetext() {
        assert!(parse_pgn("[Event \"x\"]\n\n*").is_err());
    }
}
