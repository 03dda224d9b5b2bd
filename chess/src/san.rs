//! Standard Algebraic Notation generation and parsing.
//!
//! Formatting is authoritative: parsing works by formatting every legal move
//! and comparing against the (normalised) input. That keeps the two directions
//! consistent by construction, at the price of generating SAN for each legal
//! move, which is irrelevant at the call rates this project has.

use cozy_chess::{Board, File, GameStatus, Move, Piece, Square};

use crate::uci::legal_moves;

/// Format a move as SAN, including disambiguation and check/mate suffixes.
pub fn format_san(board: &Board, mv: Move) -> Result<String, SanError> {
    let piece = board
        .piece_on(mv.from)
        .ok_or_else(|| SanError::NoLegalMove(crate::uci::format_uci(mv)))?;

    let mut san = String::new();

    let own_rook_target =
        board.piece_on(mv.to) == Some(Piece::Rook) && board.color_on(mv.to) == board.color_on(mv.from);
    let is_castling = piece == Piece::King && own_rook_target;

    if is_castling {
        if mv.to.file() > mv.from.file() {
            san.push_str("O-O");
        } else {
            san.push_str("O-O-O");
        }
    } else {
        let is_capture = is_capture(board, mv, piece);

        match piece {
            Piece::Pawn => {
                if is_capture {
                    san.push(file_char(mv.from.file()));
                }
            }
            _ => {
                san.push(piece_char(piece));
                san.push_str(&disambiguation(board, mv, piece));
            }
        }

        if is_capture {
            san.push('x');
        }

        san.push_str(&mv.to.to_string());

        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(piece_char(promo));
        }
    }

    // Suffix from the resulting position.
    let mut after = board.clone();
    after
        .try_play(mv)
        .map_err(|_| SanError::NoLegalMove(crate::uci::format_uci(mv)))?;
    if after.status() == GameStatus::Won {
        san.push('#');
    } else if !after.checkers().is_empty() {
        san.push('+');
    }

    Ok(san)
}

/// Parse a SAN string against a position.
///
/// Annotation glyphs (`!`, `?`) and redundant check markers are ignored, and
/// `0-0` castling spelling is accepted alongside `O-O`.
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let wanted = normalise(san);
    if wanted.is_empty() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    let mut matched: Option<Move> = None;
    for mv in legal_moves(board) {
        let candidate = format_san(board, mv)?;
        if normalise(&candidate) == wanted {
            if matched.is_some() {
                return Err(SanError::AmbiguousMove(san.to_string()));
            }
            matched = Some(mv);
        }
    }

    matched.ok_or_else(|| SanError::NoLegalMove(san.to_string()))
}

/// True if the SAN carries a checkmate suffix.
pub fn is_mate_san(san: &str) -> bool {
    san.contains('#')
}

/// True if the SAN carries a check (not mate) suffix.
pub fn is_check_san(san: &str) -> bool {
    san.contains('+')
}

fn normalise(san: &str) -> String {
    san.trim_end_matches(['!', '?', '+', '#'])
        .replace("0-0-0", "O-O-O")
        .replace("0-0", "O-O")
}

fn is_capture(board: &Board, mv: Move, piece: Piece) -> bool {
    if board.piece_on(mv.to).is_some() {
        return true;
    }
    // En passant: a pawn moving diagonally onto an empty square.
    piece == Piece::Pawn && mv.from.file() != mv.to.file()
}

/// Minimal disambiguation: file, then rank, then both, per SAN rules.
fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let rivals: Vec<Square> = legal_moves(board)
        .into_iter()
        .filter(|other| {
            other.to == mv.to && other.from != mv.from && board.piece_on(other.from) == Some(piece)
        })
        .map(|other| other.from)
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let same_file = rivals.iter().any(|sq| sq.file() == mv.from.file());
    let same_rank = rivals.iter().any(|sq| sq.rank() == mv.from.rank());

    if !same_file {
        file_char(mv.from.file()).to_string()
    } else if !same_rank {
        ((mv.from.rank() as u8 + b'1') as char).to_string()
    } else {
        mv.from.to_string()
    }
}

fn piece_char(piece: Piece) -> char {
    match piece {
        Piece::King => 'K',
        Piece::Queen => 'Q',
        Piece::Rook => 'R',
        Piece::Bishop => 'B',
        Piece::Knight => 'N',
        Piece::Pawn => 'P',
    }
}

fn file_char(file: File) -> char {
    (file as u8 + b'a') as char
}

#[derive(Debug, thiserror::Error)]
pub enum SanError {
    #[error("No legal move found for: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}
