//! UCI (Universal Chess Interface) move notation utilities.
//!
//! UCI castling uses standard notation (king moves two squares): e1g1, e1c1.
//! cozy_chess encodes castling as king-takes-rook: e1h1, e1a1. Conversions in
//! both directions live here so the rest of the project never sees the
//! cozy-chess convention.

use cozy_chess::{Board, File, Move, Piece, Rank, Square};

/// Parse a bare UCI move string (e2e4, e7e8q) without board context.
pub fn parse_uci(s: &str) -> Result<Move, UciMoveError> {
    if s.len() < 4 || s.len() > 5 {
        return Err(UciMoveError::InvalidMove(s.to_string()));
    }

    let from = parse_square(&s[0..2])?;
    let to = parse_square(&s[2..4])?;

    let promotion = if s.len() == 5 {
        Some(match &s[4..5] {
            "q" => Piece::Queen,
            "r" => Piece::Rook,
            "b" => Piece::Bishop,
            "n" => Piece::Knight,
            _ => return Err(UciMoveError::InvalidPromotion(s.to_string())),
        })
    } else {
        None
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}

/// Parse a UCI move against a position, resolving castling to the
/// cozy_chess king-takes-rook encoding.
pub fn parse_uci_on(board: &Board, s: &str) -> Result<Move, UciMoveError> {
    let mv = parse_uci(s)?;
    let legal = legal_moves(board);
    if legal.contains(&mv) {
        return Ok(mv);
    }
    let converted = convert_uci_castling_to_cozy(mv, &legal);
    if legal.contains(&converted) {
        return Ok(converted);
    }
    Err(UciMoveError::IllegalMove(s.to_string()))
}

/// Convert UCI castling notation to cozy_chess notation.
///
/// Checks whether the move looks like a castling move (king moving two files
/// from the e-file on the back rank) and, if so, rewrites the target to the
/// rook square, verifying the result against the legal move list.
pub fn convert_uci_castling_to_cozy(mv: Move, legal_moves: &[Move]) -> Move {
    let is_back_rank = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let is_e_file = matches!(mv.from.file(), File::E);
    let is_g_or_c_file = matches!(mv.to.file(), File::G | File::C);

    if is_back_rank && is_e_file && is_g_or_c_file && mv.promotion.is_none() {
        let target_square = match (mv.from.rank(), mv.to.file()) {
            (Rank::First, File::G) => Square::new(File::H, Rank::First),
            (Rank::First, File::C) => Square::new(File::A, Rank::First),
            (Rank::Eighth, File::G) => Square::new(File::H, Rank::Eighth),
            (Rank::Eighth, File::C) => Square::new(File::A, Rank::Eighth),
            _ => return mv,
        };

        let converted = Move {
            from: mv.from,
            to: target_square,
            promotion: None,
        };

        if legal_moves.contains(&converted) {
            return converted;
        }
    }

    mv
}

/// Format a move in standard UCI notation, converting cozy_chess castling
/// (king-takes-rook) back to the king-moves-two-squares form.
pub fn format_uci_on(board: &Board, mv: Move) -> String {
    if let Some(piece) = board.piece_on(mv.from) {
        let own_rook_target =
            board.piece_on(mv.to) == Some(Piece::Rook) && board.color_on(mv.to) == board.color_on(mv.from);
        if piece == Piece::King && own_rook_target {
            let rank = mv.from.rank();
            let to_file = if mv.to.file() > mv.from.file() {
                File::G
            } else {
                File::C
            };
            let standard = Move {
                from: mv.from,
                to: Square::new(to_file, rank),
                promotion: None,
            };
            return format_uci(standard);
        }
    }
    format_uci(mv)
}

/// Format a move in UCI notation (e.g. "e2e4", "e7e8q"), with no castling
/// awareness. Use [`format_uci_on`] when a board is available.
pub fn format_uci(mv: Move) -> String {
    let mut s = format!("{}{}", mv.from, mv.to);
    if let Some(promo) = mv.promotion {
        s.push(match promo {
            Piece::Queen => 'q',
            Piece::Rook => 'r',
            Piece::Bishop => 'b',
            Piece::Knight => 'n',
            _ => 'q',
        });
    }
    s
}

pub(crate) fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });
    moves
}

fn parse_square(s: &str) -> Result<Square, UciMoveError> {
    let mut chars = s.chars();
    let (Some(file_char), Some(rank_char), None) = (chars.next(), chars.next(), chars.next())
    else {
        return Err(UciMoveError::InvalidSquare(s.to_string()));
    };

    let file = match file_char {
        'a'..='h' => File::try_index(file_char as usize - 'a' as usize),
        _ => None,
    };
    let rank = match rank_char {
        '1'..='8' => Rank::try_index(rank_char as usize - '1' as usize),
        _ => None,
    };

    match (file, rank) {
        (Some(file), Some(rank)) => Ok(Square::new(file, rank)),
        _ => Err(UciMoveError::InvalidSquare(s.to_string())),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UciMoveError {
    #[error("Invalid move: {0}")]
    InvalidMove(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),
    #[error("Move is not legal here: {0}")]
    IllegalMove(String),
}
