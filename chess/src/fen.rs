use cozy_chess::Board;

/// Parse a FEN string into a Board.
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.is_empty() {
        return Err(FenError::InvalidFormat);
    }

    fen.parse().map_err(|_| FenError::InvalidFormat)
}

/// Format a Board as a FEN string.
pub fn format_fen(board: &Board) -> String {
    board.to_string()
}

/// The first four FEN fields (placement, side, castling, en passant).
///
/// Two positions with the same key are the same position for opening-book
/// purposes regardless of move counters.
pub fn position_key(fen: &str) -> Option<String> {
    let fields: Vec<&str> = fen.split_whitespace().take(4).collect();
    if fields.len() < 4 {
        return None;
    }
    Some(fields.join(" "))
}

/// Side to move read straight from the FEN, without a full board parse.
pub fn side_to_move(fen: &str) -> Option<crate::PieceColor> {
    match fen.split_whitespace().nth(1)? {
        "w" => Some(crate::PieceColor::White),
        "b" => Some(crate::PieceColor::Black),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN format")]
    InvalidFormat,
    #[error("Invalid board layout")]
    InvalidBoardLayout,
}
