use cozy_chess::{BitBoard, Board, Color, Piece, Square};

/// Returns the attack bitboard for a specific piece on a square.
pub fn piece_attacks(board: &Board, sq: Square, piece: Piece, color: Color) -> BitBoard {
    let occupied = board.occupied();
    match piece {
        Piece::Pawn => cozy_chess::get_pawn_attacks(sq, color),
        Piece::Knight => cozy_chess::get_knight_moves(sq),
        Piece::Bishop => cozy_chess::get_bishop_moves(sq, occupied),
        Piece::Rook => cozy_chess::get_rook_moves(sq, occupied),
        Piece::Queen => {
            cozy_chess::get_bishop_moves(sq, occupied) | cozy_chess::get_rook_moves(sq, occupied)
        }
        Piece::King => cozy_chess::get_king_moves(sq),
    }
}

/// Returns all pieces of `color` that attack the given square.
pub fn attackers_of(board: &Board, sq: Square, color: Color) -> BitBoard {
    let occupied = board.occupied();
    let color_pieces = board.colors(color);

    let mut attackers = BitBoard::EMPTY;

    // A pawn of `color` attacks `sq` iff a pawn of the other color on `sq`
    // would attack the pawn's square.
    let pawn_attacks = cozy_chess::get_pawn_attacks(sq, !color);
    attackers |= pawn_attacks & board.pieces(Piece::Pawn) & color_pieces;

    let knight_attacks = cozy_chess::get_knight_moves(sq);
    attackers |= knight_attacks & board.pieces(Piece::Knight) & color_pieces;

    let bishop_attacks = cozy_chess::get_bishop_moves(sq, occupied);
    attackers |=
        bishop_attacks & (board.pieces(Piece::Bishop) | board.pieces(Piece::Queen)) & color_pieces;

    let rook_attacks = cozy_chess::get_rook_moves(sq, occupied);
    attackers |=
        rook_attacks & (board.pieces(Piece::Rook) | board.pieces(Piece::Queen)) & color_pieces;

    let king_attacks = cozy_chess::get_king_moves(sq);
    attackers |= king_attacks & board.pieces(Piece::King) & color_pieces;

    attackers
}

/// Standard piece values in centipawns (cozy piece flavour).
pub fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => 100,
        Piece::Knight => 320,
        Piece::Bishop => 330,
        Piece::Rook => 500,
        Piece::Queen => 900,
        Piece::King => 20_000,
    }
}

/// The four orthogonal and four diagonal directions as (file, rank) deltas.
pub const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
pub const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Step from a square along a direction, if still on the board.
pub fn offset_square(sq: Square, df: i8, dr: i8) -> Option<Square> {
    let file = sq.file() as i8 + df;
    let rank = sq.rank() as i8 + dr;
    if !(0..8).contains(&file) || !(0..8).contains(&rank) {
        return None;
    }
    let file = cozy_chess::File::try_index(file as usize)?;
    let rank = cozy_chess::Rank::try_index(rank as usize)?;
    Some(Square::new(file, rank))
}

/// Walk a ray from `from`, returning occupied squares in order until the
/// second piece or the board edge.
pub fn ray_occupants(board: &Board, from: Square, df: i8, dr: i8) -> Vec<Square> {
    let mut found = Vec::with_capacity(2);
    let mut current = from;
    while let Some(next) = offset_square(current, df, dr) {
        if board.occupied().has(next) {
            found.push(next);
            if found.len() == 2 {
                break;
            }
        }
        current = next;
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_values() {
        assert_eq!(piece_value(Piece::Pawn), 100);
        assert_eq!(piece_value(Piece::Knight), 320);
        assert_eq!(piece_value(Piece::Bishop), 330);
        assert_eq!(piece_value(Piece::Rook), 500);
        assert_eq!(piece_value(Piece::Queen), 900);
        assert_eq!(piece_value(Piece::King), 20_000);
    }

    #[test]
    fn test_attackers_of_center() {
        let board = Board::default();
        // In the starting position, e3 is attacked by the d2 and f2 pawns.
        let white_attackers = attackers_of(&board, Square::E3, Color::White);
        assert!(white_attackers.len() >= 2);
    }

    #[test]
    fn test_piece_attacks_knight() {
        let board = Board::default();
        let attacks = piece_attacks(&board, Square::G1, Piece::Knight, Color::White);
        assert!(attacks.has(Square::F3));
        assert!(attacks.has(Square::H3));
    }

    #[test]
    fn ray_walk_stops_at_second_piece() {
        // Rook a1, own pawn a2, enemy rook a7: the ray up the a-file sees two.
        let board: Board = "4k3/8/r7/8/8/8/P7/R3K3 w - - 0 1".parse().unwrap();
        let occupants = ray_occupants(&board, Square::A1, 0, 1);
        assert_eq!(occupants, vec![Square::A2, Square::A6]);
    }
}
