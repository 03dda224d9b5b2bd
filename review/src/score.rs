//! Score encoding helpers and material arithmetic.
//!
//! All scores are plain `i32` centipawns in White's perspective once they
//! pass the driver boundary. Mate scores ride the same integer: an absolute
//! value at or above [`MATE_THRESHOLD`] encodes a forced mate whose distance
//! is `(100_000 - |value|) / 100`.

use chess::PieceKind;

pub use engine::{MATE_SCORE_BASE, MATE_THRESHOLD};

/// True if the score encodes a forced mate for either side.
pub fn is_mate(score: i32) -> bool {
    score.abs() >= MATE_THRESHOLD
}

/// Signed mate distance: `Some(3)` for White mates in 3, `Some(-2)` for
/// Black mates in 2.
pub fn extract_mate_in(score: i32) -> Option<i32> {
    if !is_mate(score) {
        return None;
    }
    let distance = (MATE_SCORE_BASE - score.abs()) / 100;
    Some(if score > 0 { distance } else { -distance })
}

/// Flip a White-perspective score into the mover's perspective.
pub fn to_player_perspective(score: i32, is_white: bool) -> i32 {
    if is_white {
        score
    } else {
        -score
    }
}

/// Mate in favour of the given player.
pub fn is_mate_for_player(score: i32, is_white: bool) -> bool {
    is_mate(score) && to_player_perspective(score, is_white) > 0
}

/// Mate against the given player.
pub fn is_mate_against_player(score: i32, is_white: bool) -> bool {
    is_mate(score) && to_player_perspective(score, is_white) < 0
}

/// Centipawn value of a piece, canonical table.
pub fn piece_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => 100,
        PieceKind::Knight => 320,
        PieceKind::Bishop => 330,
        PieceKind::Rook => 500,
        PieceKind::Queen => 900,
        PieceKind::King => 20_000,
    }
}

/// Total piece material on the board in pawn units (Q=9, R=5, B=3, N=3),
/// both colours, read from the FEN placement field only.
pub fn material_count(fen: &str) -> i32 {
    let placement = fen.split_whitespace().next().unwrap_or("");
    placement
        .chars()
        .map(|c| match c.to_ascii_lowercase() {
            'q' => 9,
            'r' => 5,
            'b' => 3,
            'n' => 3,
            _ => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mate_encoding_round_trips() {
        let mate_in_3 = engine::encode_mate_score(3);
        assert!(is_mate(mate_in_3));
        assert_eq!(extract_mate_in(mate_in_3), Some(3));

        let mated_in_2 = engine::encode_mate_score(-2);
        assert!(is_mate(mated_in_2));
        assert_eq!(extract_mate_in(mated_in_2), Some(-2));

        assert_eq!(extract_mate_in(450), None);
    }

    #[test]
    fn perspective_flips_for_black() {
        assert_eq!(to_player_perspective(120, true), 120);
        assert_eq!(to_player_perspective(120, false), -120);

        let mate_for_white = engine::encode_mate_score(5);
        assert!(is_mate_for_player(mate_for_white, true));
        assert!(is_mate_against_player(mate_for_white, false));
    }

    #[test]
    fn material_count_of_start_position() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        // Per side: 9 + 2*5 + 2*3 + 2*3 = 31.
        assert_eq!(material_count(fen), 62);
    }

    #[test]
    fn material_count_ignores_pawns_and_kings() {
        assert_eq!(material_count("8/8/8/4k3/8/8/8/4K3 w - - 0 1"), 0);
        assert_eq!(material_count("8/8/8/4k3/8/8/PPPP4/4K3 w - - 0 1"), 0);
    }

    #[test]
    fn piece_values_match_table() {
        assert_eq!(piece_value(PieceKind::Pawn), 100);
        assert_eq!(piece_value(PieceKind::Knight), 320);
        assert_eq!(piece_value(PieceKind::Bishop), 330);
        assert_eq!(piece_value(PieceKind::Rook), 500);
        assert_eq!(piece_value(PieceKind::Queen), 900);
        assert_eq!(piece_value(PieceKind::King), 20_000);
    }
}
