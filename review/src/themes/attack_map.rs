use cozy_chess::{Board, Color, Piece, Square};
use smallvec::SmallVec;

use super::helpers::piece_attacks;

const MAX_ATTACKERS_PER_SQUARE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attacker {
    pub from: Square,
    pub piece: Piece,
}

/// Who attacks what, precomputed once per position.
#[derive(Debug, Clone)]
pub struct AttackMap {
    attacked_by_white: [SmallVec<[Attacker; MAX_ATTACKERS_PER_SQUARE]>; 64],
    attacked_by_black: [SmallVec<[Attacker; MAX_ATTACKERS_PER_SQUARE]>; 64],
}

impl AttackMap {
    pub fn compute(board: &Board) -> Self {
        let mut attack_map = Self {
            attacked_by_white: std::array::from_fn(|_| SmallVec::new()),
            attacked_by_black: std::array::from_fn(|_| SmallVec::new()),
        };

        for color in [Color::White, Color::Black] {
            for piece in Piece::ALL {
                let pieces = board.pieces(piece) & board.colors(color);
                for from in pieces {
                    let attacks = piece_attacks(board, from, piece, color);
                    for target in attacks {
                        let attacker = Attacker { from, piece };
                        let idx = square_index(target);
                        match color {
                            Color::White => attack_map.attacked_by_white[idx].push(attacker),
                            Color::Black => attack_map.attacked_by_black[idx].push(attacker),
                        }
                    }
                }
            }
        }

        attack_map
    }

    pub fn attackers_of(&self, sq: Square, color: Color) -> &[Attacker] {
        let idx = square_index(sq);
        match color {
            Color::White => self.attacked_by_white[idx].as_slice(),
            Color::Black => self.attacked_by_black[idx].as_slice(),
        }
    }

    pub fn is_attacked(&self, sq: Square, by: Color) -> bool {
        !self.attackers_of(sq, by).is_empty()
    }

    /// Value of the cheapest piece of `color` attacking `sq`, if any.
    pub fn cheapest_attacker(&self, sq: Square, color: Color) -> Option<Attacker> {
        self.attackers_of(sq, color)
            .iter()
            .copied()
            .min_by_key(|a| super::helpers::piece_value(a.piece))
    }
}

fn square_index(sq: Square) -> usize {
    (sq.rank() as usize * 8) + sq.file() as usize
}
