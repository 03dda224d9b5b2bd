use cozy_chess::{Board, GameStatus, Move, Piece, Square};

use crate::fen::{format_fen, parse_fen, FenError};
use crate::san::{format_san, parse_san, SanError};
use crate::types::{PieceColor, PieceKind};
use crate::uci::{self, UciMoveError};

/// A board position identified by its FEN.
///
/// Thin facade over a cozy_chess `Board` exposing exactly the operations the
/// review pipeline needs. Positions are immutable: applying a move returns a
/// new `Position`.
#[derive(Debug, Clone)]
pub struct Position {
    board: Board,
}

/// A legal move with everything the classification pipeline wants to know
/// about it, precomputed.
#[derive(Debug, Clone)]
pub struct VerboseMove {
    pub mv: Move,
    pub piece: PieceKind,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    pub san: String,
    pub uci: String,
    pub is_capture: bool,
    pub gives_check: bool,
}

impl Position {
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Ok(Self {
            board: parse_fen(fen)?,
        })
    }

    pub fn from_board(board: Board) -> Self {
        Self { board }
    }

    pub fn startpos() -> Self {
        Self {
            board: Board::default(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn fen(&self) -> String {
        format_fen(&self.board)
    }

    pub fn side_to_move(&self) -> PieceColor {
        self.board.side_to_move().into()
    }

    pub fn is_check(&self) -> bool {
        !self.board.checkers().is_empty()
    }

    pub fn is_checkmate(&self) -> bool {
        self.board.status() == GameStatus::Won
    }

    pub fn is_stalemate(&self) -> bool {
        self.board.status() == GameStatus::Drawn && !self.is_check()
    }

    pub fn is_game_over(&self) -> bool {
        self.board.status() != GameStatus::Ongoing || self.is_insufficient_material()
    }

    /// Draw by bare kings or king + single minor piece.
    pub fn is_insufficient_material(&self) -> bool {
        let heavy = self.board.pieces(Piece::Pawn)
            | self.board.pieces(Piece::Rook)
            | self.board.pieces(Piece::Queen);
        if !heavy.is_empty() {
            return false;
        }
        let minors = self.board.pieces(Piece::Knight) | self.board.pieces(Piece::Bishop);
        minors.len() <= 1
    }

    pub fn legal_move_count(&self) -> usize {
        let mut count = 0;
        self.board.generate_moves(|mvs| {
            count += mvs.len();
            false
        });
        count
    }

    /// True when exactly one legal move exists (the move is forced).
    pub fn is_forced(&self) -> bool {
        self.legal_move_count() == 1
    }

    pub fn piece_at(&self, sq: Square) -> Option<(PieceKind, PieceColor)> {
        let piece = self.board.piece_on(sq)?;
        let color = self.board.color_on(sq)?;
        Some((piece.into(), color.into()))
    }

    /// All legal moves with SAN, capture and check information.
    pub fn legal_moves(&self) -> Vec<VerboseMove> {
        uci::legal_moves(&self.board)
            .into_iter()
            .filter_map(|mv| self.describe(mv).ok())
            .collect()
    }

    /// Describe one legal move in verbose form.
    pub fn describe(&self, mv: Move) -> Result<VerboseMove, SanError> {
        let piece: PieceKind = self
            .board
            .piece_on(mv.from)
            .ok_or_else(|| SanError::NoLegalMove(uci::format_uci(mv)))?
            .into();

        let en_passant =
            piece == PieceKind::Pawn && mv.from.file() != mv.to.file() && self.board.piece_on(mv.to).is_none();
        let captured: Option<PieceKind> = if en_passant {
            Some(PieceKind::Pawn)
        } else {
            // Own-rook target means castling, not a capture.
            match (self.board.piece_on(mv.to), self.board.color_on(mv.to)) {
                (Some(p), Some(c)) if c != self.board.side_to_move() => Some(p.into()),
                _ => None,
            }
        };

        let san = format_san(&self.board, mv)?;
        let gives_check = san.ends_with('+') || san.ends_with('#');

        Ok(VerboseMove {
            mv,
            piece,
            captured,
            promotion: mv.promotion.map(Into::into),
            san,
            uci: uci::format_uci_on(&self.board, mv),
            is_capture: captured.is_some(),
            gives_check,
        })
    }

    /// Apply a move given in UCI notation, returning the resulting position.
    pub fn apply_uci(&self, uci_str: &str) -> Result<Position, UciMoveError> {
        let mv = uci::parse_uci_on(&self.board, uci_str)?;
        self.apply(mv)
            .map_err(|_| UciMoveError::IllegalMove(uci_str.to_string()))
    }

    /// Apply a SAN move, returning the resulting position.
    pub fn apply_san(&self, san: &str) -> Result<(Position, VerboseMove), SanError> {
        let mv = parse_san(&self.board, san)?;
        let verbose = self.describe(mv)?;
        let next = self
            .apply(mv)
            .map_err(|_| SanError::NoLegalMove(san.to_string()))?;
        Ok((next, verbose))
    }

    /// Apply a cozy_chess move, returning the resulting position.
    pub fn apply(&self, mv: Move) -> Result<Position, PositionError> {
        let mut board = self.board.clone();
        board.try_play(mv).map_err(|_| PositionError::IllegalMove)?;
        Ok(Position { board })
    }

    /// Find and describe the legal move matching a UCI string.
    pub fn find_uci(&self, uci_str: &str) -> Option<VerboseMove> {
        let mv = uci::parse_uci_on(&self.board, uci_str).ok()?;
        self.describe(mv).ok()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PositionError {
    #[error("Illegal move for this position")]
    IllegalMove,
}
