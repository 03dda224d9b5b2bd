pub mod fen;
pub mod pgn;
pub mod position;
pub mod san;
pub mod types;
pub mod uci;

pub use fen::{format_fen, parse_fen, position_key, FenError};
pub use pgn::{parse_pgn, replay, PgnError, PgnGame, ReplayedMove};
pub use position::{Position, PositionError, VerboseMove};
pub use san::{format_san, is_check_san, is_mate_san, parse_san, SanError};
pub use types::{is_white_ply, PieceColor, PieceKind};
pub use uci::{format_uci, format_uci_on, parse_uci, parse_uci_on, UciMoveError};
