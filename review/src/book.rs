//! Opening book: a small built-in table of common lines, compiled once at
//! startup by replaying each line and recording every position key along
//! the way. Book moves bypass the engine entirely.

use std::collections::HashMap;

use chess::{position_key, Position};
use once_cell::sync::Lazy;

/// SAN lines of common openings. Every position reached while replaying a
/// line (including the start position) lands in the table.
const BOOK_LINES: &[(&str, &str)] = &[
    ("Italian Game", "e4 e5 Nf3 Nc6 Bc4 Bc5 c3 Nf6 d3 d6"),
    ("Italian Game, Two Knights", "e4 e5 Nf3 Nc6 Bc4 Nf6 d3 Be7"),
    ("Ruy Lopez", "e4 e5 Nf3 Nc6 Bb5 a6 Ba4 Nf6 O-O Be7 Re1 b5 Bb3 d6"),
    ("Ruy Lopez, Berlin Defence", "e4 e5 Nf3 Nc6 Bb5 Nf6 O-O Nxe4 d4 Nd6"),
    ("Ruy Lopez, Exchange", "e4 e5 Nf3 Nc6 Bb5 a6 Bxc6 dxc6 O-O f6"),
    ("Sicilian Defence, Open", "e4 c5 Nf3 d6 d4 cxd4 Nxd4 Nf6 Nc3 a6"),
    ("Sicilian Defence, Najdorf", "e4 c5 Nf3 d6 d4 cxd4 Nxd4 Nf6 Nc3 a6 Be3 e5"),
    ("Sicilian Defence, Dragon", "e4 c5 Nf3 d6 d4 cxd4 Nxd4 Nf6 Nc3 g6"),
    ("Sicilian Defence, Sveshnikov", "e4 c5 Nf3 Nc6 d4 cxd4 Nxd4 Nf6 Nc3 e5"),
    ("French Defence", "e4 e6 d4 d5 Nc3 Nf6 Bg5 Be7 e5 Nfd7"),
    ("French Defence, Advance", "e4 e6 d4 d5 e5 c5 c3 Nc6 Nf3 Qb6"),
    ("Caro-Kann Defence", "e4 c6 d4 d5 Nc3 dxe4 Nxe4 Bf5 Ng3 Bg6"),
    ("Caro-Kann Defence, Advance", "e4 c6 d4 d5 e5 Bf5 Nf3 e6 Be2 c5"),
    ("Scandinavian Defence", "e4 d5 exd5 Qxd5 Nc3 Qa5 d4 Nf6 Nf3 c6"),
    ("Pirc Defence", "e4 d6 d4 Nf6 Nc3 g6 Nf3 Bg7 Be2 O-O"),
    ("Scotch Game", "e4 e5 Nf3 Nc6 d4 exd4 Nxd4 Nf6 Nxc6 bxc6"),
    ("Petrov Defence", "e4 e5 Nf3 Nf6 Nxe5 d6 Nf3 Nxe4 d4 d5"),
    ("Vienna Game", "e4 e5 Nc3 Nf6 f4 d5 fxe5 Nxe4 Nf3 Be7"),
    ("Queen's Gambit Declined", "d4 d5 c4 e6 Nc3 Nf6 Bg5 Be7 e3 O-O Nf3 h6"),
    ("Queen's Gambit Accepted", "d4 d5 c4 dxc4 Nf3 Nf6 e3 e6 Bxc4 c5"),
    ("Slav Defence", "d4 d5 c4 c6 Nf3 Nf6 Nc3 dxc4 a4 Bf5"),
    ("Semi-Slav Defence", "d4 d5 c4 c6 Nf3 Nf6 Nc3 e6 e3 Nbd7"),
    ("King's Indian Defence", "d4 Nf6 c4 g6 Nc3 Bg7 e4 d6 Nf3 O-O Be2 e5"),
    ("Nimzo-Indian Defence", "d4 Nf6 c4 e6 Nc3 Bb4 e3 O-O Bd3 d5"),
    ("Queen's Indian Defence", "d4 Nf6 c4 e6 Nf3 b6 g3 Bb7 Bg2 Be7"),
    ("Grunfeld Defence", "d4 Nf6 c4 g6 Nc3 d5 cxd5 Nxd5 e4 Nxc3 bxc3 Bg7"),
    ("London System", "d4 d5 Nf3 Nf6 Bf4 c5 e3 Nc6 c3 e6"),
    ("Catalan Opening", "d4 Nf6 c4 e6 g3 d5 Bg2 Be7 Nf3 O-O"),
    ("English Opening", "c4 e5 Nc3 Nf6 Nf3 Nc6 g3 d5 cxd5 Nxd5"),
    ("English Opening, Symmetrical", "c4 c5 Nf3 Nf6 d4 cxd4 Nxd4 e6 Nc3 Bb4"),
    ("Reti Opening", "Nf3 d5 c4 e6 g3 Nf6 Bg2 Be7 O-O O-O"),
];

/// Position key (first four FEN fields) → opening name.
static BOOK_TABLE: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    let mut table = HashMap::new();

    for (name, line) in BOOK_LINES {
        let mut position = Position::startpos();
        if let Some(key) = position_key(&position.fen()) {
            table.entry(key).or_insert(*name);
        }

        for san in line.split_whitespace() {
            match position.apply_san(san) {
                Ok((next, _)) => {
                    position = next;
                    if let Some(key) = position_key(&position.fen()) {
                        table.entry(key).or_insert(*name);
                    }
                }
                Err(e) => {
                    // A broken book line is a data bug, not a runtime error.
                    tracing::warn!(opening = name, san, "Book line failed to replay: {e}");
                    break;
                }
            }
        }
    }

    table
});

/// Look up a position in the book table.
pub fn opening_name(fen: &str) -> Option<&'static str> {
    let key = position_key(fen)?;
    BOOK_TABLE.get(&key).copied()
}

/// Is this ply a book move? Either endpoint known, early enough in the game.
pub fn classify_book(
    fen_before: &str,
    fen_after: &str,
    move_number: u32,
    max_book_moves: u32,
) -> Option<&'static str> {
    if move_number > max_book_moves {
        return None;
    }
    opening_name(fen_before).or_else(|| opening_name(fen_after))
}
