//! Line-oriented parser for the UCI subset the workers consume.
//!
//! Moves are kept as validated UCI strings; nothing in the engine crate needs
//! board context, and castling conventions are resolved by the `chess` facade
//! at the layer that does.

use super::UciError;

/// Incoming message from a UCI engine.
#[derive(Debug, Clone)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    /// `bestmove (none)` (terminal positions) carries no move.
    BestMove {
        uci: Option<String>,
        ponder: Option<String>,
    },
    Info(InfoLine),
}

/// Raw score as the engine reports it, in side-to-move perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UciScore {
    Centipawns(i32),
    Mate(i32),
}

/// The fields of an `info` line that matter for analysis.
#[derive(Debug, Clone, Default)]
pub struct InfoLine {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub multipv: Option<u32>,
    pub score: Option<UciScore>,
    pub pv: Vec<String>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub time_ms: Option<u64>,
}

/// Parse one line from the engine.
pub fn parse_uci_message(line: &str) -> Result<UciMessage, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => Ok(UciMessage::UciOk),
        Some(&"readyok") => Ok(UciMessage::ReadyOk),

        Some(&"id") => {
            if tokens.len() < 3 {
                return Err(UciError::MalformedMessage(line.to_string()));
            }
            Ok(UciMessage::Id {
                name: tokens[1].to_string(),
                value: tokens[2..].join(" "),
            })
        }

        Some(&"bestmove") => {
            if tokens.len() < 2 {
                return Err(UciError::MalformedMessage(line.to_string()));
            }
            let uci = match tokens[1] {
                "(none)" => None,
                mv => Some(validate_move_token(mv)?.to_string()),
            };
            let ponder = if tokens.len() >= 4 && tokens[2] == "ponder" {
                validate_move_token(tokens[3]).ok().map(str::to_string)
            } else {
                None
            };
            Ok(UciMessage::BestMove { uci, ponder })
        }

        Some(&"info") => Ok(UciMessage::Info(parse_info_line(&tokens[1..]))),

        _ => Err(UciError::UnknownMessage(line.to_string())),
    }
}

/// Parse an `info` line. Unknown keywords are skipped, never fatal.
fn parse_info_line(tokens: &[&str]) -> InfoLine {
    let mut info = InfoLine::default();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                info.depth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "seldepth" => {
                i += 1;
                info.seldepth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "multipv" => {
                i += 1;
                info.multipv = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "time" => {
                i += 1;
                info.time_ms = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nodes" => {
                i += 1;
                info.nodes = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nps" => {
                i += 1;
                info.nps = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "score" => {
                i += 1;
                if let Some(&score_type) = tokens.get(i) {
                    i += 1;
                    if let Some(value_str) = tokens.get(i) {
                        info.score = match score_type {
                            "cp" => value_str.parse().ok().map(UciScore::Centipawns),
                            "mate" => value_str.parse().ok().map(UciScore::Mate),
                            _ => None,
                        };
                    }
                }
                // A trailing "lowerbound"/"upperbound" is skipped by the
                // unknown-keyword arm on the next iteration.
            }
            "pv" => {
                i += 1;
                while i < tokens.len() && !is_keyword(tokens[i]) {
                    if let Ok(mv) = validate_move_token(tokens[i]) {
                        info.pv.push(mv.to_string());
                    }
                    i += 1;
                }
                continue;
            }
            "string" => break,
            _ => {}
        }
        i += 1;
    }

    info
}

fn is_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "time"
            | "nodes"
            | "score"
            | "pv"
            | "multipv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "nps"
            | "tbhits"
            | "cpuload"
            | "string"
    )
}

/// Check a token has UCI move shape (e2e4, e7e8q) without resolving it.
fn validate_move_token(s: &str) -> Result<&str, UciError> {
    let bytes = s.as_bytes();
    let valid = matches!(bytes.len(), 4 | 5)
        && bytes[0].is_ascii_lowercase()
        && (b'a'..=b'h').contains(&bytes[0])
        && (b'1'..=b'8').contains(&bytes[1])
        && (b'a'..=b'h').contains(&bytes[2])
        && (b'1'..=b'8').contains(&bytes[3])
        && (bytes.len() == 4 || matches!(bytes[4], b'q' | b'r' | b'b' | b'n'));

    if valid {
        Ok(s)
    } else {
        Err(UciError::InvalidMove(s.to_string()))
    }
}
