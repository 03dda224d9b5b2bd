pub mod parser;

pub use parser::{parse_uci_message, InfoLine, UciMessage, UciScore};

#[derive(Debug, thiserror::Error)]
pub enum UciError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed UCI message: {0}")]
    MalformedMessage(String),
    #[error("Unknown UCI message: {0}")]
    UnknownMessage(String),
    #[error("Invalid move token: {0}")]
    InvalidMove(String),
}
