use engine::EngineError;

/// Failures that abort a review. Classification itself never fails; only
/// input validation, the engine layer, or a host callback can.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Client cancelled the review")]
    CancelledByClient,
}

impl ReviewError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Short machine-readable code for the error event stream.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Engine(EngineError::AnalysisTimeout) => "engine_timeout",
            Self::Engine(EngineError::PoolDisposed) => "pool_disposed",
            Self::Engine(EngineError::PoolExhausted) => "pool_exhausted",
            Self::Engine(_) => "engine_unavailable",
            Self::CancelledByClient => "cancelled",
        }
    }
}
