use carechat_common::error::ModelError;
use thiserror::Error;

/// Failures while running one group-chat exchange.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{speaker} failed in round {round}: {source}")]
    Turn {
        speaker: String,
        round: usize,
        #[source]
        source: ModelError,
    },
}

pub type ChatResult<T> = std::result::Result<T, ChatError>;
