//! Error type for an agent session.

use thiserror::Error;

use hanabi_core::knowledge::KnowledgeError;
use hanabi_core::transport::TransportError;

/// Fatal conditions that end a session.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The connection dropped or delivered a malformed frame.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server refused one of our actions.
    #[error("action rejected by the server: {reason}")]
    Rejected { reason: String },

    /// Server events contradicted the belief model.
    #[error("knowledge inconsistency: {0}")]
    Knowledge(#[from] KnowledgeError),

    /// The decision worker thread could not be started.
    #[error("could not start decision worker: {0}")]
    Worker(#[source] std::io::Error),
}
