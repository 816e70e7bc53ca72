pub mod streaming;
pub mod terminal;

pub use streaming::{Card, RenderDecision};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UIError {
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
}

/// Receives render decisions for the assistant turn being streamed
pub trait RenderSink: Send + Sync {
    /// Show the current state of the assistant message
    fn render(&self, decision: &RenderDecision) -> Result<(), UIError>;

    /// Whether the user still wants this reply. Returning false abandons the turn.
    fn should_streaming_continue(&self) -> bool {
        true
    }
}
