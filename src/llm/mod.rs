//! Types shared with the streaming transport that delivers assistant replies

pub mod recording;

use serde::{Deserialize, Serialize};

/// A piece of a streamed assistant reply as delivered by the transport
#[derive(Debug, Clone, PartialEq)]
pub enum StreamingChunk {
    /// Regular text content
    Text(String),
    /// Content identified as "thinking" (supported by some models)
    Thinking(String),
    /// The transport finished the reply
    StreamingComplete,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}
