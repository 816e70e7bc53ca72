//! Streaming state for assistant messages that may contain card blocks

use crate::cards::{ParsedPayload, TaggedBlockKind};
use crate::extraction::ExtractionResult;
use serde::{Deserialize, Serialize};

mod card_processor;
mod message_stream;

#[cfg(test)]
mod test_utils;

pub use card_processor::CardStreamProcessor;
pub use message_stream::{MessageStream, RawMessage, StreamPhase};

/// A parsed block ready to be shown as a rich card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub kind: TaggedBlockKind,
    pub payload: ParsedPayload,
}

/// What the renderer should show for an assistant message right now
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderDecision {
    pub show_plain_text: bool,
    /// Text to show when `show_plain_text` is set
    pub plain_text: String,
    pub show_loading_placeholder: bool,
    /// Kinds whose blocks are still arriving
    pub loading_kinds: Vec<TaggedBlockKind>,
    /// Every parsed block, in priority order
    pub cards_to_render: Vec<Card>,
}

/// Split text into chunks of at most `chunk_size` characters, never
/// splitting a character. A size of zero is treated as one.
pub fn chunk_str(s: &str, chunk_size: usize) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    chars
        .chunks(chunk_size.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Decide what to render for one extraction result.
///
/// While streaming, plain text is held back as soon as any block is parsed
/// or partially received, so half-written markup never reaches the user.
/// Cards are shown the moment they parse. After the stream completes plain
/// text is shown whenever there is some.
pub fn decide(result: &ExtractionResult, is_streaming: bool) -> RenderDecision {
    let has_text = !result.display_text.is_empty();
    let show_plain_text = if is_streaming {
        has_text && !(result.has_blocks() || result.has_partial_block)
    } else {
        has_text
    };

    RenderDecision {
        show_plain_text,
        plain_text: result.display_text.clone(),
        show_loading_placeholder: is_streaming
            && result.has_partial_block
            && !result.has_blocks(),
        loading_kinds: if is_streaming {
            result.partial_kinds.clone()
        } else {
            Vec::new()
        },
        cards_to_render: result
            .blocks
            .iter()
            .map(|(kind, payload)| Card {
                kind: *kind,
                payload: payload.clone(),
            })
            .collect(),
    }
}
