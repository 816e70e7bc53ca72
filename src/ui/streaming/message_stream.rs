use super::{decide, RenderDecision};
use crate::cards::{ParsedPayload, TaggedBlockKind};
use crate::extraction::{ExtractionResult, Extractor};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// The accumulated text of one assistant turn
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMessage {
    pub full_text: String,
    pub is_streaming_complete: bool,
}

impl RawMessage {
    /// Append a delta. Returns false if the message is already complete.
    pub fn append(&mut self, delta: &str) -> bool {
        if self.is_streaming_complete {
            return false;
        }
        self.full_text.push_str(delta);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// No text received yet
    Empty,
    /// Text is arriving, no block parsed yet
    Streaming,
    /// Text is arriving and at least one card is showing
    StreamingWithBlocks,
    Complete,
}

/// Render state machine for one in-flight assistant message.
///
/// Extraction is re-run over the full text on every delta. A payload that
/// parsed once stays revealed for the rest of the turn.
#[derive(Debug, Clone)]
pub struct MessageStream {
    extractor: Arc<Extractor>,
    message: RawMessage,
    phase: StreamPhase,
    revealed: BTreeMap<TaggedBlockKind, ParsedPayload>,
    decision: RenderDecision,
}

impl MessageStream {
    pub fn new(extractor: Arc<Extractor>) -> Self {
        Self {
            extractor,
            message: RawMessage::default(),
            phase: StreamPhase::Empty,
            revealed: BTreeMap::new(),
            decision: RenderDecision::default(),
        }
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn message(&self) -> &RawMessage {
        &self.message
    }

    /// The decision computed for the latest delta
    pub fn decision(&self) -> &RenderDecision {
        &self.decision
    }

    pub fn is_streaming(&self) -> bool {
        !self.message.is_streaming_complete
    }

    /// Append a text delta and recompute what to render
    pub fn push_delta(&mut self, delta: &str) -> RenderDecision {
        if !self.message.append(delta) {
            warn!("Ignoring {} bytes received after stream completion", delta.len());
            return self.decision.clone();
        }
        self.recompute()
    }

    /// Mark the stream as ended and compute the final decision
    pub fn complete(&mut self) -> RenderDecision {
        if !self.message.is_streaming_complete {
            self.message.is_streaming_complete = true;
            self.recompute();
        }
        self.decision.clone()
    }

    /// Extraction over the current text with every revealed payload kept
    pub fn extraction(&self) -> ExtractionResult {
        let mut result = self.extractor.extract(&self.message.full_text);
        for (kind, payload) in &self.revealed {
            result.blocks.insert(*kind, payload.clone());
        }
        result
    }

    fn recompute(&mut self) -> RenderDecision {
        let result = self.extraction();
        for (kind, payload) in &result.blocks {
            if !self.revealed.contains_key(kind) {
                debug!("Revealing {} card", kind);
                self.revealed.insert(*kind, payload.clone());
            }
        }

        let is_streaming = self.is_streaming();
        let mut decision = decide(&result, is_streaming);
        decision.plain_text = self.visible_text(&result.display_text, is_streaming);
        decision.show_plain_text &= !decision.plain_text.is_empty();

        self.advance_phase(&result);
        self.decision = decision.clone();
        decision
    }

    /// Display text with any unfinished markup removed
    fn visible_text(&self, display_text: &str, is_streaming: bool) -> String {
        let mut text = display_text;
        if let Some(start) = self.extractor.unclosed_block_start(text) {
            text = &text[..start];
        }
        if is_streaming {
            if let Some(start) = self.extractor.pending_marker_start(text) {
                text = &text[..start];
            }
        }
        text.trim().to_string()
    }

    fn advance_phase(&mut self, result: &ExtractionResult) {
        let next = if self.message.is_streaming_complete {
            StreamPhase::Complete
        } else if result.has_blocks() {
            StreamPhase::StreamingWithBlocks
        } else if self.message.full_text.is_empty() {
            StreamPhase::Empty
        } else {
            StreamPhase::Streaming
        };

        // Phases only move forward
        if next != self.phase && phase_rank(next) > phase_rank(self.phase) {
            debug!("Message stream {:?} -> {:?}", self.phase, next);
            self.phase = next;
        }
    }
}

fn phase_rank(phase: StreamPhase) -> u8 {
    match phase {
        StreamPhase::Empty => 0,
        StreamPhase::Streaming => 1,
        StreamPhase::StreamingWithBlocks => 2,
        StreamPhase::Complete => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_stream() -> MessageStream {
        MessageStream::new(Arc::new(Extractor::default()))
    }

    #[test]
    fn test_phases_follow_deltas() {
        let mut stream = new_stream();
        assert_eq!(stream.phase(), StreamPhase::Empty);

        stream.push_delta("");
        assert_eq!(stream.phase(), StreamPhase::Empty);

        stream.push_delta("Dạ ");
        assert_eq!(stream.phase(), StreamPhase::Streaming);

        stream.push_delta("@@<STATUS>{\"status\":");
        assert_eq!(stream.phase(), StreamPhase::Streaming);

        stream.push_delta("\"ok\"}</STATUS>");
        assert_eq!(stream.phase(), StreamPhase::StreamingWithBlocks);

        stream.complete();
        assert_eq!(stream.phase(), StreamPhase::Complete);
    }

    #[test]
    fn test_deltas_after_completion_are_ignored() {
        let mut stream = new_stream();
        stream.push_delta("Xin chào");
        let final_decision = stream.complete();

        let decision = stream.push_delta(" thêm");
        assert_eq!(decision, final_decision);
        assert_eq!(stream.message().full_text, "Xin chào");
    }

    #[test]
    fn test_trailing_marker_prefix_is_held_back() {
        let mut stream = new_stream();
        let decision = stream.push_delta("Nhiệt độ hôm nay @@<WEA");
        assert!(decision.show_plain_text);
        assert_eq!(decision.plain_text, "Nhiệt độ hôm nay");

        // Not a marker after all
        let decision = stream.push_delta("K");
        assert_eq!(decision.plain_text, "Nhiệt độ hôm nay @@<WEAK");
    }

    #[test]
    fn test_unclosed_block_is_cut_after_completion() {
        let mut stream = new_stream();
        stream.push_delta("Thời tiết Huế: @@<WEATHER_DATA>{\"location\":\"Huế\"");
        let decision = stream.complete();

        assert!(decision.show_plain_text);
        assert_eq!(decision.plain_text, "Thời tiết Huế:");
        assert!(!decision.show_loading_placeholder);
        assert!(decision.loading_kinds.is_empty());
    }

    #[test]
    fn test_unclosed_block_only_shows_nothing_after_completion() {
        let mut stream = new_stream();
        stream.push_delta("@@<ARGI_NEWS>{\"title\"");
        let decision = stream.complete();
        assert!(!decision.show_plain_text);
        assert!(decision.cards_to_render.is_empty());
    }
}
