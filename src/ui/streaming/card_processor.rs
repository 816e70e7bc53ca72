use super::{MessageStream, RenderDecision};
use crate::extraction::Extractor;
use crate::llm::StreamingChunk;
use crate::ui::{RenderSink, UIError};
use std::sync::Arc;
use tracing::trace;

/// Feeds streaming chunks of one assistant turn through a [`MessageStream`]
/// and forwards every changed decision to the UI.
pub struct CardStreamProcessor {
    stream: MessageStream,
    ui: Arc<Box<dyn RenderSink>>,
    last_rendered: Option<RenderDecision>,
}

impl CardStreamProcessor {
    pub fn new(ui: Arc<Box<dyn RenderSink>>, extractor: Arc<Extractor>) -> Self {
        Self {
            stream: MessageStream::new(extractor),
            ui,
            last_rendered: None,
        }
    }

    /// Process a streaming chunk and send the resulting decision to the UI
    pub fn process(&mut self, chunk: &StreamingChunk) -> Result<(), UIError> {
        let decision = match chunk {
            StreamingChunk::Text(text) => self.stream.push_delta(text),
            // Thinking is not part of the visible reply
            StreamingChunk::Thinking(text) => {
                trace!("Skipping {} bytes of thinking", text.len());
                return Ok(());
            }
            StreamingChunk::StreamingComplete => {
                let decision = self.stream.complete();
                // The final state is always delivered, even if unchanged
                self.ui.render(&decision)?;
                self.last_rendered = Some(decision);
                return Ok(());
            }
        };

        if self.last_rendered.as_ref() != Some(&decision) {
            self.ui.render(&decision)?;
            self.last_rendered = Some(decision);
        }
        Ok(())
    }

    pub fn should_streaming_continue(&self) -> bool {
        self.ui.should_streaming_continue()
    }

    pub fn stream(&self) -> &MessageStream {
        &self.stream
    }

    pub fn into_stream(self) -> MessageStream {
        self.stream
    }
}
