//! Common test utilities for the card stream processor
use crate::ui::streaming::RenderDecision;
use crate::ui::{RenderSink, UIError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A test sink that records every decision it is asked to render
#[derive(Clone)]
pub struct TestSink {
    decisions: Arc<Mutex<Vec<RenderDecision>>>,
    keep_streaming: Arc<AtomicBool>,
}

impl TestSink {
    pub fn new() -> Self {
        Self {
            decisions: Arc::new(Mutex::new(Vec::new())),
            keep_streaming: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn get_decisions(&self) -> Vec<RenderDecision> {
        self.decisions.lock().unwrap().clone()
    }

    pub fn last_decision(&self) -> Option<RenderDecision> {
        self.decisions.lock().unwrap().last().cloned()
    }

    /// Make the sink ask for the stream to stop
    pub fn cancel(&self) {
        self.keep_streaming.store(false, Ordering::SeqCst);
    }
}

impl RenderSink for TestSink {
    fn render(&self, decision: &RenderDecision) -> Result<(), UIError> {
        self.decisions.lock().unwrap().push(decision.clone());
        Ok(())
    }

    fn should_streaming_continue(&self) -> bool {
        self.keep_streaming.load(Ordering::SeqCst)
    }
}

/// Helper function to print decisions for debugging
pub fn print_decisions(decisions: &[RenderDecision]) {
    println!("Collected {} decisions:", decisions.len());
    for (i, decision) in decisions.iter().enumerate() {
        let kinds: Vec<_> = decision.cards_to_render.iter().map(|c| c.kind).collect();
        println!(
            "  [{i}] plain={} {:?} loading={} {:?} cards={:?}",
            decision.show_plain_text,
            decision.plain_text,
            decision.show_loading_placeholder,
            decision.loading_kinds,
            kinds
        );
    }
}
