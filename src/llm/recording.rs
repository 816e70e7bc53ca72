use super::StreamingChunk;
use crate::ui::streaming::CardStreamProcessor;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// One recorded assistant turn with the user prompt that triggered it
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecordedTurn {
    pub prompt: String,
    /// Timestamp of when the recording was started
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Text deltas as received from the transport
    pub chunks: Vec<RecordedChunk>,
}

/// Single recorded chunk with timing info
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecordedChunk {
    pub data: String,
    /// Milliseconds since recording start
    pub timestamp_ms: u64,
}

/// Recorder for streamed assistant turns
pub struct TurnRecorder {
    file_path: PathBuf,
    current_turn: Arc<Mutex<Option<RecordedTurn>>>,
    start_time: Arc<Mutex<Option<Instant>>>,
}

impl TurnRecorder {
    /// Create a new recorder that appends to the specified file
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            file_path: path.as_ref().to_path_buf(),
            current_turn: Arc::new(Mutex::new(None)),
            start_time: Arc::new(Mutex::new(None)),
        }
    }

    /// Start recording a new turn
    pub fn start_recording(&self, prompt: &str) {
        *self.current_turn.lock().unwrap() = Some(RecordedTurn {
            prompt: prompt.to_string(),
            timestamp: chrono::Utc::now(),
            chunks: Vec::new(),
        });
        *self.start_time.lock().unwrap() = Some(Instant::now());
    }

    /// Record an incoming chunk
    pub fn record_chunk(&self, data: &str) {
        let mut turn_guard = self.current_turn.lock().unwrap();
        let start_guard = self.start_time.lock().unwrap();

        if let (Some(turn), Some(start_time)) = (turn_guard.as_mut(), *start_guard) {
            let timestamp_ms = start_time.elapsed().as_millis() as u64;
            turn.chunks.push(RecordedChunk {
                data: data.to_string(),
                timestamp_ms,
            });
        }
    }

    /// End the current turn and append it to the recording file
    pub fn end_recording(&self) -> Result<()> {
        let turn = self.current_turn.lock().unwrap().take();
        *self.start_time.lock().unwrap() = None;

        let Some(turn) = turn else {
            return Ok(());
        };

        let mut turns = if self.file_path.exists() {
            let contents =
                std::fs::read_to_string(&self.file_path).context("Failed to read recording file")?;
            if contents.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str::<Vec<RecordedTurn>>(&contents).with_context(|| {
                    format!(
                        "Refusing to append to invalid recording {}",
                        self.file_path.display()
                    )
                })?
            }
        } else {
            Vec::new()
        };

        let chunk_count = turn.chunks.len();
        turns.push(turn);
        let json = serde_json::to_string_pretty(&turns)?;
        let mut file = File::create(&self.file_path).context("Failed to write recording file")?;
        writeln!(file, "{json}")?;

        debug!(
            "Recorded turn with {} chunks to {}",
            chunk_count,
            self.file_path.display()
        );
        Ok(())
    }
}

/// Sequential playback over the turns of a recording file
#[derive(Clone)]
pub struct PlaybackState {
    turns: Arc<Vec<RecordedTurn>>,
    index: Arc<Mutex<usize>>,
    pub fast: bool,
}

impl PlaybackState {
    pub fn from_file<P: AsRef<Path>>(path: P, fast: bool) -> Result<Self> {
        let mut file = File::open(path).context("Failed to open recording file")?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .context("Failed to read recording file")?;
        let turns: Vec<RecordedTurn> =
            serde_json::from_str(&contents).context("Failed to parse recording file")?;
        Ok(Self {
            turns: Arc::new(turns),
            index: Arc::new(Mutex::new(0)),
            fast,
        })
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// Take the next turn, or None if exhausted
    pub fn next_turn(&self) -> Option<RecordedTurn> {
        let mut idx = self.index.lock().unwrap();
        let turn = self.turns.get(*idx)?.clone();
        *idx += 1;
        Some(turn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed,
    /// The UI asked to stop before the last chunk
    Abandoned,
}

/// Feed a recorded turn through a processor, keeping the recorded chunk timing
/// unless `fast` is set
pub async fn play_turn(
    turn: &RecordedTurn,
    processor: &mut CardStreamProcessor,
    fast: bool,
) -> Result<PlaybackOutcome> {
    let mut last_timestamp = 0;

    for chunk in &turn.chunks {
        if !processor.should_streaming_continue() {
            info!("Playback stopped by the UI");
            return Ok(PlaybackOutcome::Abandoned);
        }

        if !fast && chunk.timestamp_ms > last_timestamp {
            tokio::time::sleep(Duration::from_millis(chunk.timestamp_ms - last_timestamp)).await;
        }
        last_timestamp = chunk.timestamp_ms;

        processor.process(&StreamingChunk::Text(chunk.data.clone()))?;
    }

    processor.process(&StreamingChunk::StreamingComplete)?;
    Ok(PlaybackOutcome::Completed)
}
