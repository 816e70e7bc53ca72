mod cli;

use agri_assistant::config::{load_config, AppConfig};
use agri_assistant::extraction::Extractor;
use agri_assistant::llm::recording::{play_turn, PlaybackOutcome, PlaybackState, TurnRecorder};
use agri_assistant::llm::StreamingChunk;
use agri_assistant::logging::setup_logging;
use agri_assistant::persistence::{generate_session_id, FileSessionPersistence};
use agri_assistant::prompt::system_prompt;
use agri_assistant::session::ChatSession;
use agri_assistant::ui::streaming::{chunk_str, CardStreamProcessor};
use agri_assistant::ui::terminal::TerminalRenderer;
use agri_assistant::ui::RenderSink;
use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Mode, SessionsAction};
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}

fn terminal_processor(
    extractor: &Arc<Extractor>,
    prompt: Option<&str>,
) -> Result<CardStreamProcessor> {
    let renderer = TerminalRenderer::new();
    renderer.begin_turn(prompt)?;
    Ok(CardStreamProcessor::new(
        Arc::new(Box::new(renderer) as Box<dyn RenderSink>),
        extractor.clone(),
    ))
}

fn session_store(config: &AppConfig) -> FileSessionPersistence {
    match &config.sessions_dir {
        Some(dir) => FileSessionPersistence::with_root(dir.clone()),
        None => FileSessionPersistence::new(),
    }
}

fn run_extract(extractor: &Extractor, file: Option<&Path>) -> Result<()> {
    let input = read_input(file)?;
    let result = extractor.extract(&input);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn run_simulate(
    extractor: Arc<Extractor>,
    file: &Path,
    chunk_size: usize,
    delay_ms: u64,
    record: Option<&Path>,
) -> Result<()> {
    let input = read_input(Some(file))?;
    let recorder = record.map(TurnRecorder::new);
    if let Some(recorder) = &recorder {
        recorder.start_recording(&file.display().to_string());
    }

    let mut processor = terminal_processor(&extractor, None)?;
    for chunk in chunk_str(&input, chunk_size) {
        if let Some(recorder) = &recorder {
            recorder.record_chunk(&chunk);
        }
        processor.process(&StreamingChunk::Text(chunk))?;
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }
    processor.process(&StreamingChunk::StreamingComplete)?;
    println!();

    if let Some(recorder) = &recorder {
        recorder.end_recording()?;
    }
    debug!("Final phase: {:?}", processor.stream().phase());
    Ok(())
}

async fn run_replay(
    extractor: Arc<Extractor>,
    config: &AppConfig,
    recording: &Path,
    fast: bool,
    save: bool,
) -> Result<()> {
    let playback = PlaybackState::from_file(recording, fast || config.fast_playback)?;
    info!(
        "Replaying {} turn(s) from {}",
        playback.turn_count(),
        recording.display()
    );

    let mut session = ChatSession::new_empty(
        generate_session_id(),
        format!("Phát lại {}", recording.display()),
    );

    while let Some(turn) = playback.next_turn() {
        session.add_user_message(turn.prompt.clone(), Vec::new());

        let mut processor = terminal_processor(&extractor, Some(&turn.prompt))?;
        let outcome = play_turn(&turn, &mut processor, playback.fast).await?;
        println!();
        if outcome == PlaybackOutcome::Abandoned {
            info!("Turn abandoned: {}", turn.prompt);
        }

        session.record_assistant_turn(&processor.into_stream());
    }

    if save {
        let mut store = session_store(config);
        store.save_chat_session(&session)?;
        println!("Saved session {}", session.id);
    }
    Ok(())
}

fn run_sessions(config: &AppConfig, action: &SessionsAction) -> Result<()> {
    let mut store = session_store(config);
    match action {
        SessionsAction::List => {
            let sessions = store.list_chat_sessions()?;
            if sessions.is_empty() {
                println!("No stored sessions");
            }
            for meta in sessions {
                let updated: chrono::DateTime<chrono::Local> = meta.updated_at.into();
                println!(
                    "{}  {}  {} message(s), {} card(s)  {}",
                    meta.id,
                    updated.format("%Y-%m-%d %H:%M"),
                    meta.message_count,
                    meta.card_count,
                    meta.name
                );
            }
        }
        SessionsAction::Delete { id } => {
            store.delete_chat_session(id)?;
            println!("Deleted session {id}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let mut config = load_config()?;
    if let Some(markers) = args.markers {
        config.markers = markers;
    }
    debug!("Using config: {:?}", config);

    let extractor = Arc::new(Extractor::new(config.markers));

    match &args.mode {
        Mode::Extract { file } => run_extract(&extractor, file.as_deref()),
        Mode::Simulate {
            file,
            chunk_size,
            delay_ms,
            record,
        } => run_simulate(extractor, file, *chunk_size, *delay_ms, record.as_deref()).await,
        Mode::Replay {
            recording,
            fast,
            save,
        } => run_replay(extractor, &config, recording, *fast, *save).await,
        Mode::Prompt => {
            println!("{}", system_prompt(extractor.convention()));
            Ok(())
        }
        Mode::Sessions { action } => run_sessions(&config, action),
    }
}

