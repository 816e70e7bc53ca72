use agri_assistant::extraction::MarkerConvention;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Extract card blocks from a complete reply and print them as JSON
    Extract {
        /// File containing the reply (reads stdin if omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Stream a reply from a file through the renderer in small chunks
    Simulate {
        /// File containing the reply
        #[arg(short, long)]
        file: PathBuf,

        /// Characters per streamed chunk
        #[arg(long, default_value_t = 8)]
        chunk_size: usize,

        /// Delay between chunks in milliseconds
        #[arg(long, default_value_t = 30)]
        delay_ms: u64,

        /// Record the streamed chunks to a file for later replay
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Play back recorded turns through the renderer
    Replay {
        /// Recording file (JSON array of turns)
        #[arg(short, long)]
        recording: PathBuf,

        /// Ignore the recorded timing
        #[arg(long)]
        fast: bool,

        /// Store the replayed conversation as a chat session
        #[arg(long)]
        save: bool,
    },

    /// Print the system prompt for the configured markers
    Prompt,

    /// Manage stored chat sessions
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum SessionsAction {
    /// List stored sessions, newest first
    List,
    /// Delete a stored session
    Delete { id: String },
}

/// Define the application arguments
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub mode: Mode,

    /// Enable verbose logging (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Card delimiter markers to accept (overrides the config file)
    #[arg(long, global = true)]
    pub markers: Option<MarkerConvention>,
}
