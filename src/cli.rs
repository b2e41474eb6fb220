use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dub a single video into the target language
    Process {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Target language code (fr, es, de, hi, en)
        #[arg(short, long)]
        language: String,

        /// Workspace directory for intermediate and final files
        #[arg(short, long)]
        workdir: Option<PathBuf>,
    },

    /// Dub all video files in a directory
    Batch {
        /// Input directory containing video files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Target language code (fr, es, de, hi, en)
        #[arg(short, long)]
        language: String,

        /// Workspace directory for intermediate and final files
        #[arg(short, long)]
        workdir: Option<PathBuf>,
    },

    /// Extract audio from video file
    Extract {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output audio file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Split audio into fixed-length chunks
    Split {
        /// Input audio file
        #[arg(short, long)]
        input: PathBuf,

        /// Directory receiving chunk_NNN.wav files
        #[arg(long)]
        chunk_dir: PathBuf,

        /// Chunk length in seconds (defaults to media.chunk_seconds)
        #[arg(short, long)]
        seconds: Option<u32>,
    },

    /// Split a video into fixed-length segments
    SplitVideo {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Directory receiving chunk_NNN.mp4 files
        #[arg(long)]
        chunk_dir: PathBuf,

        /// Segment length in seconds
        #[arg(short, long, default_value = "60")]
        seconds: u32,
    },

    /// Concatenate audio files in the given order
    Merge {
        /// Output audio file
        #[arg(short, long)]
        output: PathBuf,

        /// Input audio files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Replace the audio track of a video
    Remux {
        /// Input video file
        #[arg(long)]
        video: PathBuf,

        /// Replacement audio file
        #[arg(short, long)]
        audio: PathBuf,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the duration of a media file in seconds
    Duration {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Re-time audio to a target duration
    Stretch {
        /// Input audio file
        #[arg(short, long)]
        input: PathBuf,

        /// Target duration in seconds
        #[arg(short, long)]
        target: f64,

        /// Output audio file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Transcribe an audio file and print the text
    Transcribe {
        /// Input audio file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Translate English text and print the result
    Translate {
        /// Text to translate
        #[arg(short, long)]
        text: String,

        /// Target language code
        #[arg(short, long)]
        language: String,
    },

    /// Synthesize speech for text in the target language
    Synthesize {
        /// Text to speak
        #[arg(short, long)]
        text: String,

        /// Target language code
        #[arg(short, long)]
        language: String,

        /// Output MP3 file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List supported target languages
    Languages,

    /// List available whisper models and their status
    Models {
        /// Download all missing models
        #[arg(long)]
        download: bool,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Output configuration file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}
