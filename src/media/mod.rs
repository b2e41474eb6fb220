// Media Tool Adapter
//
// Everything that touches audio or video bytes goes through ffmpeg/ffprobe:
// - Commands: argument-vector command builders (no shell strings)
// - Processor: policy-aware execution of those commands
// - Timing: duration parsing, tempo ratio and concat manifest helpers

pub mod commands;
pub mod processor;
pub mod timing;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// One time-bounded slice of the extracted audio track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    /// Zero-based position in the original track
    pub index: usize,
    pub path: PathBuf,
}

/// Main trait for media processing operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Extract the best audio stream of a video into a standalone file
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()>;

    /// Split audio into fixed-length chunks, returned in chronological order
    async fn split_audio(
        &self,
        audio_path: &Path,
        chunk_dir: &Path,
        chunk_seconds: u32,
    ) -> Result<Vec<AudioChunk>>;

    /// Split a video into fixed-length segments, returned in chronological order
    async fn split_video(
        &self,
        video_path: &Path,
        chunk_dir: &Path,
        segment_seconds: u32,
    ) -> Result<Vec<PathBuf>>;

    /// Concatenate audio files in the given order
    async fn merge_audio(&self, audio_paths: &[PathBuf], output_path: &Path) -> Result<()>;

    /// Replace the audio of a video, copying its video stream unmodified
    async fn remux(&self, video_path: &Path, audio_path: &Path, output_path: &Path) -> Result<()>;

    /// Duration of a media file in seconds
    async fn duration(&self, media_path: &Path) -> Result<f64>;

    /// Re-time audio towards `target_seconds`; returns the applied ratio
    async fn time_stretch(
        &self,
        audio_path: &Path,
        target_seconds: f64,
        output_path: &Path,
    ) -> Result<f64>;

    /// Check if media processor is available
    fn check_availability(&self) -> Result<()>;

    /// Get media processor version information
    async fn get_version_info(&self) -> Result<String>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessorTrait> {
        Box::new(processor::MediaProcessorImpl::new(config))
    }
}
