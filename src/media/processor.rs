use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{FailurePolicy, MediaConfig};
use crate::error::{Result, RedubError};
use crate::layout::{CHUNK_EXTENSION, chunk_index, chunk_pattern};
use super::timing::{atempo_factor, concat_manifest, expected_chunk_count, parse_duration, stretch_ratio};
use super::{AudioChunk, MediaCommand, MediaCommandBuilder, MediaProcessorTrait};

const VIDEO_CHUNK_EXTENSION: &str = "mp4";

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path, &config.probe_binary_path);

        Self {
            config,
            command_builder,
        }
    }

    /// Execute a command, honoring the configured failure policy
    async fn run(&self, command: MediaCommand) -> Result<()> {
        match command.execute().await {
            Ok(_) => Ok(()),
            Err(e) => match self.config.failure_policy {
                FailurePolicy::FailFast => Err(e),
                FailurePolicy::BestEffort => {
                    warn!("{} (continuing under best-effort policy)", e);
                    Ok(())
                }
            },
        }
    }

    async fn segment(
        &self,
        input_path: &Path,
        chunk_dir: &Path,
        segment_seconds: u32,
        extension: &str,
    ) -> Result<Vec<(usize, PathBuf)>> {
        if segment_seconds == 0 {
            return Err(RedubError::Config("Chunk length must be at least one second".to_string()));
        }

        tokio::fs::create_dir_all(chunk_dir).await?;
        let removed = remove_chunks(chunk_dir, extension).await?;
        if removed > 0 {
            debug!("Removed {} stale chunks from {}", removed, chunk_dir.display());
        }

        let pattern = chunk_pattern(chunk_dir, extension);
        self.run(self.command_builder.segment(input_path, pattern.as_path(), segment_seconds))
            .await?;

        let chunks = list_chunks(chunk_dir, extension);
        if chunks.iter().enumerate().any(|(position, (index, _))| position != *index) {
            warn!("Chunk sequence in {} has gaps", chunk_dir.display());
        }
        Ok(chunks)
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()> {
        info!("Extracting audio from {} to {}", video_path.display(), audio_path.display());

        if let Some(parent) = audio_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        self.run(self.command_builder.extract_audio(video_path, audio_path)).await?;

        info!("Audio extraction completed");
        Ok(())
    }

    async fn split_audio(
        &self,
        audio_path: &Path,
        chunk_dir: &Path,
        chunk_seconds: u32,
    ) -> Result<Vec<AudioChunk>> {
        info!("Splitting {} into {}s chunks", audio_path.display(), chunk_seconds);

        let chunks: Vec<AudioChunk> = self
            .segment(audio_path, chunk_dir, chunk_seconds, CHUNK_EXTENSION)
            .await?
            .into_iter()
            .map(|(index, path)| AudioChunk { index, path })
            .collect();

        match self.duration(audio_path).await {
            Ok(total) => {
                let expected = expected_chunk_count(total, chunk_seconds);
                if expected != chunks.len() {
                    warn!(
                        "Expected {} chunks for {:.1}s of audio, found {}",
                        expected, total, chunks.len()
                    );
                }
            }
            Err(e) => debug!("Skipping chunk count check: {}", e),
        }

        info!("Audio split into {} chunks", chunks.len());
        Ok(chunks)
    }

    async fn split_video(
        &self,
        video_path: &Path,
        chunk_dir: &Path,
        segment_seconds: u32,
    ) -> Result<Vec<PathBuf>> {
        info!("Splitting {} into {}s segments", video_path.display(), segment_seconds);

        let segments = self
            .segment(video_path, chunk_dir, segment_seconds, VIDEO_CHUNK_EXTENSION)
            .await?;

        info!("Video split into {} segments", segments.len());
        Ok(segments.into_iter().map(|(_, path)| path).collect())
    }

    async fn merge_audio(&self, audio_paths: &[PathBuf], output_path: &Path) -> Result<()> {
        if audio_paths.is_empty() {
            return Err(RedubError::Media("No audio files to merge".to_string()));
        }
        info!("Merging {} audio files into {}", audio_paths.len(), output_path.display());

        let output_dir = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&output_dir).await?;

        let absolute = audio_paths
            .iter()
            .map(std::path::absolute)
            .collect::<std::io::Result<Vec<_>>>()?;

        // Deleted when dropped, whichever way this function returns
        let mut manifest = tempfile::Builder::new()
            .prefix("concat_")
            .suffix(".txt")
            .tempfile_in(&output_dir)?;
        manifest.write_all(concat_manifest(&absolute).as_bytes())?;
        manifest.flush()?;
        debug!("Concat manifest written to {}", manifest.path().display());

        self.run(self.command_builder.concat(manifest.path(), output_path)).await?;

        info!("Audio merge completed");
        Ok(())
    }

    async fn remux(&self, video_path: &Path, audio_path: &Path, output_path: &Path) -> Result<()> {
        info!(
            "Remuxing {} with audio {} -> {}",
            video_path.display(), audio_path.display(), output_path.display()
        );

        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let command = self.command_builder.remux(
            video_path,
            audio_path,
            output_path,
            &self.config.audio_codec,
        );
        self.run(command).await?;

        info!("Remux completed");
        Ok(())
    }

    async fn duration(&self, media_path: &Path) -> Result<f64> {
        let stdout = self.command_builder.probe_duration(media_path).execute().await?;
        let seconds = parse_duration(&stdout)?;
        debug!("Duration of {}: {:.3}s", media_path.display(), seconds);
        Ok(seconds)
    }

    async fn time_stretch(
        &self,
        audio_path: &Path,
        target_seconds: f64,
        output_path: &Path,
    ) -> Result<f64> {
        let current = match self.duration(audio_path).await {
            Ok(seconds) => Some(seconds),
            Err(e) => {
                warn!("Could not measure {}, leaving tempo unchanged: {}", audio_path.display(), e);
                None
            }
        };

        let ratio = stretch_ratio(current, target_seconds);
        info!(
            "Stretching {} towards {:.2}s (ratio {:.3})",
            audio_path.display(), target_seconds, ratio
        );

        self.run(self.command_builder.tempo(audio_path, output_path, atempo_factor(ratio)))
            .await?;
        Ok(ratio)
    }

    fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.binary_path)
            .arg("-version")
            .output()
            .map_err(|e| RedubError::Media(format!("Media processor not found: {}", e)))?;

        if output.status.success() {
            info!("Media processor is available");
            Ok(())
        } else {
            Err(RedubError::Media("Media processor version check failed".to_string()))
        }
    }

    async fn get_version_info(&self) -> Result<String> {
        debug!("Getting media processor version information");

        let stdout = self.command_builder.version_check().execute().await?;
        Ok(stdout.lines().next().unwrap_or("Unknown version").to_string())
    }
}

/// Chunk files in `chunk_dir`, ordered by their embedded sequence index
pub fn list_chunks(chunk_dir: &Path, extension: &str) -> Vec<(usize, PathBuf)> {
    let mut chunks: Vec<(usize, PathBuf)> = WalkDir::new(chunk_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let path = entry.into_path();
            chunk_index(&path, extension).map(|index| (index, path))
        })
        .collect();

    chunks.sort();
    chunks
}

/// Delete chunk files left behind by an earlier run
async fn remove_chunks(chunk_dir: &Path, extension: &str) -> Result<usize> {
    let stale = list_chunks(chunk_dir, extension);
    for (_, path) in &stale {
        tokio::fs::remove_file(path).await?;
    }
    Ok(stale.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use tokio_test::{assert_err, assert_ok};

    fn config(policy: FailurePolicy) -> MediaConfig {
        MediaConfig {
            binary_path: "redub-missing-ffmpeg".to_string(),
            probe_binary_path: "redub-missing-ffprobe".to_string(),
            chunk_seconds: 300,
            audio_codec: "aac".to_string(),
            failure_policy: policy,
        }
    }

    fn leftover_manifests(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("concat_"))
            .count()
    }

    #[test]
    fn test_list_chunks_orders_by_index_and_ignores_other_files() {
        let temp = TempDir::new().unwrap();
        for name in [
            "chunk_010.wav",
            "chunk_002.wav",
            "chunk_1000.wav",
            "chunk_000.wav",
            "translated_000.mp3",
            "chunk_001.mp4",
            "notes.txt",
        ] {
            temp.child(name).touch().unwrap();
        }

        let names: Vec<String> = list_chunks(temp.path(), "wav")
            .into_iter()
            .map(|(_, path)| path.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(
            names,
            vec!["chunk_000.wav", "chunk_002.wav", "chunk_010.wav", "chunk_1000.wav"]
        );
    }

    #[test]
    fn test_list_chunks_of_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(list_chunks(&temp.path().join("absent"), "wav").is_empty());
    }

    #[tokio::test]
    async fn test_remove_chunks_keeps_translated_audio() {
        let temp = TempDir::new().unwrap();
        temp.child("chunk_000.wav").touch().unwrap();
        temp.child("chunk_001.wav").touch().unwrap();
        temp.child("translated_000.mp3").touch().unwrap();

        assert_eq!(remove_chunks(temp.path(), "wav").await.unwrap(), 2);
        assert!(!temp.child("chunk_000.wav").path().exists());
        assert!(temp.child("translated_000.mp3").path().exists());
    }

    #[tokio::test]
    async fn test_best_effort_swallows_tool_failure() {
        let temp = TempDir::new().unwrap();
        let processor = MediaProcessorImpl::new(config(FailurePolicy::BestEffort));

        let result = processor
            .extract_audio(&temp.path().join("in.mp4"), &temp.path().join("audio.wav"))
            .await;
        assert_ok!(result);
        assert!(!temp.path().join("audio.wav").exists());
    }

    #[tokio::test]
    async fn test_fail_fast_propagates_tool_failure() {
        let temp = TempDir::new().unwrap();
        let processor = MediaProcessorImpl::new(config(FailurePolicy::FailFast));

        let result = processor
            .extract_audio(&temp.path().join("in.mp4"), &temp.path().join("audio.wav"))
            .await;
        assert!(matches!(result, Err(RedubError::Media(_))));
    }

    #[tokio::test]
    async fn test_merge_rejects_empty_input() {
        let temp = TempDir::new().unwrap();
        let processor = MediaProcessorImpl::new(config(FailurePolicy::BestEffort));

        let result = processor.merge_audio(&[], &temp.path().join("merged.mp3")).await;
        assert_err!(result);
    }

    #[tokio::test]
    async fn test_merge_manifest_is_removed_on_failure() {
        let temp = TempDir::new().unwrap();
        let processor = MediaProcessorImpl::new(config(FailurePolicy::FailFast));
        let inputs = vec![temp.path().join("translated_000.mp3")];

        let result = processor.merge_audio(&inputs, &temp.path().join("merged.mp3")).await;
        assert_err!(result);
        assert_eq!(leftover_manifests(temp.path()), 0);
    }

    #[tokio::test]
    async fn test_merge_manifest_is_removed_under_best_effort() {
        let temp = TempDir::new().unwrap();
        let processor = MediaProcessorImpl::new(config(FailurePolicy::BestEffort));
        let inputs = vec![temp.path().join("translated_000.mp3")];

        let result = processor.merge_audio(&inputs, &temp.path().join("merged.mp3")).await;
        assert_ok!(result);
        assert_eq!(leftover_manifests(temp.path()), 0);
    }

    #[tokio::test]
    async fn test_split_clears_stale_chunks_before_segmenting() {
        let temp = TempDir::new().unwrap();
        temp.child("chunks/chunk_007.wav").touch().unwrap();
        let processor = MediaProcessorImpl::new(config(FailurePolicy::BestEffort));

        let chunks = processor
            .split_audio(&temp.path().join("audio.wav"), &temp.path().join("chunks"), 300)
            .await
            .unwrap();
        assert!(chunks.is_empty());
        assert!(!temp.path().join("chunks/chunk_007.wav").exists());
    }

    #[tokio::test]
    async fn test_split_rejects_zero_length_chunks() {
        let temp = TempDir::new().unwrap();
        let processor = MediaProcessorImpl::new(config(FailurePolicy::BestEffort));

        let result = processor
            .split_audio(&temp.path().join("audio.wav"), &temp.path().join("chunks"), 0)
            .await;
        assert!(matches!(result, Err(RedubError::Config(_))));
    }

    #[tokio::test]
    async fn test_unmeasurable_stretch_keeps_tempo() {
        let temp = TempDir::new().unwrap();
        let processor = MediaProcessorImpl::new(config(FailurePolicy::BestEffort));

        let ratio = processor
            .time_stretch(&temp.path().join("a.mp3"), 30.0, &temp.path().join("b.mp3"))
            .await
            .unwrap();
        assert_eq!(ratio, 1.0);
    }
}
