use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Result, RedubError};
use crate::language::TargetLanguage;
use crate::layout::RunLayout;
use crate::media::{AudioChunk, MediaProcessorFactory, MediaProcessorTrait};
use crate::synthesize::{SpeechSynthesizer, SynthesizerFactory};
use crate::transcribe::{TranscriberFactory, TranscriberTrait};
use crate::translate::{Translator, TranslatorFactory};

const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm"];

/// What one pipeline run produced
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub final_video: PathBuf,
    pub merged_audio: PathBuf,
    pub total_chunks: usize,
    /// Indices of chunks that contributed translated speech, in order
    pub translated_chunks: Vec<usize>,
    /// Indices of chunks with no recognized speech
    pub skipped_chunks: Vec<usize>,
}

pub struct Workflow {
    config: Config,
    media: Box<dyn MediaProcessorTrait>,
    transcriber: Box<dyn TranscriberTrait>,
    translator: Box<dyn Translator>,
    synthesizer: Box<dyn SpeechSynthesizer>,
}

impl Workflow {
    /// Build every adapter once; they are reused for all chunks and videos
    pub fn new(config: Config) -> Result<Self> {
        let media = MediaProcessorFactory::create_processor(config.media.clone());
        media.check_availability()?;

        let transcriber = TranscriberFactory::load(config.transcriber.clone())?;
        let translator = TranslatorFactory::create_translator(config.translate.clone())?;
        let synthesizer = SynthesizerFactory::create_synthesizer(config.synthesis.clone())?;

        Ok(Self::with_components(config, media, transcriber, translator, synthesizer))
    }

    pub fn with_components(
        config: Config,
        media: Box<dyn MediaProcessorTrait>,
        transcriber: Box<dyn TranscriberTrait>,
        translator: Box<dyn Translator>,
        synthesizer: Box<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            config,
            media,
            transcriber,
            translator,
            synthesizer,
        }
    }

    pub fn media(&self) -> &dyn MediaProcessorTrait {
        self.media.as_ref()
    }

    pub fn transcriber(&self) -> &dyn TranscriberTrait {
        self.transcriber.as_ref()
    }

    fn layout_in(&self, workspace: &Path) -> RunLayout {
        if self.config.workspace.isolate_runs {
            RunLayout::isolated(workspace)
        } else {
            RunLayout::shared(workspace)
        }
    }

    /// Dub a video, returning the final file or `None` if anything failed
    pub async fn process_video<P: AsRef<Path>>(&self, video_path: P, language: &str) -> Option<PathBuf> {
        let video_path = video_path.as_ref();
        match self.try_process_video(video_path, language).await {
            Ok(report) => Some(report.final_video),
            Err(e) => {
                error!("Translation pipeline failed for {}: {}", video_path.display(), e);
                None
            }
        }
    }

    /// Dub a video: extract, split, transcribe, translate, synthesize, merge, remux
    pub async fn try_process_video<P: AsRef<Path>>(
        &self,
        video_path: P,
        language: &str,
    ) -> Result<PipelineReport> {
        let workspace = self.config.workspace.dir.clone();
        self.try_process_video_in(video_path.as_ref(), language, &workspace).await
    }

    async fn try_process_video_in(
        &self,
        video_path: &Path,
        language: &str,
        workspace: &Path,
    ) -> Result<PipelineReport> {
        let language = TargetLanguage::from_code(language)?;

        if !video_path.is_file() {
            return Err(RedubError::FileNotFound(video_path.display().to_string()));
        }

        info!("Starting translation pipeline for {} ({})", video_path.display(), language.name());
        self.translator.check_availability().await?;

        let layout = self.layout_in(workspace);
        fs::create_dir_all(layout.root()).await?;
        remove_previous_outputs(&layout, language).await?;

        // Step 1: Extract audio
        let audio_path = layout.audio_path();
        self.media.extract_audio(video_path, &audio_path).await?;

        // Step 2: Split into ordered chunks
        let chunks = self
            .media
            .split_audio(&audio_path, &layout.chunk_dir(), self.config.media.chunk_seconds)
            .await?;

        // Step 3: Per-chunk transcription, translation and synthesis
        let mut translated_audio = Vec::new();
        let mut translated_chunks = Vec::new();
        let mut skipped_chunks = Vec::new();

        let progress = chunk_progress(chunks.len());
        for chunk in &chunks {
            progress.set_message(format!("chunk {:03}", chunk.index));
            match self.process_chunk(chunk, language, &layout).await? {
                Some(audio) => {
                    translated_audio.push(audio);
                    translated_chunks.push(chunk.index);
                }
                None => skipped_chunks.push(chunk.index),
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        if translated_audio.is_empty() {
            return Err(RedubError::NoSpeech);
        }

        // Step 4: Merge translated speech in chunk order
        let merged_audio = layout.merged_audio_path(language);
        self.media.merge_audio(&translated_audio, &merged_audio).await?;

        // Step 5: Put the translated speech under the original picture
        let final_video = layout.final_video_path(language);
        self.media.remux(video_path, &merged_audio, &final_video).await?;

        if !final_video.is_file() {
            return Err(RedubError::Media(format!(
                "Pipeline finished but {} was not produced",
                final_video.display()
            )));
        }

        info!("Translation complete! File ready at: {}", final_video.display());
        Ok(PipelineReport {
            final_video,
            merged_audio,
            total_chunks: chunks.len(),
            translated_chunks,
            skipped_chunks,
        })
    }

    /// Returns the translated audio for a chunk, or `None` when it holds no speech
    async fn process_chunk(
        &self,
        chunk: &AudioChunk,
        language: TargetLanguage,
        layout: &RunLayout,
    ) -> Result<Option<PathBuf>> {
        info!("Processing chunk {:03}: {}", chunk.index, chunk.path.display());

        let transcription = self.transcriber.transcribe(&chunk.path).await?;
        if transcription.is_blank() {
            warn!("No speech recognized in chunk {:03}, skipping", chunk.index);
            return Ok(None);
        }
        let text = transcription.text();

        let translated = self.translator.translate(&text, language).await?;
        if translated.trim().is_empty() {
            return Err(RedubError::Translation(format!(
                "Chunk {:03} translated to empty text", chunk.index
            )));
        }

        let speech_path = layout.translated_chunk_path(chunk.index);
        self.synthesizer.synthesize(&translated, language, &speech_path).await?;

        if !self.config.pipeline.align_chunk_durations {
            return Ok(Some(speech_path));
        }

        let target = self.media.duration(&chunk.path).await?;
        let aligned_path = layout.aligned_chunk_path(chunk.index);
        self.media.time_stretch(&speech_path, target, &aligned_path).await?;
        Ok(Some(aligned_path))
    }

    /// Dub every video below a directory, one after another
    pub async fn process_directory<P: AsRef<Path>>(
        &self,
        input_dir: P,
        language: &str,
    ) -> Result<Vec<PathBuf>> {
        let input_dir = input_dir.as_ref();
        info!("Processing directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(RedubError::Config("Input path is not a directory".to_string()));
        }
        TargetLanguage::from_code(language)?;

        let video_files = find_videos(input_dir);
        info!("Found {} video files to process", video_files.len());

        let mut produced = Vec::new();
        for video_path in video_files {
            let workspace = batch_workspace(&self.config.workspace.dir, input_dir, &video_path);
            match self.try_process_video_in(&video_path, language, &workspace).await {
                Ok(report) => {
                    info!("Successfully processed: {}", video_path.display());
                    produced.push(report.final_video);
                }
                Err(e) => warn!("Failed to process {}: {}", video_path.display(), e),
            }
        }

        Ok(produced)
    }
}

/// Delete outputs an earlier run left in `layout`, so a failed stage cannot
/// pass off old files as this run's results
async fn remove_previous_outputs(layout: &RunLayout, language: TargetLanguage) -> Result<()> {
    let stale = [
        layout.audio_path(),
        layout.merged_audio_path(language),
        layout.final_video_path(language),
    ];
    for path in stale {
        match fs::remove_file(&path).await {
            Ok(()) => debug!("Removed previous output {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Per-video workspace for batch runs: `<workspace>/<relative dir>/<name>_<ext>`
fn batch_workspace(workspace: &Path, input_dir: &Path, video_path: &Path) -> PathBuf {
    let relative = video_path
        .strip_prefix(input_dir)
        .unwrap_or(video_path);
    let name = relative
        .file_name()
        .map(|name| name.to_string_lossy().replace('.', "_"))
        .unwrap_or_else(|| "video".to_string());

    match relative.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => workspace.join(parent).join(name),
        _ => workspace.join(name),
    }
}

/// Video files below `dir` in sorted order, skipping the workspace's own outputs
fn find_videos(dir: &Path) -> Vec<PathBuf> {
    let mut videos: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .filter(|path| {
            !path.file_name()
                .map(|name| name.to_string_lossy().starts_with("final_translated_"))
                .unwrap_or(false)
        })
        .collect();

    videos.sort();
    videos
}

fn chunk_progress(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        progress.set_style(style.progress_chars("#>-"));
    }
    progress
}
