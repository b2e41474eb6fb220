use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::language::TargetLanguage;

pub const CHUNK_PREFIX: &str = "chunk_";
pub const CHUNK_EXTENSION: &str = "wav";

/// File naming for one pipeline run.
///
/// The shared layout writes every run into the same directory, so two runs
/// started at the same time overwrite each other's `audio.wav` and
/// `chunks/`. The isolated layout places each run under `runs/<uuid>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    root: PathBuf,
}

impl RunLayout {
    pub fn shared<P: AsRef<Path>>(workspace: P) -> Self {
        Self {
            root: workspace.as_ref().to_path_buf(),
        }
    }

    pub fn isolated<P: AsRef<Path>>(workspace: P) -> Self {
        Self {
            root: workspace
                .as_ref()
                .join("runs")
                .join(Uuid::new_v4().to_string()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn audio_path(&self) -> PathBuf {
        self.root.join("audio.wav")
    }

    pub fn chunk_dir(&self) -> PathBuf {
        self.root.join("chunks")
    }

    pub fn translated_chunk_path(&self, index: usize) -> PathBuf {
        self.chunk_dir().join(format!("translated_{:03}.mp3", index))
    }

    /// Translated chunk after tempo alignment to its source duration
    pub fn aligned_chunk_path(&self, index: usize) -> PathBuf {
        self.chunk_dir().join(format!("aligned_{:03}.mp3", index))
    }

    pub fn merged_audio_path(&self, language: TargetLanguage) -> PathBuf {
        self.root.join(format!("merged_translated_{}.mp3", language.code()))
    }

    pub fn final_video_path(&self, language: TargetLanguage) -> PathBuf {
        self.root.join(format!("final_translated_{}.mp4", language.code()))
    }
}

/// ffmpeg segment muxer pattern for chunks with the given extension
pub fn chunk_pattern(chunk_dir: &Path, extension: &str) -> PathBuf {
    chunk_dir.join(format!("{}%03d.{}", CHUNK_PREFIX, extension))
}

/// Sequence index embedded in a chunk file name, e.g. `chunk_007.wav` -> 7
pub fn chunk_index(path: &Path, extension: &str) -> Option<usize> {
    if path.extension()?.to_str()? != extension {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix(CHUNK_PREFIX)?
        .parse()
        .ok()
}
