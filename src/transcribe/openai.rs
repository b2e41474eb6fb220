// OpenAI Whisper Python implementation
// This provides support for OpenAI's Whisper Python command-line tool

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, RedubError};
use super::TranscriberTrait;
use super::common::{Transcription, TranscriptSegment, TranscriptionMapper, audio_stem, read_tool_json};

/// OpenAI Whisper specific JSON output format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIWhisperOutput {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub segments: Vec<OpenAIWhisperSegment>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIWhisperSegment {
    pub id: u64,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Mapper for OpenAI Whisper format
pub struct OpenAIWhisperMapper;

impl TranscriptionMapper<OpenAIWhisperOutput> for OpenAIWhisperMapper {
    fn to_transcription(whisper_output: OpenAIWhisperOutput) -> Transcription {
        Transcription {
            language: whisper_output.language,
            segments: whisper_output
                .segments
                .into_iter()
                .map(|seg| TranscriptSegment { text: seg.text.trim().to_string() })
                .collect(),
        }
    }
}

/// OpenAI Whisper implementation.
///
/// The Python tool loads its model on every invocation; prefer whisper.cpp
/// for long videos.
pub struct OpenAITranscriber {
    config: TranscriberConfig,
}

impl OpenAITranscriber {
    pub fn load(config: TranscriberConfig) -> Result<Self> {
        if config.model.trim().is_empty() {
            return Err(RedubError::Config("Whisper model name is empty".to_string()));
        }
        info!("Using OpenAI Whisper model {}", config.model);
        Ok(Self { config })
    }
}

#[async_trait]
impl TranscriberTrait for OpenAITranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcription> {
        info!("Transcribing {} with OpenAI Whisper", audio_path.display());

        let temp_dir = tempfile::tempdir()
            .map_err(|e| RedubError::Transcriber(format!("Failed to create temp directory: {}", e)))?;
        let output_dir = temp_dir.path();

        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg(audio_path)
            .arg("--model").arg(&self.config.model)
            .arg("--language").arg(&self.config.language)
            .arg("--threads").arg(self.config.threads.to_string())
            .arg("--output_dir").arg(output_dir)
            .arg("--output_format").arg("json")
            .arg("--verbose").arg("False");

        debug!("Executing whisper command: {:?}", cmd);

        let output = cmd.output().await
            .map_err(|e| RedubError::Transcriber(format!("Failed to execute whisper: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RedubError::Transcriber(format!("Whisper failed: {}", stderr.trim())));
        }

        let json_file = output_dir.join(format!("{}.json", audio_stem(audio_path)?));
        let whisper_output: OpenAIWhisperOutput = read_tool_json(&json_file)?;

        Ok(OpenAIWhisperMapper::to_transcription(whisper_output))
    }

    fn model_name(&self) -> String {
        self.config.model.clone()
    }
}
