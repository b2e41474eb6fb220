use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, RedubError};
use super::TranscriberTrait;
use super::common::{Transcription, TranscriptSegment, TranscriptionMapper, audio_stem, read_tool_json};

/// whisper.cpp `-oj` output format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppOutput {
    #[serde(default)]
    pub result: Option<WhisperCppResult>,
    #[serde(default)]
    pub transcription: Vec<WhisperCppSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppResult {
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperCppSegment {
    pub text: String,
}

/// Mapper for Whisper.cpp format
pub struct WhisperCppMapper;

impl TranscriptionMapper<WhisperCppOutput> for WhisperCppMapper {
    fn to_transcription(whisper_output: WhisperCppOutput) -> Transcription {
        Transcription {
            language: whisper_output.result.and_then(|result| result.language),
            segments: whisper_output
                .transcription
                .into_iter()
                .map(|seg| TranscriptSegment { text: seg.text.trim().to_string() })
                .collect(),
        }
    }
}

/// Runs the whisper.cpp command-line tool against a model file resolved once at load
pub struct WhisperCppTranscriber {
    config: TranscriberConfig,
    model_path: PathBuf,
}

impl WhisperCppTranscriber {
    /// Resolve and verify the model; the instance is reused for every chunk
    pub fn load(config: TranscriberConfig) -> Result<Self> {
        let model_path = PathBuf::from(&config.model);
        if !model_path.is_file() {
            return Err(RedubError::Config(format!(
                "Whisper model not found: {} (run `redub models --download`)",
                model_path.display()
            )));
        }

        info!("Loaded whisper.cpp model {}", model_path.display());
        Ok(Self { config, model_path })
    }
}

#[async_trait]
impl TranscriberTrait for WhisperCppTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcription> {
        info!("Transcribing {} with whisper.cpp", audio_path.display());

        let temp_dir = tempfile::tempdir()
            .map_err(|e| RedubError::Transcriber(format!("Failed to create temp directory: {}", e)))?;
        let stem = audio_stem(audio_path)?;
        let output_base = temp_dir.path().join(&stem);

        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg("-m").arg(&self.model_path)
            .arg("-f").arg(audio_path)
            .arg("-l").arg(&self.config.language)
            .arg("-t").arg(self.config.threads.to_string())
            .arg("-np")
            .arg("-oj")
            .arg("-of").arg(&output_base);

        debug!("Executing whisper.cpp command: {:?}", cmd);

        let output = cmd.output().await
            .map_err(|e| RedubError::Transcriber(format!("Failed to execute whisper.cpp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RedubError::Transcriber(format!("whisper.cpp failed: {}", stderr.trim())));
        }

        let json_file = temp_dir.path().join(format!("{}.json", stem));
        let whisper_output: WhisperCppOutput = read_tool_json(&json_file)?;

        Ok(WhisperCppMapper::to_transcription(whisper_output))
    }

    fn model_name(&self) -> String {
        self.model_path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;

    const SAMPLE: &str = r#"{
        "systeminfo": "AVX = 1",
        "model": {"type": "base"},
        "result": {"language": "en"},
        "transcription": [
            {"timestamps": {"from": "00:00:00,000", "to": "00:00:02,000"},
             "offsets": {"from": 0, "to": 2000}, "text": " Hello and welcome."},
            {"timestamps": {"from": "00:00:02,000", "to": "00:00:04,500"},
             "offsets": {"from": 2000, "to": 4500}, "text": " Today we cook pasta."}
        ]
    }"#;

    #[test]
    fn test_maps_whisper_cpp_json() {
        let output: WhisperCppOutput = serde_json::from_str(SAMPLE).unwrap();
        let transcription = WhisperCppMapper::to_transcription(output);

        assert_eq!(transcription.language.as_deref(), Some("en"));
        assert_eq!(transcription.text(), "Hello and welcome. Today we cook pasta.");
    }

    #[test]
    fn test_silent_chunk_maps_to_blank_transcription() {
        let output: WhisperCppOutput =
            serde_json::from_str(r#"{"result": {"language": "en"}, "transcription": []}"#).unwrap();
        assert!(WhisperCppMapper::to_transcription(output).is_blank());
    }

    #[test]
    fn test_load_requires_model_file() {
        let temp = TempDir::new().unwrap();
        let mut config = crate::config::Config::default().transcriber;
        config.model = temp.child("ggml-base.bin").path().display().to_string();

        assert!(matches!(WhisperCppTranscriber::load(config.clone()), Err(RedubError::Config(_))));

        temp.child("ggml-base.bin").write_binary(b"model").unwrap();
        let transcriber = WhisperCppTranscriber::load(config).unwrap();
        assert!(transcriber.model_name().ends_with("ggml-base.bin"));
    }
}
