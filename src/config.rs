use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, RedubError};

fn default_model_cache_capacity() -> usize {
    5
}

fn default_max_batch_chars() -> usize {
    900
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub workspace: WorkspaceConfig,
    pub media: MediaConfig,
    pub transcriber: TranscriberConfig,
    pub translate: TranslateConfig,
    pub synthesis: SynthesisConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Directory holding intermediate and final files
    pub dir: PathBuf,
    /// Give every run its own sub-directory instead of the shared layout
    pub isolate_runs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Path to ffprobe binary
    pub probe_binary_path: String,
    /// Length of each audio chunk in seconds
    pub chunk_seconds: u32,
    /// Audio codec used when remuxing onto the source video
    pub audio_codec: String,
    /// What to do when ffmpeg exits with an error
    pub failure_policy: FailurePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Abort the run on the first tool failure
    FailFast,
    /// Log the tool failure and keep going; later stages may fail on missing files
    BestEffort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriberConfig {
    /// Which speech-to-text backend to run
    pub implementation: TranscriberImplementation,
    /// Path to transcriber binary (e.g., whisper-cli)
    pub binary_path: String,
    /// Model name (e.g. "base") or path to a model file
    pub model: String,
    /// Spoken language of the source video
    pub language: String,
    /// Worker threads handed to whisper.cpp
    pub threads: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranscriberImplementation {
    /// whisper.cpp command-line tool
    WhisperCpp,
    /// OpenAI Whisper Python command-line tool
    OpenAI,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Which translation backend to call
    pub backend: TranslationBackend,
    /// Inference endpoint serving the Marian models
    pub endpoint: String,
    /// Bearer token for the inference endpoint; falls back to HF_TOKEN
    #[serde(default)]
    pub api_token: Option<String>,
    /// Number of per-language model handles kept alive
    #[serde(default = "default_model_cache_capacity")]
    pub model_cache_capacity: usize,
    /// Upper bound on characters sent to the model in one input
    #[serde(default = "default_max_batch_chars")]
    pub max_batch_chars: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Ollama endpoint URL
    pub ollama_endpoint: String,
    /// LLM model to use when the backend is Ollama
    pub ollama_model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslationBackend {
    /// Helsinki-NLP Marian models behind a Hugging Face style inference API
    Marian,
    /// Prompted translation through a local Ollama server
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Google Translate text-to-speech endpoint
    pub endpoint: String,
    /// Maximum characters per synthesis request
    pub max_chars: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Stretch each translated chunk to the duration of its source chunk
    pub align_chunk_durations: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: WorkspaceConfig {
                dir: PathBuf::from("uploads"),
                isolate_runs: false,
            },
            media: MediaConfig {
                binary_path: "ffmpeg".to_string(),
                probe_binary_path: "ffprobe".to_string(),
                chunk_seconds: 300,
                audio_codec: "aac".to_string(),
                failure_policy: FailurePolicy::FailFast,
            },
            transcriber: TranscriberConfig {
                implementation: TranscriberImplementation::WhisperCpp,
                binary_path: "whisper-cli".to_string(),
                model: "base".to_string(),
                language: "en".to_string(),
                threads: 4,
            },
            translate: TranslateConfig {
                backend: TranslationBackend::Marian,
                endpoint: "https://api-inference.huggingface.co".to_string(),
                api_token: None,
                model_cache_capacity: default_model_cache_capacity(),
                max_batch_chars: default_max_batch_chars(),
                timeout_secs: 300,
                ollama_endpoint: "http://localhost:11434".to_string(),
                ollama_model: "llama3.2:3b".to_string(),
            },
            synthesis: SynthesisConfig {
                endpoint: "https://translate.google.com/translate_tts".to_string(),
                max_chars: 100,
                timeout_secs: 60,
            },
            pipeline: PipelineConfig {
                align_chunk_durations: false,
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RedubError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| RedubError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RedubError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| RedubError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;

    #[test]
    fn test_default_config_round_trips_through_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.child("config.toml");

        Config::default().save_to_file(path.path()).unwrap();
        let loaded = Config::from_file(path.path()).unwrap();

        assert_eq!(loaded.media.chunk_seconds, 300);
        assert_eq!(loaded.media.failure_policy, FailurePolicy::FailFast);
        assert_eq!(loaded.translate.backend, TranslationBackend::Marian);
        assert_eq!(loaded.workspace.dir, PathBuf::from("uploads"));
        assert!(!loaded.pipeline.align_chunk_durations);
    }

    #[test]
    fn test_best_effort_policy_parses() {
        let mut config = Config::default();
        config.media.failure_policy = FailurePolicy::BestEffort;
        let content = toml::to_string_pretty(&config).unwrap();

        let parsed: Config = toml::from_str(&content).unwrap();
        assert_eq!(parsed.media.failure_policy, FailurePolicy::BestEffort);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let temp = TempDir::new().unwrap();
        let result = Config::from_file(temp.child("absent.toml").path());
        assert!(matches!(result, Err(RedubError::Config(_))));
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.child("config.toml");
        let mut content = toml::to_string_pretty(&Config::default()).unwrap();
        content.push_str("\n[subtitles]\nenabled = true\n");
        path.write_str(&content).unwrap();

        assert!(matches!(Config::from_file(path.path()), Err(RedubError::Config(_))));
    }
}
