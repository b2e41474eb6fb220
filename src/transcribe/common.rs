use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, RedubError};

/// One recognized stretch of speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
}

/// Recognized speech of one audio chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    pub language: Option<String>,
    pub segments: Vec<TranscriptSegment>,
}

impl Transcription {
    /// Segment texts joined by single spaces, trimmed
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }

    pub fn is_blank(&self) -> bool {
        self.segments.iter().all(|segment| segment.text.trim().is_empty())
    }
}

/// Trait for converting service-specific transcription formats
pub trait TranscriptionMapper<T> {
    fn to_transcription(service_result: T) -> Transcription;
}

/// Read and decode a JSON file written by a transcription tool
pub fn read_tool_json<T: for<'de> Deserialize<'de>>(json_path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(json_path).map_err(|e| {
        RedubError::Transcriber(format!(
            "Failed to read output {}: {}", json_path.display(), e
        ))
    })?;

    serde_json::from_str(&content)
        .map_err(|e| RedubError::Transcriber(format!("Failed to parse transcription JSON: {}", e)))
}

/// File stem of an audio path, used to locate tool output
pub fn audio_stem(audio_path: &Path) -> Result<String> {
    audio_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .ok_or_else(|| RedubError::Transcriber("Invalid audio filename".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcription(texts: &[&str]) -> Transcription {
        Transcription {
            language: Some("en".to_string()),
            segments: texts
                .iter()
                .map(|text| TranscriptSegment { text: text.to_string() })
                .collect(),
        }
    }

    #[test]
    fn test_text_joins_segments_with_single_spaces() {
        let t = transcription(&["Hello there.", "How are you?"]);
        assert_eq!(t.text(), "Hello there. How are you?");
    }

    #[test]
    fn test_text_trims_outer_whitespace() {
        let t = transcription(&[" Hello", "world "]);
        assert_eq!(t.text(), "Hello world");
    }

    #[test]
    fn test_whitespace_only_transcription_is_blank() {
        assert!(transcription(&[" ", "\n"]).is_blank());
        assert!(transcription(&[]).is_blank());
        assert_eq!(transcription(&[" ", "  "]).text(), "");
        assert!(!transcription(&["", "hi"]).is_blank());
    }
}
