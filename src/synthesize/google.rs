use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::SynthesisConfig;
use crate::error::{Result, RedubError};
use crate::language::TargetLanguage;
use crate::text::split_into_batches;
use super::SpeechSynthesizer;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) redub/0.1.0";

/// Google Translate text-to-speech.
///
/// The endpoint only accepts short inputs, so text is split into parts and
/// the returned MP3 frames are appended in order.
pub struct GoogleTtsSynthesizer {
    client: Client,
    config: SynthesisConfig,
}

impl GoogleTtsSynthesizer {
    pub fn new(config: SynthesisConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    async fn fetch_part(
        &self,
        part: &str,
        language: TargetLanguage,
        index: usize,
        total: usize,
    ) -> Result<Vec<u8>> {
        let query = part_query(part, language, index, total);
        debug!("Requesting speech part {}/{} ({} chars)", index + 1, total, part.chars().count());

        let response = self.client
            .get(&self.config.endpoint)
            .query(&query)
            .send()
            .await
            .map_err(|e| RedubError::Synthesis(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(RedubError::Synthesis(format!(
                "Speech service returned {} for part {}/{}", status, index + 1, total
            )));
        }

        let bytes = response.bytes().await
            .map_err(|e| RedubError::Synthesis(format!("Failed to read audio: {}", e)))?;
        if bytes.is_empty() {
            return Err(RedubError::Synthesis(format!("Empty audio for part {}/{}", index + 1, total)));
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTtsSynthesizer {
    async fn synthesize(&self, text: &str, language: TargetLanguage, output_path: &Path) -> Result<()> {
        let parts = split_into_batches(text, self.config.max_chars);
        if parts.is_empty() {
            return Err(RedubError::Synthesis("Nothing to synthesize".to_string()));
        }
        info!("Synthesizing voice in {} ({} parts) -> {}", language.name(), parts.len(), output_path.display());

        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Nothing is written until every part has been fetched
        let mut audio = Vec::new();
        for (index, part) in parts.iter().enumerate() {
            audio.extend(self.fetch_part(part, language, index, parts.len()).await?);
        }

        let mut file = tokio::fs::File::create(output_path).await?;
        file.write_all(&audio).await?;
        file.flush().await?;

        info!("Speech synthesis completed");
        Ok(())
    }
}

fn part_query(part: &str, language: TargetLanguage, index: usize, total: usize) -> Vec<(&'static str, String)> {
    vec![
        ("ie", "UTF-8".to_string()),
        ("q", part.to_string()),
        ("tl", language.code().to_string()),
        ("client", "tw-ob".to_string()),
        ("ttsspeed", "1".to_string()),
        ("total", total.to_string()),
        ("idx", index.to_string()),
        ("textlen", part.chars().count().to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use assert_fs::TempDir;

    #[test]
    fn test_part_query() {
        let query = part_query("Bonjour à tous.", TargetLanguage::French, 1, 3);
        let get = |key: &str| {
            query.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
        };

        assert_eq!(get("q"), Some("Bonjour à tous."));
        assert_eq!(get("tl"), Some("fr"));
        assert_eq!(get("client"), Some("tw-ob"));
        assert_eq!(get("idx"), Some("1"));
        assert_eq!(get("total"), Some("3"));
        assert_eq!(get("textlen"), Some("15"));
    }

    #[tokio::test]
    async fn test_blank_text_is_rejected() {
        let temp = TempDir::new().unwrap();
        let synthesizer = GoogleTtsSynthesizer::new(Config::default().synthesis).unwrap();
        let output = temp.path().join("translated_000.mp3");

        let result = synthesizer.synthesize("  ", TargetLanguage::French, &output).await;
        assert!(matches!(result, Err(RedubError::Synthesis(_))));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_failed_request_writes_no_file() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default().synthesis;
        config.endpoint = "http://127.0.0.1:9/translate_tts".to_string();
        config.timeout_secs = 2;
        let synthesizer = GoogleTtsSynthesizer::new(config).unwrap();
        let output = temp.path().join("translated_000.mp3");

        let result = synthesizer.synthesize("Bonjour.", TargetLanguage::French, &output).await;
        assert!(matches!(result, Err(RedubError::Synthesis(_))));
        assert!(!output.exists());
    }
}
