// Speech synthesis
//
// Text-to-speech backends write synthesized audio straight to a file.

pub mod google;

use async_trait::async_trait;
use std::path::Path;

use crate::config::SynthesisConfig;
use crate::error::Result;
use crate::language::TargetLanguage;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `text` in `language`, writing MP3 audio to `output_path`
    async fn synthesize(&self, text: &str, language: TargetLanguage, output_path: &Path) -> Result<()>;
}

pub struct SynthesizerFactory;

impl SynthesizerFactory {
    pub fn create_synthesizer(config: SynthesisConfig) -> Result<Box<dyn SpeechSynthesizer>> {
        Ok(Box::new(google::GoogleTtsSynthesizer::new(config)?))
    }
}
