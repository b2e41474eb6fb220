// Modular translation architecture
//
// This module provides different translation implementations through a factory pattern:
// - Marian: Helsinki-NLP sequence-to-sequence models, one per target language
// - Ollama: prompted translation through a local LLM

pub mod marian;
pub mod ollama;

use async_trait::async_trait;

use crate::config::{TranslateConfig, TranslationBackend};
use crate::error::Result;
use crate::language::TargetLanguage;

/// Main trait for translation operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate English text into the target language.
    ///
    /// Blank input yields an empty string; non-blank input never does.
    async fn translate(&self, text: &str, language: TargetLanguage) -> Result<String>;

    /// Verify the backing service can be reached
    async fn check_availability(&self) -> Result<()>;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create a translator for the configured backend
    pub fn create_translator(config: TranslateConfig) -> Result<Box<dyn Translator>> {
        match config.backend {
            TranslationBackend::Marian => Ok(Box::new(marian::MarianTranslator::new(config)?)),
            TranslationBackend::Ollama => Ok(Box::new(ollama::OllamaTranslator::new(config)?)),
        }
    }
}
