// Modular transcription architecture
//
// Speech-to-text backends behind one trait:
// - WhisperCpp: whisper.cpp command-line tool
// - OpenAI: OpenAI Whisper Python command-line tool
//
// A transcriber is loaded once per process and shared by every chunk.

pub mod common;
pub mod whisper_cpp;
pub mod openai;

use async_trait::async_trait;
use std::path::Path;

pub use common::*;
use crate::config::{TranscriberConfig, TranscriberImplementation};
use crate::error::Result;

/// Main trait for transcription operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriberTrait: Send + Sync {
    /// Recognize the speech in one audio file
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcription>;

    /// Model identifier, for logging
    fn model_name(&self) -> String;
}

/// Factory for creating transcriber instances
pub struct TranscriberFactory;

impl TranscriberFactory {
    /// Load the configured backend
    pub fn load(config: TranscriberConfig) -> Result<Box<dyn TranscriberTrait>> {
        match config.implementation {
            TranscriberImplementation::WhisperCpp => {
                Ok(Box::new(whisper_cpp::WhisperCppTranscriber::load(config)?))
            }
            TranscriberImplementation::OpenAI => {
                Ok(Box::new(openai::OpenAITranscriber::load(config)?))
            }
        }
    }
}
