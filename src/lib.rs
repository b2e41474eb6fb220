//! Redub - Automated Video Dubbing Workflow
//!
//! Replaces the speech of a video with a synthesized translation by
//! chaining ffmpeg, whisper, Marian translation models and Google TTS.

pub mod cli;
pub mod config;
pub mod error;
pub mod language;
pub mod layout;
pub mod text;
pub mod media;
pub mod transcribe;
pub mod translate;
pub mod synthesize;
pub mod workflow;
pub mod setup;
