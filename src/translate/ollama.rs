use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TranslateConfig;
use crate::error::{Result, RedubError};
use crate::language::TargetLanguage;
use super::Translator;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub text: String,
}

/// Prompted translation through an Ollama server
pub struct OllamaTranslator {
    client: Client,
    config: TranslateConfig,
}

impl OllamaTranslator {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> &str {
        self.config.ollama_endpoint.trim_end_matches('/')
    }
}

#[async_trait]
impl Translator for OllamaTranslator {
    async fn translate(&self, text: &str, language: TargetLanguage) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let request = GenerateRequest {
            model: self.config.ollama_model.clone(),
            prompt: build_translation_prompt(text, language),
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.endpoint());
        debug!("Sending translation request to: {}", url);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RedubError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RedubError::Translation(format!(
                "Ollama API error {}: {}", status, error_text
            )));
        }

        let generated: GenerateResponse = response.json().await
            .map_err(|e| RedubError::Translation(format!("Failed to parse response: {}", e)))?;

        debug!("Raw Ollama response: {}", generated.response);
        parse_translation_response(&generated.response)
    }

    async fn check_availability(&self) -> Result<()> {
        let url = format!("{}/api/show", self.endpoint());
        let model = &self.config.ollama_model;

        let response = self.client
            .post(&url)
            .json(&json!({ "name": model }))
            .send()
            .await
            .map_err(|e| RedubError::Translation(format!("Failed to connect to Ollama: {}", e)))?;

        if response.status().is_success() {
            info!("Ollama model '{}' is available", model);
            Ok(())
        } else {
            Err(RedubError::Translation(format!(
                "Ollama model '{}' not found. Please pull the model first: ollama pull {}",
                model, model
            )))
        }
    }
}

/// Build translation prompt requesting a JSON answer
fn build_translation_prompt(text: &str, language: TargetLanguage) -> String {
    let language_name = language.name();
    format!(
        "You are a professional translator.\n\
         \n\
         CRITICAL: You must translate the English text to {} ONLY. Do not translate to any other language.\n\
         The target language is: {} (language code: {})\n\
         \n\
         Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
         Do not include any explanations, alternatives, or text in other languages.\n\
         \n\
         [Text to translate]\n\
         {}\n",
        language_name, language_name, language.code(), language_name, text
    )
}

/// Extract the translation from a model answer, JSON first, prose second
fn parse_translation_response(raw_response: &str) -> Result<String> {
    let raw_response = raw_response.trim();
    if raw_response.is_empty() {
        return Err(RedubError::Translation("Empty translation received".to_string()));
    }

    let translation = match serde_json::from_str::<TranslationResult>(raw_response) {
        Ok(result) => result.text.trim().to_string(),
        Err(_) => clean_translation_response(raw_response),
    };

    if translation.is_empty() {
        return Err(RedubError::Translation("Empty translation received".to_string()));
    }
    Ok(translation)
}

/// Clean up translation response to extract just the translation
fn clean_translation_response(response: &str) -> String {
    let lines: Vec<&str> = response.lines().collect();

    for &line in &lines {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with("Here are") ||
           trimmed.starts_with("Option") ||
           trimmed.starts_with("**Option") ||
           trimmed.starts_with("Translation:") ||
           trimmed.starts_with("- ") ||
           trimmed.starts_with("* ") {
            continue;
        }

        if trimmed.starts_with("**") && trimmed.ends_with("**") {
            continue;
        }

        if trimmed.len() > 3 {
            return trimmed.to_string();
        }
    }

    lines
        .iter()
        .map(|line| line.trim())
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_target_language() {
        let prompt = build_translation_prompt("Good evening.", TargetLanguage::German);
        assert!(prompt.contains("to German ONLY"));
        assert!(prompt.contains("language code: de"));
        assert!(prompt.ends_with("Good evening.\n"));
    }

    #[test]
    fn test_parses_json_answer() {
        let translation = parse_translation_response(r#"{"text": " Bonsoir. "}"#).unwrap();
        assert_eq!(translation, "Bonsoir.");
    }

    #[test]
    fn test_falls_back_to_prose_answer() {
        let raw = "Here are some options:\n**Option 1**\nBuenas noches a todos.\n- alt";
        assert_eq!(parse_translation_response(raw).unwrap(), "Buenas noches a todos.");
    }

    #[test]
    fn test_empty_answers_are_errors() {
        assert!(parse_translation_response("   ").is_err());
        assert!(parse_translation_response(r#"{"text": ""}"#).is_err());
    }

    #[tokio::test]
    async fn test_blank_text_needs_no_request() {
        let mut config = crate::config::Config::default().translate;
        config.ollama_endpoint = "http://127.0.0.1:9".to_string();
        let translator = OllamaTranslator::new(config).unwrap();

        assert_eq!(translator.translate("\n", TargetLanguage::Hindi).await.unwrap(), "");
    }
}
