use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TranslateConfig;
use crate::error::{Result, RedubError};
use crate::language::TargetLanguage;
use crate::text::split_into_batches;
use super::Translator;

#[derive(Debug, Clone, Serialize)]
struct MarianRequest<'a> {
    inputs: &'a [String],
    options: MarianOptions,
}

#[derive(Debug, Clone, Serialize)]
struct MarianOptions {
    wait_for_model: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarianOutput {
    pub translation_text: String,
}

/// Handle for one target language's model.
///
/// The inference service loads the weights; the handle only records which
/// model to ask for and where.
#[derive(Debug)]
pub struct MarianModel {
    pub language: TargetLanguage,
    pub model_id: &'static str,
    pub url: String,
}

impl MarianModel {
    fn load(endpoint: &str, language: TargetLanguage) -> Self {
        let model_id = language.marian_model();
        debug!("Resolved translation model {}", model_id);
        Self {
            language,
            model_id,
            url: format!("{}/models/{}", endpoint.trim_end_matches('/'), model_id),
        }
    }
}

/// Per-language model handles with least-recently-used eviction.
///
/// Lives as long as the translator that owns it.
#[derive(Debug)]
pub struct ModelCache {
    capacity: usize,
    entries: VecDeque<Arc<MarianModel>>,
}

impl ModelCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    /// Return the cached model for `language`, loading it on a miss
    pub fn get_or_load<F>(&mut self, language: TargetLanguage, load: F) -> Arc<MarianModel>
    where
        F: FnOnce() -> MarianModel,
    {
        if let Some(position) = self.entries.iter().position(|m| m.language == language) {
            if let Some(model) = self.entries.remove(position) {
                self.entries.push_back(Arc::clone(&model));
                return model;
            }
        }

        if self.entries.len() >= self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                debug!("Evicting translation model {}", evicted.model_id);
            }
        }

        let model = Arc::new(load());
        self.entries.push_back(Arc::clone(&model));
        model
    }

    pub fn contains(&self, language: TargetLanguage) -> bool {
        self.entries.iter().any(|m| m.language == language)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Translator backed by Marian models on a Hugging Face style inference API
pub struct MarianTranslator {
    client: Client,
    config: TranslateConfig,
    api_token: Option<String>,
    models: Mutex<ModelCache>,
}

impl MarianTranslator {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let api_token = config
            .api_token
            .clone()
            .or_else(|| std::env::var("HF_TOKEN").ok())
            .filter(|token| !token.trim().is_empty());
        let models = Mutex::new(ModelCache::new(config.model_cache_capacity));

        Ok(Self {
            client,
            config,
            api_token,
            models,
        })
    }

    fn model(&self, language: TargetLanguage) -> Result<Arc<MarianModel>> {
        let mut models = self
            .models
            .lock()
            .map_err(|_| RedubError::Translation("Translation model cache is poisoned".to_string()))?;
        let endpoint = &self.config.endpoint;
        Ok(models.get_or_load(language, || MarianModel::load(endpoint, language)))
    }

    /// Number of model handles currently cached
    pub fn cached_models(&self) -> usize {
        self.models.lock().map(|models| models.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Translator for MarianTranslator {
    async fn translate(&self, text: &str, language: TargetLanguage) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let model = self.model(language)?;
        let batches = split_into_batches(text, self.config.max_batch_chars);
        info!(
            "Translating {} chars to {} in {} batches",
            text.chars().count(), language.name(), batches.len()
        );

        let request = MarianRequest {
            inputs: &batches,
            options: MarianOptions { wait_for_model: true },
        };

        debug!("Sending translation request to: {}", model.url);

        let mut builder = self.client.post(&model.url).json(&request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RedubError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RedubError::Translation(format!(
                "{} returned {}: {}", model.model_id, status, error_text
            )));
        }

        let outputs: Vec<MarianOutput> = response
            .json()
            .await
            .map_err(|e| RedubError::Translation(format!("Failed to parse response: {}", e)))?;

        join_outputs(outputs, batches.len())
    }

    async fn check_availability(&self) -> Result<()> {
        if self.config.endpoint.trim().is_empty() {
            return Err(RedubError::Config("Translation endpoint is empty".to_string()));
        }
        Ok(())
    }
}

/// Reassemble per-batch model outputs in order
fn join_outputs(outputs: Vec<MarianOutput>, expected: usize) -> Result<String> {
    if outputs.len() != expected {
        return Err(RedubError::Translation(format!(
            "Expected {} translations, received {}", expected, outputs.len()
        )));
    }

    let joined = outputs
        .iter()
        .map(|output| output.translation_text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if joined.is_empty() {
        return Err(RedubError::Translation("Empty translation received".to_string()));
    }
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tokio_test::assert_err;

    fn output(text: &str) -> MarianOutput {
        MarianOutput { translation_text: text.to_string() }
    }

    fn unreachable_config() -> TranslateConfig {
        let mut config = Config::default().translate;
        config.endpoint = "http://127.0.0.1:9".to_string();
        config.api_token = Some("test-token".to_string());
        config.timeout_secs = 2;
        config
    }

    #[test]
    fn test_cache_loads_each_language_once() {
        let mut cache = ModelCache::new(5);
        let mut loads = 0;

        for _ in 0..3 {
            cache.get_or_load(TargetLanguage::French, || {
                loads += 1;
                MarianModel::load("http://localhost", TargetLanguage::French)
            });
        }

        assert_eq!(loads, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_evicts_least_recently_used() {
        let mut cache = ModelCache::new(2);
        let load = |language| move || MarianModel::load("http://localhost", language);

        cache.get_or_load(TargetLanguage::French, load(TargetLanguage::French));
        cache.get_or_load(TargetLanguage::German, load(TargetLanguage::German));
        cache.get_or_load(TargetLanguage::French, load(TargetLanguage::French));
        cache.get_or_load(TargetLanguage::Hindi, load(TargetLanguage::Hindi));

        assert!(cache.contains(TargetLanguage::French));
        assert!(cache.contains(TargetLanguage::Hindi));
        assert!(!cache.contains(TargetLanguage::German));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_model_url() {
        let model = MarianModel::load("https://api-inference.huggingface.co/", TargetLanguage::Spanish);
        assert_eq!(
            model.url,
            "https://api-inference.huggingface.co/models/Helsinki-NLP/opus-mt-en-es"
        );
    }

    #[test]
    fn test_join_outputs_keeps_batch_order() {
        let joined = join_outputs(vec![output(" Bonjour. "), output("Au revoir.")], 2).unwrap();
        assert_eq!(joined, "Bonjour. Au revoir.");
    }

    #[test]
    fn test_join_outputs_rejects_empty_or_mismatched() {
        assert_err!(join_outputs(vec![output("  ")], 1));
        assert_err!(join_outputs(vec![output("Bonjour")], 2));
    }

    #[tokio::test]
    async fn test_blank_text_needs_no_request() {
        let translator = MarianTranslator::new(unreachable_config()).unwrap();
        let translated = translator.translate("   ", TargetLanguage::French).await.unwrap();

        assert_eq!(translated, "");
        assert_eq!(translator.cached_models(), 0);
    }

    #[tokio::test]
    async fn test_model_is_resolved_once_per_language() {
        let translator = MarianTranslator::new(unreachable_config()).unwrap();

        for _ in 0..2 {
            let result = translator.translate("Hello.", TargetLanguage::French).await;
            assert!(matches!(result, Err(RedubError::Translation(_))));
        }
        assert_eq!(translator.cached_models(), 1);

        let _ = translator.translate("Hello.", TargetLanguage::German).await;
        assert_eq!(translator.cached_models(), 2);
    }
}
