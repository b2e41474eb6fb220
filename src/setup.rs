use std::path::{Path, PathBuf};
use std::fs;
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use reqwest::Client;
use tracing::{info, warn};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Result, RedubError};
use crate::config::{Config, TranscriberImplementation};

const MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

const WHISPER_MODELS: [(&str, f64); 11] = [
    ("tiny", 39.0),
    ("tiny.en", 39.0),
    ("base", 142.0),
    ("base.en", 142.0),
    ("small", 244.0),
    ("small.en", 244.0),
    ("medium", 769.0),
    ("medium.en", 769.0),
    ("large-v1", 1550.0),
    ("large-v2", 1550.0),
    ("large-v3", 1550.0),
];

pub struct SetupManager {
    client: Client,
    redub_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub filename: String,
    pub url: String,
    pub size_mb: f64,
}

impl SetupManager {
    pub fn new() -> Result<Self> {
        Self::with_dir(".redub")
    }

    /// Use `redub_dir` instead of `./.redub` for models
    pub fn with_dir<P: AsRef<Path>>(redub_dir: P) -> Result<Self> {
        let redub_dir = redub_dir.as_ref().to_path_buf();
        fs::create_dir_all(redub_dir.join("models"))?;

        let client = Client::builder()
            .user_agent("redub/0.1.0")
            .build()?;

        Ok(Self { client, redub_dir })
    }

    /// Point the transcriber at a local model file, downloading it if needed
    pub async fn initialize(&self, config: &mut Config) -> Result<()> {
        if config.transcriber.implementation != TranscriberImplementation::WhisperCpp {
            return Ok(());
        }

        let requested = config.transcriber.model.clone();
        if self.model_exists(&requested) {
            config.transcriber.model = self.resolve_model_path(&requested);
            return Ok(());
        }

        info!("Whisper model not found: {}", requested);
        let model = self.select_appropriate_model(&requested)?;
        let local_path = self.download_model(&model).await?;
        config.transcriber.model = local_path.to_string_lossy().to_string();
        Ok(())
    }

    pub fn get_available_models(&self) -> Vec<ModelInfo> {
        WHISPER_MODELS
            .iter()
            .map(|(name, size_mb)| {
                let filename = format!("ggml-{}.bin", name);
                ModelInfo {
                    name: name.to_string(),
                    url: format!("{}/{}", MODEL_BASE_URL, filename),
                    filename,
                    size_mb: *size_mb,
                }
            })
            .collect()
    }

    fn select_appropriate_model(&self, preferred: &str) -> Result<ModelInfo> {
        let models = self.get_available_models();
        if let Some(model) = models.iter().find(|m| m.name == preferred) {
            return Ok(model.clone());
        }

        if let Some(model) = models.into_iter().find(|m| m.name == "base") {
            warn!("Preferred model '{}' not found, using 'base' instead", preferred);
            return Ok(model);
        }

        Err(RedubError::Config("No suitable whisper model found".to_string()))
    }

    fn model_exists(&self, model: &str) -> bool {
        Path::new(&self.resolve_model_path(model)).is_file()
    }

    pub async fn download_model(&self, model: &ModelInfo) -> Result<PathBuf> {
        let local_path = self.models_dir().join(&model.filename);

        if local_path.exists() {
            info!("Model {} already exists at {}", model.name, local_path.display());
            return Ok(local_path);
        }

        info!("Downloading {} model ({:.1} MB)...", model.name, model.size_mb);

        let pb = ProgressBar::new((model.size_mb * 1_000_000.0) as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let mut response = self.client.get(&model.url).send().await?;

        if !response.status().is_success() {
            return Err(RedubError::Config(format!(
                "Failed to download model {}: HTTP {}",
                model.name, response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            pb.set_length(content_length);
        }

        // Stream into a temp file; only a complete download gets the final name
        let temp_path = local_path.with_extension("tmp");
        let mut file = async_fs::File::create(&temp_path).await?;
        while let Some(bytes) = response.chunk().await? {
            file.write_all(&bytes).await?;
            pb.inc(bytes.len() as u64);
        }
        file.flush().await?;
        drop(file);

        async_fs::rename(&temp_path, &local_path).await?;

        pb.finish_with_message(format!("Downloaded {}", model.name));
        info!("Successfully downloaded {} to {}", model.name, local_path.display());

        Ok(local_path)
    }

    pub fn redub_dir(&self) -> &Path {
        &self.redub_dir
    }

    pub fn models_dir(&self) -> PathBuf {
        self.redub_dir.join("models")
    }

    /// Map a model name like `base` to its file under the models directory
    pub fn resolve_model_path(&self, model: &str) -> String {
        if model.contains('/') || model.ends_with(".bin") {
            return model.to_string();
        }

        self.models_dir()
            .join(format!("ggml-{}.bin", model))
            .to_string_lossy()
            .to_string()
    }
}
