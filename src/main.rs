//! Redub - Automated Video Dubbing Workflow
//!
//! Entry point for the `redub` binary: sets up logging, loads the
//! configuration and dispatches the requested command.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use redub::cli::{Args, Commands};
use redub::config::Config;
use redub::language::TargetLanguage;
use redub::media::MediaProcessorFactory;
use redub::setup::SetupManager;
use redub::synthesize::SynthesizerFactory;
use redub::transcribe::TranscriberFactory;
use redub::translate::TranslatorFactory;
use redub::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;
    info!("Starting Redub - Automated Video Dubbing Workflow");

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Process { input, language, workdir } => {
            if let Some(dir) = workdir {
                config.workspace.dir = dir;
            }
            prepare_models(&mut config).await?;

            let workflow = Workflow::new(config)?;
            info!("Using {}", workflow.media().get_version_info().await?);
            info!("Transcribing with {}", workflow.transcriber().model_name());
            match workflow.process_video(&input, &language).await {
                Some(output) => println!("{}", output.display()),
                None => anyhow::bail!("Dubbing failed for {}", input.display()),
            }
        }
        Commands::Batch { input_dir, language, workdir } => {
            if let Some(dir) = workdir {
                config.workspace.dir = dir;
            }
            prepare_models(&mut config).await?;

            let workflow = Workflow::new(config)?;
            let produced = workflow.process_directory(&input_dir, &language).await?;
            for output in &produced {
                println!("{}", output.display());
            }
            info!("Dubbed {} videos", produced.len());
        }
        Commands::Extract { input, output } => {
            info!("Extracting audio from: {}", input.display());
            let media = MediaProcessorFactory::create_processor(config.media);
            media.check_availability()?;
            media.extract_audio(&input, &output).await?;
        }
        Commands::Split { input, chunk_dir, seconds } => {
            let seconds = seconds.unwrap_or(config.media.chunk_seconds);
            let media = MediaProcessorFactory::create_processor(config.media);
            media.check_availability()?;
            for chunk in media.split_audio(&input, &chunk_dir, seconds).await? {
                println!("{:03} {}", chunk.index, chunk.path.display());
            }
        }
        Commands::SplitVideo { input, chunk_dir, seconds } => {
            let media = MediaProcessorFactory::create_processor(config.media);
            media.check_availability()?;
            for segment in media.split_video(&input, &chunk_dir, seconds).await? {
                println!("{}", segment.display());
            }
        }
        Commands::Merge { output, inputs } => {
            let media = MediaProcessorFactory::create_processor(config.media);
            media.check_availability()?;
            media.merge_audio(&inputs, &output).await?;
            println!("{}", output.display());
        }
        Commands::Remux { video, audio, output } => {
            let media = MediaProcessorFactory::create_processor(config.media);
            media.check_availability()?;
            media.remux(&video, &audio, &output).await?;
            println!("{}", output.display());
        }
        Commands::Duration { input } => {
            let media = MediaProcessorFactory::create_processor(config.media);
            let seconds = media.duration(&input).await?;
            println!("{:.3}", seconds);
        }
        Commands::Stretch { input, target, output } => {
            let media = MediaProcessorFactory::create_processor(config.media);
            media.check_availability()?;
            let ratio = media.time_stretch(&input, target, &output).await?;
            println!("ratio {:.4} -> {}", ratio, output.display());
        }
        Commands::Transcribe { input } => {
            prepare_models(&mut config).await?;
            let transcriber = TranscriberFactory::load(config.transcriber)?;
            info!("Transcribing {} with {}", input.display(), transcriber.model_name());
            let transcription = transcriber.transcribe(&input).await?;
            println!("{}", transcription.text());
        }
        Commands::Translate { text, language } => {
            let language = TargetLanguage::from_code(&language)?;
            let translator = TranslatorFactory::create_translator(config.translate)?;
            translator.check_availability().await?;
            println!("{}", translator.translate(&text, language).await?);
        }
        Commands::Synthesize { text, language, output } => {
            let language = TargetLanguage::from_code(&language)?;
            let synthesizer = SynthesizerFactory::create_synthesizer(config.synthesis)?;
            synthesizer.synthesize(&text, language, &output).await?;
            println!("{}", output.display());
        }
        Commands::Languages => {
            println!("{:<6} {:<10} {:<30}", "Code", "Language", "Translation model");
            println!("{}", "-".repeat(48));
            for language in TargetLanguage::ALL {
                println!("{:<6} {:<10} {:<30}", language.code(), language.name(), language.marian_model());
            }
        }
        Commands::Models { download } => {
            let setup_manager = SetupManager::new()?;
            let models = setup_manager.get_available_models();
            let models_dir = setup_manager.models_dir();

            println!("\nAvailable Whisper Models:");
            println!("{:<15} {:<20} {:<10} {:<10}", "Name", "Filename", "Size (MB)", "Status");
            println!("{}", "-".repeat(65));

            for model in &models {
                let status = if models_dir.join(&model.filename).exists() {
                    "Downloaded"
                } else {
                    "Missing"
                };
                println!("{:<15} {:<20} {:<10.0} {:<10}", model.name, model.filename, model.size_mb, status);
            }

            if download {
                info!("Downloading all missing models...");
                for model in &models {
                    if !models_dir.join(&model.filename).exists() {
                        setup_manager.download_model(model).await?;
                    }
                }
                info!("All models downloaded successfully");
            }
        }
        Commands::InitConfig { output } => {
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
    }

    Ok(())
}

/// Resolve the whisper model to a local file, downloading it if missing
async fn prepare_models(config: &mut Config) -> Result<()> {
    let setup_manager = SetupManager::new()?;
    setup_manager.initialize(config).await?;
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".redub").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "redub.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // The writer must outlive every log call
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("redub.log").display());

    Ok(())
}
