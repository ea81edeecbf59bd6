//! snapclass CLI
//!
//! Loads a configured classifier and classifies image files from disk.

use anyhow::{Context, Result};
use clap::Parser;
use snapclass_classifier::preprocess::{open_image, resize_to_input};
use snapclass_classifier::{
    Backend, CandleDelegateFactory, CandleEngineFactory, ClassifierAdapter, ClassifierConfig,
    DirAssetSource, LabelTable,
};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Classify {
            config,
            model,
            image,
            label,
            resize,
            json,
        } => {
            let config = load_config(&config)?;
            let mut adapter = load_adapter(&config, &model)?;

            let picture = open_image(&image)
                .with_context(|| format!("Failed to open image {}", image.display()))?;
            let picture = if resize {
                resize_to_input(&picture, adapter.input_size())
            } else {
                picture.to_rgb8()
            };

            let prediction = adapter.predict(&picture)?;
            info!(
                "Classified {} as '{}' (index {}, score {:.4}) in {}us",
                image.display(),
                prediction.label,
                prediction.index,
                prediction.score,
                prediction.latency_us
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&prediction)?);
            } else if label {
                println!("{}", prediction.label);
            } else {
                println!("{}", prediction.class_id()?);
            }

            adapter.close();
        }

        Commands::Labels { config, model } => {
            let config = load_config(&config)?;
            let spec = config.model(&model)?;
            let assets = DirAssetSource::new(&config.assets_dir);
            let labels = LabelTable::load(&assets, &spec.labels)?;

            for (index, label) in labels.iter().enumerate() {
                println!("{}\t{}", index, label);
            }
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<ClassifierConfig> {
    ClassifierConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration {}", path.display()))
}

fn load_adapter(config: &ClassifierConfig, name: &str) -> Result<ClassifierAdapter> {
    let options = config.adapter_options(name)?;
    let assets = DirAssetSource::new(&config.assets_dir);
    let engines = CandleEngineFactory;
    let accelerator = CandleDelegateFactory::for_device(config.device(name)?);

    let mut backend = Backend::new(&engines);
    if let Some(factory) = accelerator.as_ref() {
        backend = backend.with_accelerator(factory);
    }

    let adapter = ClassifierAdapter::load(&assets, &backend, options)
        .with_context(|| format!("Failed to load classifier '{}'", name))?;
    Ok(adapter)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "snapclass=debug,snapclass_classifier=debug"
    } else {
        "snapclass=info,snapclass_classifier=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
