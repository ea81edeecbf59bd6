//! Classifier registry initialization and management

use crate::adapter::ClassifierAdapter;
use crate::assets::DirAssetSource;
use crate::config::{ClassifierConfig, DeviceSpec};
use crate::engine::{Backend, DelegateFactory, EngineFactory};
use crate::shared::SharedClassifier;
use snapclass_core::Result;
use std::collections::HashMap;
use tracing::{info, warn};

/// Named classifiers loaded from one configuration
#[derive(Debug, Default)]
pub struct ClassifierRegistry {
    classifiers: HashMap<String, SharedClassifier>,
}

impl ClassifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every configured model.
    ///
    /// `accelerator_for` maps a model's device to its delegate factory. A
    /// model that fails to load is logged and skipped.
    pub fn from_config<F>(
        config: &ClassifierConfig,
        engines: &dyn EngineFactory,
        accelerator_for: F,
    ) -> Result<Self>
    where
        F: Fn(DeviceSpec) -> Option<Box<dyn DelegateFactory>>,
    {
        let assets = DirAssetSource::new(&config.assets_dir);
        let mut registry = Self::new();

        info!("Initializing classifier registry with {} models", config.models.len());

        for name in config.model_names() {
            let options = config.adapter_options(&name)?;
            let accelerator = accelerator_for(config.device(&name)?);

            let mut backend = Backend::new(engines);
            if let Some(factory) = accelerator.as_deref() {
                backend = backend.with_accelerator(factory);
            }

            match ClassifierAdapter::load(&assets, &backend, options) {
                Ok(adapter) => {
                    info!("Loaded classifier: {}", name);
                    registry.register(adapter);
                }
                Err(e) => {
                    warn!("Failed to load classifier {}: {}", name, e);
                }
            }
        }

        info!(
            "Classifier registry initialized with {}/{} models",
            registry.count(),
            config.models.len()
        );
        Ok(registry)
    }

    /// Load every configured model with the candle engine
    #[cfg(feature = "ml-models")]
    pub fn from_config_with_candle(config: &ClassifierConfig) -> Result<Self> {
        use crate::candle_engine::{CandleDelegateFactory, CandleEngineFactory};

        Self::from_config(config, &CandleEngineFactory, |device| {
            CandleDelegateFactory::for_device(device)
                .map(|f| Box::new(f) as Box<dyn DelegateFactory>)
        })
    }

    /// Register a loaded adapter under its own name
    pub fn register(&mut self, adapter: ClassifierAdapter) {
        let name = adapter.name().to_string();
        self.classifiers.insert(name, SharedClassifier::new(adapter));
    }

    pub fn get(&self, name: &str) -> Option<SharedClassifier> {
        self.classifiers.get(name).cloned()
    }

    /// Get the number of loaded classifiers
    pub fn count(&self) -> usize {
        self.classifiers.len()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classifiers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Close every classifier
    pub fn close_all(&self) {
        for classifier in self.classifiers.values() {
            classifier.close();
        }
    }
}
