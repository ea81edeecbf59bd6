//! Classifier adapter: assets in, class labels out
//!
//! A [`ClassifierAdapter`] owns a label table, a mapped model and the engine
//! (plus optional accelerator) bound to that model. All four are acquired
//! together in [`ClassifierAdapter::load`] and released together in
//! [`ClassifierAdapter::close`].

use crate::assets::AssetSource;
use crate::engine::{AccelerationPolicy, Backend, Delegate, EngineRequest, InferenceEngine};
use crate::labels::LabelTable;
use crate::model_blob::ModelBlob;
use crate::postprocess::argmax;
use crate::preprocess::image_to_tensor;
use image::{GenericImageView, Pixel};
use snapclass_core::{Error, InputTensor, Prediction, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Byte range of a model packed inside a larger asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelRegion {
    pub offset: u64,
    pub length: u64,
}

/// Options for loading a classifier
#[derive(Debug, Clone)]
pub struct AdapterOptions {
    /// Classifier name for logs and metrics
    pub name: String,

    /// Model weights asset
    pub model_path: PathBuf,

    /// Label asset
    pub label_path: PathBuf,

    /// Side length of the square input image
    pub input_size: u32,

    /// Hardware acceleration policy
    pub acceleration: AccelerationPolicy,

    /// Region of the model asset to map; the whole asset when `None`
    pub model_region: Option<ModelRegion>,
}

impl AdapterOptions {
    pub fn new(
        model_path: impl Into<PathBuf>,
        label_path: impl Into<PathBuf>,
        input_size: u32,
    ) -> Self {
        Self {
            name: "classifier".to_string(),
            model_path: model_path.into(),
            label_path: label_path.into(),
            input_size,
            acceleration: AccelerationPolicy::default(),
            model_region: None,
        }
    }

    /// Set the classifier name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the acceleration policy
    pub fn with_acceleration(mut self, acceleration: AccelerationPolicy) -> Self {
        self.acceleration = acceleration;
        self
    }

    /// Map only `region` of the model asset
    pub fn with_model_region(mut self, region: ModelRegion) -> Self {
        self.model_region = Some(region);
        self
    }
}

struct LoadedState {
    labels: LabelTable,
    engine: Box<dyn InferenceEngine>,
    delegate: Option<Box<dyn Delegate>>,
    blob: Arc<ModelBlob>,
}

impl LoadedState {
    fn release(mut self, name: &str) {
        self.engine.release();
        if let Some(mut delegate) = self.delegate.take() {
            delegate.close();
        }
        tracing::info!(
            classifier = name,
            model = %self.blob.path().display(),
            "Released classifier"
        );
    }
}

/// Synchronous image classifier over an injected inference engine.
///
/// Not internally synchronized: `predict` and `classify` take `&mut self`.
/// Wrap in [`crate::shared::SharedClassifier`] to share between tasks.
pub struct ClassifierAdapter {
    name: String,
    input_size: u32,
    state: Option<LoadedState>,
}

impl ClassifierAdapter {
    /// Load labels and model, then bind an engine to the model.
    ///
    /// Labels are read before the model is mapped. Any failure releases what
    /// was acquired so far before returning.
    pub fn load(
        assets: &dyn AssetSource,
        backend: &Backend<'_>,
        options: AdapterOptions,
    ) -> Result<Self> {
        if options.input_size == 0 {
            return Err(Error::config("input_size must be greater than zero"));
        }
        if InputTensor::byte_len_for(options.input_size as usize).is_none() {
            return Err(Error::config(format!(
                "input_size {} is too large",
                options.input_size
            )));
        }

        let labels = LabelTable::load(assets, &options.label_path)?;
        let blob = Arc::new(map_model(assets, &options)?);

        let request = EngineRequest {
            blob: Arc::clone(&blob),
            input_size: options.input_size as usize,
            num_labels: labels.len(),
        };
        let (engine, delegate) = backend.initialize(&request, options.acceleration)?;

        tracing::info!(
            classifier = %options.name,
            model = %blob.path().display(),
            labels = labels.len(),
            input_size = options.input_size,
            engine = engine.name(),
            accelerator = delegate.as_ref().map(|d| d.name()).unwrap_or("none"),
            "Loaded classifier"
        );

        Ok(Self {
            name: options.name,
            input_size: options.input_size,
            state: Some(LoadedState {
                labels,
                engine,
                delegate,
                blob,
            }),
        })
    }

    /// Like [`load`](Self::load), but a failure is logged and an unloaded
    /// adapter is returned; every call on it fails with `NotReady`.
    pub fn load_or_unloaded(
        assets: &dyn AssetSource,
        backend: &Backend<'_>,
        options: AdapterOptions,
    ) -> Self {
        let name = options.name.clone();
        let input_size = options.input_size;
        match Self::load(assets, backend, options) {
            Ok(adapter) => adapter,
            Err(e) => {
                tracing::error!(classifier = %name, "Failed to load model: {}", e);
                Self::unloaded(name, input_size)
            }
        }
    }

    /// Adapter without a model
    pub fn unloaded(name: impl Into<String>, input_size: u32) -> Self {
        Self {
            name: name.into(),
            input_size,
            state: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    /// Loaded and not closed
    pub fn is_ready(&self) -> bool {
        self.state.is_some()
    }

    /// Whether the engine runs on an acceleration delegate
    pub fn is_accelerated(&self) -> bool {
        self.state
            .as_ref()
            .map(|s| s.delegate.is_some())
            .unwrap_or(false)
    }

    /// Label table, while loaded
    pub fn labels(&self) -> Option<&LabelTable> {
        self.state.as_ref().map(|s| &s.labels)
    }

    /// Mapped model, while loaded
    pub fn model_blob(&self) -> Option<&Arc<ModelBlob>> {
        self.state.as_ref().map(|s| &s.blob)
    }

    /// Classify `image` and return the selected label parsed as a decimal
    /// class id.
    pub fn classify<I>(&mut self, image: &I) -> Result<i64>
    where
        I: GenericImageView,
        I::Pixel: Pixel<Subpixel = u8>,
    {
        let start = Instant::now();
        let result = self
            .predict_image(image, start)
            .and_then(|prediction| Ok((prediction.class_id()?, prediction.latency_us)));
        self.record(result.as_ref().map(|(_, latency_us)| *latency_us));
        result.map(|(class_id, _)| class_id)
    }

    /// Classify `image` and return the arg-max index, its raw label and score
    pub fn predict<I>(&mut self, image: &I) -> Result<Prediction>
    where
        I: GenericImageView,
        I::Pixel: Pixel<Subpixel = u8>,
    {
        let start = Instant::now();
        let result = self.predict_image(image, start);
        self.record(result.as_ref().map(|p| p.latency_us));
        result
    }

    /// Classify an already preprocessed tensor
    pub fn predict_tensor(&mut self, input: &InputTensor) -> Result<Prediction> {
        let start = Instant::now();
        let result = self.run(input, start);
        self.record(result.as_ref().map(|p| p.latency_us));
        result
    }

    fn predict_image<I>(&mut self, image: &I, start: Instant) -> Result<Prediction>
    where
        I: GenericImageView,
        I::Pixel: Pixel<Subpixel = u8>,
    {
        if self.state.is_none() {
            return Err(Error::NotReady);
        }
        let input = image_to_tensor(image, self.input_size)?;
        self.run(&input, start)
    }

    fn run(&mut self, input: &InputTensor, start: Instant) -> Result<Prediction> {
        let state = self.state.as_mut().ok_or(Error::NotReady)?;

        if input.input_size() != self.input_size as usize {
            return Err(Error::invalid_image(format!(
                "tensor is {}x{}, model input is {}x{}",
                input.input_size(),
                input.input_size(),
                self.input_size,
                self.input_size
            )));
        }

        let output = state.engine.run(input)?;
        if output.len() != state.labels.len() {
            return Err(Error::inference(format!(
                "engine returned {} scores for {} labels",
                output.len(),
                state.labels.len()
            )));
        }

        let (index, score) = argmax(output.as_slice())
            .ok_or_else(|| Error::inference("engine returned no scores"))?;
        let label = state
            .labels
            .get(index)
            .ok_or_else(|| Error::inference(format!("label index {} out of range", index)))?;

        let latency_us = start.elapsed().as_micros() as u64;
        tracing::debug!(
            classifier = %self.name,
            index,
            label,
            score,
            latency_us,
            "Classified image"
        );

        Ok(Prediction {
            index,
            label: label.to_string(),
            score,
            latency_us,
        })
    }

    fn record(&self, outcome: std::result::Result<u64, &Error>) {
        match outcome {
            Ok(latency_us) => {
                metrics::counter!("snapclass_classifications_total", "outcome" => "ok")
                    .increment(1);
                metrics::histogram!("snapclass_inference_latency_us").record(latency_us as f64);
            }
            Err(e) => {
                metrics::counter!("snapclass_classifications_total", "outcome" => e.kind())
                    .increment(1);
            }
        }
    }

    /// Release the engine, the accelerator and the mapped model. Safe to call
    /// repeatedly and on an unloaded adapter.
    pub fn close(&mut self) {
        if let Some(state) = self.state.take() {
            state.release(&self.name);
        }
    }
}

impl Drop for ClassifierAdapter {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ClassifierAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierAdapter")
            .field("name", &self.name)
            .field("input_size", &self.input_size)
            .field("ready", &self.is_ready())
            .field("labels", &self.labels().map(|l| l.len()))
            .finish()
    }
}

fn map_model(assets: &dyn AssetSource, options: &AdapterOptions) -> Result<ModelBlob> {
    let path: &Path = &options.model_path;
    let region = assets
        .open_region(path)
        .map_err(|e| Error::asset_read(path, e))?;
    let region = match options.model_region {
        Some(ModelRegion { offset, length }) => region
            .sub_region(offset, length)
            .map_err(|e| Error::asset_read(path, e))?,
        None => region,
    };

    ModelBlob::map(&region).map_err(|e| Error::asset_read(path, e))
}
