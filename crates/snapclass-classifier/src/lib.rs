//! snapclass Classifier
//!
//! Loads a pre-trained image classification model and its label list from
//! assets, binds an injected inference engine to the memory-mapped model,
//! and classifies one picture at a time:
//!
//! 1. copy the top-left `size × size` pixels into an unnormalized RGB tensor
//! 2. run the engine (optionally on a GPU delegate)
//! 3. take a stable arg-max over the scores
//! 4. resolve the winning index through the label table
//!
//! The bundled engine (feature `ml-models`) runs a Candle linear head; any
//! other runtime plugs in through [`EngineFactory`].

pub mod adapter;
pub mod assets;
#[cfg(feature = "ml-models")]
pub mod candle_engine;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod labels;
pub mod model_blob;
pub mod postprocess;
pub mod preprocess;
pub mod registry;
pub mod shared;

pub use adapter::{AdapterOptions, ClassifierAdapter, ModelRegion};
pub use assets::{AssetRegion, AssetSource, DirAssetSource};
#[cfg(feature = "ml-models")]
pub use candle_engine::{CandleDelegateFactory, CandleEngineFactory};
pub use classifier::ImageClassifier;
pub use config::{ClassifierConfig, DeviceSpec, ModelSpec};
pub use engine::{
    AccelerationPolicy, Backend, Delegate, DelegateFactory, EngineFactory, EngineRequest,
    InferenceEngine,
};
pub use labels::LabelTable;
pub use model_blob::ModelBlob;
pub use registry::ClassifierRegistry;
pub use shared::SharedClassifier;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::adapter::{AdapterOptions, ClassifierAdapter};
    pub use crate::assets::{AssetSource, DirAssetSource};
    pub use crate::classifier::ImageClassifier;
    pub use crate::engine::{AccelerationPolicy, Backend, EngineFactory, InferenceEngine};
    pub use crate::shared::SharedClassifier;
    pub use snapclass_core::prelude::*;
}
