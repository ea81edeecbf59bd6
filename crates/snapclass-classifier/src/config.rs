//! Configuration for classifiers and model loading

use crate::adapter::{AdapterOptions, ModelRegion};
use crate::engine::AccelerationPolicy;
use serde::{Deserialize, Serialize};
use snapclass_core::{Error, InputTensor, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Configuration for all classifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Directory model and label paths are resolved against
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    /// Acceleration policy for models that do not set one
    #[serde(default)]
    pub default_acceleration: AccelerationPolicy,

    /// Device for models that do not set one
    #[serde(default)]
    pub default_device: DeviceSpec,

    /// Model configurations by name
    #[serde(default)]
    pub models: HashMap<String, ModelSpec>,
}

/// One classifier model (for YAML/config files)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Model weights asset
    pub model: PathBuf,

    /// Label asset, one label per line
    pub labels: PathBuf,

    /// Side length of the square input image
    pub input_size: u32,

    /// Acceleration override
    pub acceleration: Option<AccelerationPolicy>,

    /// Device override
    pub device: Option<DeviceSpec>,

    /// Start of the model inside a packed asset
    pub model_offset: Option<u64>,

    /// Declared model length inside a packed asset
    pub model_length: Option<u64>,
}

/// Device specification (for config files)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceSpec {
    #[default]
    Cpu,
    Cuda { index: Option<usize> },
    Metal { index: Option<usize> },
}

impl DeviceSpec {
    /// Whether running on this device needs an acceleration delegate
    pub fn is_accelerated(&self) -> bool {
        !matches!(self, Self::Cpu)
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            assets_dir: default_assets_dir(),
            default_acceleration: AccelerationPolicy::default(),
            default_device: DeviceSpec::default(),
            models: HashMap::new(),
        }
    }
}

impl ClassifierConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Check every model for unusable settings
    pub fn validate(&self) -> Result<()> {
        for (name, spec) in &self.models {
            if spec.input_size == 0 {
                return Err(Error::config(format!(
                    "model '{}': input_size must be greater than zero",
                    name
                )));
            }
            if InputTensor::byte_len_for(spec.input_size as usize).is_none() {
                return Err(Error::config(format!(
                    "model '{}': input_size {} is too large",
                    name, spec.input_size
                )));
            }
            if spec.model_offset.is_some() && spec.model_length.is_none() {
                return Err(Error::config(format!(
                    "model '{}': model_offset requires model_length",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Get a model specification by name
    pub fn model(&self, name: &str) -> Result<&ModelSpec> {
        self.models
            .get(name)
            .ok_or_else(|| Error::config(format!("model '{}' is not configured", name)))
    }

    /// Loader options for the named model
    pub fn adapter_options(&self, name: &str) -> Result<AdapterOptions> {
        let spec = self.model(name)?;

        let mut options = AdapterOptions::new(&spec.model, &spec.labels, spec.input_size)
            .with_name(name)
            .with_acceleration(spec.acceleration.unwrap_or(self.default_acceleration));

        if let Some(length) = spec.model_length {
            options = options.with_model_region(ModelRegion {
                offset: spec.model_offset.unwrap_or(0),
                length,
            });
        }

        Ok(options)
    }

    /// Effective device of the named model
    pub fn device(&self, name: &str) -> Result<DeviceSpec> {
        let spec = self.model(name)?;
        Ok(spec.device.unwrap_or(self.default_device))
    }

    /// Get all model names, sorted
    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("./assets")
}
