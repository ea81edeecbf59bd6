//! Candle-backed inference engine
//!
//! Reads the mapped model as SafeTensors and evaluates a linear
//! classification head (`classifier.weight` of shape
//! `[num_labels, size * size * 3]`, `classifier.bias` of shape `[num_labels]`)
//! over the flattened input. CUDA and Metal are exposed as delegates.

use crate::config::DeviceSpec;
use crate::engine::{Delegate, DelegateFactory, EngineFactory, EngineRequest, InferenceEngine};
use candle_core::{DType, Device, Tensor};
use candle_nn::{Linear, Module, VarBuilder};
use snapclass_core::{Error, InputTensor, OutputTensor, Result};
use std::any::Any;

/// GPU device handed to the candle engine
pub struct CandleGpuDelegate {
    device: Device,
    name: String,
}

impl CandleGpuDelegate {
    pub fn device(&self) -> &Device {
        &self.device
    }
}

impl Delegate for CandleGpuDelegate {
    fn name(&self) -> &str {
        &self.name
    }

    fn close(&mut self) {
        tracing::debug!("Closing accelerator '{}'", self.name);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Creates CUDA or Metal delegates
#[derive(Debug, Clone, Copy)]
pub struct CandleDelegateFactory {
    device: DeviceSpec,
}

impl CandleDelegateFactory {
    /// Delegate factory for `device`; `None` for the CPU, which needs none
    pub fn for_device(device: DeviceSpec) -> Option<Self> {
        device.is_accelerated().then_some(Self { device })
    }
}

impl DelegateFactory for CandleDelegateFactory {
    fn create(&self) -> Result<Box<dyn Delegate>> {
        let (device, name) = match self.device {
            DeviceSpec::Cpu => {
                return Err(Error::model_load("the CPU is not an accelerator"));
            }
            DeviceSpec::Cuda { index } => {
                let idx = index.unwrap_or(0);
                let device = Device::new_cuda(idx)
                    .map_err(|e| Error::model_load_with("Failed to create CUDA device", e))?;
                (device, format!("cuda:{}", idx))
            }
            DeviceSpec::Metal { index } => {
                let idx = index.unwrap_or(0);
                let device = Device::new_metal(idx)
                    .map_err(|e| Error::model_load_with("Failed to create Metal device", e))?;
                (device, format!("metal:{}", idx))
            }
        };

        tracing::info!("Created accelerator '{}'", name);
        Ok(Box::new(CandleGpuDelegate { device, name }))
    }
}

/// Builds [`CandleEngine`]s from SafeTensors blobs
#[derive(Debug, Clone, Copy, Default)]
pub struct CandleEngineFactory;

impl EngineFactory for CandleEngineFactory {
    fn initialize(
        &self,
        request: &EngineRequest,
        delegate: Option<&dyn Delegate>,
    ) -> Result<Box<dyn InferenceEngine>> {
        let device = delegate
            .and_then(|d| d.as_any().downcast_ref::<CandleGpuDelegate>())
            .map(|d| d.device().clone())
            .unwrap_or(Device::Cpu);

        let input_dim = InputTensor::element_count(request.input_size).ok_or_else(|| {
            Error::model_load(format!("input size {} is too large", request.input_size))
        })?;

        let tensors = candle_core::safetensors::load_buffer(request.blob.as_bytes(), &device)
            .map_err(|e| Error::model_load_with("Failed to load SafeTensors", e))?;

        let vb = VarBuilder::from_tensors(tensors, DType::F32, &device);
        let head = candle_nn::linear(input_dim, request.num_labels, vb.pp("classifier"))
            .map_err(|e| Error::model_load_with("Failed to build classification head", e))?;

        tracing::info!(
            "Loaded candle classifier with {} inputs and {} labels on {:?}",
            input_dim,
            request.num_labels,
            device
        );

        Ok(Box::new(CandleEngine {
            head: Some(head),
            device,
            input_dim,
        }))
    }
}

/// Linear classification head evaluated with candle
pub struct CandleEngine {
    head: Option<Linear>,
    device: Device,
    input_dim: usize,
}

impl InferenceEngine for CandleEngine {
    fn run(&mut self, input: &InputTensor) -> Result<OutputTensor> {
        let head = self
            .head
            .as_ref()
            .ok_or_else(|| Error::inference("engine has been released"))?;

        let scores = Tensor::from_slice(input.as_slice(), (1, self.input_dim), &self.device)
            .and_then(|x| head.forward(&x))
            .and_then(|logits| logits.squeeze(0))
            .and_then(|logits| logits.to_dtype(DType::F32))
            .and_then(|logits| logits.to_vec1::<f32>())
            .map_err(|e| Error::inference(format!("Model forward pass failed: {}", e)))?;

        Ok(OutputTensor::new(scores))
    }

    fn release(&mut self) {
        self.head = None;
    }

    fn name(&self) -> &str {
        "candle-linear"
    }
}
