//! Tensor value types exchanged with inference engines

use serde::Serialize;

/// Batch dimension of every input tensor
pub const BATCH_SIZE: usize = 1;

/// Colour channels per pixel (red, green, blue)
pub const CHANNELS: usize = 3;

/// Size of one f32 element in bytes
const ELEMENT_BYTES: usize = std::mem::size_of::<f32>();

/// Preprocessed image in NHWC layout: `[1, size, size, 3]` of f32
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    input_size: usize,
    data: Vec<f32>,
}

impl InputTensor {
    /// Number of f32 elements for a square input of `input_size`, or `None`
    /// when it does not fit in `usize`
    pub fn element_count(input_size: usize) -> Option<usize> {
        BATCH_SIZE
            .checked_mul(input_size)?
            .checked_mul(input_size)?
            .checked_mul(CHANNELS)
    }

    /// Number of bytes for a square input of `input_size`, or `None` on
    /// overflow
    pub fn byte_len_for(input_size: usize) -> Option<usize> {
        Self::element_count(input_size)?.checked_mul(ELEMENT_BYTES)
    }

    /// Wrap already laid-out data. Returns `None` when the length does not
    /// match `[1, input_size, input_size, 3]`.
    pub fn from_vec(input_size: usize, data: Vec<f32>) -> Option<Self> {
        if Self::element_count(input_size) != Some(data.len()) {
            return None;
        }
        Some(Self { input_size, data })
    }

    /// Side length of the square input
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Shape as `[batch, height, width, channels]`
    pub fn shape(&self) -> [usize; 4] {
        [BATCH_SIZE, self.input_size, self.input_size, CHANNELS]
    }

    /// Flat element view
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Consume into the flat element vector
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Size of the byte encoding
    pub fn byte_len(&self) -> usize {
        self.data.len() * ELEMENT_BYTES
    }

    /// Native-endian byte encoding, as handed to byte-oriented runtimes
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.byte_len());
        for value in &self.data {
            bytes.extend_from_slice(&value.to_ne_bytes());
        }
        bytes
    }
}

/// Raw confidence vector produced by an engine, one value per label
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutputTensor {
    scores: Vec<f32>,
}

impl OutputTensor {
    pub fn new(scores: Vec<f32>) -> Self {
        Self { scores }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.scores
    }
}

impl From<Vec<f32>> for OutputTensor {
    fn from(scores: Vec<f32>) -> Self {
        Self::new(scores)
    }
}

/// Outcome of one classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Arg-max index into the label table
    pub index: usize,

    /// Raw label text at `index`
    pub label: String,

    /// Engine confidence at `index`
    pub score: f32,

    /// End-to-end latency in microseconds (preprocess, run, postprocess)
    pub latency_us: u64,
}

impl Prediction {
    /// Parse the label as a decimal class id
    pub fn class_id(&self) -> crate::Result<i64> {
        self.label
            .parse::<i64>()
            .map_err(|e| crate::Error::label_parse(self.label.clone(), e))
    }
}
