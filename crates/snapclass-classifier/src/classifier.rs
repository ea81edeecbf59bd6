//! Async classifier trait

use async_trait::async_trait;
use image::RgbImage;
use snapclass_core::{Prediction, Result};

/// Trait for classifiers callable from async code
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// Classify the given image
    async fn predict(&self, image: RgbImage) -> Result<Prediction>;

    /// Classify the given image and return the label as a decimal class id
    async fn classify(&self, image: RgbImage) -> Result<i64> {
        self.predict(image).await?.class_id()
    }

    /// Get the classifier name
    fn name(&self) -> &str;
}
