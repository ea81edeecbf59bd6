//! Shared, task-safe classifier handle

use crate::adapter::ClassifierAdapter;
use crate::classifier::ImageClassifier;
use async_trait::async_trait;
use image::RgbImage;
use parking_lot::Mutex;
use snapclass_core::{Error, Prediction, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle to one adapter.
///
/// Calls are serialized through a mutex and executed on tokio's blocking
/// pool, so at most one inference runs per adapter at a time and async
/// workers are never blocked by the engine. `is_ready` and `labels` read a
/// snapshot taken at construction and never wait on an in-flight call.
#[derive(Clone)]
pub struct SharedClassifier {
    name: Arc<str>,
    labels: Option<Arc<[String]>>,
    ready: Arc<AtomicBool>,
    inner: Arc<Mutex<ClassifierAdapter>>,
}

impl SharedClassifier {
    pub fn new(adapter: ClassifierAdapter) -> Self {
        let labels = adapter
            .labels()
            .map(|labels| labels.iter().map(str::to_string).collect());
        Self {
            name: Arc::from(adapter.name()),
            labels,
            ready: Arc::new(AtomicBool::new(adapter.is_ready())),
            inner: Arc::new(Mutex::new(adapter)),
        }
    }

    /// Loaded and not yet closing
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Labels of the underlying adapter, while ready
    pub fn labels(&self) -> Option<Vec<String>> {
        if !self.is_ready() {
            return None;
        }
        self.labels.as_ref().map(|labels| labels.to_vec())
    }

    /// Close the underlying adapter on the calling thread.
    ///
    /// Blocks until an in-flight call finishes; from async code use
    /// [`close_async`](Self::close_async).
    pub fn close(&self) {
        self.ready.store(false, Ordering::Release);
        self.inner.lock().close();
    }

    /// Close the underlying adapter on tokio's blocking pool
    pub async fn close_async(&self) -> Result<()> {
        self.ready.store(false, Ordering::Release);
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.lock().close())
            .await
            .map_err(|e| Error::inference(format!("close task failed: {}", e)))
    }
}

#[async_trait]
impl ImageClassifier for SharedClassifier {
    async fn predict(&self, image: RgbImage) -> Result<Prediction> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.lock().predict(&image))
            .await
            .map_err(|e| Error::inference(format!("classification task failed: {}", e)))?
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for SharedClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedClassifier")
            .field("name", &self.name)
            .finish()
    }
}
