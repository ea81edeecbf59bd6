//! Mock engines, delegates and asset helpers for testing
//!
//! Provides configurable implementations of the engine and delegate traits
//! that record what the adapter hands them.

#![allow(dead_code)]

use parking_lot::Mutex;
use snapclass_classifier::assets::{AssetRegion, AssetSource, DirAssetSource};
use snapclass_classifier::engine::{
    Delegate, DelegateFactory, EngineFactory, EngineRequest, InferenceEngine,
};
use snapclass_classifier::ModelBlob;
use snapclass_core::{Error, InputTensor, OutputTensor, Result};
use std::any::Any;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tempfile::TempDir;

/// Everything the mocks observed
#[derive(Clone, Default)]
pub struct Probe {
    pub initializations: Arc<AtomicU32>,
    pub runs: Arc<AtomicU32>,
    pub in_flight: Arc<AtomicU32>,
    pub max_in_flight: Arc<AtomicU32>,
    pub released: Arc<AtomicBool>,
    pub last_input: Arc<Mutex<Option<InputTensor>>>,
    pub blob: Arc<Mutex<Option<Weak<ModelBlob>>>>,
    pub delegates_seen: Arc<Mutex<Vec<Option<String>>>>,
    pub delegates_created: Arc<AtomicU32>,
    pub delegate_closed: Arc<AtomicBool>,
}

impl Probe {
    pub fn runs(&self) -> u32 {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn initializations(&self) -> u32 {
        self.initializations.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub fn delegate_closed(&self) -> bool {
        self.delegate_closed.load(Ordering::SeqCst)
    }

    pub fn delegates_created(&self) -> u32 {
        self.delegates_created.load(Ordering::SeqCst)
    }

    /// Whether the last mapped blob is still alive
    pub fn blob_alive(&self) -> bool {
        self.blob
            .lock()
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some()
    }

    pub fn last_input(&self) -> Option<InputTensor> {
        self.last_input.lock().clone()
    }
}

/// Engine factory returning fixed scores
pub struct MockEngineFactory {
    scores: Vec<f32>,
    fail_init: bool,
    fail_run: bool,
    reject_delegate: bool,
    run_delay: Option<Duration>,
    pub probe: Probe,
}

impl MockEngineFactory {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            fail_init: false,
            fail_run: false,
            reject_delegate: false,
            run_delay: None,
            probe: Probe::default(),
        }
    }

    /// Reject every model
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Fail every run
    pub fn failing_run(mut self) -> Self {
        self.fail_run = true;
        self
    }

    /// Fail initialization whenever a delegate is offered
    pub fn rejecting_delegate(mut self) -> Self {
        self.reject_delegate = true;
        self
    }

    /// Sleep inside every run
    pub fn with_run_delay(mut self, delay: Duration) -> Self {
        self.run_delay = Some(delay);
        self
    }
}

impl EngineFactory for MockEngineFactory {
    fn initialize(
        &self,
        request: &EngineRequest,
        delegate: Option<&dyn Delegate>,
    ) -> Result<Box<dyn InferenceEngine>> {
        self.probe.initializations.fetch_add(1, Ordering::SeqCst);
        *self.probe.blob.lock() = Some(Arc::downgrade(&request.blob));
        self.probe
            .delegates_seen
            .lock()
            .push(delegate.map(|d| d.name().to_string()));

        if self.fail_init {
            return Err(Error::model_load_with("mock engine rejected model", "bad magic"));
        }
        if self.reject_delegate && delegate.is_some() {
            return Err(Error::model_load("mock engine cannot use delegates"));
        }

        Ok(Box::new(MockEngine {
            scores: self.scores.clone(),
            fail_run: self.fail_run,
            run_delay: self.run_delay,
            probe: self.probe.clone(),
            released: false,
        }))
    }
}

struct MockEngine {
    scores: Vec<f32>,
    fail_run: bool,
    run_delay: Option<Duration>,
    probe: Probe,
    released: bool,
}

impl InferenceEngine for MockEngine {
    fn run(&mut self, input: &InputTensor) -> Result<OutputTensor> {
        if self.released {
            return Err(Error::inference("mock engine released"));
        }

        let now = self.probe.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.run_delay {
            std::thread::sleep(delay);
        }
        self.probe.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.probe.runs.fetch_add(1, Ordering::SeqCst);
        *self.probe.last_input.lock() = Some(input.clone());

        if self.fail_run {
            return Err(Error::inference("simulated engine fault"));
        }
        Ok(OutputTensor::new(self.scores.clone()))
    }

    fn release(&mut self) {
        self.released = true;
        self.probe.released.store(true, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Delegate factory that either succeeds or fails
pub struct MockDelegateFactory {
    fail: bool,
    probe: Probe,
}

impl MockDelegateFactory {
    pub fn working(probe: Probe) -> Self {
        Self { fail: false, probe }
    }

    pub fn failing(probe: Probe) -> Self {
        Self { fail: true, probe }
    }
}

impl DelegateFactory for MockDelegateFactory {
    fn create(&self) -> Result<Box<dyn Delegate>> {
        self.probe.delegates_created.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::model_load("no GPU available"));
        }
        Ok(Box::new(MockDelegate {
            probe: self.probe.clone(),
        }))
    }
}

struct MockDelegate {
    probe: Probe,
}

impl Delegate for MockDelegate {
    fn name(&self) -> &str {
        "mock-gpu"
    }

    fn close(&mut self) {
        self.probe.delegate_closed.store(true, Ordering::SeqCst);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Asset source that counts how often each kind of asset is opened
pub struct CountingAssets {
    inner: DirAssetSource,
    pub texts_opened: AtomicU32,
    pub regions_opened: AtomicU32,
}

impl CountingAssets {
    pub fn new(root: &Path) -> Self {
        Self {
            inner: DirAssetSource::new(root),
            texts_opened: AtomicU32::new(0),
            regions_opened: AtomicU32::new(0),
        }
    }

    pub fn regions_opened(&self) -> u32 {
        self.regions_opened.load(Ordering::SeqCst)
    }
}

impl AssetSource for CountingAssets {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        self.texts_opened.fetch_add(1, Ordering::SeqCst);
        self.inner.open(path)
    }

    fn open_region(&self, path: &Path) -> io::Result<AssetRegion> {
        self.regions_opened.fetch_add(1, Ordering::SeqCst);
        self.inner.open_region(path)
    }
}

/// Temporary asset directory with `labels.txt` and a dummy `model.bin`
pub fn asset_dir(labels: &str) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("labels.txt"), labels).expect("Failed to write labels");
    std::fs::write(dir.path().join("model.bin"), b"\x00model-weights\x00")
        .expect("Failed to write model");
    dir
}
