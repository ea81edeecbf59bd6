//! Extension points for inference engines and acceleration backends.
//!
//! The classifier never depends on a specific runtime. An [`EngineFactory`]
//! turns a mapped model into a runnable [`InferenceEngine`]; an optional
//! [`DelegateFactory`] supplies a hardware [`Delegate`] the engine may run on.

use crate::model_blob::ModelBlob;
use serde::{Deserialize, Serialize};
use snapclass_core::{Error, InputTensor, OutputTensor, Result};
use std::any::Any;
use std::sync::Arc;

/// Everything an engine needs to bind to a model
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// Mapped model bytes
    pub blob: Arc<ModelBlob>,

    /// Side length of the square input image
    pub input_size: usize,

    /// Expected length of every output vector
    pub num_labels: usize,
}

/// Executor bound to one model
pub trait InferenceEngine: Send {
    /// Run one forward pass. Blocks until the engine is done.
    fn run(&mut self, input: &InputTensor) -> Result<OutputTensor>;

    /// Free engine resources. The engine must not be run afterwards.
    fn release(&mut self);

    /// Engine name for logging
    fn name(&self) -> &str;
}

/// Creates engines from mapped models
pub trait EngineFactory: Send + Sync {
    /// Bind an engine to `request.blob`, on `delegate` when one is given
    fn initialize(
        &self,
        request: &EngineRequest,
        delegate: Option<&dyn Delegate>,
    ) -> Result<Box<dyn InferenceEngine>>;
}

/// Hardware acceleration context handed to an engine
pub trait Delegate: Send {
    fn name(&self) -> &str;

    /// Release the accelerator context
    fn close(&mut self);

    /// Downcast hook so engines can recognise their own delegate types
    fn as_any(&self) -> &dyn Any;
}

/// Creates acceleration delegates
pub trait DelegateFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn Delegate>>;
}

/// What to do about hardware acceleration at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccelerationPolicy {
    /// Never create a delegate
    Disabled,
    /// Use a delegate when one can be created, otherwise run unaccelerated
    #[default]
    Prefer,
    /// Fail the load when no delegate can be created
    Require,
}

/// Engine factory plus the optional accelerator used to load classifiers
#[derive(Clone, Copy)]
pub struct Backend<'a> {
    engines: &'a dyn EngineFactory,
    accelerator: Option<&'a dyn DelegateFactory>,
}

impl<'a> Backend<'a> {
    pub fn new(engines: &'a dyn EngineFactory) -> Self {
        Self {
            engines,
            accelerator: None,
        }
    }

    /// Set the accelerator
    pub fn with_accelerator(mut self, accelerator: &'a dyn DelegateFactory) -> Self {
        self.accelerator = Some(accelerator);
        self
    }

    pub fn has_accelerator(&self) -> bool {
        self.accelerator.is_some()
    }

    /// Create a delegate according to `policy`
    pub(crate) fn acquire_delegate(
        &self,
        policy: AccelerationPolicy,
    ) -> Result<Option<Box<dyn Delegate>>> {
        match (policy, self.accelerator) {
            (AccelerationPolicy::Disabled, _) => Ok(None),
            (AccelerationPolicy::Prefer, None) => {
                tracing::debug!("No accelerator configured, using default execution path");
                Ok(None)
            }
            (AccelerationPolicy::Require, None) => Err(Error::model_load(
                "acceleration is required but no accelerator is configured",
            )),
            (AccelerationPolicy::Prefer, Some(factory)) => match factory.create() {
                Ok(delegate) => Ok(Some(delegate)),
                Err(e) => {
                    tracing::warn!(
                        "Accelerator unavailable, falling back to default execution path: {}",
                        e
                    );
                    Ok(None)
                }
            },
            (AccelerationPolicy::Require, Some(factory)) => factory
                .create()
                .map(Some)
                .map_err(|e| Error::model_load_with("failed to create required accelerator", e)),
        }
    }

    /// Initialize an engine, retrying unaccelerated under `Prefer` when the
    /// engine rejects the delegate.
    pub(crate) fn initialize(
        &self,
        request: &EngineRequest,
        policy: AccelerationPolicy,
    ) -> Result<(Box<dyn InferenceEngine>, Option<Box<dyn Delegate>>)> {
        let Some(mut delegate) = self.acquire_delegate(policy)? else {
            let engine = self.engines.initialize(request, None)?;
            return Ok((engine, None));
        };

        match self.engines.initialize(request, Some(delegate.as_ref())) {
            Ok(engine) => Ok((engine, Some(delegate))),
            Err(e) if policy == AccelerationPolicy::Prefer => {
                tracing::warn!(
                    "Engine rejected accelerator '{}', retrying unaccelerated: {}",
                    delegate.name(),
                    e
                );
                delegate.close();
                let engine = self.engines.initialize(request, None)?;
                Ok((engine, None))
            }
            Err(e) => {
                delegate.close();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoDelegates;

    impl DelegateFactory for NoDelegates {
        fn create(&self) -> Result<Box<dyn Delegate>> {
            Err(Error::model_load("no gpu"))
        }
    }

    struct NullEngines;

    impl EngineFactory for NullEngines {
        fn initialize(
            &self,
            _request: &EngineRequest,
            _delegate: Option<&dyn Delegate>,
        ) -> Result<Box<dyn InferenceEngine>> {
            Err(Error::model_load("unused"))
        }
    }

    #[test]
    fn test_policy_without_accelerator() {
        let backend = Backend::new(&NullEngines);

        assert!(backend
            .acquire_delegate(AccelerationPolicy::Prefer)
            .unwrap()
            .is_none());
        assert!(backend
            .acquire_delegate(AccelerationPolicy::Disabled)
            .unwrap()
            .is_none());
        assert!(matches!(
            backend.acquire_delegate(AccelerationPolicy::Require),
            Err(Error::ModelLoad { .. })
        ));
    }

    #[test]
    fn test_policy_with_failing_accelerator() {
        let backend = Backend::new(&NullEngines).with_accelerator(&NoDelegates);
        assert!(backend.has_accelerator());

        assert!(backend
            .acquire_delegate(AccelerationPolicy::Prefer)
            .unwrap()
            .is_none());
        assert!(matches!(
            backend.acquire_delegate(AccelerationPolicy::Require),
            Err(Error::ModelLoad { .. })
        ));
    }

    #[test]
    fn test_policy_serde() {
        let policy: AccelerationPolicy = serde_yaml::from_str("require").unwrap();
        assert_eq!(policy, AccelerationPolicy::Require);
        assert_eq!(AccelerationPolicy::default(), AccelerationPolicy::Prefer);
    }
}
