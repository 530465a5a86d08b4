use crate::value::{RObject, RValue};
use async_lock::OnceCell;
use async_trait::async_trait;
use framechart_common::error::{FrameChartError, Result, ResultWithContext};
use std::any::Any;
use std::sync::Arc;

/// Capability of an embedded statistical interpreter.
///
/// Implementations serialize requests internally; callers may share one instance
/// between any number of views.
#[async_trait]
pub trait InterpreterTrait: Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// One-time setup. Must be safe to call more than once.
    async fn init(&self) -> Result<()>;

    async fn evaluate(&self, expression: &str) -> Result<RObject>;

    /// Copy the value behind a handle out of the interpreter
    async fn to_value(&self, object: &RObject) -> Result<RValue>;

    async fn release(&self, object: RObject) -> Result<()>;
}

/// Shared, lazily initialized handle to an interpreter.
///
/// Clones share the same initialization state, so `init` runs once no matter how
/// many views call `ensure_ready`. A failed initialization is not remembered and
/// the next call tries again.
#[derive(Clone)]
pub struct InterpreterHandle {
    interpreter: Arc<dyn InterpreterTrait>,
    ready: Arc<OnceCell<()>>,
}

impl InterpreterHandle {
    pub fn new(interpreter: Arc<dyn InterpreterTrait>) -> Self {
        Self {
            interpreter,
            ready: Arc::new(OnceCell::new()),
        }
    }

    pub fn interpreter(&self) -> &Arc<dyn InterpreterTrait> {
        &self.interpreter
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_initialized()
    }

    pub async fn ensure_ready(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| async {
                log::debug!("Initializing interpreter");
                self.interpreter.init().await.map_err(|err| {
                    FrameChartError::interpreter(err.to_string())
                        .with_context(|| "Failed to initialize interpreter")
                })
            })
            .await?;
        Ok(())
    }

    /// Evaluate `expression`, copy the result out and hand it to `f`.
    ///
    /// The interpreter-side value is released on every path, including when the
    /// copy or `f` fails. An error from `f` takes precedence over a release error.
    pub async fn with_value<T, F>(&self, expression: &str, f: F) -> Result<T>
    where
        F: FnOnce(RValue) -> Result<T>,
    {
        self.ensure_ready().await?;

        let object = self
            .interpreter
            .evaluate(expression)
            .await
            .with_context(|| format!("Failed to evaluate: {expression}"))?;

        let result = match self.interpreter.to_value(&object).await {
            Ok(value) => f(value),
            Err(err) => Err(err),
        };

        let released = self.interpreter.release(object).await;
        match (result, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Err(err), released) => {
                if let Err(release_err) = released {
                    log::warn!("Failed to release value of {expression}: {release_err}");
                }
                Err(err.with_context(|| format!("While converting result of: {expression}")))
            }
            (Ok(_), Err(err)) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::RType;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubInterpreter {
        init_calls: AtomicUsize,
        fail_init: bool,
        released: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl InterpreterTrait for StubInterpreter {
        fn as_any(&self) -> &dyn Any {
            self
        }

        async fn init(&self) -> Result<()> {
            self.init_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_init {
                Err(FrameChartError::external("wasm module failed to load"))
            } else {
                Ok(())
            }
        }

        async fn evaluate(&self, expression: &str) -> Result<RObject> {
            match expression {
                "x" => Ok(RObject::new(1, RType::Double)),
                _ => Err(FrameChartError::interpreter(format!(
                    "object '{expression}' not found"
                ))),
            }
        }

        async fn to_value(&self, _object: &RObject) -> Result<RValue> {
            Ok(RValue::from(vec![1.0, 2.0]))
        }

        async fn release(&self, object: RObject) -> Result<()> {
            self.released.lock().unwrap().push(object.id());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_init_runs_once_across_clones() {
        let stub = Arc::new(StubInterpreter::default());
        let handle = InterpreterHandle::new(stub.clone());
        let other = handle.clone();

        futures::future::try_join_all(vec![handle.ensure_ready(), other.ensure_ready()])
            .await
            .unwrap();
        handle.ensure_ready().await.unwrap();

        assert!(other.is_ready());
        assert_eq!(stub.init_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_init_is_retried() {
        let stub = Arc::new(StubInterpreter {
            fail_init: true,
            ..Default::default()
        });
        let handle = InterpreterHandle::new(stub.clone());

        let err = handle.ensure_ready().await.unwrap_err();
        assert!(matches!(err, FrameChartError::InterpreterError(..)));
        assert!(!handle.is_ready());

        handle.ensure_ready().await.unwrap_err();
        assert_eq!(stub.init_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_value_released_after_success_and_failure() {
        let stub = Arc::new(StubInterpreter::default());
        let handle = InterpreterHandle::new(stub.clone());

        let len = handle.with_value("x", |value| Ok(value.len())).await.unwrap();
        assert_eq!(len, 2);

        let err = handle
            .with_value("x", |_| -> Result<()> {
                Err(FrameChartError::conversion("not a data frame"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FrameChartError::ConversionError(..)));

        assert_eq!(*stub.released.lock().unwrap(), vec![1, 1]);
    }

    #[tokio::test]
    async fn test_failed_evaluation_has_nothing_to_release() {
        let stub = Arc::new(StubInterpreter::default());
        let handle = InterpreterHandle::new(stub.clone());

        let err = handle.with_value("y", |v| Ok(v)).await.unwrap_err();
        assert!(err.to_string().contains("object 'y' not found"));
        assert!(stub.released.lock().unwrap().is_empty());
    }
}
