#![allow(dead_code)]

use async_trait::async_trait;
use framechart_common::error::{FrameChartError, Result};
use framechart_core::interpreter::{InterpreterHandle, InterpreterTrait};
use framechart_core::value::{RList, RObject, RValue};
use framechart_runtime::LocalInterpreter;
use std::any::Any;
use std::sync::Arc;

/// A local interpreter with the built-in datasets plus `extra` datasets
pub fn local_handle(extra: Vec<(&str, RValue)>) -> (Arc<LocalInterpreter>, InterpreterHandle) {
    let interpreter = extra
        .into_iter()
        .fold(LocalInterpreter::default(), |interpreter, (name, value)| {
            interpreter.with_dataset(name, value)
        });
    let interpreter = Arc::new(interpreter);
    let handle = InterpreterHandle::new(interpreter.clone());
    (interpreter, handle)
}

pub fn data_frame(columns: Vec<(&str, RValue)>) -> RValue {
    RList::named(columns).with_class("data.frame").into()
}

/// Interpreter whose setup always fails, like a runtime that could not be loaded
pub struct UnavailableInterpreter;

#[async_trait]
impl InterpreterTrait for UnavailableInterpreter {
    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn init(&self) -> Result<()> {
        Err(FrameChartError::external("webR worker did not start"))
    }

    async fn evaluate(&self, expression: &str) -> Result<RObject> {
        Err(FrameChartError::interpreter(format!(
            "Cannot evaluate {expression}"
        )))
    }

    async fn to_value(&self, _object: &RObject) -> Result<RValue> {
        Err(FrameChartError::interpreter("No values"))
    }

    async fn release(&self, _object: RObject) -> Result<()> {
        Ok(())
    }
}
