use arrow::error::ArrowError;
use std::num::ParseFloatError;
use std::result;
use thiserror::Error;

pub type Result<T> = result::Result<T, FrameChartError>;

#[derive(Clone, Debug, Default)]
pub struct ErrorContext {
    pub contexts: Vec<String>,
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (i, context) in self.contexts.iter().enumerate() {
            writeln!(f, "    Context[{i}]: {context}")?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum FrameChartError {
    #[error("Expression parsing error: {0}\n{1}")]
    ParseError(String, ErrorContext),

    #[error("Interpreter unavailable: {0}\n{1}")]
    InterpreterError(String, ErrorContext),

    #[error("Value conversion error: {0}\n{1}")]
    ConversionError(String, ErrorContext),

    #[error("Column not found: {0}\n{1}")]
    ColumnNotFound(String, ErrorContext),

    #[error("Column is not numeric: {0}\n{1}")]
    ColumnNotNumeric(String, ErrorContext),

    #[error("Row count mismatch: {0}\n{1}")]
    RowCountMismatch(String, ErrorContext),

    #[error("Internal error: {0}\n{1}")]
    InternalError(String, ErrorContext),

    #[error("External error: {0}\n{1}")]
    ExternalError(String, ErrorContext),

    #[error("Arrow error: {0}\n{1}")]
    ArrowError(ArrowError, ErrorContext),

    #[error("IO Error: {0}\n{1}")]
    IOError(std::io::Error, ErrorContext),

    #[error("Serde JSON Error: {0}\n{1}")]
    SerdeJsonError(serde_json::Error, ErrorContext),
}

impl FrameChartError {
    /// Append a new context level to the error
    pub fn with_context<S, F>(self, context_fn: F) -> Self
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        use FrameChartError::*;
        match self {
            ParseError(msg, mut context) => {
                context.contexts.push(context_fn().into());
                FrameChartError::ParseError(msg, context)
            }
            InterpreterError(msg, mut context) => {
                context.contexts.push(context_fn().into());
                FrameChartError::InterpreterError(msg, context)
            }
            ConversionError(msg, mut context) => {
                context.contexts.push(context_fn().into());
                FrameChartError::ConversionError(msg, context)
            }
            ColumnNotFound(msg, mut context) => {
                context.contexts.push(context_fn().into());
                FrameChartError::ColumnNotFound(msg, context)
            }
            ColumnNotNumeric(msg, mut context) => {
                context.contexts.push(context_fn().into());
                FrameChartError::ColumnNotNumeric(msg, context)
            }
            RowCountMismatch(msg, mut context) => {
                context.contexts.push(context_fn().into());
                FrameChartError::RowCountMismatch(msg, context)
            }
            InternalError(msg, mut context) => {
                context.contexts.push(context_fn().into());
                FrameChartError::InternalError(msg, context)
            }
            ExternalError(msg, mut context) => {
                context.contexts.push(context_fn().into());
                FrameChartError::ExternalError(msg, context)
            }
            ArrowError(err, mut context) => {
                context.contexts.push(context_fn().into());
                FrameChartError::ArrowError(err, context)
            }
            IOError(err, mut context) => {
                context.contexts.push(context_fn().into());
                FrameChartError::IOError(err, context)
            }
            SerdeJsonError(err, mut context) => {
                context.contexts.push(context_fn().into());
                FrameChartError::SerdeJsonError(err, context)
            }
        }
    }

    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::ParseError(message.into(), Default::default())
    }

    pub fn interpreter<S: Into<String>>(message: S) -> Self {
        Self::InterpreterError(message.into(), Default::default())
    }

    pub fn conversion<S: Into<String>>(message: S) -> Self {
        Self::ConversionError(message.into(), Default::default())
    }

    pub fn column_not_found<S: Into<String>>(message: S) -> Self {
        Self::ColumnNotFound(message.into(), Default::default())
    }

    pub fn column_not_numeric<S: Into<String>>(message: S) -> Self {
        Self::ColumnNotNumeric(message.into(), Default::default())
    }

    pub fn row_count_mismatch<S: Into<String>>(message: S) -> Self {
        Self::RowCountMismatch(message.into(), Default::default())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::InternalError(message.into(), Default::default())
    }

    pub fn external<S: Into<String>>(message: S) -> Self {
        Self::ExternalError(message.into(), Default::default())
    }

    pub fn is_column_not_found(&self) -> bool {
        matches!(self, FrameChartError::ColumnNotFound(..))
    }

    pub fn is_row_count_mismatch(&self) -> bool {
        matches!(self, FrameChartError::RowCountMismatch(..))
    }
}

pub trait ResultWithContext<R> {
    fn with_context<S, F>(self, context_fn: F) -> Result<R>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<R, E> ResultWithContext<R> for result::Result<R, E>
where
    E: Into<FrameChartError>,
{
    fn with_context<S, F>(self, context_fn: F) -> Result<R>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        match self {
            Ok(val) => Ok(val),
            Err(err) => {
                let frame_chart_error: FrameChartError = err.into();
                Err(frame_chart_error.with_context(context_fn))
            }
        }
    }
}

impl<R> ResultWithContext<R> for Option<R> {
    fn with_context<S, F>(self, context_fn: F) -> Result<R>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        match self {
            Some(val) => Ok(val),
            None => Err(FrameChartError::internal(context_fn().into())),
        }
    }
}

impl From<ParseFloatError> for FrameChartError {
    fn from(err: ParseFloatError) -> Self {
        Self::parse(err.to_string())
    }
}

impl From<ArrowError> for FrameChartError {
    fn from(err: ArrowError) -> Self {
        Self::ArrowError(err, Default::default())
    }
}

impl From<std::io::Error> for FrameChartError {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(err, Default::default())
    }
}

impl From<serde_json::Error> for FrameChartError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerdeJsonError(err, Default::default())
    }
}
