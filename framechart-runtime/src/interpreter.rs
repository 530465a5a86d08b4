use crate::datasets;
use crate::expression::Expr;
use crate::stats::hist::Histogram;
use async_lock::Mutex;
use async_trait::async_trait;
use framechart_common::error::{FrameChartError, Result, ResultWithContext};
use framechart_core::adapter::quote_name;
use framechart_core::interpreter::InterpreterTrait;
use framechart_core::value::{RList, RObject, RValue};
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalInterpreterOpts {
    /// Make `iris`, `cars` and `women` available after `init`
    pub builtin_datasets: bool,
}

impl Default for LocalInterpreterOpts {
    fn default() -> Self {
        Self {
            builtin_datasets: true,
        }
    }
}

#[derive(Default)]
struct InterpreterState {
    initialized: bool,
    globals: HashMap<String, RValue>,
    objects: HashMap<u64, RValue>,
    next_id: u64,
    evaluated: Vec<String>,
}

/// In-process interpreter for the expression subset in `crate::expression`.
///
/// Every request takes the same lock, so evaluations are serialized even when
/// many views share the interpreter. Results stay in an object store until they
/// are released.
pub struct LocalInterpreter {
    opts: LocalInterpreterOpts,
    state: Mutex<InterpreterState>,
    setup_count: AtomicUsize,
}

impl LocalInterpreter {
    pub fn new(opts: LocalInterpreterOpts) -> Self {
        Self {
            opts,
            state: Mutex::new(InterpreterState::default()),
            setup_count: AtomicUsize::new(0),
        }
    }

    /// Bind `value` to `name` in the global environment. Takes precedence over
    /// a built-in dataset of the same name.
    pub fn with_dataset<S: Into<String>>(mut self, name: S, value: RValue) -> Self {
        self.state.get_mut().globals.insert(name.into(), value);
        self
    }

    /// Number of times setup actually ran
    pub fn setup_count(&self) -> usize {
        self.setup_count.load(Ordering::SeqCst)
    }

    /// Number of values evaluated and not yet released
    pub async fn live_objects(&self) -> usize {
        self.state.lock().await.objects.len()
    }

    /// Every expression evaluated so far, in order
    pub async fn evaluated(&self) -> Vec<String> {
        self.state.lock().await.evaluated.clone()
    }
}

impl Default for LocalInterpreter {
    fn default() -> Self {
        Self::new(Default::default())
    }
}

#[async_trait]
impl InterpreterTrait for LocalInterpreter {
    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn init(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.initialized {
            return Ok(());
        }

        if self.opts.builtin_datasets {
            for name in datasets::builtin_names() {
                if state.globals.contains_key(name) {
                    continue;
                }
                let value = datasets::builtin(name)?
                    .with_context(|| format!("Built-in dataset {name} is not registered"))?;
                state.globals.insert(name.to_string(), value);
            }
        }

        state.initialized = true;
        self.setup_count.fetch_add(1, Ordering::SeqCst);
        log::info!(
            "Local interpreter ready with {} datasets",
            state.globals.len()
        );
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<RObject> {
        let mut state = self.state.lock().await;
        if !state.initialized {
            return Err(FrameChartError::interpreter(
                "The interpreter has not been initialized",
            ));
        }

        state.evaluated.push(expression.to_string());
        let expr = Expr::parse(expression)?;
        let value = eval(&state.globals, &expr)?;

        state.next_id += 1;
        let id = state.next_id;
        let object = RObject::new(id, value.rtype());
        state.objects.insert(id, value);
        log::debug!("Evaluated {expr} into object {id} ({})", object.rtype());
        Ok(object)
    }

    async fn to_value(&self, object: &RObject) -> Result<RValue> {
        let state = self.state.lock().await;
        state.objects.get(&object.id()).cloned().ok_or_else(|| {
            FrameChartError::interpreter(format!("Object {} has been released", object.id()))
        })
    }

    async fn release(&self, object: RObject) -> Result<()> {
        let mut state = self.state.lock().await;
        match state.objects.remove(&object.id()) {
            Some(_) => Ok(()),
            None => Err(FrameChartError::interpreter(format!(
                "Object {} was already released",
                object.id()
            ))),
        }
    }
}

fn eval(globals: &HashMap<String, RValue>, expr: &Expr) -> Result<RValue> {
    match expr {
        Expr::Symbol(name) => globals
            .get(name)
            .cloned()
            .ok_or_else(|| FrameChartError::interpreter(format!("object '{name}' not found"))),
        Expr::Column { data, column } => Ok(dollar(&eval(globals, data)?, column)?.clone()),
        Expr::Head { data, n } => match eval(globals, data)? {
            RValue::List(df) => {
                let rows = df.values.iter().map(RValue::len).max().unwrap_or(0);
                let keep = head_rows(rows, *n);
                let mut head = RList::new(
                    df.names.clone(),
                    df.values.iter().map(|column| slice(column, keep)).collect(),
                );
                head.class = df.class.clone();
                Ok(head.into())
            }
            atomic => Ok(slice(&atomic, head_rows(atomic.len(), *n))),
        },
        Expr::Hist {
            data,
            column,
            breaks,
        } => {
            let frame = eval(globals, data)?;
            let x = dollar(&frame, column)?;
            let xname = format!("{data}${}", quote_name(column));
            let values = x.to_f64_values().ok_or_else(|| {
                FrameChartError::interpreter(format!(
                    "hist: '{xname}' must be numeric, found {}",
                    x.rtype()
                ))
            })?;
            Ok(Histogram::try_new(&values, *breaks)?.into_value(&xname))
        }
    }
}

/// `data$column`; a missing column is `NULL`
fn dollar<'a>(data: &'a RValue, column: &str) -> Result<&'a RValue> {
    static NULL: RValue = RValue::Null;
    match data {
        RValue::List(list) => Ok(list.get(column).unwrap_or(&NULL)),
        other => Err(FrameChartError::interpreter(format!(
            "$ operator is invalid for {} vectors",
            other.rtype()
        ))),
    }
}

fn head_rows(rows: usize, n: i64) -> usize {
    if n >= 0 {
        rows.min(n as usize)
    } else {
        rows.saturating_sub(n.unsigned_abs() as usize)
    }
}

fn slice(value: &RValue, len: usize) -> RValue {
    fn take<T: Clone>(v: &[T], len: usize) -> Vec<T> {
        v.iter().take(len).cloned().collect()
    }
    match value {
        RValue::Null => RValue::Null,
        RValue::Logical(v) => RValue::Logical(take(v, len)),
        RValue::Integer(v) => RValue::Integer(take(v, len)),
        RValue::Double(v) => RValue::Double(take(v, len)),
        RValue::Character(v) => RValue::Character(take(v, len)),
        RValue::List(list) => RValue::List(list.clone()),
    }
}
