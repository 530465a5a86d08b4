use framechart_common::arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int32Array, NullArray, StringArray,
};
use framechart_common::error::{FrameChartError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Declared element type of an interpreter value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RType {
    Null,
    Logical,
    Integer,
    Double,
    Character,
    List,
}

impl RType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RType::Null => "null",
            RType::Logical => "logical",
            RType::Integer => "integer",
            RType::Double => "double",
            RType::Character => "character",
            RType::List => "list",
        }
    }
}

impl Display for RType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named list, the shape of data frames and of most structured results
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RList {
    pub names: Option<Vec<Option<String>>>,
    pub values: Vec<RValue>,
    pub class: Vec<String>,
}

impl RList {
    pub fn new(names: Option<Vec<Option<String>>>, values: Vec<RValue>) -> Self {
        Self {
            names,
            values,
            class: Vec::new(),
        }
    }

    /// Build a list whose every element is named
    pub fn named<S: Into<String>>(entries: Vec<(S, RValue)>) -> Self {
        let (names, values): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .map(|(name, value)| (Some(name.into()), value))
            .unzip();
        Self::new(Some(names), values)
    }

    pub fn with_class<S: Into<String>>(mut self, class: S) -> Self {
        self.class.push(class.into());
        self
    }

    pub fn inherits(&self, class: &str) -> bool {
        self.class.iter().any(|c| c == class)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names
            .as_ref()
            .and_then(|names| names.get(index))
            .and_then(|name| name.as_deref())
    }

    /// Element lookup by exact name, like `x[["name"]]`
    pub fn get(&self, name: &str) -> Option<&RValue> {
        let names = self.names.as_ref()?;
        names
            .iter()
            .position(|n| n.as_deref() == Some(name))
            .and_then(|i| self.values.get(i))
    }
}

/// A value copied out of the interpreter
#[derive(Clone, Debug, PartialEq)]
pub enum RValue {
    Null,
    Logical(Vec<Option<bool>>),
    Integer(Vec<Option<i32>>),
    Double(Vec<Option<f64>>),
    Character(Vec<Option<String>>),
    List(RList),
}

impl RValue {
    pub fn rtype(&self) -> RType {
        match self {
            RValue::Null => RType::Null,
            RValue::Logical(_) => RType::Logical,
            RValue::Integer(_) => RType::Integer,
            RValue::Double(_) => RType::Double,
            RValue::Character(_) => RType::Character,
            RValue::List(_) => RType::List,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RValue::Null => 0,
            RValue::Logical(v) => v.len(),
            RValue::Integer(v) => v.len(),
            RValue::Double(v) => v.len(),
            RValue::Character(v) => v.len(),
            RValue::List(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_list(&self) -> Option<&RList> {
        match self {
            RValue::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn into_list(self) -> Option<RList> {
        match self {
            RValue::List(list) => Some(list),
            _ => None,
        }
    }

    /// Numeric contents as nullable doubles. `None` for non-numeric values.
    pub fn to_f64_values(&self) -> Option<Vec<Option<f64>>> {
        match self {
            RValue::Double(v) => Some(v.clone()),
            RValue::Integer(v) => Some(v.iter().map(|x| x.map(f64::from)).collect()),
            _ => None,
        }
    }

    /// Atomic vector as an arrow array whose type mirrors the declared type
    pub fn to_array(&self) -> Result<ArrayRef> {
        let array: ArrayRef = match self {
            RValue::Null => Arc::new(NullArray::new(0)),
            RValue::Logical(v) => Arc::new(BooleanArray::from(v.clone())),
            RValue::Integer(v) => Arc::new(Int32Array::from(v.clone())),
            RValue::Double(v) => Arc::new(Float64Array::from(v.clone())),
            RValue::Character(v) => Arc::new(StringArray::from(v.clone())),
            RValue::List(_) => {
                return Err(FrameChartError::conversion(
                    "Nested lists cannot be converted to a table column",
                ))
            }
        };
        Ok(array)
    }
}

impl From<Vec<f64>> for RValue {
    fn from(value: Vec<f64>) -> Self {
        RValue::Double(value.into_iter().map(Some).collect())
    }
}

impl From<Vec<i32>> for RValue {
    fn from(value: Vec<i32>) -> Self {
        RValue::Integer(value.into_iter().map(Some).collect())
    }
}

impl From<Vec<&str>> for RValue {
    fn from(value: Vec<&str>) -> Self {
        RValue::Character(value.into_iter().map(|s| Some(s.to_string())).collect())
    }
}

impl From<RList> for RValue {
    fn from(value: RList) -> Self {
        RValue::List(value)
    }
}

/// Handle to a value that lives inside the interpreter.
///
/// Not `Clone`: the handle is consumed by `InterpreterTrait::release`.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct RObject {
    id: u64,
    rtype: RType,
}

impl RObject {
    pub fn new(id: u64, rtype: RType) -> Self {
        Self { id, rtype }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn rtype(&self) -> RType {
        self.rtype
    }
}
