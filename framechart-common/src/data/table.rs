use arrow::{
    array::{Array, ArrayRef, AsArray},
    datatypes::{DataType, Field, Float64Type, Int32Type, Schema, SchemaRef},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::sync::Arc;

use crate::error::{FrameChartError, Result};

/// Header and accessor key of one table column, as consumed by table widgets
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    pub header: String,
    pub accessor: String,
}

/// Named, ordered columns copied out of the interpreter.
///
/// Every column carries its declared type as the arrow `DataType` of its field.
/// Columns are expected to share one length; `try_new` does not enforce it so that
/// consumers can detect and report ragged input instead of silently truncating.
#[derive(Clone, Debug)]
pub struct ColumnarTable {
    pub schema: SchemaRef,
    pub columns: Vec<ArrayRef>,
}

impl ColumnarTable {
    pub fn try_new(schema: SchemaRef, columns: Vec<ArrayRef>) -> Result<Self> {
        if schema.fields().len() != columns.len() {
            return Err(FrameChartError::internal(format!(
                "Schema has {} fields but {} columns were provided",
                schema.fields().len(),
                columns.len()
            )));
        }

        for (field, column) in schema.fields().iter().zip(&columns) {
            if field.data_type() != column.data_type() {
                return Err(FrameChartError::internal(format!(
                    "Column {} declared as {} but holds {}",
                    field.name(),
                    field.data_type(),
                    column.data_type()
                )));
            }
        }

        // Make all columns nullable
        let schema_fields: Vec<_> = schema
            .fields()
            .iter()
            .map(|f| f.as_ref().clone().with_nullable(true))
            .collect();

        Ok(Self {
            schema: Arc::new(Schema::new(schema_fields)),
            columns,
        })
    }

    pub fn from_columns(columns: Vec<(String, ArrayRef)>) -> Result<Self> {
        let fields: Vec<Field> = columns
            .iter()
            .map(|(name, array)| Field::new(name, array.data_type().clone(), true))
            .collect();
        let arrays = columns.into_iter().map(|(_, array)| array).collect();
        Self::try_new(Arc::new(Schema::new(fields)), arrays)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Row count of the table, taken from the first column
    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_rectangular(&self) -> bool {
        let num_rows = self.num_rows();
        self.columns.iter().all(|c| c.len() == num_rows)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Position of the first column whose name matches exactly
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.fields().iter().position(|f| f.name() == name)
    }

    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    pub fn data_type(&self, name: &str) -> Option<&DataType> {
        self.column_index(name)
            .map(|i| self.schema.field(i).data_type())
    }

    /// Keep, at most, the first n rows of every column
    pub fn head(&self, n: usize) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|c| c.slice(0, n.min(c.len())))
            .collect();
        Self {
            schema: self.schema.clone(),
            columns,
        }
    }

    fn check_rectangular(&self) -> Result<()> {
        if self.is_rectangular() {
            return Ok(());
        }
        let lengths = self
            .schema
            .fields()
            .iter()
            .zip(&self.columns)
            .map(|(f, c)| format!("{}={}", f.name(), c.len()))
            .collect::<Vec<_>>()
            .join(", ");
        Err(FrameChartError::row_count_mismatch(format!(
            "Columns have different lengths: {lengths}"
        )))
    }

    /// Column headers with positional accessors (`col0`, `col1`, ...)
    pub fn table_columns(&self) -> Vec<TableColumn> {
        self.schema
            .fields()
            .iter()
            .enumerate()
            .map(|(i, f)| TableColumn {
                header: f.name().clone(),
                accessor: format!("col{i}"),
            })
            .collect()
    }

    /// One JSON object per row, keyed by the accessors of `table_columns`
    pub fn to_json_rows(&self) -> Result<Value> {
        self.check_rectangular()?;
        let accessors: Vec<String> = self
            .table_columns()
            .into_iter()
            .map(|c| c.accessor)
            .collect();

        let mut rows: Vec<Value> = Vec::with_capacity(self.num_rows());
        for row in 0..self.num_rows() {
            let mut record = Map::new();
            for (accessor, column) in accessors.iter().zip(&self.columns) {
                record.insert(accessor.clone(), array_value_to_json(column, row)?);
            }
            rows.push(Value::Object(record));
        }
        Ok(Value::Array(rows))
    }
}

fn array_value_to_json(array: &ArrayRef, row: usize) -> Result<Value> {
    if array.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match array.data_type() {
        DataType::Null => Value::Null,
        DataType::Boolean => Value::Bool(array.as_boolean().value(row)),
        DataType::Int32 => Value::from(array.as_primitive::<Int32Type>().value(row)),
        // NaN and infinities have no JSON representation
        DataType::Float64 => Number::from_f64(array.as_primitive::<Float64Type>().value(row))
            .map(Value::Number)
            .unwrap_or(Value::Null),
        DataType::Utf8 => Value::String(array.as_string::<i32>().value(row).to_string()),
        dtype => {
            return Err(FrameChartError::conversion(format!(
                "Unsupported column type for JSON output: {dtype}"
            )))
        }
    };
    Ok(value)
}
