use crate::error::{FrameChartError, Result, ResultWithContext};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};

pub fn is_numeric_datatype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
    )
}

/// Columns whose declared type is double. Only these are offered for axis selection.
pub fn is_selectable_datatype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float64)
}

/// Copy a numeric array into nullable f64 values, widening integers.
///
/// Nulls stay nulls. Non-numeric arrays are rejected rather than coerced.
pub fn to_f64_values(array: &ArrayRef) -> Result<Vec<Option<f64>>> {
    let dtype = array.data_type();
    if !is_numeric_datatype(dtype) {
        return Err(FrameChartError::column_not_numeric(format!(
            "Expected a numeric array, found {dtype}"
        )));
    }

    let array = if dtype == &DataType::Float64 {
        array.clone()
    } else {
        cast(array, &DataType::Float64)
            .with_context(|| format!("Failed to cast {dtype} array to Float64"))?
    };

    Ok(array.as_primitive::<Float64Type>().iter().collect())
}
