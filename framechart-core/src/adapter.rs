//! Conversion of interpreter data frames into chart and table data.
//!
//! The functions here are pure: they never talk to the interpreter. Views combine
//! them with an `InterpreterHandle` to load and reshape data.
use crate::value::RValue;
use framechart_common::arrow::array::ArrayRef;
use framechart_common::data::coordinates::CoordinateSeries;
use framechart_common::data::table::ColumnarTable;
use framechart_common::datatypes::{is_selectable_datatype, to_f64_values};
use framechart_common::error::{FrameChartError, Result, ResultWithContext};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Number of axes a view needs selected
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axes {
    One,
    Two,
}

impl Axes {
    pub fn count(&self) -> usize {
        match self {
            Axes::One => 1,
            Axes::Two => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSelection {
    Single(String),
    Pair { x: String, y: String },
}

impl ColumnSelection {
    pub fn names(&self) -> Vec<&str> {
        match self {
            ColumnSelection::Single(column) => vec![column.as_str()],
            ColumnSelection::Pair { x, y } => vec![x.as_str(), y.as_str()],
        }
    }

    /// True when every selected name is one of `columns`
    pub fn is_within(&self, columns: &[String]) -> bool {
        self.names()
            .iter()
            .all(|name| columns.iter().any(|c| c == name))
    }
}

/// Convert a named list (data frame) into a `ColumnarTable`.
///
/// Elements without a name, or with an empty name, are dropped together with their
/// values. Nested list elements cannot be represented as a column and are skipped.
pub fn table_from_value(value: RValue) -> Result<ColumnarTable> {
    let rtype = value.rtype();
    let list = value.into_list().ok_or_else(|| {
        FrameChartError::conversion(format!(
            "Expected a data frame or named list, received a {rtype} vector"
        ))
    })?;

    let Some(names) = list.names else {
        return Err(FrameChartError::conversion(
            "Expected a named list, received a list without names",
        ));
    };

    let mut columns: Vec<(String, ArrayRef)> = Vec::with_capacity(list.values.len());
    for (name, column) in names.into_iter().zip(list.values) {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            continue;
        };
        if let RValue::List(_) = column {
            log::warn!("Skipping nested list column {name}");
            continue;
        }
        let array = column
            .to_array()
            .with_context(|| format!("Failed to convert column {name}"))?;
        columns.push((name, array));
    }

    ColumnarTable::from_columns(columns)
}

/// Names of the columns that can be offered for axis selection, in table order.
///
/// Only double columns with a non-empty name qualify. An empty result means
/// selection is unavailable; it is not an error.
pub fn list_numeric_columns(table: &ColumnarTable) -> Vec<String> {
    table
        .schema
        .fields()
        .iter()
        .filter(|f| !f.name().is_empty() && is_selectable_datatype(f.data_type()))
        .map(|f| f.name().clone())
        .collect()
}

/// First `axes.count()` columns, or `None` when there are not enough of them
pub fn default_selection(columns: &[String], axes: Axes) -> Option<ColumnSelection> {
    match (axes, columns) {
        (Axes::One, [first, ..]) => Some(ColumnSelection::Single(first.clone())),
        (Axes::Two, [first, second, ..]) => Some(ColumnSelection::Pair {
            x: first.clone(),
            y: second.clone(),
        }),
        _ => None,
    }
}

fn column_values(table: &ColumnarTable, name: &str) -> Result<Vec<Option<f64>>> {
    let column = table.column(name).ok_or_else(|| {
        FrameChartError::column_not_found(format!(
            "{name} is not one of [{}]",
            table.column_names().iter().join(", ")
        ))
    })?;
    to_f64_values(column).with_context(|| format!("Column {name} cannot be plotted"))
}

/// One point per row, `x` and `y` taken from the named columns.
///
/// Nulls are carried through as null coordinates. Columns of different length
/// produce `RowCountMismatch` and no points.
pub fn build_coordinates(table: &ColumnarTable, x: &str, y: &str) -> Result<CoordinateSeries> {
    let xs = column_values(table, x)?;
    let ys = column_values(table, y)?;
    CoordinateSeries::try_from_parallel(xs, ys)
        .with_context(|| format!("Failed to pair columns {x} and {y}"))
}

/// Reshape the result of the interpreter's `hist()` into `{x: mid, y: count}` points,
/// in the order the interpreter returned the bins.
pub fn build_histogram_bins(value: &RValue) -> Result<CoordinateSeries> {
    let list = value.as_list().ok_or_else(|| {
        FrameChartError::conversion(format!(
            "Expected a histogram list, received a {} vector",
            value.rtype()
        ))
    })?;

    let parallel = |name: &str| -> Result<Vec<Option<f64>>> {
        let element = list.get(name).ok_or_else(|| {
            FrameChartError::conversion(format!("Histogram result has no {name} element"))
        })?;
        element.to_f64_values().ok_or_else(|| {
            FrameChartError::conversion(format!(
                "Histogram {name} must be numeric, found {}",
                element.rtype()
            ))
        })
    };

    let mids = parallel("mids")?;
    let counts = parallel("counts")?;
    CoordinateSeries::try_from_parallel(mids, counts)
        .with_context(|| "Histogram mids and counts differ in length")
}

const RESERVED_WORDS: &[&str] = &[
    "if", "else", "repeat", "while", "function", "for", "in", "next", "break", "TRUE", "FALSE",
    "NULL", "Inf", "NaN", "NA",
];

/// True when `name` can be written in an expression without backquotes
pub fn is_syntactic_name(name: &str) -> bool {
    let mut chars = name.chars();
    let valid_start = match chars.next() {
        Some('.') => !name[1..].starts_with(|c: char| c.is_ascii_digit()),
        Some(c) => c.is_ascii_alphabetic(),
        None => false,
    };
    valid_start
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
        && !RESERVED_WORDS.contains(&name)
}

/// `name` as written in an expression, backquoted unless it is syntactic
pub fn quote_name(name: &str) -> String {
    if is_syntactic_name(name) {
        name.to_string()
    } else {
        format!("`{name}`")
    }
}

/// Interpreter expression computing histogram bins of one data frame column.
///
/// `dataset` is an expression and is used as is; `column` is a name and is quoted
/// when needed.
pub fn histogram_expression(dataset: &str, column: &str, breaks: Option<usize>) -> String {
    let column = quote_name(column);
    match breaks {
        Some(breaks) => format!("hist({dataset}${column}, breaks = {breaks}, plot = FALSE)"),
        None => format!("hist({dataset}${column}, plot = FALSE)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::RList;
    use framechart_common::arrow::datatypes::DataType;
    use framechart_common::data::coordinates::Coordinate;
    use rstest::rstest;

    fn iris_head() -> RValue {
        RList::named(vec![
            ("sepalLength", RValue::from(vec![5.1, 4.9])),
            ("sepalWidth", RValue::from(vec![3.5, 3.0])),
            ("species", RValue::from(vec!["setosa", "setosa"])),
        ])
        .with_class("data.frame")
        .into()
    }

    #[test]
    fn test_iris_scenario() {
        let table = table_from_value(iris_head()).unwrap();
        let columns = list_numeric_columns(&table);
        assert_eq!(columns, vec!["sepalLength", "sepalWidth"]);

        let selection = default_selection(&columns, Axes::Two).unwrap();
        assert_eq!(
            selection,
            ColumnSelection::Pair {
                x: "sepalLength".to_string(),
                y: "sepalWidth".to_string()
            }
        );

        let coords = build_coordinates(&table, "sepalLength", "sepalWidth").unwrap();
        assert_eq!(
            coords.points(),
            &[
                Coordinate::new(Some(5.1), Some(3.5)),
                Coordinate::new(Some(4.9), Some(3.0))
            ]
        );
    }

    #[test]
    fn test_unnamed_and_nested_columns_are_dropped() {
        let value = RValue::List(RList::new(
            Some(vec![
                Some("a".to_string()),
                None,
                Some(String::new()),
                Some("nested".to_string()),
                Some("b".to_string()),
            ]),
            vec![
                RValue::from(vec![1.0]),
                RValue::from(vec![2.0]),
                RValue::from(vec![3.0]),
                RValue::List(RList::default()),
                RValue::from(vec![1]),
            ],
        ));
        let table = table_from_value(value).unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(table.data_type("b"), Some(&DataType::Int32));
        assert_eq!(list_numeric_columns(&table), vec!["a"]);
    }

    #[test]
    fn test_atomic_value_is_not_a_table() {
        let err = table_from_value(RValue::from(vec![1.0])).unwrap_err();
        assert!(err.to_string().contains("received a double vector"));

        let unnamed = RValue::List(RList::new(None, vec![RValue::from(vec![1.0])]));
        assert!(matches!(
            table_from_value(unnamed).unwrap_err(),
            FrameChartError::ConversionError(..)
        ));
    }

    #[rstest(
        columns,
        axes,
        expected,
        case(vec![], Axes::One, None),
        case(vec!["a"], Axes::One, Some(ColumnSelection::Single("a".to_string()))),
        case(vec!["a"], Axes::Two, None),
        case(vec!["a", "b", "c"], Axes::Two, Some(ColumnSelection::Pair { x: "a".to_string(), y: "b".to_string() })),
    )]
    fn test_default_selection(columns: Vec<&str>, axes: Axes, expected: Option<ColumnSelection>) {
        let columns: Vec<String> = columns.into_iter().map(String::from).collect();
        assert_eq!(default_selection(&columns, axes), expected);
    }

    #[test]
    fn test_missing_column() {
        let table = table_from_value(iris_head()).unwrap();
        let err = build_coordinates(&table, "sepalLength", "petalWidth").unwrap_err();
        assert!(err.is_column_not_found());
    }

    #[test]
    fn test_non_numeric_column() {
        let table = table_from_value(iris_head()).unwrap();
        let err = build_coordinates(&table, "species", "sepalWidth").unwrap_err();
        assert!(matches!(err, FrameChartError::ColumnNotNumeric(..)));
    }

    #[test]
    fn test_null_propagates() {
        let value = RList::named(vec![
            ("x", RValue::Double(vec![Some(1.0), Some(2.0), None])),
            ("y", RValue::Double(vec![Some(4.0), Some(5.0), Some(6.0)])),
        ]);
        let table = table_from_value(value.into()).unwrap();
        let coords = build_coordinates(&table, "x", "y").unwrap();
        assert_eq!(coords.len(), 3);
        assert_eq!(coords.points()[2], Coordinate::new(None, Some(6.0)));
    }

    #[test]
    fn test_ragged_columns() {
        let value = RList::named(vec![
            ("x", RValue::from(vec![1.0, 2.0, 3.0])),
            ("y", RValue::from(vec![1.0, 2.0])),
        ]);
        let table = table_from_value(value.into()).unwrap();
        let err = build_coordinates(&table, "x", "y").unwrap_err();
        assert!(err.is_row_count_mismatch());
    }

    #[test]
    fn test_coordinates_are_repeatable() {
        let table = table_from_value(iris_head()).unwrap();
        let first = build_coordinates(&table, "sepalWidth", "sepalLength").unwrap();
        let second = build_coordinates(&table, "sepalWidth", "sepalLength").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_histogram_bins() {
        let hist = RList::named(vec![
            ("breaks", RValue::from(vec![4.0, 5.0, 6.0, 7.0])),
            ("counts", RValue::from(vec![3, 0, 1])),
            ("density", RValue::from(vec![0.75, 0.0, 0.25])),
            ("mids", RValue::from(vec![4.5, 5.5, 6.5])),
        ])
        .with_class("histogram");

        let bins = build_histogram_bins(&hist.into()).unwrap();
        assert_eq!(
            bins.points(),
            &[
                Coordinate::new(Some(4.5), Some(3.0)),
                Coordinate::new(Some(5.5), Some(0.0)),
                Coordinate::new(Some(6.5), Some(1.0)),
            ]
        );
    }

    #[test]
    fn test_histogram_without_mids() {
        let hist = RList::named(vec![("counts", RValue::from(vec![1]))]);
        let err = build_histogram_bins(&hist.into()).unwrap_err();
        assert!(err.to_string().contains("no mids element"));
    }

    #[test]
    fn test_histogram_expression() {
        assert_eq!(
            histogram_expression("iris", "Sepal.Length", None),
            "hist(iris$Sepal.Length, plot = FALSE)"
        );
        assert_eq!(
            histogram_expression("iris", "Sepal.Length", Some(20)),
            "hist(iris$Sepal.Length, breaks = 20, plot = FALSE)"
        );
        assert_eq!(
            histogram_expression("head(survey, 10)", "Sepal Length", None),
            "hist(head(survey, 10)$`Sepal Length`, plot = FALSE)"
        );
    }

    #[rstest(
        name, expected,
        case("Sepal.Length", "Sepal.Length"),
        case(".hidden", ".hidden"),
        case("x_1", "x_1"),
        case("Sepal Length", "`Sepal Length`"),
        case("2019", "`2019`"),
        case(".5x", "`.5x`"),
        case("TRUE", "`TRUE`"),
        case("", "``"),
    )]
    fn test_quote_name(name: &str, expected: &str) {
        assert_eq!(quote_name(name), expected);
    }
}
