//! Data frames available to every `LocalInterpreter` without loading anything

use framechart_common::error::{FrameChartError, Result, ResultWithContext};
use framechart_core::value::{RList, RValue};

const BUILTIN: &[(&str, &str)] = &[
    ("iris", include_str!("../data/iris.csv")),
    ("cars", include_str!("../data/cars.csv")),
    ("women", include_str!("../data/women.csv")),
];

pub fn builtin_names() -> Vec<&'static str> {
    BUILTIN.iter().map(|(name, _)| *name).collect()
}

/// Parse the built-in data frame called `name`, `None` if there is no such dataset
pub fn builtin(name: &str) -> Result<Option<RValue>> {
    match BUILTIN.iter().find(|(n, _)| *n == name) {
        Some((_, csv)) => parse_csv(csv)
            .with_context(|| format!("Failed to parse built-in dataset {name}"))
            .map(Some),
        None => Ok(None),
    }
}

/// Read comma separated text with a header row into a data frame.
///
/// A column whose every cell is a number or `NA` becomes a double vector,
/// anything else a character vector. Quoted fields may contain commas.
pub fn parse_csv(text: &str) -> Result<RValue> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let names: Vec<String> = reader
        .headers()
        .map_err(|err| FrameChartError::parse(format!("Invalid CSV header: {err}")))?
        .iter()
        .map(String::from)
        .collect();
    if names.is_empty() {
        return Err(FrameChartError::parse("CSV text has no header row"));
    }

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); names.len()];
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|err| match err.kind() {
            csv::ErrorKind::UnequalLengths {
                expected_len, len, ..
            } => FrameChartError::row_count_mismatch(format!(
                "Row {} has {len} fields, the header has {expected_len}",
                i + 1
            )),
            _ => FrameChartError::parse(format!("Invalid CSV row {}: {err}", i + 1)),
        })?;
        for (column, cell) in cells.iter_mut().zip(record.iter()) {
            column.push(cell.to_string());
        }
    }

    let columns: Vec<(String, RValue)> = names
        .into_iter()
        .zip(cells)
        .map(|(name, column)| (name, parse_column(&column)))
        .collect();
    Ok(RList::named(columns).with_class("data.frame").into())
}

fn parse_column(cells: &[String]) -> RValue {
    let numbers: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|cell| match cell.as_str() {
            "NA" => Some(None),
            cell => cell.parse::<f64>().ok().map(Some),
        })
        .collect();

    match numbers {
        Some(numbers) => RValue::Double(numbers),
        None => RValue::Character(
            cells
                .iter()
                .map(|cell| match cell.as_str() {
                    "NA" => None,
                    cell => Some(cell.to_string()),
                })
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framechart_core::value::RType;
    use rstest::rstest;

    #[rstest(
        name, rows, columns,
        case("iris", 150, vec!["Sepal.Length", "Sepal.Width", "Petal.Length", "Petal.Width", "Species"]),
        case("cars", 50, vec!["speed", "dist"]),
        case("women", 15, vec!["height", "weight"]),
    )]
    fn test_builtin_shape(name: &str, rows: usize, columns: Vec<&str>) {
        let value = builtin(name).unwrap().unwrap();
        let df = value.as_list().unwrap();
        assert!(df.inherits("data.frame"));
        let names: Vec<_> = (0..df.len()).filter_map(|i| df.name(i)).collect();
        assert_eq!(names, columns);
        assert!(df.values.iter().all(|column| column.len() == rows));
    }

    #[test]
    fn test_iris_types() {
        let value = builtin("iris").unwrap().unwrap();
        let df = value.as_list().unwrap();
        assert_eq!(df.get("Sepal.Length").map(|c| c.rtype()), Some(RType::Double));
        assert_eq!(df.get("Species").map(|c| c.rtype()), Some(RType::Character));
    }

    #[test]
    fn test_unknown_dataset() {
        assert_eq!(builtin("mtcars").unwrap(), None);
    }

    #[test]
    fn test_parse_csv_na() {
        let value = parse_csv("a,b\n1,x\nNA,NA\n").unwrap();
        let df = value.as_list().unwrap();
        assert_eq!(df.get("a"), Some(&RValue::Double(vec![Some(1.0), None])));
        assert_eq!(
            df.get("b"),
            Some(&RValue::Character(vec![Some("x".to_string()), None]))
        );
    }

    #[test]
    fn test_parse_csv_ragged_row() {
        let err = parse_csv("a,b\n1,2\n3\n").unwrap_err();
        assert!(err.is_row_count_mismatch());
    }

    #[test]
    fn test_parse_csv_quoted_fields() {
        let value = parse_csv("label,value\n\"setosa, var\",1.5\nplain,2\n").unwrap();
        let df = value.as_list().unwrap();
        assert_eq!(
            df.get("label"),
            Some(&RValue::Character(vec![
                Some("setosa, var".to_string()),
                Some("plain".to_string())
            ]))
        );
        assert_eq!(df.get("value"), Some(&RValue::from(vec![1.5, 2.0])));
    }

    #[test]
    fn test_parse_csv_without_header() {
        assert!(parse_csv("").is_err());
    }
}
