use serde::{Deserialize, Serialize};

use crate::error::{FrameChartError, Result};

/// A single chart point. Missing values are kept as `None` and serialize to `null`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl Coordinate {
    pub fn new(x: Option<f64>, y: Option<f64>) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoordinateSeries(Vec<Coordinate>);

impl CoordinateSeries {
    /// Zip two parallel value arrays into points.
    ///
    /// Fails without producing any points when the arrays differ in length.
    pub fn try_from_parallel(xs: Vec<Option<f64>>, ys: Vec<Option<f64>>) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(FrameChartError::row_count_mismatch(format!(
                "x has {} values but y has {}",
                xs.len(),
                ys.len()
            )));
        }
        Ok(Self(
            xs.into_iter()
                .zip(ys)
                .map(|(x, y)| Coordinate { x, y })
                .collect(),
        ))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Coordinate> {
        self.0.iter()
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.0
    }
}

impl From<Vec<Coordinate>> for CoordinateSeries {
    fn from(value: Vec<Coordinate>) -> Self {
        Self(value)
    }
}

impl IntoIterator for CoordinateSeries {
    type Item = Coordinate;
    type IntoIter = std::vec::IntoIter<Coordinate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a CoordinateSeries {
    type Item = &'a Coordinate;
    type IntoIter = std::slice::Iter<'a, Coordinate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nulls_serialize_as_null() {
        let series =
            CoordinateSeries::try_from_parallel(vec![Some(5.1), None], vec![Some(3.5), Some(3.0)])
                .unwrap();
        assert_eq!(
            serde_json::to_value(&series).unwrap(),
            json!([{"x": 5.1, "y": 3.5}, {"x": null, "y": 3.0}])
        );
    }

    #[test]
    fn test_length_mismatch_produces_nothing() {
        let err = CoordinateSeries::try_from_parallel(vec![Some(1.0), Some(2.0)], vec![Some(1.0)])
            .unwrap_err();
        assert!(err.is_row_count_mismatch());
    }
}
