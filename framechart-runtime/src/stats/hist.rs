//! Histogram bins compatible with `hist(x, plot = FALSE)`

use crate::stats::pretty::{pretty, PrettyOpts};
use framechart_common::error::{FrameChartError, Result};
use framechart_core::value::{RList, RValue};

/// Largest number of bins that may be requested
pub const MAX_CLASSES: i64 = 100_000;

/// Sturges' rule: `ceiling(log2(n) + 1)` classes
pub fn sturges_classes(n: usize) -> i64 {
    if n == 0 {
        return 1;
    }
    ((n as f64).log2() + 1.0).ceil() as i64
}

#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    pub breaks: Vec<f64>,
    pub counts: Vec<i32>,
    pub density: Vec<f64>,
    pub mids: Vec<f64>,
    pub equidist: bool,
}

impl Histogram {
    /// Bin the finite values of `x`. Missing and non-finite values are ignored.
    ///
    /// `classes` is the suggested number of bins, Sturges' rule when `None`.
    /// Bins are right-closed and the lowest break is included in the first bin.
    pub fn try_new(x: &[Option<f64>], classes: Option<i64>) -> Result<Self> {
        let values: Vec<f64> = x.iter().flatten().copied().filter(|v| v.is_finite()).collect();
        if values.is_empty() {
            return Err(FrameChartError::interpreter(
                "hist: 'x' must contain at least one finite value",
            ));
        }

        let classes = classes.unwrap_or_else(|| sturges_classes(values.len()));
        if !(1..=MAX_CLASSES).contains(&classes) {
            return Err(FrameChartError::interpreter(format!(
                "hist: invalid number of 'breaks': {classes}"
            )));
        }

        let (lo, up) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, up), v| {
                (lo.min(*v), up.max(*v))
            });
        let breaks = pretty(lo, up, classes, &PrettyOpts::with_min_n(1));
        if breaks.len() < 2 {
            return Err(FrameChartError::internal(format!(
                "hist: breaks {breaks:?} do not span any bin"
            )));
        }

        let widths: Vec<f64> = breaks.windows(2).map(|w| w[1] - w[0]).collect();
        let counts = bin_counts(&values, &fuzzy_breaks(&breaks, &widths, up - lo));

        let n = values.len() as f64;
        let density = counts
            .iter()
            .zip(&widths)
            .map(|(count, width)| *count as f64 / (n * width))
            .collect();
        let mids = breaks.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect();

        let (min_width, max_width) = widths
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, up), w| {
                (lo.min(*w), up.max(*w))
            });
        let mean_width = widths.iter().sum::<f64>() / widths.len() as f64;
        let equidist = max_width - min_width < 1e-7 * mean_width;

        Ok(Self {
            breaks,
            counts,
            density,
            mids,
            equidist,
        })
    }

    /// The list `hist()` returns, with class `histogram`
    pub fn into_value(self, xname: &str) -> RValue {
        RList::named(vec![
            ("breaks", RValue::from(self.breaks)),
            ("counts", RValue::from(self.counts)),
            ("density", RValue::from(self.density)),
            ("mids", RValue::from(self.mids)),
            ("xname", RValue::from(vec![xname])),
            ("equidist", RValue::Logical(vec![Some(self.equidist)])),
        ])
        .with_class("histogram")
        .into()
    }
}

/// Breaks nudged so values sitting on a break land in the bin to its left,
/// with the first break nudged down so the minimum is counted.
fn fuzzy_breaks(breaks: &[f64], widths: &[f64], range: f64) -> Vec<f64> {
    let diddle = 1e-7
        * if breaks.len() > 5 {
            median(widths)
        } else if breaks.len() <= 3 {
            range
        } else {
            widths
                .iter()
                .copied()
                .filter(|w| *w > 0.0)
                .fold(f64::INFINITY, f64::min)
        };

    breaks
        .iter()
        .enumerate()
        .map(|(i, b)| if i == 0 { b - diddle } else { b + diddle })
        .collect()
}

fn bin_counts(values: &[f64], breaks: &[f64]) -> Vec<i32> {
    let last = breaks.len() - 1;
    let mut counts = vec![0; last];
    for x in values {
        if !(breaks[0] <= *x && *x <= breaks[last]) {
            continue;
        }
        let (mut lo, mut hi) = (0, last);
        while hi - lo >= 2 {
            let mid = (lo + hi) / 2;
            if *x > breaks[mid] {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        counts[lo] += 1;
    }
    counts
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    if n == 0 {
        f64::NAN
    } else if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets;
    use float_cmp::approx_eq;
    use rstest::rstest;

    fn iris_column(name: &str) -> Vec<Option<f64>> {
        let iris = datasets::builtin("iris").unwrap().unwrap();
        iris.as_list()
            .and_then(|df| df.get(name))
            .and_then(|column| column.to_f64_values())
            .unwrap()
    }

    fn assert_all_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!(approx_eq!(f64, *a, *e, epsilon = 1e-9), "{actual:?} vs {expected:?}");
        }
    }

    #[rstest(
        n, expected,
        case(1, 1),
        case(15, 5),
        case(50, 7),
        case(150, 9),
        case(1024, 11),
    )]
    fn test_sturges_classes(n: usize, expected: i64) {
        assert_eq!(sturges_classes(n), expected);
    }

    #[test]
    fn test_iris_sepal_length() {
        let hist = Histogram::try_new(&iris_column("Sepal.Length"), None).unwrap();
        assert_all_close(&hist.breaks, &[4.0, 4.5, 5.0, 5.5, 6.0, 6.5, 7.0, 7.5, 8.0]);
        assert_eq!(hist.counts, vec![5, 27, 27, 30, 31, 18, 6, 6]);
        assert_all_close(
            &hist.mids,
            &[4.25, 4.75, 5.25, 5.75, 6.25, 6.75, 7.25, 7.75],
        );
        assert_all_close(
            &hist.density,
            &[
                5.0 / 75.0,
                27.0 / 75.0,
                27.0 / 75.0,
                30.0 / 75.0,
                31.0 / 75.0,
                18.0 / 75.0,
                6.0 / 75.0,
                6.0 / 75.0,
            ],
        );
        assert!(hist.equidist);
    }

    #[rstest(
        column, counts,
        case("Sepal.Width", vec![4, 7, 13, 23, 36, 24, 18, 10, 9, 3, 2, 1]),
        case("Petal.Length", vec![37, 13, 0, 1, 4, 11, 21, 21, 17, 16, 5, 4]),
        case("Petal.Width", vec![34, 14, 2, 0, 7, 8, 21, 16, 14, 11, 9, 11, 3]),
    )]
    fn test_iris_counts(column: &str, counts: Vec<i32>) {
        let hist = Histogram::try_new(&iris_column(column), None).unwrap();
        assert_eq!(hist.counts, counts);
        assert_eq!(hist.counts.iter().sum::<i32>(), 150);
    }

    #[test]
    fn test_requested_classes() {
        let hist = Histogram::try_new(&iris_column("Sepal.Length"), Some(20)).unwrap();
        assert_eq!(hist.breaks.len(), 20);
        assert!(approx_eq!(f64, hist.breaks[0], 4.2, epsilon = 1e-9));
        assert_eq!(hist.counts.iter().sum::<i32>(), 150);
    }

    #[test]
    fn test_values_on_breaks_fall_left() {
        // 60 sits on a break and is counted in (58, 60]
        let x: Vec<Option<f64>> = (58..=72).map(|h| Some(h as f64)).collect();
        let hist = Histogram::try_new(&x, None).unwrap();
        assert_eq!(hist.counts, vec![3, 2, 2, 2, 2, 2, 2]);
    }

    #[test]
    fn test_missing_values_are_ignored() {
        let x = vec![Some(1.0), None, Some(f64::NAN), Some(2.0), Some(f64::INFINITY)];
        let hist = Histogram::try_new(&x, None).unwrap();
        assert_eq!(hist.counts.iter().sum::<i32>(), 2);
    }

    #[test]
    fn test_no_finite_values() {
        let err = Histogram::try_new(&[None, Some(f64::NAN)], None).unwrap_err();
        assert!(err.to_string().contains("finite"), "{err}");
    }

    #[test]
    fn test_invalid_breaks() {
        let err = Histogram::try_new(&[Some(1.0)], Some(0)).unwrap_err();
        assert!(err.to_string().contains("breaks"), "{err}");

        let err = Histogram::try_new(&[Some(1.0), Some(2.0)], Some(i64::MAX)).unwrap_err();
        assert!(err.to_string().contains("invalid number of 'breaks'"), "{err}");
    }

    #[test]
    fn test_into_value() {
        let value = Histogram::try_new(&[Some(1.0), Some(2.0)], None)
            .unwrap()
            .into_value("x");
        let list = value.as_list().unwrap();
        assert!(list.inherits("histogram"));
        assert_eq!(list.get("xname"), Some(&RValue::from(vec!["x"])));
        assert!(matches!(list.get("counts"), Some(RValue::Integer(_))));
        assert_eq!(list.get("mids").map(|m| m.len()), list.get("counts").map(|c| c.len()));
    }
}
