//! "Pretty" breakpoints: about `n` equally spaced round values covering a range,
//! with step sizes of 1, 2 or 5 times a power of ten.

const ROUNDING_EPS: f64 = 1e-10;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrettyOpts {
    /// Smallest number of intervals to return
    pub min_n: i64,
    /// Factor applied to the cell size when the range is tiny compared to its magnitude
    pub shrink_sml: f64,
    /// Bias towards larger units
    pub high_u_bias: f64,
    /// Bias towards unit 5 over unit 2
    pub u5_bias: f64,
}

impl PrettyOpts {
    pub fn with_min_n(min_n: i64) -> Self {
        Self {
            min_n,
            ..Default::default()
        }
    }
}

impl Default for PrettyOpts {
    fn default() -> Self {
        let high_u_bias = 1.5;
        Self {
            min_n: 1,
            shrink_sml: 0.75,
            high_u_bias,
            u5_bias: 0.5 + 1.5 * high_u_bias,
        }
    }
}

/// Compute the interval `[lo, up]` and its number of intervals
fn pretty_bounds(lo: f64, up: f64, ndiv: i64, opts: &PrettyOpts) -> (f64, f64, i64) {
    let h = opts.high_u_bias;
    let h5 = opts.u5_bias;

    let dx = up - lo;
    let mut cell;
    let i_small;
    if dx == 0.0 && up == 0.0 {
        cell = 1.0;
        i_small = true;
    } else {
        cell = lo.abs().max(up.abs());
        let u = 1.0
            + if h5 >= 1.5 * h + 0.5 {
                1.0 / (1.0 + h)
            } else {
                1.5 / (1.0 + h5)
            };
        let u = u * (ndiv.max(1) as f64) * f64::EPSILON;
        i_small = dx < cell * u * 3.0;
    }

    if i_small {
        if cell > 10.0 {
            cell = 9.0 + cell / 10.0;
        }
        cell *= opts.shrink_sml;
        if opts.min_n > 1 {
            cell /= opts.min_n as f64;
        }
    } else {
        cell = dx;
        if ndiv > 1 {
            cell /= ndiv as f64;
        }
    }

    if cell < 20.0 * f64::MIN_POSITIVE {
        cell = 20.0 * f64::MIN_POSITIVE;
    } else if cell * 10.0 > f64::MAX {
        cell = 0.1 * f64::MAX;
    }

    let base = 10f64.powf(cell.log10().floor());
    let mut unit = base;
    if 2.0 * base - cell < h * (cell - unit) {
        unit = 2.0 * base;
        if 5.0 * base - cell < h5 * (cell - unit) {
            unit = 5.0 * base;
            if 10.0 * base - cell < h * (cell - unit) {
                unit = 10.0 * base;
            }
        }
    }

    let mut ns = (lo / unit + ROUNDING_EPS).floor();
    let mut nu = (up / unit - ROUNDING_EPS).ceil();
    while ns * unit > lo + ROUNDING_EPS * unit {
        ns -= 1.0;
    }
    while nu * unit < up - ROUNDING_EPS * unit {
        nu += 1.0;
    }

    let mut k = (0.5 + nu - ns) as i64;
    let ndiv = if k < opts.min_n {
        k = opts.min_n - k;
        let half = (k / 2) as f64;
        let rest = (k / 2 + k % 2) as f64;
        if ns >= 0.0 {
            nu += half;
            ns -= rest;
        } else {
            ns -= half;
            nu += rest;
        }
        opts.min_n
    } else {
        k
    };

    (ns * unit, nu * unit, ndiv)
}

/// Breakpoints covering `[lo, up]` in roughly `n` intervals
pub fn pretty(lo: f64, up: f64, n: i64, opts: &PrettyOpts) -> Vec<f64> {
    let (l, u, ndiv) = pretty_bounds(lo, up, n, opts);
    if ndiv == 0 {
        return vec![l];
    }

    let by = (u - l) / ndiv as f64;
    let mut breaks: Vec<f64> = (0..=ndiv).map(|i| l + i as f64 * by).collect();
    // Pin the end point exactly
    if let Some(last) = breaks.last_mut() {
        *last = u;
    }

    // Snap values that are zero up to rounding
    let delta = (u - l) / ndiv as f64;
    for b in breaks.iter_mut() {
        if b.abs() < 1e-14 * delta {
            *b = 0.0;
        }
    }
    breaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use rstest::rstest;

    fn assert_breaks(actual: Vec<f64>, expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!(approx_eq!(f64, *a, *e, epsilon = 1e-9), "{actual:?} vs {expected:?}");
        }
    }

    #[rstest(
        lo, up, n, expected,
        // range(iris$Sepal.Length) with Sturges' 9 classes
        case(4.3, 7.9, 9, &[4.0, 4.5, 5.0, 5.5, 6.0, 6.5, 7.0, 7.5, 8.0]),
        // range(iris$Sepal.Width)
        case(2.0, 4.4, 9, &[2.0, 2.2, 2.4, 2.6, 2.8, 3.0, 3.2, 3.4, 3.6, 3.8, 4.0, 4.2, 4.4]),
        // range(women$height) with 5 classes
        case(58.0, 72.0, 5, &[58.0, 60.0, 62.0, 64.0, 66.0, 68.0, 70.0, 72.0]),
        case(0.0, 100.0, 5, &[0.0, 20.0, 40.0, 60.0, 80.0, 100.0]),
        case(-1.0, 1.0, 4, &[-1.0, -0.5, 0.0, 0.5, 1.0]),
    )]
    fn test_pretty(lo: f64, up: f64, n: i64, expected: &[f64]) {
        assert_breaks(pretty(lo, up, n, &PrettyOpts::default()), expected);
    }

    #[test]
    fn test_pretty_degenerate_range_has_one_interval() {
        let breaks = pretty(5.0, 5.0, 3, &PrettyOpts::default());
        assert_eq!(breaks.len(), 2);
        assert!(breaks[0] < 5.0 && breaks[1] >= 5.0);
    }
}
