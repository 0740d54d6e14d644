//! Field statistics and camera arithmetic used by view refreshes.

use rayon::prelude::*;

use quickview_common::Bounds;

/// Field length above which statistics run in parallel
const PARALLEL_THRESHOLD: usize = 16_384;

/// Area-weighted average, `sum(v * a) / sum(a)`, skipping NaN values and
/// their areas.
///
/// Without weights (or with weights of the wrong length) the plain mean of
/// the non-NaN values is returned. All-NaN input averages to NaN.
pub fn area_weighted_average(values: &[f64], areas: Option<&[f64]>) -> f64 {
    let (sum, weight) = match areas {
        Some(areas) if areas.len() == values.len() => {
            let accumulate = |(v, a): (&f64, &f64)| {
                if v.is_nan() || a.is_nan() {
                    (0.0, 0.0)
                } else {
                    (v * a, *a)
                }
            };
            if values.len() >= PARALLEL_THRESHOLD {
                values
                    .par_iter()
                    .zip(areas.par_iter())
                    .map(accumulate)
                    .reduce(|| (0.0, 0.0), |x, y| (x.0 + y.0, x.1 + y.1))
            } else {
                values
                    .iter()
                    .zip(areas)
                    .map(accumulate)
                    .fold((0.0, 0.0), |x, y| (x.0 + y.0, x.1 + y.1))
            }
        }
        _ => values
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0.0), |acc, v| (acc.0 + v, acc.1 + 1.0)),
    };

    if weight == 0.0 {
        f64::NAN
    } else {
        sum / weight
    }
}

/// Finite min/max of a field, or `[NaN, NaN]` when nothing is finite.
pub fn data_range(values: &[f64]) -> [f64; 2] {
    renderer::finite_range(values).unwrap_or([f64::NAN, f64::NAN])
}

/// Parallel scale that fits `bounds` into a viewport of `size` pixels.
///
/// Wide data is fitted on width, tall data on height; `margin` pads the
/// result. Returns `None` for empty bounds or a degenerate viewport.
pub fn fit_parallel_scale(bounds: &Bounds, size: (usize, usize), margin: f64) -> Option<f64> {
    let (width, height) = size;
    if !bounds.is_valid() || width == 0 || height == 0 {
        return None;
    }
    let data_width = bounds.width();
    let data_height = bounds.height();
    if data_width <= 0.0 || data_height <= 0.0 {
        return None;
    }

    let viewport_aspect = width as f64 / height as f64;
    let data_aspect = data_width / data_height;
    let scale = if data_aspect > viewport_aspect {
        data_width / (2.0 * viewport_aspect) * margin
    } else {
        data_height / 2.0 * margin
    };
    Some(scale)
}

/// Camera offset of one pan step along `axis`: `ratio` of the extent span,
/// positive when `factor > 0`.
pub fn pan_offset(extents: &Bounds, axis: usize, factor: f64, ratio: f64) -> f64 {
    if axis > 2 || !extents.is_valid() {
        return 0.0;
    }
    let step = extents.span(axis) * ratio;
    if factor > 0.0 {
        step
    } else {
        -step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    #[test]
    fn test_weighted_average() {
        let avg = area_weighted_average(&[1.0, 2.0, 3.0], Some(&[1.0, 1.0, 2.0][..]));
        assert_approx_eq!(avg, 2.25, 1e-12);
    }

    #[test]
    fn test_weighted_average_skips_nan() {
        let avg = area_weighted_average(&[1.0, f64::NAN, 3.0], Some(&[1.0, 1.0, 2.0][..]));
        assert_approx_eq!(avg, 7.0 / 3.0, 1e-12);
    }

    #[test]
    fn test_average_all_nan() {
        assert!(area_weighted_average(&[f64::NAN, f64::NAN], Some(&[1.0, 1.0][..])).is_nan());
        assert!(area_weighted_average(&[], None).is_nan());
    }

    #[test]
    fn test_unweighted_fallback() {
        assert_approx_eq!(area_weighted_average(&[1.0, 2.0, f64::NAN, 3.0], None), 2.0, 1e-12);
        // Length mismatch falls back too
        assert_approx_eq!(area_weighted_average(&[1.0, 3.0], Some(&[1.0][..])), 2.0, 1e-12);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let n = PARALLEL_THRESHOLD + 10;
        let values: Vec<f64> = (0..n).map(|i| (i % 7) as f64).collect();
        let areas: Vec<f64> = (0..n).map(|i| 1.0 + (i % 3) as f64).collect();
        let expected = values.iter().zip(&areas).map(|(v, a)| v * a).sum::<f64>() / areas.iter().sum::<f64>();
        assert_approx_eq!(area_weighted_average(&values, Some(areas.as_slice())), expected, 1e-9);
    }

    #[test]
    fn test_data_range() {
        assert_eq!(data_range(&[3.0, f64::NAN, -1.0, f64::INFINITY]), [-1.0, 3.0]);
        let empty = data_range(&[f64::NAN]);
        assert!(empty[0].is_nan() && empty[1].is_nan());
    }

    #[test]
    fn test_fit_scale_wide_data() {
        let bounds = Bounds::new(-180.0, 180.0, -90.0, 90.0, 0.0, 0.0);
        // 2:1 data in a 4:3 viewport is fitted on width
        let scale = fit_parallel_scale(&bounds, (800, 600), 1.05).unwrap();
        assert_approx_eq!(scale, 360.0 / (2.0 * 800.0 / 600.0) * 1.05, 1e-9);
    }

    #[test]
    fn test_fit_scale_tall_data() {
        let bounds = Bounds::new(0.0, 10.0, 0.0, 40.0, 0.0, 0.0);
        assert_approx_eq!(fit_parallel_scale(&bounds, (800, 600), 1.0).unwrap(), 20.0, 1e-12);
        assert!(fit_parallel_scale(&Bounds::empty(), (800, 600), 1.0).is_none());
    }

    #[test]
    fn test_pan_offset() {
        let extents = Bounds::new(-180.0, 180.0, -90.0, 90.0, 0.0, 0.0);
        assert_approx_eq!(pan_offset(&extents, 0, 1.0, 0.05), 18.0, 1e-12);
        assert_approx_eq!(pan_offset(&extents, 1, -1.0, 0.05), -9.0, 1e-12);
        assert_eq!(pan_offset(&extents, 3, 1.0, 0.05), 0.0);
    }
}
