//! Center-meridian longitude wrapping.

/// Shift longitude `x` so that `center` maps to 0, wrapping into `[-180, 180]`.
///
/// For `lon = x - center`: values above 180 become `-180 + lon mod 180`,
/// values below -180 become `180 - |lon| mod 180`, anything else is kept.
pub fn wrap_longitude(x: f64, center: f64) -> f64 {
    let lon = x - center;
    if lon > 180.0 {
        -180.0 + lon.rem_euclid(180.0)
    } else if lon < -180.0 {
        180.0 - lon.abs().rem_euclid(180.0)
    } else {
        lon
    }
}

/// A wrapped position of exactly 180 coincides with -180; its label is not drawn.
pub fn is_boundary_duplicate(pos: f64) -> bool {
    pos == 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inside_range_unchanged() {
        assert_eq!(wrap_longitude(45.0, 0.0), 45.0);
        assert_eq!(wrap_longitude(-180.0, 0.0), -180.0);
        assert_eq!(wrap_longitude(180.0, 0.0), 180.0);
    }

    #[test]
    fn test_wraps_above() {
        assert_eq!(wrap_longitude(210.0, 0.0), -150.0);
        assert_eq!(wrap_longitude(90.0, -120.0), -150.0);
    }

    #[test]
    fn test_wraps_below() {
        assert_eq!(wrap_longitude(-210.0, 0.0), 150.0);
        assert_eq!(wrap_longitude(-90.0, 120.0), 150.0);
        assert!(is_boundary_duplicate(wrap_longitude(-360.0, 0.0)));
    }

    #[test]
    fn test_always_in_range() {
        for center in [-270.0, -90.0, 0.0, 45.0, 180.0, 333.0] {
            let mut x = -720.0;
            while x <= 720.0 {
                let pos = wrap_longitude(x, center);
                assert!(
                    (-180.0..=180.0).contains(&pos),
                    "x {} center {} -> {}",
                    x,
                    center,
                    pos
                );
                x += 7.5;
            }
        }
    }
}
