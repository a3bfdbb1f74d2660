use ndarray::{Array2, Zip};

/// Denominators with magnitude below this make a normalized difference undefined.
pub const DEGENERATE_EPS: f64 = 1e-10;

/// Normalized difference: (a - b) / (a + b), `None` when undefined
pub fn normalized_difference(a: f64, b: f64) -> Option<f64> {
    if !a.is_finite() || !b.is_finite() {
        return None;
    }
    let sum = a + b;
    if sum.abs() < DEGENERATE_EPS {
        return None;
    }
    Some((a - b) / sum)
}

/// Element-wise division by a nonzero constant
pub fn divide_array(a: &Array2<f64>, divisor: f64) -> Array2<f64> {
    Zip::from(a).par_map_collect(|&v| v / divisor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn normalized_difference_basic() {
        assert_relative_eq!(normalized_difference(0.8, 0.2).unwrap(), 0.6);
        assert_relative_eq!(normalized_difference(0.2, 0.8).unwrap(), -0.6);
        assert_relative_eq!(normalized_difference(0.5, 0.0).unwrap(), 1.0);
    }

    #[test]
    fn zero_denominator_is_undefined() {
        assert_eq!(normalized_difference(0.0, 0.0), None);
        assert_eq!(normalized_difference(0.3, -0.3), None);
        assert_eq!(normalized_difference(f64::NAN, 0.3), None);
        assert_eq!(normalized_difference(0.3, f64::INFINITY), None);
    }

    #[test]
    fn divide_is_elementwise() {
        let a = array![[0.8, 0.0], [1.0, 3.0]];
        assert_eq!(divide_array(&a, 2.0), array![[0.4, 0.0], [0.5, 1.5]]);
    }
}
