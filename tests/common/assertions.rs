//! Floating-point assertions over dataset values.

use wrfcf::Variable;

/// Tolerance used when none is given
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// `|actual - expected| <= epsilon`, defaulting to [`DEFAULT_EPSILON`]
pub fn assert_approx_eq(actual: f64, expected: f64, epsilon: Option<f64>) {
    let epsilon = epsilon.unwrap_or(DEFAULT_EPSILON);
    assert!(
        (actual - expected).abs() <= epsilon,
        "{} is not within {} of {}",
        actual,
        epsilon,
        expected
    );
}

/// Agreement to `decimal` places, `|actual - expected| < 1.5 * 10^-decimal`
pub fn assert_almost_equal_decimal(actual: f64, expected: f64, decimal: i32) {
    let tolerance = 1.5 * 10f64.powi(-decimal);
    assert!(
        (actual - expected).abs() < tolerance,
        "{} and {} differ at {} decimals",
        actual,
        expected,
        decimal
    );
}

/// Element-wise [`assert_approx_eq`] over equally long slices
pub fn assert_array_approx_eq(actual: &[f64], expected: &[f64], epsilon: Option<f64>) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    let epsilon = epsilon.unwrap_or(DEFAULT_EPSILON);
    if let Some(i) = actual
        .iter()
        .zip(expected)
        .position(|(a, e)| (a - e).abs() > epsilon)
    {
        panic!(
            "index {}: {} is not within {} of {} ({:?} vs {:?})",
            i, actual[i], epsilon, expected[i], actual, expected
        );
    }
}

/// The values of a numeric variable in logical order
pub fn values(var: &Variable) -> Vec<f64> {
    var.as_f64()
        .expect("variable should hold numeric data")
        .iter()
        .copied()
        .collect()
}

/// Every value of a numeric variable is close to `expected`
pub fn assert_all_approx(var: &Variable, expected: f64, epsilon: Option<f64>) {
    for value in values(var) {
        assert_approx_eq(value, expected, epsilon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_helpers() {
        assert_approx_eq(1.0, 1.0000001, None);
        assert_approx_eq(1.0, 1.001, Some(0.01));
        assert_almost_equal_decimal(34.8312, 34.8305, 2);
        assert_array_approx_eq(&[1.0, 2.0], &[1.001, 2.001], Some(0.01));
    }

    #[test]
    #[should_panic(expected = "index 1")]
    fn test_array_mismatch_reports_index() {
        assert_array_approx_eq(&[1.0, 2.0], &[1.0, 2.5], None);
    }

    #[test]
    fn test_values() {
        let var = Variable::from_vec("x", vec![0.5, 1.5]);
        assert_eq!(values(&var), vec![0.5, 1.5]);
        assert_all_approx(&Variable::from_vec("x", vec![2.0, 2.0]), 2.0, None);
    }
}
