/// Average of `sum` over `count` items. Returns 0.0 for an empty group.
pub fn average(sum: i128, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    sum as f64 / count as f64
}

/// Formats a value the way the report prints averages.
pub fn two_decimals(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_with_zero_count() {
        assert_eq!(average(0, 0), 0.0);
        assert_eq!(average(500, 0), 0.0);
    }

    #[test]
    fn test_average_normal_values() {
        assert_eq!(average(300, 2), 150.0);
        assert_eq!(average(-10, 4), -2.5);
    }

    #[test]
    fn test_two_decimals() {
        assert_eq!(two_decimals(150.0), "150.00");
        assert_eq!(two_decimals(1.0 / 3.0), "0.33");
    }
}
