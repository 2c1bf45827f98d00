//! Human-readable trade value formatting

/// Collapse a raw trade value into an order-of-magnitude string.
///
/// Values of a thousand or more keep one decimal place and a unit word
/// (`1.2 Billion`, `340.0 Million`, `5.5 Thousand`); smaller values are
/// printed as-is.
pub fn format_value(value: f64) -> String {
    if value >= 1e9 {
        format!("{:.1} Billion", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.1} Million", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.1} Thousand", value / 1e3)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billions() {
        assert_eq!(format_value(12_345_678_901.0), "12.3 Billion");
        assert_eq!(format_value(1e9), "1.0 Billion");
    }

    #[test]
    fn millions_and_thousands() {
        assert_eq!(format_value(999_999_999.0), "1000.0 Million");
        assert_eq!(format_value(4_260_000.0), "4.3 Million");
        assert_eq!(format_value(1_000.0), "1.0 Thousand");
        assert_eq!(format_value(87_600.0), "87.6 Thousand");
    }

    #[test]
    fn small_values_are_raw() {
        assert_eq!(format_value(999.0), "999");
        assert_eq!(format_value(12.5), "12.5");
        assert_eq!(format_value(0.0), "0");
    }
}
