//! Tests for error creation and message formatting

use tax_rates::prelude::*;

#[cfg(test)]
mod error_tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_invalid_rate_message() {
        let err = TaxError::InvalidRate { rate: 1.4 };

        let msg = err.to_string();
        assert!(msg.contains("Invalid tax rate"));
        assert!(msg.contains("1.4"));
        assert!(msg.contains("[0, 1]"));
        assert!(err.is_invalid_rate());
    }

    #[test]
    fn test_engine_returns_invalid_rate() {
        let mut engine = RateEngine::new();

        for rate in [-0.2, -f64::EPSILON, 1.0 + 1e-9, 1.4, f64::NAN] {
            let err = engine
                .set_custom_tax_rate(Commodity::Default, rate)
                .unwrap_err();
            assert!(err.is_invalid_rate(), "{} should be rejected", rate);
        }
        assert_eq!(engine.entry_count(), 0);
    }

    #[test]
    fn test_boundary_rates_accepted() {
        let mut engine = RateEngine::new();
        assert!(engine.set_custom_tax_rate(Commodity::Food, 0.0).is_ok());
        assert!(engine.set_custom_tax_rate(Commodity::Alcohol, 1.0).is_ok());
    }

    #[test]
    fn test_unknown_commodity_message() {
        let err = "tobacco".parse::<Commodity>().unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("Unknown commodity"));
        assert!(msg.contains("tobacco"));
        assert!(!err.is_invalid_rate());
    }

    #[test]
    fn test_script_error_keeps_source() {
        let err = TaxError::Script {
            line: 7,
            source: Box::new(TaxError::InvalidRate { rate: 2.0 }),
        };

        let msg = err.to_string();
        assert!(msg.contains("line 7"));
        assert!(msg.contains("2"));
        assert!(err.is_invalid_rate());
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_message() {
        let err = EngineConfig::new(-10).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("Configuration error"));
        assert!(msg.contains("-10"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "rates.csv");
        let err: TaxError = io.into();

        assert!(matches!(err, TaxError::Io(_)));
        assert!(err.to_string().contains("rates.csv"));
    }
}
