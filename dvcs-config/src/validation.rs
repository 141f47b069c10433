// Configuration validation

use crate::{ConfigError, Result};
use std::net::SocketAddr;

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Validation rules shared by the settings sections
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate that a value is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                field
            )));
        }
        Ok(())
    }

    /// Validate that a number is within an inclusive range
    pub fn in_range<T: PartialOrd + std::fmt::Display>(
        value: T,
        min: T,
        max: T,
        field: &str,
    ) -> Result<()> {
        if value < min || value > max {
            return Err(ConfigError::ValidationError(format!(
                "{} must be between {} and {} (got {})",
                field, min, max, value
            )));
        }
        Ok(())
    }

    /// Validate that a number is strictly positive
    pub fn positive(value: u64, field: &str) -> Result<()> {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{} must be greater than zero",
                field
            )));
        }
        Ok(())
    }

    /// Validate a `host:port` socket address
    pub fn is_socket_addr(value: &str, field: &str) -> Result<SocketAddr> {
        value.parse().map_err(|_| {
            ConfigError::ValidationError(format!(
                "{} must be a socket address like 0.0.0.0:9001 (got {})",
                field, value
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_empty_validation() {
        assert!(ConfigValidator::not_empty("value", "field").is_ok());
        assert!(ConfigValidator::not_empty("", "field").is_err());
        assert!(ConfigValidator::not_empty("   ", "field").is_err());
    }

    #[test]
    fn test_range_validation() {
        assert!(ConfigValidator::in_range(5, 1, 10, "field").is_ok());
        assert!(ConfigValidator::in_range(0, 1, 10, "field").is_err());

        let err = ConfigValidator::in_range(11, 1, 10, "retries").unwrap_err();
        assert!(err.to_string().contains("retries must be between 1 and 10"));
    }

    #[test]
    fn test_positive_validation() {
        assert!(ConfigValidator::positive(1, "field").is_ok());
        assert!(ConfigValidator::positive(0, "field").is_err());
    }

    #[test]
    fn test_socket_addr_validation() {
        assert!(ConfigValidator::is_socket_addr("127.0.0.1:9001", "field").is_ok());
        assert!(ConfigValidator::is_socket_addr("[::1]:80", "field").is_ok());
        assert!(ConfigValidator::is_socket_addr("localhost", "field").is_err());
    }
}
