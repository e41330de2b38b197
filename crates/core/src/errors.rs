use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("{name} must be in range (0, 1], got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
    #[error("top_n must be greater than zero, got {0}")]
    InvalidTopN(usize),
    #[error("basket item at position {index} cannot be read as an item name: {reason}")]
    InvalidBasketItem { index: usize, reason: String },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl ApplicationError {
    /// Stable machine-readable class for structured command output.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::InvalidThreshold { .. }) => "config_validation",
            Self::Domain(_) => "domain_validation",
            Self::Persistence(_) => "persistence",
        }
    }

    /// Remediation hint shown next to the technical message.
    pub fn user_message(&self) -> &'static str {
        match self.error_class() {
            "config_validation" => "The configuration is invalid. Check thresholds and limits.",
            "domain_validation" => {
                "The request could not be processed. Check inputs and try again."
            }
            _ => "The rule-set artifact could not be read or written.",
        }
    }
}

/// Checks that a probability-style threshold lies in (0, 1]. NaN is rejected.
pub fn validate_threshold(name: &'static str, value: f64) -> Result<f64, DomainError> {
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(DomainError::InvalidThreshold { name, value })
    }
}

pub fn validate_top_n(top_n: usize) -> Result<usize, DomainError> {
    if top_n == 0 {
        return Err(DomainError::InvalidTopN(top_n));
    }
    Ok(top_n)
}
