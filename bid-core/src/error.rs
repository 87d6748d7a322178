use thiserror::Error;

/// Everything the planner can reject. All variants abort the whole call;
/// there are no partial results.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("unknown {kind}: {value:?}")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("malformed number for {field}: {value:?}")]
    MalformedNumber { field: &'static str, value: String },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no property with id {0}")]
    UnknownProperty(u64),
}

impl PlannerError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        PlannerError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Unknown enum strings and unparseable numbers are input errors too,
    /// they just carry more detail for the form layer.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            PlannerError::InvalidInput { .. }
                | PlannerError::UnknownVariant { .. }
                | PlannerError::MalformedNumber { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;

/// Required money field: finite and strictly positive.
pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(PlannerError::invalid(field, format!("{value} is not finite")));
    }
    if value <= 0.0 {
        return Err(PlannerError::invalid(field, format!("{value} must be > 0")));
    }
    Ok(())
}

/// Optional money field: finite and not negative (0 means "not provided").
pub(crate) fn require_non_negative(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(PlannerError::invalid(field, format!("{value} is not finite")));
    }
    if value < 0.0 {
        return Err(PlannerError::invalid(field, format!("{value} must be >= 0")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_rejects_zero_negative_and_nan() {
        assert!(require_positive("marketPrice", 1.0).is_ok());
        assert!(require_positive("marketPrice", 0.0).is_err());
        assert!(require_positive("marketPrice", -5.0).is_err());
        assert!(require_positive("marketPrice", f64::NAN).is_err());
        assert!(require_positive("marketPrice", f64::INFINITY).is_err());
    }

    #[test]
    fn non_negative_allows_zero() {
        assert!(require_non_negative("appraisalPrice", 0.0).is_ok());
        assert!(require_non_negative("appraisalPrice", -0.01).is_err());
    }

    #[test]
    fn error_taxonomy() {
        let e = PlannerError::UnknownVariant {
            kind: "auction category",
            value: "boat".to_string(),
        };
        assert!(e.is_invalid_input());
        assert_eq!(e.to_string(), "unknown auction category: \"boat\"");
        assert!(!PlannerError::UnknownProperty(3).is_invalid_input());
    }
}
