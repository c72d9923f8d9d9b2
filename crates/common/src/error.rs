/// Construction-time misuse of an overlay or geometry builder.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be positive and finite, got {value}")]
    NonPositiveDimension { name: &'static str, value: f32 },
    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f32 },
    #[error("{name} must be at least 1")]
    ZeroSegments { name: &'static str },
    #[error("vertex array has {vertices} floats but normal array has {normals}")]
    LengthMismatch { vertices: usize, normals: usize },
    #[error("{name} length {len} is not a multiple of 3")]
    NotStride3 { name: &'static str, len: usize },
    #[error("{vertices} vertices exceed the 16-bit index range")]
    IndexOverflow { vertices: usize },
    #[error("invalid color: {0}")]
    InvalidColor(String),
}

/// Check that a dimension is finite and strictly positive.
pub fn ensure_positive(name: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NonPositiveDimension { name, value })
    }
}

/// Check that a value is finite; zero and negatives are allowed.
pub fn ensure_finite(name: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { name, value })
    }
}

/// Check that a segment count is non-zero.
pub fn ensure_segments(name: &'static str, value: u32) -> Result<u32, ConfigError> {
    if value == 0 {
        Err(ConfigError::ZeroSegments { name })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_dimension_checks() {
        assert_eq!(ensure_positive("width", 2.0), Ok(2.0));
        assert!(ensure_positive("width", 0.0).is_err());
        assert!(ensure_positive("width", -1.0).is_err());
        assert!(ensure_positive("width", f32::NAN).is_err());
        assert!(ensure_positive("width", f32::INFINITY).is_err());
        assert_eq!(ensure_finite("lift", -2.0), Ok(-2.0));
        assert!(matches!(
            ensure_finite("lift", f32::NAN),
            Err(ConfigError::NonFinite { name: "lift", .. })
        ));
    }

    #[test]
    fn error_messages_name_the_field() {
        let err = ensure_segments("height_segments", 0).unwrap_err();
        assert_eq!(err.to_string(), "height_segments must be at least 1");
    }
}
