//! Per-user device cap.

use crate::error::CoreError;

/// Cap applied to users without an explicit policy row.
pub const DEFAULT_MAX_DEVICES: i32 = 3;

/// Smallest cap an operator may set.
pub const MIN_MAX_DEVICES: i32 = 1;

/// Largest cap an operator may set.
pub const MAX_MAX_DEVICES: i32 = 50;

/// Validate an operator-supplied device cap.
pub fn validate_max_devices(max_devices: i32) -> Result<(), CoreError> {
    if !(MIN_MAX_DEVICES..=MAX_MAX_DEVICES).contains(&max_devices) {
        return Err(CoreError::Validation(format!(
            "max_devices must be between {MIN_MAX_DEVICES} and {MAX_MAX_DEVICES} (got {max_devices})"
        )));
    }
    Ok(())
}

/// Whether a user holding `device_count` devices has reached `max_devices`.
pub fn is_at_limit(device_count: i64, max_devices: i32) -> bool {
    device_count >= i64::from(max_devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_accepted() {
        assert!(validate_max_devices(MIN_MAX_DEVICES).is_ok());
        assert!(validate_max_devices(MAX_MAX_DEVICES).is_ok());
        assert!(validate_max_devices(DEFAULT_MAX_DEVICES).is_ok());
    }

    #[test]
    fn test_zero_and_negative_rejected() {
        assert!(validate_max_devices(0).is_err());
        assert!(validate_max_devices(-2).is_err());
    }

    #[test]
    fn test_above_ceiling_rejected() {
        let err = validate_max_devices(MAX_MAX_DEVICES + 1).unwrap_err();
        assert!(err.to_string().contains("between"));
    }

    #[test]
    fn test_is_at_limit() {
        assert!(!is_at_limit(2, 3));
        assert!(is_at_limit(3, 3));
        assert!(is_at_limit(5, 3));
    }
}
