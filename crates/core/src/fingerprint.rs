//! Device fingerprint shape validation.
//!
//! Fingerprints are produced by the client-side collector and are opaque to
//! this service. Only their shape is checked here: derivation and any
//! abuse scoring happen before a fingerprint ever reaches us.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Maximum fingerprint length in bytes.
pub const MAX_FINGERPRINT_LENGTH: usize = 256;

/// Maximum length of a human device label.
pub const MAX_LABEL_LENGTH: usize = 120;

/// Printable, non-whitespace ASCII only.
pub const FINGERPRINT_PATTERN: &str = r"^[\x21-\x7E]+$";

static FINGERPRINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(FINGERPRINT_PATTERN).expect("valid regex"));

/// Validate a fingerprint: non-empty, bounded, printable ASCII without spaces.
pub fn validate_fingerprint(fingerprint: &str) -> Result<(), CoreError> {
    if fingerprint.is_empty() {
        return Err(CoreError::Validation(
            "Fingerprint must not be empty".to_string(),
        ));
    }
    if fingerprint.len() > MAX_FINGERPRINT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Fingerprint exceeds maximum length of {MAX_FINGERPRINT_LENGTH} characters (got {})",
            fingerprint.len()
        )));
    }
    if !FINGERPRINT_RE.is_match(fingerprint) {
        return Err(CoreError::Validation(
            "Fingerprint must contain only printable ASCII characters without whitespace"
                .to_string(),
        ));
    }
    Ok(())
}

/// Validate an optional device label. Empty labels are treated as absent by callers.
pub fn validate_label(label: &str) -> Result<(), CoreError> {
    if label.chars().count() > MAX_LABEL_LENGTH {
        return Err(CoreError::Validation(format!(
            "Device label exceeds maximum length of {MAX_LABEL_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Shorten a fingerprint for log lines and notices.
pub fn abbreviate(fingerprint: &str) -> String {
    const SHOWN: usize = 12;
    if fingerprint.chars().count() <= SHOWN {
        fingerprint.to_string()
    } else {
        let head: String = fingerprint.chars().take(SHOWN).collect();
        format!("{head}…")
    }
}
