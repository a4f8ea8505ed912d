// Boundary input checks. The engine itself never rejects input; callers that
// accept requests from users run these first.

use crate::error::GuardianError;

pub const MIN_FINGERPRINT_LEN: usize = 3;
pub const MIN_URL_LEN: usize = 3;

pub fn validate_fingerprint(fingerprint: &str) -> Result<(), GuardianError> {
    if fingerprint.trim().chars().count() < MIN_FINGERPRINT_LEN {
        return Err(GuardianError::Validation(format!(
            "user fingerprint must be at least {MIN_FINGERPRINT_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_url(url: &str) -> Result<(), GuardianError> {
    if url.trim().chars().count() < MIN_URL_LEN {
        return Err(GuardianError::Validation(format!(
            "url must be at least {MIN_URL_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_fingerprint_rejected() {
        assert!(validate_fingerprint("ab").is_err());
        assert!(validate_fingerprint("  ab  ").is_err());
        assert!(validate_fingerprint("abc").is_ok());
    }

    #[test]
    fn short_url_rejected() {
        assert!(validate_url("x").is_err());
        assert!(validate_url("https://youtu.be/abc").is_ok());
    }
}
