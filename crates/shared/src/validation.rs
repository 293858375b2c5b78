//! Common validation utilities.

use validator::{ValidateEmail, ValidationError};

/// Validates that a value contains at least one non-whitespace character.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be empty".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates that a string is a syntactically valid email address.
pub fn validate_email_address(email: &str) -> Result<(), ValidationError> {
    if email.validate_email() {
        Ok(())
    } else {
        let mut err = ValidationError::new("email");
        err.message = Some(format!("Invalid email address: {}", email).into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Family").is_ok());
        assert!(validate_not_blank(" a ").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   ").is_err());
    }

    #[test]
    fn test_validate_email_address() {
        assert!(validate_email_address("user@example.com").is_ok());
        assert!(validate_email_address("not-an-email").is_err());
        assert!(validate_email_address("").is_err());
    }

    #[test]
    fn test_validate_generated_emails() {
        for _ in 0..20 {
            let email: String = SafeEmail().fake();
            assert!(validate_email_address(&email).is_ok(), "{}", email);
        }
    }

    #[test]
    fn test_validate_email_error_message() {
        let err = validate_email_address("bad").unwrap_err();
        assert!(err.message.unwrap().contains("bad"));
    }
}
