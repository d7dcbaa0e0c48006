// Validation utilities module
// Provides custom validation functions for domain-specific rules

use regex::Regex;
use std::sync::OnceLock;
use validator::ValidationError;

struct PasswordRules {
    lowercase: Regex,
    uppercase: Regex,
    digit: Regex,
    special: Regex,
}

fn password_rules() -> &'static PasswordRules {
    static RULES: OnceLock<PasswordRules> = OnceLock::new();
    RULES.get_or_init(|| PasswordRules {
        lowercase: Regex::new(r"[a-z]").expect("static regex"),
        uppercase: Regex::new(r"[A-Z]").expect("static regex"),
        digit: Regex::new(r"[0-9]").expect("static regex"),
        special: Regex::new(r"[^A-Za-z0-9\s]").expect("static regex"),
    })
}

/// Validates the password policy: at least one lowercase letter, one uppercase
/// letter, one digit and one special character. Length is checked separately.
pub fn validate_password_policy(password: &str) -> Result<(), ValidationError> {
    let rules = password_rules();
    let satisfied = rules.lowercase.is_match(password)
        && rules.uppercase.is_match(password)
        && rules.digit.is_match(password)
        && rules.special.is_match(password);

    if satisfied {
        Ok(())
    } else {
        let mut error = ValidationError::new("password_policy");
        error.message = Some(
            "Password must contain at least one uppercase letter, one lowercase letter, one number and one special character"
                .into(),
        );
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_policy_accepts_strong_passwords() {
        for password in ["Passw0rd!", "Zz9#zzzz", "C0rrect-Horse"] {
            assert!(validate_password_policy(password).is_ok(), "{}", password);
        }
    }

    #[test]
    fn test_password_policy_rejects_missing_classes() {
        for password in [
            "password1!", // no uppercase
            "PASSWORD1!", // no lowercase
            "Password!!", // no digit
            "Password11", // no special
            "Pass word1", // whitespace is not a special character
        ] {
            let err = validate_password_policy(password).unwrap_err();
            assert_eq!(err.code, "password_policy", "{}", password);
        }
    }
}
