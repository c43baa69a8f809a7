//! Applicant identity rules: field normalisation, validation and the
//! external-identity resolution decision.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use validator::ValidateEmail;

use crate::error::CoreError;

/// Phone numbers are 10 to 12 digits (with or without country code).
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10,12}$").expect("phone regex is valid"));

/// Special characters accepted (and one of which is required) in passwords.
pub const PASSWORD_SPECIALS: &str = "@$!%*?&";

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// How an applicant authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityProviderKind {
    /// Local credentials (password may still be absent).
    None,
    /// Signed up through the external identity provider.
    External,
}

impl IdentityProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::External => "external",
        }
    }

    /// Parse the value stored in `applicants.identity_provider`.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "none" => Ok(Self::None),
            "external" => Ok(Self::External),
            _ => Err(CoreError::Internal(format!("Invalid identity provider '{s}'"))),
        }
    }
}

/// Trim and lower-case an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an (already normalised) email address.
pub fn validate_email(email: &str) -> Result<(), CoreError> {
    if email.validate_email() {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "Please enter a valid email address".into(),
        ))
    }
}

/// Validate a phone number: 10 to 12 ASCII digits.
pub fn validate_phone(phone: &str) -> Result<(), CoreError> {
    if PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "Please enter a valid phone number (10 to 12 digits)".into(),
        ))
    }
}

/// Validate that a display name is not blank.
pub fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("Name is required".into()));
    }
    Ok(())
}

/// Check a password against the portal's strength rule.
///
/// At least [`MIN_PASSWORD_LENGTH`] characters drawn from letters, digits and
/// [`PASSWORD_SPECIALS`], containing at least one uppercase letter, one
/// lowercase letter, one digit and one special character.
pub fn validate_password_strength(password: &str) -> Result<(), CoreError> {
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c));
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if password.chars().count() >= MIN_PASSWORD_LENGTH
        && allowed
        && has_upper
        && has_lower
        && has_digit
        && has_special
    {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long, contain one \
             uppercase letter, one lowercase letter, one number, and one special character \
             ({PASSWORD_SPECIALS})."
        )))
    }
}

// ---------------------------------------------------------------------------
// External identity resolution
// ---------------------------------------------------------------------------

/// Where an external-identity sign-in lands the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityResolution {
    /// No applicant matches the identity; collect phone/course first.
    NewApplicant,
    /// An applicant exists but phone or course is still missing.
    IncompleteProfile,
    /// Fully registered; treat as logged in.
    Registered,
}

/// Decide how to continue after looking up an applicant by email or
/// external id.
///
/// `existing` carries the phone and course of the matched applicant, if any.
pub fn resolve_identity(existing: Option<(Option<&str>, Option<&str>)>) -> IdentityResolution {
    match existing {
        None => IdentityResolution::NewApplicant,
        Some((Some(phone), Some(course))) if !phone.is_empty() && !course.is_empty() => {
            IdentityResolution::Registered
        }
        Some(_) => IdentityResolution::IncompleteProfile,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalised() {
        assert_eq!(normalize_email("  Student@Example.COM "), "student@example.com");
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("student@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn phone_accepts_10_to_12_digits() {
        assert!(validate_phone("9999999999").is_ok());
        assert!(validate_phone("919999999999").is_ok());
        assert!(validate_phone("999999999").is_err());
        assert!(validate_phone("9999999999999").is_err());
        assert!(validate_phone("99999-99999").is_err());
    }

    #[test]
    fn password_rule() {
        assert!(validate_password_strength("Passw0rd!").is_ok());
        assert!(validate_password_strength("Pa0!").is_err(), "too short");
        assert!(validate_password_strength("password0!").is_err(), "no uppercase");
        assert!(validate_password_strength("PASSWORD0!").is_err(), "no lowercase");
        assert!(validate_password_strength("Password!").is_err(), "no digit");
        assert!(validate_password_strength("Password0").is_err(), "no special");
        assert!(validate_password_strength("Pass word0!").is_err(), "space not allowed");
    }

    #[test]
    fn identity_resolution() {
        assert_eq!(resolve_identity(None), IdentityResolution::NewApplicant);
        assert_eq!(
            resolve_identity(Some((None, Some("MBA (Co-Ed)")))),
            IdentityResolution::IncompleteProfile
        );
        assert_eq!(
            resolve_identity(Some((Some("9999999999"), None))),
            IdentityResolution::IncompleteProfile
        );
        assert_eq!(
            resolve_identity(Some((Some("9999999999"), Some("MBA (Co-Ed)")))),
            IdentityResolution::Registered
        );
    }

    #[test]
    fn identity_provider_round_trip() {
        for kind in [IdentityProviderKind::None, IdentityProviderKind::External] {
            assert_eq!(IdentityProviderKind::from_str_db(kind.as_str()).unwrap(), kind);
        }
        assert!(IdentityProviderKind::from_str_db("google").is_err());
    }
}
