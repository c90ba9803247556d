/// Password Hashing and Verification
///
/// Handles password hashing with bcrypt and the password strength policy.

use bcrypt::{hash, verify, DEFAULT_COST};
use lazy_static::lazy_static;
use unicode_properties::{GeneralCategory, UnicodeGeneralCategory};

use crate::error::AuthError;

const MIN_PASSWORD_LENGTH: usize = 4;
const MIN_DIGIT_COUNT: usize = 2;

lazy_static! {
    // Verified against when the principal does not exist, so that a login
    // for an unknown email costs the same bcrypt work as a wrong password.
    static ref DUMMY_HASH: String =
        hash("timing-equaliser-00", DEFAULT_COST).unwrap_or_default();
}

/// Hash a password using bcrypt
///
/// # Errors
/// - `WeakCredential` if the password fails the strength policy
/// - `HashingFailure` if bcrypt fails
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    validate_password_strength(password)?;

    hash(password, DEFAULT_COST).map_err(|e| AuthError::HashingFailure(e.to_string()))
}

/// Verify a password against its bcrypt hash
///
/// A corrupt hash and a wrong password are both reported as
/// `CredentialMismatch`.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    match verify(password, hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthError::CredentialMismatch),
        Err(e) => {
            tracing::warn!("Stored password hash could not be checked: {}", e);
            Err(AuthError::CredentialMismatch)
        }
    }
}

/// Burn one bcrypt verification without a real hash to compare against.
pub fn verify_against_dummy(password: &str) {
    let _ = verify(password, DUMMY_HASH.as_str());
}

/// Validate password strength requirements
///
/// Requirements:
/// - Minimum 4 characters, counted as Unicode scalar values
/// - At least two decimal digits, any script (general category Nd)
fn validate_password_strength(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakCredential(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let digit_count = password
        .chars()
        .filter(|c| c.general_category() == GeneralCategory::DecimalNumber)
        .count();
    if digit_count < MIN_DIGIT_COUNT {
        return Err(AuthError::WeakCredential(format!(
            "password must contain at least {} digits",
            MIN_DIGIT_COUNT
        )));
    }

    Ok(())
}
