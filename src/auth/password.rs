use bcrypt::{hash, verify, DEFAULT_COST};
use once_cell::sync::Lazy;
use rand::RngCore;
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password must be at least 8 characters long")]
    TooShort,
    #[error("Password must be no more than 128 characters long")]
    TooLong,
    #[error("Password must contain at least one uppercase letter")]
    NoUppercase,
    #[error("Password must contain at least one lowercase letter")]
    NoLowercase,
    #[error("Password must contain at least one number")]
    NoNumber,
    #[error("Password must contain at least one special character")]
    NoSpecialChar,
    #[error("Failed to hash password")]
    HashingFailed,
    #[error("Failed to verify password")]
    VerificationFailed,
}

impl PasswordError {
    pub fn is_policy_violation(&self) -> bool {
        !matches!(
            self,
            PasswordError::HashingFailed | PasswordError::VerificationFailed
        )
    }
}

static SPECIAL_CHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]").expect("special character pattern is valid"));

/// Reset tokens stay valid for one hour
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Password strength requirements
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_number: bool,
    pub require_special_char: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
            require_uppercase: true,
            require_lowercase: true,
            require_number: true,
            require_special_char: true,
        }
    }
}

/// Validate password strength according to policy
pub fn validate_password_strength(password: &str, policy: &PasswordPolicy) -> Result<(), PasswordError> {
    let length = password.chars().count();
    if length < policy.min_length {
        return Err(PasswordError::TooShort);
    }

    if length > policy.max_length {
        return Err(PasswordError::TooLong);
    }

    if policy.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
        return Err(PasswordError::NoUppercase);
    }

    if policy.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
        return Err(PasswordError::NoLowercase);
    }

    if policy.require_number && !password.chars().any(|c| c.is_numeric()) {
        return Err(PasswordError::NoNumber);
    }

    if policy.require_special_char && !SPECIAL_CHAR.is_match(password) {
        return Err(PasswordError::NoSpecialChar);
    }

    Ok(())
}

/// Hash a password using bcrypt after checking it against the default policy
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    validate_password_strength(password, &PasswordPolicy::default())?;

    hash(password, DEFAULT_COST).map_err(|_| PasswordError::HashingFailed)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    verify(password, hash).map_err(|_| PasswordError::VerificationFailed)
}

/// 32 random bytes, hex encoded
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Digest stored in place of the reset token itself
pub fn hash_reset_token(token: &str) -> String {
    format!("{:x}", md5::compute(token))
}
