//! Request input validation and safe on-disk naming.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Longest accepted email address (RFC 5321 path limit).
pub const MAX_EMAIL_LENGTH: usize = 254;
/// Longest accepted password, in bytes.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Input validation errors with messages safe to return to clients
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Email is empty.")]
    EmptyEmail,

    #[error("Email is not valid.")]
    InvalidEmail,

    #[error("Password is empty.")]
    EmptyPassword,

    #[error("Password is too long (maximum {max} bytes).")]
    PasswordTooLong { max: usize },

    #[error("Invalid id: {reason}")]
    InvalidId { reason: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecurityError {
    /// File size exceeds maximum allowed
    #[error("File size exceeds limit ({limit} bytes)")]
    FileSizeExceeded { limit: usize },

    /// JSON format is invalid or malformed
    #[error("Invalid format")]
    InvalidFormat,
}

/// Validate and normalize an email address.
///
/// Surrounding whitespace is dropped and the address is lowercased, so
/// `Alice@Example.com` and `alice@example.com` name the same account.
pub fn validate_email(email: &str) -> Result<String, InputError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(InputError::EmptyEmail);
    }
    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(InputError::InvalidEmail);
    }
    if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(InputError::InvalidEmail);
    }
    let mut parts = trimmed.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(InputError::InvalidEmail);
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(InputError::InvalidEmail);
    }
    Ok(trimmed.to_lowercase())
}

/// Validate a password submitted for registration.
pub fn validate_password(password: &str) -> Result<(), InputError> {
    if password.is_empty() {
        return Err(InputError::EmptyPassword);
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(InputError::PasswordTooLong {
            max: MAX_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Parse a record id from a path segment or request field.
pub fn parse_id(id: &str) -> Result<Uuid, InputError> {
    Uuid::parse_str(id.trim()).map_err(|_| InputError::InvalidId {
        reason: "must be a valid UUID".to_string(),
    })
}

/// Fixed-length file stem for an email: hex SHA-256 of the normalized address.
///
/// Always 64 characters regardless of input, so any accepted email fits in a
/// single path component.
pub fn safe_filename(name: &str) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write;

    let digest = Sha256::digest(name.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for b in digest.iter() {
        let _ = write!(&mut hex, "{:02x}", b);
    }
    hex
}

/// Path of the record file for a (normalized) email.
pub fn secure_user_path(data_dir: &str, email: &str) -> PathBuf {
    Path::new(data_dir)
        .join("users")
        .join(format!("{}.json", safe_filename(email)))
}

/// Path of the record file for a chirp. UUIDs are filesystem-safe as-is.
pub fn secure_chirp_path(data_dir: &str, id: &Uuid) -> PathBuf {
    Path::new(data_dir)
        .join("chirps")
        .join(format!("{}.json", id.as_hyphenated()))
}

/// Validate file size before reading
pub fn validate_file_size(size: u64, max_size: u64) -> Result<(), SecurityError> {
    if size > max_size {
        return Err(SecurityError::FileSizeExceeded {
            limit: max_size as usize,
        });
    }
    Ok(())
}

/// Securely parse JSON with size limits and error handling
pub fn secure_json_parse<T>(content: &str, max_bytes: usize) -> Result<T, SecurityError>
where
    T: serde::de::DeserializeOwned,
{
    if content.len() > max_bytes {
        return Err(SecurityError::FileSizeExceeded { limit: max_bytes });
    }

    // Interrupted writes have been seen to leave leading NULs; valid JSON
    // never starts with one.
    let normalized = content.trim_start_matches('\0');

    serde_json::from_str(normalized).map_err(|_| SecurityError::InvalidFormat)
}
