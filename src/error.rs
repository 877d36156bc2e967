//! Unified error types for DKES
//!
//! Component errors (`MnemonicError`, `DerivationError`, ...) are plain
//! `thiserror` enums; everything surfaces through `DkesError` so the host only
//! has to match on an `ErrorCode` / `ErrorKind` discriminant.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all DKES operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DkesError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl DkesError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Coarse error family of this error
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    // Convenience constructors
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    pub fn crypto_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::CryptoError, msg)
    }

    pub fn rng_failure(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RngFailure, msg)
    }

    /// Decryption failure. The message is fixed on purpose: wrong password and
    /// tampered data must be indistinguishable.
    pub fn auth_failure() -> Self {
        Self::new(ErrorCode::AuthFailure, "authentication failed")
    }

    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnsupportedFormat, msg)
    }

    pub fn policy(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self::new(code, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }
}

impl fmt::Display for DkesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for DkesError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors
    InvalidInput,
    InvalidAddress,
    InvalidPublicKey,

    // Mnemonic errors
    BadWordCount,
    UnknownWord,
    ChecksumMismatch,
    WeakReuse,
    BadEntropyLength,

    // Derivation errors
    OrderViolation,
    InvalidPath,
    HardenedFromPublic,
    Slip10Failure,
    InvalidExtendedKey,

    // Crypto errors
    CryptoError,
    RngFailure,
    AuthFailure,
    KdfParamsOutOfBounds,
    SigningFailed,

    // Policy errors
    WeakPassword,
    InvalidThreshold,
    ThresholdExceedsMembers,
    TooManyMembers,
    DuplicateMember,

    // Format errors
    UnsupportedFormat,
    JsonError,

    // Internal
    Internal,
}

/// Error families exposed to the host (see `ErrorCode::kind`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    Mnemonic,
    Derivation,
    Crypto,
    Policy,
    UnsupportedFormat,
    Internal,
}

impl ErrorCode {
    pub fn kind(self) -> ErrorKind {
        match self {
            Self::InvalidInput
            | Self::InvalidAddress
            | Self::InvalidPublicKey
            | Self::JsonError => ErrorKind::InvalidInput,
            Self::BadWordCount
            | Self::UnknownWord
            | Self::ChecksumMismatch
            | Self::WeakReuse
            | Self::BadEntropyLength => ErrorKind::Mnemonic,
            Self::OrderViolation
            | Self::InvalidPath
            | Self::HardenedFromPublic
            | Self::Slip10Failure
            | Self::InvalidExtendedKey => ErrorKind::Derivation,
            Self::CryptoError
            | Self::RngFailure
            | Self::AuthFailure
            | Self::KdfParamsOutOfBounds
            | Self::SigningFailed => ErrorKind::Crypto,
            Self::WeakPassword
            | Self::InvalidThreshold
            | Self::ThresholdExceedsMembers
            | Self::TooManyMembers
            | Self::DuplicateMember => ErrorKind::Policy,
            Self::UnsupportedFormat => ErrorKind::UnsupportedFormat,
            Self::Internal => ErrorKind::Internal,
        }
    }
}

/// Result type alias for DKES operations
pub type DkesResult<T> = Result<T, DkesError>;

// Conversions from common error types

impl From<serde_json::Error> for DkesError {
    fn from(e: serde_json::Error) -> Self {
        DkesError::new(ErrorCode::JsonError, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = DkesError::new(ErrorCode::ThresholdExceedsMembers, "threshold 3 > 2 members")
            .with_details("kind=p2sh");

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("threshold_exceeds_members"));
        assert!(json.contains("kind=p2sh"));
    }

    #[test]
    fn test_codes_group_into_kinds() {
        assert_eq!(ErrorCode::UnknownWord.kind(), ErrorKind::Mnemonic);
        assert_eq!(ErrorCode::OrderViolation.kind(), ErrorKind::Derivation);
        assert_eq!(ErrorCode::AuthFailure.kind(), ErrorKind::Crypto);
        assert_eq!(ErrorCode::TooManyMembers.kind(), ErrorKind::Policy);
        assert_eq!(ErrorCode::UnsupportedFormat.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn test_auth_failure_message_is_stable() {
        assert_eq!(DkesError::auth_failure().message, "authentication failed");
        assert_eq!(DkesError::auth_failure(), DkesError::auth_failure());
    }
}
