//! Secure Memory Utilities
//!
//! Containers for secret material handed across the DKES boundary:
//! - Zeroization on drop (including unwind)
//! - Redacted `Debug`
//! - Constant-time comparison

use std::fmt;
use std::ops::Deref;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// A byte buffer that zeroizes its contents when dropped
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes {
    data: Vec<u8>,
}

impl SecretBytes {
    /// Create a zero-filled buffer of the given size
    pub fn new(size: usize) -> Self {
        Self { data: vec![0u8; size] }
    }

    /// Copy existing data into a secret buffer
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self { data: bytes.to_vec() }
    }

    /// Take ownership of a Vec without copying it
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn expose(&self) -> &[u8] {
        &self.data
    }

    pub fn expose_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Move the contents out into a caller-owned zeroizing Vec
    pub fn into_zeroizing(mut self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(std::mem::take(&mut self.data))
    }

    /// Constant-time equality
    pub fn ct_eq(&self, other: &[u8]) -> bool {
        secure_compare(&self.data, other)
    }
}

impl Deref for SecretBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl From<Vec<u8>> for SecretBytes {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretBytes")
            .field("len", &self.data.len())
            .finish()
    }
}

/// A UTF-8 string that zeroizes its contents when dropped
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    inner: String,
}

impl SecretString {
    pub fn new(s: &str) -> Self {
        Self { inner: s.to_owned() }
    }

    /// Take ownership of a String without copying it
    pub fn from_string(s: String) -> Self {
        Self { inner: s }
    }

    pub fn expose(&self) -> &str {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretString")
            .field("len", &self.inner.len())
            .finish()
    }
}

/// Secure comparison (constant-time for equal lengths)
pub fn secure_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Secure comparison for strings
pub fn secure_compare_str(a: &str, b: &str) -> bool {
    secure_compare(a.as_bytes(), b.as_bytes())
}

/// Check that a buffer has been wiped
pub fn is_zeroized(data: &[u8]) -> bool {
    data.iter().all(|&b| b == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_bytes_explicit_zeroize() {
        let mut buffer = SecretBytes::from_slice(b"sensitive");
        buffer.zeroize();
        assert!(buffer.is_empty() || is_zeroized(buffer.expose()));
    }

    #[test]
    fn test_secret_bytes_debug_is_redacted() {
        let buffer = SecretBytes::from_slice(b"abandon about");
        let debug = format!("{:?}", buffer);
        assert!(!debug.contains("abandon"));
        assert!(debug.contains("len"));
    }

    #[test]
    fn test_secret_string() {
        let password = SecretString::new("my_password");
        assert_eq!(password.expose(), "my_password");
        assert_eq!(password.len(), 11);
        assert!(!format!("{:?}", password).contains("my_password"));
    }

    #[test]
    fn test_secure_compare() {
        assert!(secure_compare(b"hello world", b"hello world"));
        assert!(!secure_compare(b"hello world", b"hello worlD"));
        assert!(!secure_compare(b"hello", b"hello world"));
        assert!(secure_compare_str("abc", "abc"));
    }

    #[test]
    fn test_into_zeroizing_moves_contents() {
        let buffer = SecretBytes::from_vec(vec![1, 2, 3]);
        let moved = buffer.into_zeroizing();
        assert_eq!(moved.as_slice(), &[1, 2, 3]);
    }
}
