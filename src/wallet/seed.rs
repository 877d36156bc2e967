//! BIP-39 seed derivation
//!
//! PBKDF2-HMAC-SHA512 over the NFKD phrase, salt "mnemonic" ‖ passphrase,
//! 2048 iterations, 64-byte output.

use std::fmt;

use sha2::Sha512;
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

use crate::security::secure_memory::secure_compare;

use super::mnemonic::Mnemonic;

const SEED_ITERATIONS: u32 = 2048;
pub const SEED_LEN: usize = 64;

/// 64-byte BIP-39 seed, zeroized on drop
#[derive(Clone)]
pub struct Seed {
    bytes: Zeroizing<[u8; SEED_LEN]>,
}

impl Seed {
    pub fn from_bytes(bytes: [u8; SEED_LEN]) -> Self {
        Self {
            bytes: Zeroizing::new(bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.bytes
    }

    /// Lower-case hex; the result is secret
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.bytes.as_slice()))
    }
}

impl AsRef<[u8]> for Seed {
    fn as_ref(&self) -> &[u8] {
        self.bytes.as_slice()
    }
}

impl PartialEq for Seed {
    fn eq(&self, other: &Self) -> bool {
        secure_compare(self.bytes.as_slice(), other.bytes.as_slice())
    }
}

impl Eq for Seed {}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed([REDACTED])")
    }
}

/// Derive the seed for a mnemonic and optional passphrase
pub fn seed_from_mnemonic(mnemonic: &Mnemonic, passphrase: Option<&str>) -> Seed {
    seed_from_phrase(mnemonic.phrase(), passphrase.unwrap_or(""))
}

/// Derive a seed from an already-normalized phrase
pub(crate) fn seed_from_phrase(phrase: &str, passphrase: &str) -> Seed {
    let password: Zeroizing<String> = Zeroizing::new(phrase.nfkd().collect());
    let salt: Zeroizing<String> = Zeroizing::new(format!("mnemonic{}", passphrase).nfkd().collect());

    let mut out = [0u8; SEED_LEN];
    pbkdf2::pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), SEED_ITERATIONS, &mut out);
    let seed = Seed::from_bytes(out);
    zeroize::Zeroize::zeroize(&mut out);
    seed
}
