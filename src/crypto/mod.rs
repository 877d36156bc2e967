//! Cryptographic envelopes for DKES
//!
//! Password-based authenticated encryption of mnemonics and private keys.

pub mod envelope;

pub use envelope::{
    decrypt, decrypt_from_json, encrypt, encrypt_to_json, verify_password, Envelope, EnvelopeError,
    ENVELOPE_ALGORITHM, ENVELOPE_VERSION,
};
