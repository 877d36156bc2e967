//! BIP-32 HD Node
//!
//! Thin wrapper over `bitcoin::bip32` that adds neutering, path strings
//! and the crate's error codes.
//!
//! SECURITY: every `SecretKey` owned by a node, including the ones stepped
//! through during path derivation, is erased when it goes out of scope.

use std::fmt;
use std::str::FromStr;

use bitcoin::bip32::{self, ChildNumber, Xpriv, Xpub};
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::Secp256k1;
use bitcoin::NetworkKind;
use zeroize::Zeroizing;

use crate::error::{DkesError, ErrorCode};

use super::derivation_path::{parse_path, DerivationComponent, DerivationPath};

/// Mainnet xprv version bytes
pub const XPRV_VERSION: [u8; 4] = [0x04, 0x88, 0xAD, 0xE4];
/// Mainnet xpub version bytes
pub const XPUB_VERSION: [u8; 4] = [0x04, 0x88, 0xB2, 0x1E];

const SERIALIZED_LEN: usize = 78;

/// Key derivation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DerivationError {
    #[error("invalid derivation path: {0}")]
    InvalidPath(String),
    #[error("hardened derivation requires a private key")]
    HardenedFromPublic,
    #[error("derived scalar is zero or not below the curve order")]
    OrderViolation,
    #[error("seed must be 16 to 64 bytes, got {0}")]
    InvalidSeedLength(usize),
    #[error("SLIP-10 derivation failed: {0}")]
    Slip10(String),
    #[error("invalid extended key: {0}")]
    InvalidExtendedKey(String),
}

impl DerivationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            DerivationError::InvalidPath(_) => ErrorCode::InvalidPath,
            DerivationError::HardenedFromPublic => ErrorCode::HardenedFromPublic,
            DerivationError::OrderViolation => ErrorCode::OrderViolation,
            DerivationError::InvalidSeedLength(_) => ErrorCode::InvalidInput,
            DerivationError::Slip10(_) => ErrorCode::Slip10Failure,
            DerivationError::InvalidExtendedKey(_) => ErrorCode::InvalidExtendedKey,
        }
    }
}

impl From<DerivationError> for DkesError {
    fn from(e: DerivationError) -> Self {
        DkesError::new(e.code(), e.to_string())
    }
}

impl From<bip32::Error> for DerivationError {
    fn from(e: bip32::Error) -> Self {
        match e {
            bip32::Error::CannotDeriveFromHardenedKey => DerivationError::HardenedFromPublic,
            bip32::Error::MaximumDepthExceeded => {
                DerivationError::InvalidPath("maximum depth exceeded".to_string())
            }
            bip32::Error::InvalidChildNumber(index) => {
                DerivationError::InvalidPath(format!("child index {} out of range", index))
            }
            bip32::Error::Secp256k1(_) => DerivationError::OrderViolation,
            other => DerivationError::InvalidExtendedKey(other.to_string()),
        }
    }
}

/// A BIP-32 node. Holds a private key unless it has been neutered.
#[derive(Clone)]
pub struct ExtendedKey {
    xpriv: Option<Xpriv>,
    xpub: Xpub,
}

impl ExtendedKey {
    /// Master node from a seed: HMAC-SHA512("Bitcoin seed", seed)
    pub fn master_from_seed(seed: &[u8]) -> Result<Self, DerivationError> {
        if !(16..=64).contains(&seed.len()) {
            return Err(DerivationError::InvalidSeedLength(seed.len()));
        }
        Ok(Self::from_xpriv(Xpriv::new_master(NetworkKind::Main, seed)?))
    }

    fn from_xpriv(xpriv: Xpriv) -> Self {
        let xpub = Xpub::from_priv(&Secp256k1::signing_only(), &xpriv);
        Self { xpriv: Some(xpriv), xpub }
    }

    /// Derive one child. `index` excludes the hardened bit.
    pub fn derive_child(&self, index: u32, hardened: bool) -> Result<Self, DerivationError> {
        let child_number = child_number(DerivationComponent { index, hardened })?;
        match &self.xpriv {
            Some(xpriv) => Ok(Self::from_xpriv(xpriv.derive_priv(&Secp256k1::signing_only(), &[child_number])?)),
            None => {
                if hardened {
                    return Err(DerivationError::HardenedFromPublic);
                }
                let xpub = self.xpub.ckd_pub(&Secp256k1::verification_only(), child_number)?;
                Ok(Self { xpriv: None, xpub })
            }
        }
    }

    /// Apply every component of `path`, leaf-ward from this node
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self, DerivationError> {
        let mut node = self.clone();
        for component in path.components() {
            node = node.derive_child(component.index, component.hardened)?;
        }
        Ok(node)
    }

    /// Parse `text` as `m/...` and derive it
    pub fn derive_path_str(&self, text: &str) -> Result<Self, DerivationError> {
        self.derive_path(&parse_path(text)?)
    }

    /// Public-only copy of this node
    pub fn neuter(&self) -> Self {
        Self { xpriv: None, xpub: self.xpub }
    }

    pub fn is_private(&self) -> bool {
        self.xpriv.is_some()
    }

    pub fn private_key(&self) -> Option<&[u8; 32]> {
        self.xpriv.as_ref().map(|xpriv| xpriv.private_key.as_ref())
    }

    /// Compressed SEC1 public key
    pub fn public_key(&self) -> [u8; 33] {
        self.xpub.public_key.serialize()
    }

    /// Uncompressed SEC1 public key (0x04 ‖ X ‖ Y)
    pub fn public_key_uncompressed(&self) -> [u8; 65] {
        self.xpub.public_key.serialize_uncompressed()
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        self.xpub.chain_code.as_bytes()
    }

    pub fn depth(&self) -> u8 {
        self.xpub.depth
    }

    pub fn child_number(&self) -> u32 {
        u32::from(self.xpub.child_number)
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.xpub.parent_fingerprint.to_bytes()
    }

    /// HASH160 of the compressed public key
    pub fn identifier(&self) -> [u8; 20] {
        self.xpub.identifier().to_byte_array()
    }

    /// First four bytes of the identifier
    pub fn fingerprint(&self) -> [u8; 4] {
        self.xpub.fingerprint().to_bytes()
    }

    /// Base58check `xprv`; fails on a neutered node
    pub fn to_xprv(&self) -> Result<Zeroizing<String>, DerivationError> {
        let xpriv = self
            .xpriv
            .as_ref()
            .ok_or_else(|| DerivationError::InvalidExtendedKey("no private key".to_string()))?;
        let body = Zeroizing::new(xpriv.encode());
        Ok(Zeroizing::new(bitcoin::base58::encode_check(body.as_slice())))
    }

    /// Base58check `xpub`
    pub fn to_xpub(&self) -> String {
        self.xpub.to_string()
    }

    /// Parse an `xprv` or `xpub` string. Only mainnet version bytes are accepted.
    pub fn from_base58(encoded: &str) -> Result<Self, DerivationError> {
        let body = Zeroizing::new(
            bitcoin::base58::decode_check(encoded.trim())
                .map_err(|e| DerivationError::InvalidExtendedKey(e.to_string()))?,
        );
        if body.len() != SERIALIZED_LEN {
            return Err(DerivationError::InvalidExtendedKey(format!(
                "expected {} bytes, got {}",
                SERIALIZED_LEN,
                body.len()
            )));
        }

        let depth = body[4];
        if depth == 0 && (body[5..13].iter().any(|b| *b != 0)) {
            return Err(DerivationError::InvalidExtendedKey(
                "master key with non-zero parent fingerprint or index".to_string(),
            ));
        }

        match &body[0..4] {
            v if v == XPRV_VERSION => {
                if body[45] != 0 {
                    return Err(DerivationError::InvalidExtendedKey("private key prefix must be 0x00".to_string()));
                }
                Ok(Self::from_xpriv(Xpriv::decode(&body)?))
            }
            v if v == XPUB_VERSION => {
                let xpub = Xpub::decode(&body).map_err(|e| DerivationError::InvalidExtendedKey(e.to_string()))?;
                Ok(Self { xpriv: None, xpub })
            }
            other => Err(DerivationError::InvalidExtendedKey(format!(
                "unknown version bytes {}",
                hex::encode(other)
            ))),
        }
    }
}

impl Drop for ExtendedKey {
    fn drop(&mut self) {
        if let Some(xpriv) = self.xpriv.as_mut() {
            xpriv.private_key.non_secure_erase();
        }
    }
}

impl FromStr for ExtendedKey {
    type Err = DerivationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("private", &self.is_private())
            .field("public_key", &hex::encode(self.public_key()))
            .field("depth", &self.depth())
            .field("child_number", &self.child_number())
            .finish_non_exhaustive()
    }
}

fn child_number(component: DerivationComponent) -> Result<ChildNumber, DerivationError> {
    let number = if component.hardened {
        ChildNumber::from_hardened_idx(component.index)?
    } else {
        ChildNumber::from_normal_idx(component.index)?
    };
    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::derivation_path::HARDENED;
    use bitcoin::bip32::DerivationPath as BtcPath;

    const SEED1: &str = "000102030405060708090a0b0c0d0e0f";

    #[test]
    fn test_bip32_vector1_master() {
        let master = ExtendedKey::master_from_seed(&hex::decode(SEED1).unwrap()).unwrap();
        assert_eq!(
            master.to_xprv().unwrap().as_str(),
            "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi"
        );
        assert_eq!(
            master.to_xpub(),
            "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8"
        );
    }

    #[test]
    fn test_bip32_vector1_hardened_child() {
        let master = ExtendedKey::master_from_seed(&hex::decode(SEED1).unwrap()).unwrap();
        let child = master.derive_path_str("m/0'").unwrap();
        assert_eq!(
            child.to_xprv().unwrap().as_str(),
            "xprv9uHRZZhk6KAJC1avXpDAp4MDc3sQKNxDiPvvkX8Br5ngLNv1TxvUxt4cV1rGL5hj6KCesnDYUhd7oWgT11eZG7XnxHrnYeSvkzY7d2bhkJ7"
        );
        assert_eq!(child.depth(), 1);
        assert_eq!(child.child_number(), HARDENED);
        assert_eq!(child.parent_fingerprint(), master.fingerprint());
    }

    #[test]
    fn test_step_derivation_matches_full_path() {
        let seed = hex::decode("fffcf9f6f3f0edeae7e4e1dedbd8d5d2cfccc9c6c3c0bdbab7b4b1aeaba8a5a29f9c999693908d8a8784817e7b7875726f6c696663605d5a5754514e4b484542").unwrap();
        let secp = Secp256k1::new();
        let reference_master = Xpriv::new_master(bitcoin::Network::Bitcoin, &seed).unwrap();
        let master = ExtendedKey::master_from_seed(&seed).unwrap();

        for path in ["m/0", "m/0/2147483647'/1", "m/44'/60'/0'/0/7", "m/84'/0'/0'/1/3"] {
            let btc_path = BtcPath::from_str(path).unwrap();
            let reference = reference_master.derive_priv(&secp, &btc_path).unwrap();
            let ours = master.derive_path_str(path).unwrap();
            assert_eq!(ours.to_xprv().unwrap().as_str(), reference.to_string(), "{}", path);
        }
    }

    #[test]
    fn test_public_derivation_matches_private() {
        let master = ExtendedKey::master_from_seed(&[7u8; 32]).unwrap();
        let account = master.derive_path_str("m/44'/60'/0'").unwrap();
        let from_private = account.derive_path_str("m/0/5").unwrap();
        let from_public = account.neuter().derive_path_str("m/0/5").unwrap();

        assert_eq!(from_private.public_key(), from_public.public_key());
        assert_eq!(from_private.to_xpub(), from_public.to_xpub());
        assert!(!from_public.is_private());
        assert_eq!(from_public.public_key_uncompressed()[0], 0x04);
    }

    #[test]
    fn test_hardened_from_public_fails() {
        let master = ExtendedKey::master_from_seed(&[7u8; 32]).unwrap();
        let err = master.neuter().derive_child(0, true).unwrap_err();
        assert_eq!(err, DerivationError::HardenedFromPublic);
        assert_eq!(DkesError::from(err).code, ErrorCode::HardenedFromPublic);
    }

    #[test]
    fn test_child_index_out_of_range() {
        let master = ExtendedKey::master_from_seed(&[7u8; 32]).unwrap();
        let err = master.derive_child(HARDENED, false).unwrap_err();
        assert!(matches!(err, DerivationError::InvalidPath(_)));
        assert_eq!(DkesError::from(err).code, ErrorCode::InvalidPath);
    }

    #[test]
    fn test_seed_length_bounds() {
        assert_eq!(
            ExtendedKey::master_from_seed(&[1u8; 15]).unwrap_err(),
            DerivationError::InvalidSeedLength(15)
        );
        assert!(ExtendedKey::master_from_seed(&[1u8; 65]).is_err());
        assert!(ExtendedKey::master_from_seed(&[1u8; 16]).is_ok());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let master = ExtendedKey::master_from_seed(&[9u8; 64]).unwrap();
        let node = master.derive_path_str("m/1'/2").unwrap();

        let xprv = node.to_xprv().unwrap();
        let parsed: ExtendedKey = xprv.parse().unwrap();
        assert!(parsed.is_private());
        assert_eq!(parsed.to_xpub(), node.to_xpub());
        assert_eq!(parsed.private_key(), node.private_key());

        let xpub = node.to_xpub();
        let parsed_pub = ExtendedKey::from_base58(&xpub).unwrap();
        assert!(!parsed_pub.is_private());
        assert!(parsed_pub.to_xprv().is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ExtendedKey::from_base58("xpub123").is_err());
        let bad = bitcoin::base58::encode_check(&[0u8; 78]);
        assert!(matches!(
            ExtendedKey::from_base58(&bad),
            Err(DerivationError::InvalidExtendedKey(_))
        ));

        let master = ExtendedKey::master_from_seed(&[9u8; 32]).unwrap();
        let mut body = bitcoin::base58::decode_check(master.to_xprv().unwrap().as_str()).unwrap();
        body[45] = 0x01;
        let bad_prefix = bitcoin::base58::encode_check(&body);
        assert!(matches!(
            ExtendedKey::from_base58(&bad_prefix),
            Err(DerivationError::InvalidExtendedKey(_))
        ));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let master = ExtendedKey::master_from_seed(&hex::decode(SEED1).unwrap()).unwrap();
        let debug = format!("{:?}", master);
        let private_hex = hex::encode(master.private_key().unwrap());
        assert!(!debug.contains(&private_hex));
    }
}
