//! SLIP-0010 ed25519 derivation
//!
//! Master: HMAC-SHA512("ed25519 seed", seed). Children are hardened only:
//! HMAC-SHA512(chain_code, 0x00 ‖ key ‖ ser32(i | 2³¹)).

use std::fmt;

use ed25519_dalek::SigningKey;
use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroizing;

use super::derivation_path::DerivationPath;
use super::hd::DerivationError;

type HmacSha512 = Hmac<Sha512>;

const ED25519_HMAC_KEY: &[u8] = b"ed25519 seed";

/// An ed25519 node: private seed and chain code
#[derive(Clone)]
pub struct Slip10Node {
    key: Zeroizing<[u8; 32]>,
    chain_code: Zeroizing<[u8; 32]>,
    depth: u8,
}

impl Slip10Node {
    pub fn master_from_seed(seed: &[u8]) -> Result<Self, DerivationError> {
        if !(16..=64).contains(&seed.len()) {
            return Err(DerivationError::InvalidSeedLength(seed.len()));
        }
        let (key, chain_code) = hmac_sha512(ED25519_HMAC_KEY, &[seed])?;
        Ok(Self { key, chain_code, depth: 0 })
    }

    /// Hardened child; ed25519 has no public derivation
    pub fn derive_child(&self, index: u32, hardened: bool) -> Result<Self, DerivationError> {
        if !hardened {
            return Err(DerivationError::Slip10(
                "ed25519 only supports hardened derivation".to_string(),
            ));
        }
        if index >= super::derivation_path::HARDENED {
            return Err(DerivationError::InvalidPath(format!("child index {} out of range", index)));
        }
        let depth = self
            .depth
            .checked_add(1)
            .ok_or_else(|| DerivationError::Slip10("maximum depth exceeded".to_string()))?;

        let ser_index = (index | super::derivation_path::HARDENED).to_be_bytes();
        let (key, chain_code) = hmac_sha512(
            self.chain_code.as_slice(),
            &[&[0u8][..], self.key.as_slice(), &ser_index[..]],
        )?;

        Ok(Self { key, chain_code, depth })
    }

    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self, DerivationError> {
        let mut node = self.clone();
        for component in path.components() {
            node = node.derive_child(component.index, component.hardened)?;
        }
        Ok(node)
    }

    pub fn private_key(&self) -> &[u8; 32] {
        &self.key
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn signing_key(&self) -> SigningKey {
        SigningKey::from_bytes(&self.key)
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key().verifying_key().to_bytes()
    }
}

impl fmt::Debug for Slip10Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slip10Node")
            .field("public_key", &hex::encode(self.public_key()))
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

/// HMAC-SHA512 over concatenated parts, split into (IL, IR)
fn hmac_sha512(
    key: &[u8],
    parts: &[&[u8]],
) -> Result<(Zeroizing<[u8; 32]>, Zeroizing<[u8; 32]>), DerivationError> {
    let mut mac = HmacSha512::new_from_slice(key)
        .map_err(|e| DerivationError::Slip10(format!("HMAC error: {}", e)))?;
    for part in parts {
        mac.update(part);
    }
    let mut result = mac.finalize().into_bytes();

    let mut il = Zeroizing::new([0u8; 32]);
    let mut ir = Zeroizing::new([0u8; 32]);
    il.copy_from_slice(&result[..32]);
    ir.copy_from_slice(&result[32..]);
    result.iter_mut().for_each(|b| *b = 0);
    Ok((il, ir))
}

/// Derive `path` from `seed` in one step
pub fn derive_ed25519(seed: &[u8], path: &DerivationPath) -> Result<Slip10Node, DerivationError> {
    Slip10Node::master_from_seed(seed)?.derive_path(path)
}
