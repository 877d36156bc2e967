//! Coin Key Derivation
//!
//! Derives per-coin keys and addresses from a BIP-39 seed:
//! - EVM: `m/44'/60'/account'/0/i`, keccak256 of the uncompressed key
//! - Bitcoin P2PKH: `m/44'/{0|1}'/0'/0/i`
//! - Bitcoin P2WPKH: `m/84'/{0|1}'/0'/0/i`
//! - Solana: SLIP-10 ed25519 at `m/44'/501'/account'/0'`
//!
//! SECURITY: private key material is returned only inside `DerivedKeypair`,
//! which zeroizes on drop. `DerivedAccount` is public data.

use std::ops::Range;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use serde::Serialize;

use crate::error::{DkesError, DkesResult, ErrorCode};
use crate::security::secure_memory::SecretBytes;
use crate::types::{Coin, CoinAddress, Network};
use crate::utils::crypto::keccak256;
use crate::log_debug;

use super::derivation_path::{
    bitcoin_p2pkh_path, bitcoin_p2wpkh_path, evm_path, parse_path, solana_path, DerivationComponent,
    DerivationPath,
};
use super::hd::ExtendedKey;
use super::slip10::derive_ed25519;

/// Public half of a derived key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedAccount {
    pub coin: Coin,
    pub path: DerivationPath,
    pub address: CoinAddress,
    /// Compressed secp256k1 key (33 bytes) or ed25519 key (32 bytes)
    #[serde(with = "hex_bytes")]
    pub public_key: Vec<u8>,
}

impl DerivedAccount {
    pub fn address_string(&self) -> String {
        self.address.to_string()
    }
}

/// A derived account together with its secret key
///
/// For secp256k1 coins the secret is the 32-byte scalar; for Solana it is
/// the 64-byte keypair (seed ‖ public key).
pub struct DerivedKeypair {
    pub account: DerivedAccount,
    secret: SecretBytes,
}

impl DerivedKeypair {
    pub fn secret(&self) -> &SecretBytes {
        &self.secret
    }

    pub fn into_parts(self) -> (DerivedAccount, SecretBytes) {
        (self.account, self.secret)
    }
}

impl std::fmt::Debug for DerivedKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKeypair")
            .field("account", &self.account)
            .field("secret", &self.secret)
            .finish()
    }
}

// =============================================================================
// EVM
// =============================================================================

/// EVM key at `m/44'/60'/account'/0/index`
pub fn derive_evm(seed: &[u8], account: u32, index: u32) -> DkesResult<DerivedKeypair> {
    let master = ExtendedKey::master_from_seed(seed)?;
    evm_keypair(&master, evm_path(account, index))
}

/// EVM key at an arbitrary text path
pub fn derive_path_from_seed_evm(seed: &[u8], path: &str) -> DkesResult<DerivedKeypair> {
    let path = parse_path(path)?;
    let master = ExtendedKey::master_from_seed(seed)?;
    evm_keypair(&master, path)
}

/// Batch EVM derivation: the `m/44'/60'/account'/0` parent is derived once
/// and only the last index is stepped.
pub fn derive_evm_accounts(seed: &[u8], account: u32, range: Range<u32>) -> DkesResult<Vec<DerivedKeypair>> {
    if range.end > super::derivation_path::HARDENED {
        return Err(DkesError::new(ErrorCode::InvalidPath, "address index out of range"));
    }

    let master = ExtendedKey::master_from_seed(seed)?;
    let parent_path = evm_path(account, 0)
        .parent()
        .ok_or_else(|| DkesError::internal("EVM path has no parent"))?;
    let parent = master.derive_path(&parent_path)?;

    log_debug!("derivation", "Deriving EVM account batch",
        path = parent_path, start = range.start, end = range.end);

    range
        .map(|index| {
            let child = parent.derive_child(index, false)?;
            evm_from_node(&child, parent_path.child(DerivationComponent::normal(index)))
        })
        .collect()
}

fn evm_keypair(master: &ExtendedKey, path: DerivationPath) -> DkesResult<DerivedKeypair> {
    let node = master.derive_path(&path)?;
    evm_from_node(&node, path)
}

fn evm_from_node(node: &ExtendedKey, path: DerivationPath) -> DkesResult<DerivedKeypair> {
    let private_key = node
        .private_key()
        .ok_or_else(|| DkesError::internal("derived node has no private key"))?;
    let public_key = node.public_key();
    let address = evm_address_from_public_key(&public_key)?;

    log_debug!("derivation", "Derived EVM account", path = path);

    Ok(DerivedKeypair {
        account: DerivedAccount {
            coin: Coin::Evm,
            path,
            address: CoinAddress::Evm(address),
            public_key: public_key.to_vec(),
        },
        secret: SecretBytes::from_slice(private_key),
    })
}

/// Last 20 bytes of keccak256(X ‖ Y); accepts compressed or uncompressed keys
pub fn evm_address_from_public_key(public_key: &[u8]) -> DkesResult<[u8; 20]> {
    let key = PublicKey::from_slice(public_key)
        .map_err(|e| DkesError::new(ErrorCode::InvalidPublicKey, e.to_string()))?;
    let uncompressed = key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Ok(address)
}

// =============================================================================
// Bitcoin
// =============================================================================

/// P2PKH key at `m/44'/{0|1}'/0'/0/index`
pub fn derive_bitcoin_p2pkh(seed: &[u8], network: Network, index: u32) -> DkesResult<DerivedKeypair> {
    let path = bitcoin_p2pkh_path(network, index);
    let node = ExtendedKey::master_from_seed(seed)?.derive_path(&path)?;
    let address = p2pkh_address(&node.public_key(), network)?;
    bitcoin_keypair(&node, path, Coin::BitcoinP2pkh, CoinAddress::BitcoinP2pkh(address))
}

/// P2WPKH key at `m/84'/{0|1}'/0'/0/index`
pub fn derive_bitcoin_p2wpkh(seed: &[u8], network: Network, index: u32) -> DkesResult<DerivedKeypair> {
    let path = bitcoin_p2wpkh_path(network, index);
    let node = ExtendedKey::master_from_seed(seed)?.derive_path(&path)?;
    let address = p2wpkh_address(&node.public_key(), network)?;
    bitcoin_keypair(&node, path, Coin::BitcoinP2wpkh, CoinAddress::BitcoinP2wpkh(address))
}

fn bitcoin_keypair(
    node: &ExtendedKey,
    path: DerivationPath,
    coin: Coin,
    address: CoinAddress,
) -> DkesResult<DerivedKeypair> {
    let private_key = node
        .private_key()
        .ok_or_else(|| DkesError::internal("derived node has no private key"))?;

    log_debug!("derivation", "Derived Bitcoin account", path = path, coin = coin.symbol());

    Ok(DerivedKeypair {
        account: DerivedAccount {
            coin,
            path,
            address,
            public_key: node.public_key().to_vec(),
        },
        secret: SecretBytes::from_slice(private_key),
    })
}

/// base58check(version ‖ HASH160(compressed key))
pub fn p2pkh_address(public_key: &[u8; 33], network: Network) -> DkesResult<String> {
    let key = compressed_key(public_key)?;
    Ok(bitcoin::Address::p2pkh(&key, network.to_bitcoin()).to_string())
}

/// bech32(hrp, 0, HASH160(compressed key))
pub fn p2wpkh_address(public_key: &[u8; 33], network: Network) -> DkesResult<String> {
    let key = compressed_key(public_key)?;
    Ok(bitcoin::Address::p2wpkh(&key, network.to_bitcoin()).to_string())
}

fn compressed_key(public_key: &[u8; 33]) -> DkesResult<bitcoin::CompressedPublicKey> {
    bitcoin::CompressedPublicKey::from_slice(public_key)
        .map_err(|e| DkesError::new(ErrorCode::InvalidPublicKey, e.to_string()))
}

// =============================================================================
// Solana
// =============================================================================

/// Solana key at `m/44'/501'/account'/0'`
pub fn derive_solana(seed: &[u8], account: u32) -> DkesResult<DerivedKeypair> {
    let path = solana_path(account);
    let node = derive_ed25519(seed, &path)?;
    let public_key = node.public_key();

    let mut keypair = SecretBytes::new(64);
    keypair.expose_mut()[..32].copy_from_slice(node.private_key());
    keypair.expose_mut()[32..].copy_from_slice(&public_key);

    log_debug!("derivation", "Derived Solana account", path = path);

    Ok(DerivedKeypair {
        account: DerivedAccount {
            coin: Coin::Solana,
            path,
            address: CoinAddress::Solana(public_key),
            public_key: public_key.to_vec(),
        },
        secret: keypair,
    })
}

// =============================================================================
// Signing
// =============================================================================

/// Recoverable ECDSA over a 32-byte digest, returned as r ‖ s ‖ v (v = 27 + recid)
pub fn sign_evm_digest(secret_key: &[u8], digest: &[u8; 32]) -> DkesResult<[u8; 65]> {
    let secp = Secp256k1::signing_only();
    let mut key = SecretKey::from_slice(secret_key)
        .map_err(|e| DkesError::new(ErrorCode::SigningFailed, format!("invalid secret key: {}", e)))?;
    let message = Message::from_digest(*digest);

    let signature = secp.sign_ecdsa_recoverable(&message, &key);
    key.non_secure_erase();
    let (recovery_id, compact) = signature.serialize_compact();

    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&compact);
    out[64] = 27 + recovery_id.to_i32() as u8;
    Ok(out)
}

/// Recover the signer's EVM address from an r ‖ s ‖ v signature
pub fn recover_evm_address(digest: &[u8; 32], signature: &[u8; 65]) -> DkesResult<[u8; 20]> {
    let v = match signature[64] {
        27 | 28 => signature[64] - 27,
        0 | 1 => signature[64],
        other => {
            return Err(DkesError::invalid_input(format!("invalid recovery byte {}", other)));
        }
    };
    let recovery_id = RecoveryId::from_i32(v as i32)
        .map_err(|e| DkesError::invalid_input(format!("invalid recovery id: {}", e)))?;
    let signature = RecoverableSignature::from_compact(&signature[..64], recovery_id)
        .map_err(|e| DkesError::invalid_input(format!("invalid signature: {}", e)))?;

    let secp = Secp256k1::verification_only();
    let public_key = secp
        .recover_ecdsa(&Message::from_digest(*digest), &signature)
        .map_err(|e| DkesError::crypto_error(format!("recovery failed: {}", e)))?;

    evm_address_from_public_key(&public_key.serialize())
}

/// ed25519 signature with a Solana keypair (64 bytes) or seed (32 bytes)
pub fn sign_solana_message(secret: &[u8], message: &[u8]) -> DkesResult<[u8; 64]> {
    if secret.len() != 32 && secret.len() != 64 {
        return Err(DkesError::new(ErrorCode::SigningFailed, "ed25519 secret must be 32 or 64 bytes"));
    }

    let mut seed = zeroize::Zeroizing::new([0u8; 32]);
    seed.copy_from_slice(&secret[..32]);
    let signing_key = SigningKey::from_bytes(&seed);

    if secret.len() == 64 && secret[32..] != signing_key.verifying_key().to_bytes() {
        return Err(DkesError::new(ErrorCode::SigningFailed, "keypair public half does not match"));
    }

    Ok(signing_key.sign(message).to_bytes())
}

/// Verify an ed25519 signature
pub fn verify_solana_signature(public_key: &[u8; 32], message: &[u8], signature: &[u8; 64]) -> bool {
    match VerifyingKey::from_bytes(public_key) {
        Ok(key) => key.verify(message, &Signature::from_bytes(signature)).is_ok(),
        Err(_) => false,
    }
}

mod hex_bytes {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }
}
