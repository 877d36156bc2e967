//! Public facade
//!
//! Stateless entry points over the wallet, envelope, multisig and policy
//! modules. Configuration (`DkesConfig`) and randomness are always passed in;
//! nothing here keeps state between calls.
//!
//! Secret outputs are returned in zeroizing containers (`Mnemonic`, `Seed`,
//! `SecretBytes`, `DerivedKeypair`) separate from public results.

use serde::{Deserialize, Serialize};

use crate::config::DkesConfig;
use crate::crypto::envelope::{self, Envelope};
use crate::error::{DkesError, DkesResult};
use crate::log_info;
use crate::multisig::{self, MultisigArtifact, MultisigConfig};
use crate::policy::password::{self, check_password_policy, PasswordStrength};
use crate::policy::threshold::recommended_threshold;
use crate::security::secure_memory::SecretBytes;
use crate::types::{Coin, Network, WordCount};
use crate::wallet::address_validation::{validate_address_detailed, AddressValidation};
use crate::wallet::bip85::{self, ChildMnemonic};
use crate::wallet::derivation::{self, DerivedAccount, DerivedKeypair};
use crate::wallet::mnemonic::{self, Mnemonic, MnemonicScore};
use crate::wallet::rng::SecureRandom;
use crate::wallet::seed::{seed_from_mnemonic, Seed};

/// Which key to derive from a seed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeriveRequest {
    pub coin: Coin,
    #[serde(default)]
    pub network: Network,
    /// EVM account level; ignored by the other coins
    #[serde(default)]
    pub account: u32,
    /// Address index. For Solana this is the hardened account in
    /// `m/44'/501'/index'/0'`.
    #[serde(default)]
    pub index: u32,
}

impl DeriveRequest {
    pub fn new(coin: Coin, index: u32) -> Self {
        Self {
            coin,
            network: Network::Mainnet,
            account: 0,
            index,
        }
    }

    pub fn on(mut self, network: Network) -> Self {
        self.network = network;
        self
    }
}

// =============================================================================
// Mnemonics and seeds
// =============================================================================

/// Fresh mnemonic of `word_count` words
pub fn generate_mnemonic(word_count: WordCount, rng: &mut dyn SecureRandom) -> DkesResult<Mnemonic> {
    let mnemonic = mnemonic::generate_mnemonic(word_count.entropy_bits() as u32, rng)?;
    log_info!("facade", "Generated mnemonic", word_count = word_count);
    Ok(mnemonic)
}

/// Validate a 12, 18 or 24 word phrase
pub fn validate_mnemonic(phrase: &str) -> DkesResult<Mnemonic> {
    mnemonic::validate_mnemonic(phrase).map_err(DkesError::from)
}

/// Score a phrase using the configured word-reuse ratio
pub fn score_mnemonic(phrase: &str, config: &DkesConfig) -> MnemonicScore {
    mnemonic::score_mnemonic_with_ratio(phrase, config.policy.min_unique_ratio)
}

/// BIP-39 seed for an already validated mnemonic
pub fn seed(mnemonic: &Mnemonic, passphrase: Option<&str>) -> Seed {
    seed_from_mnemonic(mnemonic, passphrase)
}

/// Validate `phrase` and derive its seed
pub fn seed_from_phrase(phrase: &str, passphrase: Option<&str>) -> DkesResult<Seed> {
    let mnemonic = validate_mnemonic(phrase)?;
    Ok(seed_from_mnemonic(&mnemonic, passphrase))
}

// =============================================================================
// Keys
// =============================================================================

/// Derive a key pair; the secret travels in the returned `DerivedKeypair`
pub fn derive_keypair(seed: &Seed, request: &DeriveRequest) -> DkesResult<DerivedKeypair> {
    let seed = seed.as_bytes();
    match request.coin {
        Coin::Evm => derivation::derive_evm(seed, request.account, request.index),
        Coin::BitcoinP2pkh => derivation::derive_bitcoin_p2pkh(seed, request.network, request.index),
        Coin::BitcoinP2wpkh => derivation::derive_bitcoin_p2wpkh(seed, request.network, request.index),
        Coin::Solana => derivation::derive_solana(seed, request.index),
    }
}

/// Derive only the public account; the private key is dropped before return
pub fn derive_account(seed: &Seed, request: &DeriveRequest) -> DkesResult<DerivedAccount> {
    derive_keypair(seed, request).map(|keypair| keypair.into_parts().0)
}

/// BIP-85 child mnemonic of `master`
pub fn derive_child_mnemonic(
    master: &Mnemonic,
    index: u32,
    word_count: WordCount,
    lang: u32,
) -> DkesResult<ChildMnemonic> {
    bip85::derive_child_mnemonic(master, index, word_count, lang)
}

// =============================================================================
// Envelopes
// =============================================================================

/// Encrypt a secret after checking `password` against the configured policy
pub fn encrypt_secret(
    plaintext: &[u8],
    password: &str,
    config: &DkesConfig,
    rng: &mut dyn SecureRandom,
) -> DkesResult<Envelope> {
    check_password_policy(password, config.policy.min_password_score)?;
    envelope::encrypt(plaintext, password, rng)
}

/// Decrypt an envelope into a zeroizing buffer
pub fn decrypt_secret(envelope: &Envelope, password: &str, config: &DkesConfig) -> DkesResult<SecretBytes> {
    envelope::decrypt(envelope, password, &config.envelope)
}

/// Encrypt a mnemonic phrase
pub fn encrypt_mnemonic(
    mnemonic: &Mnemonic,
    password: &str,
    config: &DkesConfig,
    rng: &mut dyn SecureRandom,
) -> DkesResult<Envelope> {
    encrypt_secret(mnemonic.phrase().as_bytes(), password, config, rng)
}

/// Decrypt an envelope holding a mnemonic and re-validate it
pub fn decrypt_mnemonic(envelope: &Envelope, password: &str, config: &DkesConfig) -> DkesResult<Mnemonic> {
    let plaintext = decrypt_secret(envelope, password, config)?;
    let phrase = std::str::from_utf8(plaintext.expose())
        .map_err(|_| DkesError::invalid_input("envelope does not contain a mnemonic"))?;
    validate_mnemonic(phrase)
}

// =============================================================================
// Multisig and policy
// =============================================================================

/// Build a P2SH / P2WSH multisig or predict a Safe address
pub fn build_multisig(
    request: &MultisigConfig,
    config: &DkesConfig,
    rng: &mut dyn SecureRandom,
) -> DkesResult<MultisigArtifact> {
    multisig::build_multisig(request, &config.multisig, rng)
}

/// Multisig request with a simple-majority threshold over `members`
pub fn majority_multisig(kind: multisig::MultisigKind, members: Vec<String>) -> MultisigConfig {
    let threshold = recommended_threshold(members.len());
    MultisigConfig::new(kind, members, threshold)
}

/// Classify and check an address for `coin` on `network`
pub fn validate_address(address: &str, coin: Coin, network: Network) -> AddressValidation {
    let validation = validate_address_detailed(address, coin, network);
    log_info!("facade", "Validated address", address = address, coin = coin.symbol(), valid = validation.is_valid);
    validation
}

/// Password strength report
pub fn score_password(password: &str) -> PasswordStrength {
    password::score_password(password)
}
