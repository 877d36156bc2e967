//! Wallet Module
//!
//! Mnemonic handling, seed derivation, BIP-32 / SLIP-10 key trees, per-coin
//! key adapters, address validation and BIP-85 child mnemonics.

pub mod address_validation;
pub mod bip85;
pub mod derivation;
pub mod derivation_path;
pub mod hd;
pub mod mnemonic;
pub mod rng;
pub mod seed;
pub mod slip10;

pub use address_validation::{
    normalize_evm_address, parse_evm_address, parse_solana_address, validate_address_detailed, AddressType, AddressValidation,
};
pub use bip85::{derive_child_mnemonic, derive_hierarchy, validate_derivation, ChildMnemonic, DerivationRecord, HierarchyEntry};
pub use derivation::{
    derive_bitcoin_p2pkh, derive_bitcoin_p2wpkh, derive_evm, derive_evm_accounts, derive_path_from_seed_evm,
    derive_solana, DerivedAccount, DerivedKeypair,
};
pub use derivation_path::{parse_path, validate_derivation_path, DerivationComponent, DerivationPath, PathValidation};
pub use hd::{DerivationError, ExtendedKey};
pub use mnemonic::{
    entropy_to_mnemonic, generate_mnemonic, mnemonic_to_entropy, score_mnemonic, validate_mnemonic, Mnemonic,
    MnemonicError, MnemonicScore, Wordlist,
};
pub use rng::{os_rng, SecureRandom};
pub use seed::{seed_from_mnemonic, Seed};
