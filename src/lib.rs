//! DKES: Deterministic Key & Entropy Subsystem
//!
//! Key material for a multi-chain wallet, with no network access and no
//! persistent state.
//!
//! # Architecture
//!
//! This crate provides:
//! - **wallet**: BIP-39 mnemonics and seeds, BIP-32 / SLIP-10 key trees,
//!   per-coin key adapters (EVM, Bitcoin, Solana), BIP-85 child mnemonics
//! - **crypto**: the v2.0 password envelope (PBKDF2-HMAC-SHA256 + AES-256-GCM)
//! - **multisig**: Bitcoin P2SH / P2WSH scripts and Gnosis Safe prediction
//! - **policy**: password scoring and threshold checks
//! - **facade**: stateless entry points taking `DkesConfig` and an RNG
//!
//! # Security
//!
//! Seeds, private keys, mnemonics and decrypted plaintext live in containers
//! that zeroize on drop (`Seed`, `Mnemonic`, `SecretBytes`). Public results
//! never embed secret material.
//!
//! # Example
//!
//! ```rust,ignore
//! use dkes::{facade, types::{Coin, WordCount}, wallet::os_rng};
//!
//! let mnemonic = facade::generate_mnemonic(WordCount::Twelve, &mut os_rng())?;
//! let seed = facade::seed(&mnemonic, None);
//! let account = facade::derive_account(&seed, &facade::DeriveRequest::new(Coin::Evm, 0))?;
//! println!("{}", account.address_string());
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod facade;
pub mod multisig;
pub mod policy;
pub mod security;
pub mod types;
pub mod utils;
pub mod wallet;

// Re-export key types for convenience
pub use config::DkesConfig;
pub use crypto::envelope::Envelope;
pub use error::{DkesError, DkesResult, ErrorCode, ErrorKind};
pub use facade::DeriveRequest;
pub use multisig::{MultisigArtifact, MultisigConfig, MultisigKind};
pub use security::secure_memory::{SecretBytes, SecretString};
pub use types::{Coin, CoinAddress, Network, WordCount};
pub use wallet::{ChildMnemonic, DerivedAccount, DerivedKeypair, Mnemonic, Seed, SecureRandom};
