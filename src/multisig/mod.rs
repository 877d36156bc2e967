//! MultiSig Module
//!
//! Threshold address construction from public material only:
//! - Bitcoin bare multisig wrapped in P2SH or P2WSH
//! - Gnosis Safe proxy address prediction (CREATE2)
//!
//! Nothing here touches private keys.

pub mod abi;
pub mod bitcoin;
pub mod safe;
pub mod validation;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::MultisigSettings;
use crate::error::{DkesError, DkesResult, ErrorCode};
use crate::wallet::rng::SecureRandom;

pub use self::bitcoin::{build_p2sh, build_p2wsh, p2sh_address, p2wsh_address, redeem_script};
pub use safe::{create2_address, predict_safe, safe_salt, safe_setup_hash};
pub use validation::validate_config;

/// Multisig flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MultisigKind {
    P2sh,
    P2wsh,
    GnosisSafe,
}

impl MultisigKind {
    pub fn is_bitcoin(&self) -> bool {
        matches!(self, MultisigKind::P2sh | MultisigKind::P2wsh)
    }
}

impl fmt::Display for MultisigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultisigKind::P2sh => write!(f, "p2sh"),
            MultisigKind::P2wsh => write!(f, "p2wsh"),
            MultisigKind::GnosisSafe => write!(f, "gnosis-safe"),
        }
    }
}

impl FromStr for MultisigKind {
    type Err = DkesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "p2sh" => Ok(MultisigKind::P2sh),
            "p2wsh" => Ok(MultisigKind::P2wsh),
            "safe" | "gnosis-safe" | "gnosis_safe" => Ok(MultisigKind::GnosisSafe),
            _ => Err(DkesError::invalid_input(format!("Unknown multisig kind: {}", s))),
        }
    }
}

/// Multisig request: hex public keys (Bitcoin) or EVM addresses (Safe)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigConfig {
    pub kind: MultisigKind,
    pub members: Vec<String>,
    pub threshold: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt_nonce: Option<u32>,
}

impl MultisigConfig {
    pub fn new(kind: MultisigKind, members: Vec<String>, threshold: u32) -> Self {
        Self {
            kind,
            members,
            threshold,
            salt_nonce: None,
        }
    }

    pub fn with_salt_nonce(mut self, salt_nonce: u32) -> Self {
        self.salt_nonce = Some(salt_nonce);
        self
    }

    /// N
    pub fn total(&self) -> usize {
        self.members.len()
    }
}

/// Safe-specific part of an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeDeployment {
    pub factory: String,
    pub salt_nonce: u32,
    /// 0x-prefixed keccak256 of the ABI-encoded setup parameters
    pub init_data_hash: String,
    /// Always false: the address is a prediction
    pub deployed: bool,
}

/// Result of building a multisig
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigArtifact {
    pub kind: MultisigKind,
    pub address: String,
    /// Redeem (P2SH) or witness (P2WSH) script, hex
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Members normalized (Safe: checksummed and sorted; nonce filled in)
    pub canonical_config: MultisigConfig,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe: Option<SafeDeployment>,
}

/// Member-level multisig errors; threshold errors come from `policy::threshold`
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MultisigError {
    #[error("member {position}: invalid public key ({reason})")]
    InvalidPublicKey { position: usize, reason: String },

    #[error("member {0}: public key must be compressed (33 bytes)")]
    UncompressedKey(usize),

    #[error("owner {position}: {reason}")]
    InvalidOwner { position: usize, reason: String },

    #[error("owner {0} is the zero address")]
    ZeroAddress(usize),

    #[error("member {0} is listed more than once")]
    DuplicateMember(usize),
}

impl MultisigError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidPublicKey { .. } | Self::UncompressedKey(_) => ErrorCode::InvalidPublicKey,
            Self::InvalidOwner { .. } | Self::ZeroAddress(_) => ErrorCode::InvalidAddress,
            Self::DuplicateMember(_) => ErrorCode::DuplicateMember,
        }
    }
}

impl From<MultisigError> for DkesError {
    fn from(e: MultisigError) -> Self {
        DkesError::new(e.code(), e.to_string())
    }
}

/// Build any multisig kind. Bitcoin kinds use `settings.network`; the Safe
/// uses `settings.safe_factory` and draws a salt nonce from `rng` if needed.
pub fn build_multisig(
    config: &MultisigConfig,
    settings: &MultisigSettings,
    rng: &mut dyn SecureRandom,
) -> DkesResult<MultisigArtifact> {
    match config.kind {
        MultisigKind::P2sh => build_p2sh(config, settings.network),
        MultisigKind::P2wsh => build_p2wsh(config, settings.network),
        MultisigKind::GnosisSafe => predict_safe(config, &settings.safe_factory, rng),
    }
}
