//! Multisig configuration validation
//!
//! Threshold bounds come first (so an empty member list reports
//! `InvalidInput`), then every member is parsed. Duplicates are rejected for
//! all kinds.

use std::collections::HashSet;

use crate::error::{DkesError, DkesResult};
use crate::policy::threshold::{check_threshold, MAX_SCRIPT_MEMBERS, MIN_SCRIPT_MEMBERS};
use crate::wallet::address_validation::parse_evm_address;

use super::{MultisigConfig, MultisigError, MultisigKind};

/// Validate a config and return its advisory warnings
pub fn validate_config(config: &MultisigConfig) -> DkesResult<Vec<String>> {
    if config.kind.is_bitcoin() {
        validate_bitcoin(config).map(|(_, warnings)| warnings)
    } else {
        validate_safe(config).map(|(_, warnings)| warnings)
    }
}

/// Threshold checks plus parsed compressed keys in input order
pub fn validate_bitcoin(config: &MultisigConfig) -> DkesResult<(Vec<[u8; 33]>, Vec<String>)> {
    let warnings = check_threshold(config.threshold, config.total(), Some(MAX_SCRIPT_MEMBERS))?;
    if config.total() < MIN_SCRIPT_MEMBERS {
        return Err(DkesError::invalid_input(format!(
            "{} multisig requires {} to {} public keys",
            config.kind, MIN_SCRIPT_MEMBERS, MAX_SCRIPT_MEMBERS
        )));
    }
    let keys = parse_public_keys(&config.members)?;
    Ok((keys, warnings))
}

/// Threshold checks plus parsed owner addresses in input order
pub fn validate_safe(config: &MultisigConfig) -> DkesResult<(Vec<[u8; 20]>, Vec<String>)> {
    let warnings = check_threshold(config.threshold, config.total(), None)?;
    let owners = parse_owners(&config.members)?;
    Ok((owners, warnings))
}

/// Parse hex-encoded compressed secp256k1 public keys (1-based positions in errors)
pub fn parse_public_keys(members: &[String]) -> Result<Vec<[u8; 33]>, MultisigError> {
    let mut seen = HashSet::new();
    let mut keys = Vec::with_capacity(members.len());

    for (i, member) in members.iter().enumerate() {
        let position = i + 1;
        let trimmed = member.trim();
        let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(hex_part).map_err(|e| MultisigError::InvalidPublicKey {
            position,
            reason: e.to_string(),
        })?;

        if bytes.len() == 65 {
            return Err(MultisigError::UncompressedKey(position));
        }

        let key = secp256k1::PublicKey::from_slice(&bytes).map_err(|e| MultisigError::InvalidPublicKey {
            position,
            reason: e.to_string(),
        })?;
        let compressed = key.serialize();

        if !seen.insert(compressed) {
            return Err(MultisigError::DuplicateMember(position));
        }
        keys.push(compressed);
    }

    Ok(keys)
}

/// Parse Safe owner addresses; the zero address is not a valid owner
pub fn parse_owners(members: &[String]) -> Result<Vec<[u8; 20]>, MultisigError> {
    let mut seen = HashSet::new();
    let mut owners = Vec::with_capacity(members.len());

    for (i, member) in members.iter().enumerate() {
        let position = i + 1;
        let owner = parse_evm_address(member).map_err(|e| MultisigError::InvalidOwner {
            position,
            reason: e.message,
        })?;

        if owner == [0u8; 20] {
            return Err(MultisigError::ZeroAddress(position));
        }
        if !seen.insert(owner) {
            return Err(MultisigError::DuplicateMember(position));
        }
        owners.push(owner);
    }

    Ok(owners)
}
