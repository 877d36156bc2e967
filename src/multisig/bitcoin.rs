//! Bitcoin bare multisig wrapped in P2SH / P2WSH
//!
//! Script: `OP_M <pub_1> ... <pub_N> OP_N OP_CHECKMULTISIG`, keys in input
//! order. P2SH commits to HASH160(script), P2WSH to SHA-256(script).

use bitcoin::opcodes::all::OP_CHECKMULTISIG;
use bitcoin::script::{Builder, Script, ScriptBuf};
use bitcoin::Address;

use crate::error::{DkesError, DkesResult};
use crate::log_debug;
use crate::types::Network;

use super::validation::validate_bitcoin;
use super::{MultisigArtifact, MultisigConfig, MultisigKind};

/// Build the M-of-N CHECKMULTISIG script
pub fn redeem_script(threshold: u32, keys: &[[u8; 33]]) -> ScriptBuf {
    keys.iter()
        .fold(Builder::new().push_int(i64::from(threshold)), |builder, key| builder.push_slice(key))
        .push_int(keys.len() as i64)
        .push_opcode(OP_CHECKMULTISIG)
        .into_script()
}

/// Base58check P2SH address (version 0x05 / 0xC4)
pub fn p2sh_address(script: &Script, network: Network) -> DkesResult<String> {
    Address::p2sh(script, network.to_bitcoin())
        .map(|address| address.to_string())
        .map_err(|e| DkesError::internal(format!("P2SH script rejected: {}", e)))
}

/// Bech32 P2WSH address
pub fn p2wsh_address(script: &Script, network: Network) -> String {
    Address::p2wsh(script, network.to_bitcoin()).to_string()
}

fn build(config: &MultisigConfig, network: Network, kind: MultisigKind) -> DkesResult<MultisigArtifact> {
    let (keys, warnings) = validate_bitcoin(config)?;
    let script = redeem_script(config.threshold, &keys);

    let address = match kind {
        MultisigKind::P2wsh => p2wsh_address(&script, network),
        _ => p2sh_address(&script, network)?,
    };

    log_debug!("multisig", "Built Bitcoin multisig",
        kind = kind, threshold = config.threshold, total = keys.len(), address = address);

    Ok(MultisigArtifact {
        kind,
        address,
        script: Some(hex::encode(script.as_bytes())),
        canonical_config: MultisigConfig {
            kind,
            members: keys.iter().map(hex::encode).collect(),
            threshold: config.threshold,
            salt_nonce: None,
        },
        warnings,
        safe: None,
    })
}

/// P2SH multisig for `config.members` (hex compressed public keys)
pub fn build_p2sh(config: &MultisigConfig, network: Network) -> DkesResult<MultisigArtifact> {
    build(config, network, MultisigKind::P2sh)
}

/// P2WSH multisig for `config.members` (hex compressed public keys)
pub fn build_p2wsh(config: &MultisigConfig, network: Network) -> DkesResult<MultisigArtifact> {
    build(config, network, MultisigKind::P2wsh)
}
