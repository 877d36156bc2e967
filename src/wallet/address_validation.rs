//! Address Validation
//!
//! Address parsing and normalization for the coins DKES derives:
//! - EIP-55 checksum validation and normalization
//! - Bitcoin base58check (P2PKH / P2SH) and bech32/bech32m witness addresses
//! - Solana base58 public keys

use bech32::{FromBase32, Variant};

use crate::error::{DkesError, DkesResult};
use crate::types::{Coin, Network};
use crate::utils::crypto::to_checksum_address;

/// Detailed address validation result
#[derive(Debug, Clone, serde::Serialize)]
pub struct AddressValidation {
    pub is_valid: bool,
    pub normalized: Option<String>,
    pub address_type: AddressType,
    pub checksum_valid: bool,
    pub network_match: bool,
    pub warnings: Vec<String>,
}

impl AddressValidation {
    fn invalid(reason: impl Into<String>, checksum_valid: bool, network_match: bool) -> Self {
        Self {
            is_valid: false,
            normalized: None,
            address_type: AddressType::Unknown,
            checksum_valid,
            network_match,
            warnings: vec![reason.into()],
        }
    }
}

/// Address type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    P2PKH,
    P2SH,
    P2WPKH,
    P2WSH,
    P2TR,
    Evm,
    Solana,
    Unknown,
}

/// Validate an address for a coin family
pub fn validate_address_detailed(address: &str, coin: Coin, network: Network) -> AddressValidation {
    match coin {
        Coin::Evm => validate_evm_detailed(address),
        Coin::BitcoinP2pkh | Coin::BitcoinP2wpkh => validate_bitcoin_detailed(address, network),
        Coin::Solana => validate_solana_detailed(address),
    }
}

/// Parse an EVM address. All-lower or all-upper input is accepted as is;
/// mixed-case input must carry a correct EIP-55 checksum.
pub fn parse_evm_address(address: &str) -> DkesResult<[u8; 20]> {
    let trimmed = address.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| DkesError::invalid_address("EVM address must start with 0x"))?;

    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DkesError::invalid_address(
            "expected 0x followed by 40 hex characters",
        ));
    }

    let mut bytes = [0u8; 20];
    hex::decode_to_slice(hex_part.to_ascii_lowercase(), &mut bytes)
        .map_err(|e| DkesError::invalid_address(e.to_string()))?;

    let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
    if has_upper && has_lower && to_checksum_address(&bytes)[2..] != *hex_part {
        return Err(DkesError::invalid_address("invalid EIP-55 checksum"));
    }

    Ok(bytes)
}

/// Parse and re-render an EVM address in EIP-55 form
pub fn normalize_evm_address(address: &str) -> DkesResult<String> {
    parse_evm_address(address).map(|bytes| to_checksum_address(&bytes))
}

/// Parse a Solana address into its 32-byte public key
pub fn parse_solana_address(address: &str) -> DkesResult<[u8; 32]> {
    let bytes = bs58::decode(address.trim())
        .into_vec()
        .map_err(|e| DkesError::invalid_address(format!("Invalid base58: {}", e)))?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
        DkesError::invalid_address(format!("expected 32 bytes, got {}", bytes.len()))
    })
}

fn validate_evm_detailed(address: &str) -> AddressValidation {
    let trimmed = address.trim();
    let mut warnings = Vec::new();

    let bytes = match parse_evm_address(trimmed) {
        Ok(bytes) => bytes,
        Err(e) => {
            let checksum_valid = !e.message.contains("checksum");
            return AddressValidation::invalid(e.message, checksum_valid, true);
        }
    };

    let hex_part = &trimmed[2..];
    let mixed = hex_part.chars().any(|c| c.is_ascii_uppercase()) && hex_part.chars().any(|c| c.is_ascii_lowercase());
    if !mixed {
        warnings.push("No EIP-55 checksum; normalized to checksummed form".to_string());
    }

    if bytes.iter().all(|&b| b == 0) {
        warnings.push("Zero address".to_string());
    }

    AddressValidation {
        is_valid: true,
        normalized: Some(to_checksum_address(&bytes)),
        address_type: AddressType::Evm,
        checksum_valid: true,
        network_match: true,
        warnings,
    }
}

fn validate_bitcoin_detailed(address: &str, network: Network) -> AddressValidation {
    let trimmed = address.trim();
    let lower = trimmed.to_lowercase();

    if lower.starts_with("bc1") || lower.starts_with("tb1") {
        return validate_bech32_bitcoin(trimmed, network);
    }
    validate_base58_bitcoin(trimmed, network)
}

fn validate_bech32_bitcoin(address: &str, network: Network) -> AddressValidation {
    let mut warnings = Vec::new();

    let (hrp, data, variant) = match bech32::decode(address) {
        Ok(decoded) => decoded,
        Err(e) => return AddressValidation::invalid(format!("Invalid bech32 encoding: {}", e), false, false),
    };

    if hrp != network.hrp() {
        return AddressValidation::invalid("Address is for a different network", true, false);
    }

    let Some((version, program_5bit)) = data.split_first() else {
        return AddressValidation::invalid("Empty witness program", false, true);
    };
    let witness_version = version.to_u8();
    let program = match Vec::<u8>::from_base32(program_5bit) {
        Ok(p) => p,
        Err(_) => return AddressValidation::invalid("Invalid witness program padding", false, true),
    };

    let address_type = match (witness_version, program.len()) {
        (0, 20) => AddressType::P2WPKH,
        (0, 32) => AddressType::P2WSH,
        (1, 32) => AddressType::P2TR,
        _ => {
            warnings.push(format!(
                "Unusual witness version {} or program length {}",
                witness_version,
                program.len()
            ));
            AddressType::Unknown
        }
    };

    let expected_variant = if witness_version == 0 { Variant::Bech32 } else { Variant::Bech32m };
    if variant != expected_variant {
        return AddressValidation::invalid("Incorrect bech32 variant for witness version", false, true);
    }

    AddressValidation {
        is_valid: true,
        normalized: Some(address.to_lowercase()),
        address_type,
        checksum_valid: true,
        network_match: true,
        warnings,
    }
}

fn validate_base58_bitcoin(address: &str, network: Network) -> AddressValidation {
    let mut warnings = Vec::new();

    let body = match bitcoin::base58::decode_check(address.trim()) {
        Ok(body) => body,
        Err(e) => return AddressValidation::invalid(format!("Invalid base58check: {}", e), false, false),
    };

    let Some((&version, payload)) = body.split_first() else {
        return AddressValidation::invalid("Base58check payload too short", true, false);
    };
    if payload.len() != 20 {
        return AddressValidation::invalid(format!("Invalid payload length {}", payload.len()), true, false);
    }

    let classified = [Network::Mainnet, Network::Testnet].into_iter().find_map(|candidate| {
        if version == candidate.p2pkh_version() {
            Some((AddressType::P2PKH, candidate))
        } else if version == candidate.p2sh_version() {
            Some((AddressType::P2SH, candidate))
        } else {
            None
        }
    });
    let Some((address_type, address_network)) = classified else {
        return AddressValidation::invalid(format!("Unknown version byte: 0x{:02X}", version), true, false);
    };

    let network_match = address_network == network;
    if !network_match {
        warnings.push("Address is for a different network".to_string());
    }

    if address_type == AddressType::P2PKH {
        warnings.push("Legacy P2PKH address - consider using SegWit for lower fees".to_string());
    }

    AddressValidation {
        is_valid: network_match,
        normalized: network_match.then(|| address.to_string()),
        address_type,
        checksum_valid: true,
        network_match,
        warnings,
    }
}

fn validate_solana_detailed(address: &str) -> AddressValidation {
    match parse_solana_address(address) {
        Ok(bytes) => {
            let mut warnings = Vec::new();
            if bytes.iter().all(|&b| b == 0) {
                warnings.push("All-zero key (system program)".to_string());
            }
            AddressValidation {
                is_valid: true,
                normalized: Some(address.trim().to_string()),
                address_type: AddressType::Solana,
                checksum_valid: true,
                network_match: true,
                warnings,
            }
        }
        Err(e) => AddressValidation::invalid(e.message, false, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitcoin_bech32_validation() {
        let result = validate_bitcoin_detailed("bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq", Network::Mainnet);
        assert!(result.is_valid);
        assert_eq!(result.address_type, AddressType::P2WPKH);

        let result = validate_bitcoin_detailed(
            "bc1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3qccfmv3",
            Network::Mainnet,
        );
        assert!(result.is_valid);
        assert_eq!(result.address_type, AddressType::P2WSH);

        let result = validate_bitcoin_detailed(
            "bc1p5d7rjq7g6rdk2yhzks9smlaqtedr4dekq08ge8ztwac72sfr9rusxg3297",
            Network::Mainnet,
        );
        assert!(result.is_valid);
        assert_eq!(result.address_type, AddressType::P2TR);

        let wrong_net = validate_bitcoin_detailed("bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq", Network::Testnet);
        assert!(!wrong_net.is_valid);
    }

    #[test]
    fn test_bitcoin_legacy() {
        let result = validate_bitcoin_detailed("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2", Network::Mainnet);
        assert!(result.is_valid);
        assert_eq!(result.address_type, AddressType::P2PKH);
        assert!(result.warnings.iter().any(|w| w.contains("Legacy")));

        let tampered = validate_bitcoin_detailed("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN3", Network::Mainnet);
        assert!(!tampered.is_valid);
        assert!(!tampered.checksum_valid);
    }

    #[test]
    fn test_evm_checksum_validation() {
        let result = validate_evm_detailed("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
        assert!(result.is_valid);
        assert!(result.checksum_valid);

        let lower = validate_evm_detailed("0xd8da6bf26964af9d7eed9e03e53415d37aa96045");
        assert!(lower.is_valid);
        assert_eq!(lower.normalized.as_deref(), Some("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"));
        assert!(lower.warnings.iter().any(|w| w.contains("no EIP-55 checksum")));

        let bad = validate_evm_detailed("0xD8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
        assert!(!bad.is_valid);
        assert!(!bad.checksum_valid);
    }

    #[test]
    fn test_parse_evm_address() {
        let upper = parse_evm_address("0XD8DA6BF26964AF9D7EED9E03E53415D37AA96045").unwrap();
        let lower = parse_evm_address("0xd8da6bf26964af9d7eed9e03e53415d37aa96045").unwrap();
        assert_eq!(upper, lower);
        assert!(parse_evm_address("d8da6bf26964af9d7eed9e03e53415d37aa96045").is_err());
        assert!(parse_evm_address("0x1234").is_err());
        assert!(parse_evm_address("0xzz8da6bf26964af9d7eed9e03e53415d37aa9604").is_err());
    }

    #[test]
    fn test_solana_address() {
        let key = parse_solana_address("HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk").unwrap();
        assert_eq!(bs58::encode(key).into_string(), "HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk");
        assert!(parse_solana_address("abc").is_err());
        assert!(!validate_solana_detailed("0OIl").is_valid);
    }

    #[test]
    fn test_dispatch_by_coin() {
        let evm = validate_address_detailed("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045", Coin::Evm, Network::Mainnet);
        assert!(evm.is_valid);
        assert_eq!(evm.address_type, AddressType::Evm);

        let script = bitcoin::ScriptBuf::from_bytes(vec![0x51]);
        let testnet_p2sh = bitcoin::Address::p2sh(&script, bitcoin::Network::Testnet).unwrap().to_string();
        let p2sh = validate_address_detailed(&testnet_p2sh, Coin::BitcoinP2wpkh, Network::Testnet);
        assert!(p2sh.is_valid);
        assert_eq!(p2sh.address_type, AddressType::P2SH);

        let mainnet_on_testnet = validate_address_detailed("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2", Coin::BitcoinP2pkh, Network::Testnet);
        assert!(!mainnet_on_testnet.is_valid);
        assert!(mainnet_on_testnet.checksum_valid);
        assert!(!mainnet_on_testnet.network_match);

        let solana = validate_address_detailed("HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk", Coin::Solana, Network::Mainnet);
        assert!(solana.is_valid);
        assert!(!validate_address_detailed("invalid", Coin::Evm, Network::Mainnet).is_valid);
    }
}
