//! Key Derivation Path Parsing and Validation
//!
//! Parses BIP-32 text paths (`m/44'/60'/0'/0/0`; `'`, `h` and `H` mark
//! hardening) and checks them against the coin they are used for:
//! - Correct format and syntax
//! - Coin-appropriate purpose and coin type
//! - Advisory warnings for unusual paths

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{Coin, Network};

use super::hd::DerivationError;

/// Standard BIP purposes
pub mod bip_purposes {
    pub const BIP44: u32 = 44; // Legacy (P2PKH), EVM, Solana
    pub const BIP84: u32 = 84; // Native SegWit (P2WPKH)
    pub const BIP85: u32 = 83_696_968; // Deterministic entropy
}

/// Coin types from SLIP-0044
pub mod coin_types {
    pub const BITCOIN: u32 = 0;
    pub const BITCOIN_TESTNET: u32 = 1;
    pub const ETHEREUM: u32 = 60;
    pub const SOLANA: u32 = 501;
}

/// Hardened offset for BIP-32 derivation
pub const HARDENED: u32 = 0x8000_0000;

/// Single component of a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivationComponent {
    pub index: u32,
    pub hardened: bool,
}

impl DerivationComponent {
    pub fn new(index: u32, hardened: bool) -> Self {
        Self { index, hardened }
    }

    pub fn hardened(index: u32) -> Self {
        Self::new(index, true)
    }

    pub fn normal(index: u32) -> Self {
        Self::new(index, false)
    }

    /// Index including the hardened bit
    pub fn full_index(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED
        } else {
            self.index
        }
    }
}

impl fmt::Display for DerivationComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

/// Ordered sequence of (index, hardened) pairs, applied leaf-ward from `m`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    components: Vec<DerivationComponent>,
}

impl DerivationPath {
    /// The empty path (`m`)
    pub fn master() -> Self {
        Self::default()
    }

    pub fn from_components(components: Vec<DerivationComponent>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[DerivationComponent] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Append one component, returning the extended path
    pub fn child(&self, component: DerivationComponent) -> Self {
        let mut components = self.components.clone();
        components.push(component);
        Self { components }
    }

    /// Path without its last component
    pub fn parent(&self) -> Option<Self> {
        if self.components.is_empty() {
            return None;
        }
        Some(Self {
            components: self.components[..self.components.len() - 1].to_vec(),
        })
    }

    pub fn last(&self) -> Option<DerivationComponent> {
        self.components.last().copied()
    }

    pub fn purpose(&self) -> Option<u32> {
        self.components.first().map(|c| c.index)
    }

    pub fn coin_type(&self) -> Option<u32> {
        self.components.get(1).map(|c| c.index)
    }

    pub fn account(&self) -> Option<u32> {
        self.components.get(2).map(|c| c.index)
    }

    pub fn change(&self) -> Option<u32> {
        self.components.get(3).map(|c| c.index)
    }

    pub fn address_index(&self) -> Option<u32> {
        self.components.get(4).map(|c| c.index)
    }

    pub fn is_fully_hardened(&self) -> bool {
        self.components.iter().all(|c| c.hardened)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = DerivationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_path(s)
    }
}

impl Serialize for DerivationPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DerivationPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_path(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse a derivation path string
pub fn parse_path(path: &str) -> Result<DerivationPath, DerivationError> {
    let trimmed = path.trim();

    if trimmed == "m" || trimmed == "M" {
        return Ok(DerivationPath::master());
    }

    // Must start with m/
    let path_part = trimmed
        .strip_prefix("m/")
        .or_else(|| trimmed.strip_prefix("M/"))
        .ok_or_else(|| DerivationError::InvalidPath("derivation path must start with 'm/'".to_string()))?;

    if path_part.is_empty() {
        return Err(DerivationError::InvalidPath("empty derivation path".to_string()));
    }

    let components = path_part
        .split('/')
        .map(parse_component)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DerivationPath { components })
}

/// Parse a single path component
fn parse_component(s: &str) -> Result<DerivationComponent, DerivationError> {
    let trimmed = s.trim();

    if trimmed.is_empty() {
        return Err(DerivationError::InvalidPath("empty path component".to_string()));
    }

    let (number_str, hardened) = match trimmed.strip_suffix(&['\'', 'h', 'H'][..]) {
        Some(rest) => (rest, true),
        None => (trimmed, false),
    };

    if number_str.is_empty() || !number_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DerivationError::InvalidPath(format!("invalid path component '{}'", s)));
    }

    let index: u32 = number_str
        .parse()
        .map_err(|_| DerivationError::InvalidPath(format!("path component '{}' is out of range", s)))?;

    if index >= HARDENED {
        return Err(DerivationError::InvalidPath(format!(
            "path component {} exceeds maximum value",
            index
        )));
    }

    Ok(DerivationComponent::new(index, hardened))
}

/// Derivation path validation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathValidation {
    pub is_valid: bool,
    pub normalized: Option<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Parse a path and check it against the coin it will be used for
pub fn validate_derivation_path(path: &str, coin: Coin, network: Network) -> PathValidation {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    let parsed = match parse_path(path) {
        Ok(p) => p,
        Err(e) => {
            return PathValidation {
                is_valid: false,
                normalized: None,
                warnings: vec![],
                errors: vec![e.to_string()],
            };
        }
    };

    if let Some(purpose) = parsed.purpose() {
        let expected = expected_purpose(coin);
        if purpose != expected {
            warnings.push(format!(
                "Purpose {} unexpected for {}, expected {}",
                purpose,
                coin.symbol(),
                expected
            ));
        }
    }

    if let Some(coin_type) = parsed.coin_type() {
        let expected = expected_coin_type(coin, network);
        if coin_type != expected {
            if coin_type == coin_types::BITCOIN_TESTNET && network == Network::Mainnet && coin != Coin::Evm {
                errors.push("Testnet coin type on a mainnet path".to_string());
            } else {
                warnings.push(format!(
                    "Coin type {} unexpected for {}, expected {}",
                    coin_type,
                    coin.symbol(),
                    expected
                ));
            }
        }
    }

    if let Some(account) = parsed.account() {
        if account > 100 {
            warnings.push(format!("Account {} is unusually high", account));
        }
    }

    if coin != Coin::Solana {
        if let Some(change) = parsed.change() {
            if change > 1 {
                warnings.push(format!(
                    "Non-standard change value: {}. Should be 0 (external) or 1 (internal/change)",
                    change
                ));
            }
        }
    }

    if let Some(index) = parsed.address_index() {
        if index > 10_000 {
            warnings.push(format!("Address index {} is unusually high", index));
        }
    }

    if parsed.components().iter().take(3).any(|c| !c.hardened) {
        warnings.push("Purpose, coin type and account levels are not all hardened".to_string());
    }

    if coin == Coin::Solana && !parsed.is_fully_hardened() {
        errors.push("ed25519 derivation supports hardened components only".to_string());
    }

    PathValidation {
        is_valid: errors.is_empty(),
        normalized: Some(parsed.to_string()),
        warnings,
        errors,
    }
}

fn expected_purpose(coin: Coin) -> u32 {
    match coin {
        Coin::BitcoinP2wpkh => bip_purposes::BIP84,
        Coin::Evm | Coin::BitcoinP2pkh | Coin::Solana => bip_purposes::BIP44,
    }
}

fn expected_coin_type(coin: Coin, network: Network) -> u32 {
    match coin {
        Coin::Evm => coin_types::ETHEREUM,
        Coin::Solana => coin_types::SOLANA,
        Coin::BitcoinP2pkh | Coin::BitcoinP2wpkh => network.bip44_coin_type(),
    }
}

/// `m/44'/60'/account'/0/index`
pub fn evm_path(account: u32, index: u32) -> DerivationPath {
    DerivationPath::from_components(vec![
        DerivationComponent::hardened(bip_purposes::BIP44),
        DerivationComponent::hardened(coin_types::ETHEREUM),
        DerivationComponent::hardened(account),
        DerivationComponent::normal(0),
        DerivationComponent::normal(index),
    ])
}

/// `m/44'/{0|1}'/0'/0/index`
pub fn bitcoin_p2pkh_path(network: Network, index: u32) -> DerivationPath {
    DerivationPath::from_components(vec![
        DerivationComponent::hardened(bip_purposes::BIP44),
        DerivationComponent::hardened(network.bip44_coin_type()),
        DerivationComponent::hardened(0),
        DerivationComponent::normal(0),
        DerivationComponent::normal(index),
    ])
}

/// `m/84'/{0|1}'/0'/0/index`
pub fn bitcoin_p2wpkh_path(network: Network, index: u32) -> DerivationPath {
    DerivationPath::from_components(vec![
        DerivationComponent::hardened(bip_purposes::BIP84),
        DerivationComponent::hardened(network.bip44_coin_type()),
        DerivationComponent::hardened(0),
        DerivationComponent::normal(0),
        DerivationComponent::normal(index),
    ])
}

/// `m/44'/501'/account'/0'`
pub fn solana_path(account: u32) -> DerivationPath {
    DerivationPath::from_components(vec![
        DerivationComponent::hardened(bip_purposes::BIP44),
        DerivationComponent::hardened(coin_types::SOLANA),
        DerivationComponent::hardened(account),
        DerivationComponent::hardened(0),
    ])
}
