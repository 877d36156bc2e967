//! Shared types for DKES
//!
//! Value types that cross module boundaries: networks, coins, mnemonic word
//! counts and rendered addresses.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DkesError, DkesResult, ErrorCode};

// =============================================================================
// Networks
// =============================================================================

/// Bitcoin network selector (mainnet `bc` / testnet `tb`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    /// Bech32 human-readable part
    pub fn hrp(&self) -> &'static str {
        match self {
            Network::Mainnet => "bc",
            Network::Testnet => "tb",
        }
    }

    /// Base58check version byte for P2PKH
    pub fn p2pkh_version(&self) -> u8 {
        match self {
            Network::Mainnet => 0x00,
            Network::Testnet => 0x6F,
        }
    }

    /// Base58check version byte for P2SH
    pub fn p2sh_version(&self) -> u8 {
        match self {
            Network::Mainnet => 0x05,
            Network::Testnet => 0xC4,
        }
    }

    /// SLIP-44 coin type used in the BIP-44 path
    pub fn bip44_coin_type(&self) -> u32 {
        match self {
            Network::Mainnet => 0,
            Network::Testnet => 1,
        }
    }

    pub fn to_bitcoin(self) -> bitcoin::Network {
        match self {
            Network::Mainnet => bitcoin::Network::Bitcoin,
            Network::Testnet => bitcoin::Network::Testnet,
        }
    }
}

impl std::str::FromStr for Network {
    type Err = DkesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" | "main" | "bc" => Ok(Network::Mainnet),
            "testnet" | "test" | "tb" => Ok(Network::Testnet),
            other => Err(DkesError::invalid_input(format!("Unknown network: {}", other))),
        }
    }
}

// =============================================================================
// Coins
// =============================================================================

/// Coin families with a key adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Coin {
    /// Ethereum and EVM-compatible chains
    Evm,
    /// Bitcoin legacy P2PKH (BIP-44)
    BitcoinP2pkh,
    /// Bitcoin native SegWit P2WPKH (BIP-84)
    BitcoinP2wpkh,
    /// Solana, SLIP-0010 ed25519
    Solana,
}

impl Coin {
    pub fn symbol(&self) -> &'static str {
        match self {
            Coin::Evm => "ETH",
            Coin::BitcoinP2pkh | Coin::BitcoinP2wpkh => "BTC",
            Coin::Solana => "SOL",
        }
    }
}

impl std::str::FromStr for Coin {
    type Err = DkesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "evm" | "eth" | "ethereum" => Ok(Coin::Evm),
            "btc" | "bitcoin" | "p2pkh" => Ok(Coin::BitcoinP2pkh),
            "p2wpkh" | "segwit" => Ok(Coin::BitcoinP2wpkh),
            "sol" | "solana" => Ok(Coin::Solana),
            other => Err(DkesError::invalid_input(format!("Unsupported coin: {}", other))),
        }
    }
}

// =============================================================================
// Mnemonic sizes
// =============================================================================

/// BIP-39 mnemonic length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum WordCount {
    Twelve,
    Fifteen,
    Eighteen,
    TwentyOne,
    TwentyFour,
}

impl WordCount {
    pub fn from_words(words: usize) -> DkesResult<Self> {
        match words {
            12 => Ok(WordCount::Twelve),
            15 => Ok(WordCount::Fifteen),
            18 => Ok(WordCount::Eighteen),
            21 => Ok(WordCount::TwentyOne),
            24 => Ok(WordCount::TwentyFour),
            n => Err(DkesError::new(
                ErrorCode::BadWordCount,
                format!("Unsupported word count: {}", n),
            )),
        }
    }

    /// Map a generation strength (bits of entropy) to a word count
    pub fn from_strength_bits(bits: u32) -> DkesResult<Self> {
        match bits {
            128 => Ok(WordCount::Twelve),
            160 => Ok(WordCount::Fifteen),
            192 => Ok(WordCount::Eighteen),
            224 => Ok(WordCount::TwentyOne),
            256 => Ok(WordCount::TwentyFour),
            n => Err(DkesError::invalid_input(format!(
                "Strength must be one of 128, 160, 192, 224, 256 bits, got {}",
                n
            ))),
        }
    }

    pub fn words(&self) -> usize {
        match self {
            WordCount::Twelve => 12,
            WordCount::Fifteen => 15,
            WordCount::Eighteen => 18,
            WordCount::TwentyOne => 21,
            WordCount::TwentyFour => 24,
        }
    }

    pub fn entropy_bytes(&self) -> usize {
        self.words() * 4 / 3
    }

    pub fn entropy_bits(&self) -> usize {
        self.entropy_bytes() * 8
    }

    /// Word counts accepted by mnemonic validation and BIP-85
    pub fn is_standard(&self) -> bool {
        matches!(self, WordCount::Twelve | WordCount::Eighteen | WordCount::TwentyFour)
    }
}

impl TryFrom<u32> for WordCount {
    type Error = DkesError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        WordCount::from_words(value as usize)
    }
}

impl From<WordCount> for u32 {
    fn from(value: WordCount) -> Self {
        value.words() as u32
    }
}

impl fmt::Display for WordCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.words())
    }
}

// =============================================================================
// Addresses
// =============================================================================

/// A rendered public address, tagged by coin family
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CoinAddress {
    /// 20-byte EVM address
    Evm([u8; 20]),
    /// Base58check P2PKH string
    BitcoinP2pkh(String),
    /// Bech32 witness v0 string
    BitcoinP2wpkh(String),
    /// 32-byte ed25519 public key
    Solana([u8; 32]),
}

impl CoinAddress {
    pub fn coin(&self) -> Coin {
        match self {
            CoinAddress::Evm(_) => Coin::Evm,
            CoinAddress::BitcoinP2pkh(_) => Coin::BitcoinP2pkh,
            CoinAddress::BitcoinP2wpkh(_) => Coin::BitcoinP2wpkh,
            CoinAddress::Solana(_) => Coin::Solana,
        }
    }
}

impl fmt::Display for CoinAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinAddress::Evm(bytes) => write!(f, "{}", crate::utils::crypto::to_checksum_address(bytes)),
            CoinAddress::BitcoinP2pkh(s) | CoinAddress::BitcoinP2wpkh(s) => write!(f, "{}", s),
            CoinAddress::Solana(pubkey) => write!(f, "{}", bs58::encode(pubkey).into_string()),
        }
    }
}
