//! DKES Configuration
//!
//! Configuration is a plain value passed into every facade call:
//! - Security level presets (standard, high)
//! - Envelope KDF acceptance bounds
//! - Multisig defaults (Safe factory, Bitcoin network)
//! - Policy thresholds
//!
//! There is no global instance.

use serde::{Deserialize, Serialize};

use crate::error::{DkesError, DkesResult, ErrorCode};
use crate::types::Network;
use crate::wallet::address_validation::parse_evm_address;

/// PBKDF2 iterations written into every new envelope
pub const KDF_ITERATIONS: u32 = 600_000;
/// Hard floor on decrypt; configuration can raise it but never lower it
pub const MIN_KDF_ITERATIONS: u32 = 100_000;
/// Hard ceiling on decrypt; configuration can lower it but never raise it
pub const MAX_KDF_ITERATIONS: u32 = 10_000_000;
/// Gnosis Safe v1.3.0 proxy factory
pub const DEFAULT_SAFE_FACTORY: &str = "0xa6B71E26C5e0845f74c812102Ca7114b6a896AB2";

/// Security level presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    /// Suitable for most deployments
    #[default]
    Standard,
    /// Only current-cost envelopes and stricter password admission
    High,
    /// User-defined settings
    Custom,
}

/// Iteration counts accepted when decrypting. Encryption always writes
/// `KDF_ITERATIONS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeSettings {
    /// Envelopes below this are rejected on decrypt
    pub min_iterations: u32,
    /// Envelopes above this are rejected on decrypt
    pub max_iterations: u32,
}

impl EnvelopeSettings {
    /// Accepted range after clamping to the hard bounds
    pub fn accepted_iterations(&self) -> std::ops::RangeInclusive<u32> {
        self.min_iterations.max(MIN_KDF_ITERATIONS)..=self.max_iterations.min(MAX_KDF_ITERATIONS)
    }
}

impl Default for EnvelopeSettings {
    fn default() -> Self {
        Self {
            min_iterations: MIN_KDF_ITERATIONS,
            max_iterations: MAX_KDF_ITERATIONS,
        }
    }
}

/// Multisig settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultisigSettings {
    /// CREATE2 deployer used for Safe address prediction
    pub safe_factory: String,
    /// Network for P2SH / P2WSH addresses
    pub network: Network,
}

impl Default for MultisigSettings {
    fn default() -> Self {
        Self {
            safe_factory: DEFAULT_SAFE_FACTORY.to_string(),
            network: Network::Mainnet,
        }
    }
}

/// Admission policy settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    /// Minimum password score (0-100) accepted for envelope passwords
    pub min_password_score: u8,
    /// Minimum share of distinct words in a scored mnemonic
    pub min_unique_ratio: f64,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            min_password_score: 40,
            min_unique_ratio: 0.8,
        }
    }
}

/// Complete DKES configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DkesConfig {
    pub level: SecurityLevel,
    pub envelope: EnvelopeSettings,
    pub multisig: MultisigSettings,
    pub policy: PolicySettings,
}

impl DkesConfig {
    /// Standard security preset
    pub fn standard() -> Self {
        Self::default()
    }

    /// High security preset
    pub fn high() -> Self {
        Self {
            level: SecurityLevel::High,
            envelope: EnvelopeSettings {
                min_iterations: KDF_ITERATIONS,
                max_iterations: MAX_KDF_ITERATIONS,
            },
            multisig: MultisigSettings::default(),
            policy: PolicySettings {
                min_password_score: 70,
                min_unique_ratio: 0.9,
            },
        }
    }

    /// Parse a configuration from JSON and validate it
    pub fn from_json(json: &str) -> DkesResult<Self> {
        let config: DkesConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration. Hard inconsistencies are errors; weak but
    /// usable settings come back as warnings.
    pub fn validate(&self) -> DkesResult<Vec<String>> {
        let env = &self.envelope;
        if env.min_iterations < MIN_KDF_ITERATIONS || env.max_iterations > MAX_KDF_ITERATIONS {
            return Err(DkesError::new(
                ErrorCode::KdfParamsOutOfBounds,
                format!(
                    "envelope iteration bounds must lie within {}..={}",
                    MIN_KDF_ITERATIONS, MAX_KDF_ITERATIONS
                ),
            ));
        }
        if env.min_iterations > env.max_iterations {
            return Err(DkesError::invalid_input("envelope.min_iterations exceeds max_iterations"));
        }
        if !env.accepted_iterations().contains(&KDF_ITERATIONS) {
            return Err(DkesError::invalid_input(format!(
                "envelope bounds must accept the {} iterations written on encrypt",
                KDF_ITERATIONS
            )));
        }
        if self.policy.min_password_score > 100 {
            return Err(DkesError::invalid_input("policy.min_password_score must be <= 100"));
        }
        if !(0.0..=1.0).contains(&self.policy.min_unique_ratio) {
            return Err(DkesError::invalid_input("policy.min_unique_ratio must be within 0..=1"));
        }
        parse_evm_address(&self.multisig.safe_factory)
            .map_err(|e| DkesError::invalid_input(format!("multisig.safe_factory: {}", e.message)))?;

        let mut warnings = Vec::new();

        if self.policy.min_password_score < 40 {
            warnings.push("Warning: weak passwords are admitted for envelopes".to_string());
        }

        if self.multisig.network == Network::Testnet {
            warnings.push("Warning: multisig addresses are built for testnet".to_string());
        }

        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(DkesConfig::standard().validate().unwrap().is_empty());
        assert!(DkesConfig::high().validate().unwrap().is_empty());
        assert_eq!(DkesConfig::default().envelope.accepted_iterations(), 100_000..=10_000_000);
        assert_eq!(DkesConfig::high().envelope.accepted_iterations(), 600_000..=10_000_000);
        assert_eq!(DkesConfig::default().multisig.safe_factory, DEFAULT_SAFE_FACTORY);
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let mut config = DkesConfig::standard();
        config.envelope.min_iterations = 700_000;
        assert_eq!(config.validate().unwrap_err().code, ErrorCode::InvalidInput);

        let mut config = DkesConfig::standard();
        config.envelope.max_iterations = 50_000_000;
        assert_eq!(config.validate().unwrap_err().code, ErrorCode::KdfParamsOutOfBounds);

        let mut config = DkesConfig::standard();
        config.multisig.safe_factory = "0x1234".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_iteration_floor_cannot_be_lowered() {
        let mut config = DkesConfig::standard();
        config.envelope.min_iterations = 1;
        assert_eq!(config.validate().unwrap_err().code, ErrorCode::KdfParamsOutOfBounds);
        assert_eq!(config.envelope.accepted_iterations(), 100_000..=10_000_000);

        let err = DkesConfig::from_json(r#"{"envelope":{"min_iterations":1}}"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::KdfParamsOutOfBounds);
    }

    #[test]
    fn test_from_json_partial() {
        let config = DkesConfig::from_json(r#"{"policy":{"min_password_score":70}}"#).unwrap();
        assert_eq!(config.policy.min_password_score, 70);
        assert_eq!(config.policy.min_unique_ratio, 0.8);
        assert_eq!(config.envelope, EnvelopeSettings::default());
    }

    #[test]
    fn test_weak_settings_warn() {
        let mut config = DkesConfig::standard();
        config.policy.min_password_score = 10;
        config.multisig.network = Network::Testnet;
        let warnings = config.validate().unwrap();
        assert_eq!(warnings.len(), 2);
    }
}
