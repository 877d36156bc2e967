//! Gnosis Safe address prediction
//!
//! `address = keccak256(0xff ‖ factory ‖ salt ‖ init_code_hash)[12..]` with
//! - `init_code_hash = keccak256(abi(address[] owners, uint256 threshold, uint256 salt_nonce))`
//! - `salt = keccak256(utf8(decimal salt_nonce))`
//!
//! Owners are sorted by address bytes first, so the prediction does not
//! depend on input order. The result is never deployed by DKES.

use crate::error::DkesResult;
use crate::log_debug;
use crate::utils::crypto::{keccak256, to_checksum_address};
use crate::wallet::address_validation::parse_evm_address;
use crate::wallet::rng::SecureRandom;

use super::abi::{encode, AbiToken};
use super::validation::validate_safe;
use super::{MultisigArtifact, MultisigConfig, MultisigKind, SafeDeployment};

/// keccak256 of the ABI-encoded setup parameters
pub fn safe_setup_hash(owners: &[[u8; 20]], threshold: u32, salt_nonce: u32) -> [u8; 32] {
    let encoded = encode(&[
        AbiToken::Array(owners.iter().copied().map(AbiToken::Address).collect()),
        AbiToken::Uint(threshold as u64),
        AbiToken::Uint(salt_nonce as u64),
    ]);
    keccak256(&encoded)
}

/// CREATE2 salt for a nonce: keccak256 of its decimal string
pub fn safe_salt(salt_nonce: u32) -> [u8; 32] {
    keccak256(salt_nonce.to_string().as_bytes())
}

/// EIP-1014 CREATE2 address
pub fn create2_address(factory: &[u8; 20], salt: &[u8; 32], init_code_hash: &[u8; 32]) -> [u8; 20] {
    let mut data = Vec::with_capacity(1 + 20 + 32 + 32);
    data.push(0xff);
    data.extend_from_slice(factory);
    data.extend_from_slice(salt);
    data.extend_from_slice(init_code_hash);

    let hash = keccak256(&data);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

fn random_nonce(rng: &mut dyn SecureRandom) -> DkesResult<u32> {
    let mut bytes = [0u8; 4];
    rng.fill(&mut bytes)?;
    Ok(u32::from_be_bytes(bytes))
}

/// Predict the Safe address for `config` under `factory`
pub fn predict_safe(
    config: &MultisigConfig,
    factory: &str,
    rng: &mut dyn SecureRandom,
) -> DkesResult<MultisigArtifact> {
    let factory_bytes = parse_evm_address(factory)?;
    let (mut owners, warnings) = validate_safe(config)?;
    owners.sort_unstable();

    let salt_nonce = match config.salt_nonce {
        Some(nonce) => nonce,
        None => random_nonce(rng)?,
    };

    let init_data_hash = safe_setup_hash(&owners, config.threshold, salt_nonce);
    let salt = safe_salt(salt_nonce);
    let address = to_checksum_address(&create2_address(&factory_bytes, &salt, &init_data_hash));

    log_debug!("multisig", "Predicted Safe address",
        threshold = config.threshold, total = owners.len(), salt_nonce = salt_nonce, address = address);

    Ok(MultisigArtifact {
        kind: MultisigKind::GnosisSafe,
        address,
        script: None,
        canonical_config: MultisigConfig {
            kind: MultisigKind::GnosisSafe,
            members: owners.iter().map(|o| to_checksum_address(o)).collect(),
            threshold: config.threshold,
            salt_nonce: Some(salt_nonce),
        },
        warnings,
        safe: Some(SafeDeployment {
            factory: to_checksum_address(&factory_bytes),
            salt_nonce,
            init_data_hash: format!("0x{}", hex::encode(init_data_hash)),
            deployed: false,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SAFE_FACTORY;
    use crate::error::ErrorCode;
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const OWNER_A: &str = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";
    const OWNER_B: &str = "0x1111111111111111111111111111111111111111";
    const OWNER_C: &str = "0xFFfFfFffFFfffFFfFFfFFFFFffFFFffffFfFFFfF";

    fn config(owners: &[&str], threshold: u32, nonce: Option<u32>) -> MultisigConfig {
        let mut config = MultisigConfig::new(
            MultisigKind::GnosisSafe,
            owners.iter().map(|o| o.to_string()).collect(),
            threshold,
        );
        config.salt_nonce = nonce;
        config
    }

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(42)
    }

    #[test]
    fn test_create2_eip1014_vector() {
        // EIP-1014 example 0: zero deployer, zero salt, init code 0x00
        let address = create2_address(&[0u8; 20], &[0u8; 32], &keccak256(&[0u8]));
        assert_eq!(
            to_checksum_address(&address),
            "0x4D1A2e2bB4F88F0250f26Ffff098B0b30B26BF38"
        );
    }

    #[test]
    fn test_salt_is_decimal_string_hash() {
        assert_eq!(safe_salt(42), keccak256(b"42"));
        assert_eq!(safe_salt(0), keccak256(b"0"));
    }

    #[test]
    fn test_owner_order_does_not_matter() {
        let a = predict_safe(&config(&[OWNER_A, OWNER_B, OWNER_C], 2, Some(7)), DEFAULT_SAFE_FACTORY, &mut rng()).unwrap();
        let b = predict_safe(&config(&[OWNER_C, OWNER_A, OWNER_B], 2, Some(7)), DEFAULT_SAFE_FACTORY, &mut rng()).unwrap();
        assert_eq!(a.address, b.address);
        assert_eq!(
            a.canonical_config.members,
            vec![
                "0x1111111111111111111111111111111111111111".to_string(),
                OWNER_A.to_string(),
                OWNER_C.to_string(),
            ]
        );
    }

    #[test]
    fn test_recomputes_from_parts() {
        let artifact = predict_safe(&config(&[OWNER_A, OWNER_B], 2, Some(1)), DEFAULT_SAFE_FACTORY, &mut rng()).unwrap();
        let mut owners = vec![parse_evm_address(OWNER_A).unwrap(), parse_evm_address(OWNER_B).unwrap()];
        owners.sort();
        let hash = safe_setup_hash(&owners, 2, 1);
        let factory = parse_evm_address(DEFAULT_SAFE_FACTORY).unwrap();
        let expected = create2_address(&factory, &safe_salt(1), &hash);

        assert_eq!(artifact.address, to_checksum_address(&expected));
        let safe = artifact.safe.unwrap();
        assert_eq!(safe.init_data_hash, format!("0x{}", hex::encode(hash)));
        assert!(!safe.deployed);
        assert_eq!(safe.factory, DEFAULT_SAFE_FACTORY);
    }

    #[test]
    fn test_nonce_changes_address() {
        let a = predict_safe(&config(&[OWNER_A, OWNER_B], 1, Some(1)), DEFAULT_SAFE_FACTORY, &mut rng()).unwrap();
        let b = predict_safe(&config(&[OWNER_A, OWNER_B], 1, Some(2)), DEFAULT_SAFE_FACTORY, &mut rng()).unwrap();
        assert_ne!(a.address, b.address);
    }

    #[test]
    fn test_random_nonce_recorded() {
        let artifact = predict_safe(&config(&[OWNER_A], 1, None), DEFAULT_SAFE_FACTORY, &mut rng()).unwrap();
        let nonce = artifact.canonical_config.salt_nonce.unwrap();
        assert_eq!(artifact.safe.as_ref().unwrap().salt_nonce, nonce);

        // replaying the recorded nonce reproduces the address
        let replay = predict_safe(&config(&[OWNER_A], 1, Some(nonce)), DEFAULT_SAFE_FACTORY, &mut rng()).unwrap();
        assert_eq!(replay.address, artifact.address);

        let same_seed = predict_safe(&config(&[OWNER_A], 1, None), DEFAULT_SAFE_FACTORY, &mut rng()).unwrap();
        assert_eq!(same_seed.canonical_config.salt_nonce, Some(nonce));
    }

    #[test]
    fn test_rejections() {
        let zero = format!("0x{}", "0".repeat(40));
        let err = predict_safe(&config(&[OWNER_A, &zero], 1, Some(0)), DEFAULT_SAFE_FACTORY, &mut rng()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAddress);

        let lower = OWNER_A.to_lowercase();
        let err = predict_safe(&config(&[OWNER_A, &lower], 1, Some(0)), DEFAULT_SAFE_FACTORY, &mut rng()).unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateMember);

        let err = predict_safe(&config(&[OWNER_A], 1, Some(0)), "0x1234", &mut rng()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAddress);
    }

    #[test]
    fn test_unbounded_owner_count() {
        let owners: Vec<String> = (1u8..=20).map(|i| format!("0x{}", hex::encode([i; 20]))).collect();
        let config = MultisigConfig::new(MultisigKind::GnosisSafe, owners, 11).with_salt_nonce(3);
        let artifact = predict_safe(&config, DEFAULT_SAFE_FACTORY, &mut rng()).unwrap();
        assert_eq!(artifact.canonical_config.members.len(), 20);
    }
}
