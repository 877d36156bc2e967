use std::sync::OnceLock;

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dkes::config::EnvelopeSettings;
use dkes::crypto::envelope::{self, Envelope};
use dkes::multisig::{safe_setup_hash, MultisigConfig, MultisigKind};
use dkes::policy::{check_threshold, score_password};
use dkes::wallet::hd::ExtendedKey;
use dkes::wallet::mnemonic::{entropy_to_mnemonic, mnemonic_to_entropy, validate_mnemonic};
use dkes::{facade, DkesConfig, ErrorCode};
use proptest::prelude::*;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn any_entropy(sizes: &'static [usize]) -> impl Strategy<Value = Vec<u8>> {
    prop::sample::select(sizes).prop_flat_map(|len| prop::collection::vec(any::<u8>(), len))
}

fn any_owner() -> impl Strategy<Value = [u8; 20]> {
    prop::array::uniform20(any::<u8>()).prop_filter("non-zero owner", |o| *o != [0u8; 20])
}

proptest! {
    #[test]
    fn mnemonic_round_trips_through_validation(entropy in any_entropy(&[16, 24, 32])) {
        let mnemonic = entropy_to_mnemonic(&entropy).unwrap();
        let validated = validate_mnemonic(mnemonic.phrase()).unwrap();
        prop_assert_eq!(&validated, &mnemonic);
        let recovered = mnemonic_to_entropy(&validated);
        prop_assert_eq!(recovered.as_slice(), entropy.as_slice());
    }

    #[test]
    fn mnemonic_encoding_matches_bip39_crate(entropy in any_entropy(&[16, 20, 24, 28, 32])) {
        let ours = entropy_to_mnemonic(&entropy).unwrap();
        let reference = bip39::Mnemonic::from_entropy(&entropy).unwrap();
        prop_assert_eq!(ours.phrase(), reference.to_string());
    }

    #[test]
    fn password_score_is_bounded(password in ".{0,40}") {
        let strength = score_password(&password);
        prop_assert!(strength.score <= 100);
    }

    #[test]
    fn uppercase_letter_raises_lowercase_password(password in "[a-z]{1,24}", upper in "[A-Z]") {
        let base = score_password(&password).score;
        let raised = score_password(&format!("{}{}", password, upper)).score;
        prop_assert!(raised > base);
    }

    #[test]
    fn public_derivation_matches_private(seed in prop::array::uniform32(any::<u8>()), index in 0u32..0x8000_0000) {
        let master = ExtendedKey::master_from_seed(&seed).unwrap();
        let private_child = master.derive_child(index, false).unwrap();
        let public_child = master.neuter().derive_child(index, false).unwrap();
        prop_assert_eq!(private_child.public_key(), public_child.public_key());
        prop_assert_eq!(private_child.chain_code(), public_child.chain_code());
    }

    #[test]
    fn threshold_bounds(members in 1usize..=15, threshold in 0u32..=20) {
        let result = check_threshold(threshold, members, Some(15));
        if threshold == 0 {
            prop_assert_eq!(result.unwrap_err().code, ErrorCode::InvalidThreshold);
        } else if threshold as usize > members {
            prop_assert_eq!(result.unwrap_err().code, ErrorCode::ThresholdExceedsMembers);
        } else {
            prop_assert!(result.is_ok());
        }
    }

    #[test]
    fn safe_prediction_ignores_owner_order(
        owners in prop::collection::hash_set(any_owner(), 2..6),
        nonce in any::<u32>(),
    ) {
        let owners: Vec<String> = owners.into_iter().map(|o| format!("0x{}", hex::encode(o))).collect();
        let mut reversed = owners.clone();
        reversed.reverse();

        let config = DkesConfig::default();
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let a = facade::build_multisig(
            &MultisigConfig::new(MultisigKind::GnosisSafe, owners, 2).with_salt_nonce(nonce),
            &config,
            &mut rng,
        ).unwrap();
        let b = facade::build_multisig(
            &MultisigConfig::new(MultisigKind::GnosisSafe, reversed, 2).with_salt_nonce(nonce),
            &config,
            &mut rng,
        ).unwrap();
        prop_assert_eq!(&a.address, &b.address);
        prop_assert_eq!(&a.canonical_config.members, &b.canonical_config.members);
    }

    #[test]
    fn setup_hash_commits_to_threshold(owner in any_owner(), nonce in any::<u32>()) {
        prop_assert_ne!(safe_setup_hash(&[owner], 1, nonce), safe_setup_hash(&[owner], 2, nonce));
    }
}

const PASSWORD: &str = "CorrectHorseBatteryStaple1!";
const FLOOR_PLAINTEXT: &[u8] = b"seed words stay secret";

/// A 100 000-iteration envelope sealed directly with pbkdf2 + aes-gcm
fn floor_envelope() -> &'static Envelope {
    static ENVELOPE: OnceLock<Envelope> = OnceLock::new();
    ENVELOPE.get_or_init(|| {
        let salt = [0x5a; 32];
        let mut iv = [0u8; 16];
        iv[..12].copy_from_slice(&[0xa5; 12]);

        let mut key = [0u8; 32];
        pbkdf2::pbkdf2_hmac::<sha2::Sha256>(PASSWORD.as_bytes(), &salt, 100_000, &mut key);
        let cipher = Aes256Gcm::new_from_slice(&key).unwrap();

        let mut buffer = FLOOR_PLAINTEXT.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&iv[..12]), b"", &mut buffer)
            .unwrap();

        Envelope {
            version: "2.0".to_string(),
            algorithm: "aes-256-gcm".to_string(),
            iterations: 100_000,
            salt: STANDARD.encode(salt),
            iv: STANDARD.encode(iv),
            auth_tag: STANDARD.encode(tag),
            ciphertext: STANDARD.encode(&buffer),
        }
    })
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Ciphertext,
    Tag,
    Salt,
    Iv,
}

fn flip(envelope: &Envelope, field: Field, index: prop::sample::Index, mask: u8) -> Envelope {
    let mut out = envelope.clone();
    let slot = match field {
        Field::Ciphertext => &mut out.ciphertext,
        Field::Tag => &mut out.auth_tag,
        Field::Salt => &mut out.salt,
        Field::Iv => &mut out.iv,
    };
    let mut bytes = STANDARD.decode(slot.as_str()).unwrap();
    // only the first 12 IV bytes feed the nonce
    let len = match field {
        Field::Iv => 12,
        _ => bytes.len(),
    };
    bytes[index.index(len)] ^= mask;
    *slot = STANDARD.encode(bytes);
    out
}

#[test]
fn independently_sealed_envelope_opens() {
    let opened = envelope::decrypt(floor_envelope(), PASSWORD, &EnvelopeSettings::default()).unwrap();
    assert_eq!(opened.expose(), FLOOR_PLAINTEXT);
}

proptest! {
    // PBKDF2 dominates; keep the case count small
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn flipped_envelope_byte_fails_authentication(
        field in prop::sample::select(vec![Field::Ciphertext, Field::Tag, Field::Salt, Field::Iv]),
        index in any::<prop::sample::Index>(),
        mask in 1u8..=255,
    ) {
        let tampered = flip(floor_envelope(), field, index, mask);
        let err = envelope::decrypt(&tampered, PASSWORD, &EnvelopeSettings::default()).unwrap_err();
        prop_assert_eq!(err.code, ErrorCode::AuthFailure);
    }
}

proptest! {
    // Each case runs PBKDF2 twice at the full 600 000 iterations
    #![proptest_config(ProptestConfig::with_cases(2))]

    #[test]
    fn envelope_round_trips(plaintext in prop::collection::vec(any::<u8>(), 0..128), seed in any::<u64>()) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);

        let sealed = envelope::encrypt(&plaintext, PASSWORD, &mut rng).unwrap();
        prop_assert_eq!(sealed.iterations, 600_000);
        let opened = envelope::decrypt(&sealed, PASSWORD, &EnvelopeSettings::default()).unwrap();
        prop_assert_eq!(opened.expose(), plaintext.as_slice());
    }
}
