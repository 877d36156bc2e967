//! BIP-85 Child Mnemonics
//!
//! Derives independent child mnemonics from a master mnemonic along the
//! fixed path `m/83696968'/39'/0'/lang'/0'/words_path'/index'`. The child
//! entropy is the leading 16, 24 or 32 bytes of the derived private key.
//!
//! Only the English wordlist is implemented; the language code is carried
//! in the path and the derivation record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{DkesError, DkesResult};
use crate::security::secure_memory::secure_compare_str;
use crate::types::WordCount;
use crate::log_debug;

use super::derivation_path::{bip_purposes, DerivationComponent, DerivationPath, HARDENED};
use super::hd::ExtendedKey;
use super::mnemonic::{entropy_to_mnemonic, normalize_phrase, Mnemonic};
use super::seed::{seed_from_mnemonic, Seed};

/// BIP-85 application number for BIP-39 mnemonics
pub const APP_BIP39: u32 = 39;
/// Highest BIP-85 language code
pub const MAX_LANGUAGE: u32 = 8;

/// Where a child mnemonic came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationRecord {
    pub purpose: u32,
    pub app: u32,
    pub lang: u32,
    pub words_path: u32,
    pub index: u32,
    pub path: DerivationPath,
}

/// A derived child mnemonic with its derivation record
#[derive(Debug, Clone)]
pub struct ChildMnemonic {
    pub mnemonic: Mnemonic,
    pub record: DerivationRecord,
}

/// One requested child in a hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyEntry {
    pub index: u32,
    pub word_count: WordCount,
}

/// `m/83696968'/39'/0'/lang'/0'/words_path'/index'`
pub fn bip85_path(lang: u32, words_path: u32, index: u32) -> DerivationPath {
    DerivationPath::from_components(
        [bip_purposes::BIP85, APP_BIP39, 0, lang, 0, words_path, index]
            .into_iter()
            .map(DerivationComponent::hardened)
            .collect(),
    )
}

/// Derive the child mnemonic for (index, word_count, lang)
pub fn derive_child_mnemonic(
    master: &Mnemonic,
    index: u32,
    word_count: WordCount,
    lang: u32,
) -> DkesResult<ChildMnemonic> {
    check_parameters(index, word_count, lang)?;
    let seed = seed_from_mnemonic(master, None);
    derive_from_seed(&seed, index, word_count, lang)
}

/// Same as `derive_child_mnemonic` for an already-derived master seed
pub fn derive_from_seed(seed: &Seed, index: u32, word_count: WordCount, lang: u32) -> DkesResult<ChildMnemonic> {
    check_parameters(index, word_count, lang)?;

    let words_path = (word_count.words() as u32 - 12) / 6;
    let path = bip85_path(lang, words_path, index);

    let node = ExtendedKey::master_from_seed(seed.as_bytes())?.derive_path(&path)?;
    let private_key = node
        .private_key()
        .ok_or_else(|| DkesError::internal("derived node has no private key"))?;

    let entropy = Zeroizing::new(private_key[..word_count.entropy_bytes()].to_vec());
    let mnemonic = entropy_to_mnemonic(&entropy)?;

    log_debug!("bip85", "Derived child mnemonic",
        path = path, word_count = word_count);

    Ok(ChildMnemonic {
        mnemonic,
        record: DerivationRecord {
            purpose: bip_purposes::BIP85,
            app: APP_BIP39,
            lang,
            words_path,
            index,
            path,
        },
    })
}

/// Derive one child per purpose; output order follows the input map
pub fn derive_hierarchy(
    master: &Mnemonic,
    structure: &BTreeMap<String, HierarchyEntry>,
) -> DkesResult<BTreeMap<String, ChildMnemonic>> {
    let seed = seed_from_mnemonic(master, None);
    structure
        .iter()
        .map(|(purpose, entry)| {
            derive_from_seed(&seed, entry.index, entry.word_count, 0).map(|child| (purpose.clone(), child))
        })
        .collect()
}

/// Re-derive and compare against `candidate` in constant time
pub fn validate_derivation(
    master: &Mnemonic,
    candidate: &str,
    index: u32,
    word_count: WordCount,
) -> DkesResult<bool> {
    let expected = derive_child_mnemonic(master, index, word_count, 0)?;
    let candidate = normalize_phrase(candidate);
    Ok(secure_compare_str(expected.mnemonic.phrase(), &candidate))
}

fn check_parameters(index: u32, word_count: WordCount, lang: u32) -> DkesResult<()> {
    if !word_count.is_standard() {
        return Err(DkesError::invalid_input(format!(
            "BIP-85 child mnemonics must have 12, 18 or 24 words, got {}",
            word_count
        )));
    }
    if index >= HARDENED {
        return Err(DkesError::invalid_input(format!("BIP-85 index {} out of range", index)));
    }
    if lang > MAX_LANGUAGE {
        return Err(DkesError::invalid_input(format!("BIP-85 language {} out of range", lang)));
    }
    Ok(())
}
