//! BIP-39 Entropy & Mnemonic Codec
//!
//! Entropy ↔ mnemonic conversion over the English wordlist (encoding and
//! checksums come from the `bip39` crate), validation with precise failure
//! reasons, and an admissibility score.
//!
//! SECURITY: phrases and entropy buffers are zeroized on drop.

use std::fmt;

use bip39::Language;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{DkesError, DkesResult, ErrorCode};
use crate::security::secure_memory::secure_compare_str;
use crate::types::WordCount;

use super::rng::SecureRandom;

/// Default share of distinct words a mnemonic must contain to be admissible
pub const DEFAULT_MIN_UNIQUE_RATIO: f64 = 0.8;

/// Read-only view of the English BIP-39 wordlist
#[derive(Debug, Clone, Copy)]
pub struct Wordlist {
    words: &'static [&'static str; 2048],
}

impl Wordlist {
    pub fn english() -> Self {
        Self {
            words: Language::English.word_list(),
        }
    }

    pub fn word(&self, index: u16) -> &'static str {
        self.words[index as usize & 0x7ff]
    }

    /// Index of a word; the English list is sorted so lookup is a binary search
    pub fn index_of(&self, word: &str) -> Option<u16> {
        self.words.binary_search(&word).ok().map(|i| i as u16)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index_of(word).is_some()
    }
}

impl Default for Wordlist {
    fn default() -> Self {
        Self::english()
    }
}

/// Mnemonic validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MnemonicError {
    #[error("mnemonic must have 12, 18 or 24 words, got {0}")]
    BadWordCount(usize),
    #[error("word #{position} is not in the English wordlist")]
    UnknownWord { position: usize },
    #[error("mnemonic checksum does not match")]
    ChecksumMismatch,
    #[error("only {unique} distinct words out of {total}")]
    WeakReuse { unique: usize, total: usize },
    #[error("entropy must be 16, 20, 24, 28 or 32 bytes, got {0}")]
    BadEntropyLength(usize),
}

impl MnemonicError {
    pub fn code(&self) -> ErrorCode {
        match self {
            MnemonicError::BadWordCount(_) => ErrorCode::BadWordCount,
            MnemonicError::UnknownWord { .. } => ErrorCode::UnknownWord,
            MnemonicError::ChecksumMismatch => ErrorCode::ChecksumMismatch,
            MnemonicError::WeakReuse { .. } => ErrorCode::WeakReuse,
            MnemonicError::BadEntropyLength(_) => ErrorCode::BadEntropyLength,
        }
    }
}

impl From<bip39::Error> for MnemonicError {
    fn from(e: bip39::Error) -> Self {
        match e {
            bip39::Error::BadWordCount(n) => MnemonicError::BadWordCount(n),
            bip39::Error::UnknownWord(index) => MnemonicError::UnknownWord { position: index + 1 },
            bip39::Error::BadEntropyBitCount(bits) => MnemonicError::BadEntropyLength(bits / 8),
            bip39::Error::InvalidChecksum => MnemonicError::ChecksumMismatch,
            // Only English is parsed, so the phrase cannot be ambiguous
            bip39::Error::AmbiguousLanguages(_) => MnemonicError::ChecksumMismatch,
        }
    }
}

impl From<MnemonicError> for DkesError {
    fn from(e: MnemonicError) -> Self {
        DkesError::new(e.code(), e.to_string())
    }
}

/// A checksum-valid BIP-39 mnemonic, stored NFKD-normalized with single spaces
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Mnemonic {
    phrase: String,
    #[zeroize(skip)]
    word_count: WordCount,
}

impl Mnemonic {
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.phrase.split(' ')
    }

    pub fn word_count(&self) -> WordCount {
        self.word_count
    }

    /// Bits of entropy carried by this mnemonic (checksum excluded)
    pub fn entropy_bits(&self) -> usize {
        self.word_count.entropy_bits()
    }

    pub fn to_entropy(&self) -> Zeroizing<Vec<u8>> {
        mnemonic_to_entropy(self)
    }
}

impl PartialEq for Mnemonic {
    fn eq(&self, other: &Self) -> bool {
        secure_compare_str(&self.phrase, &other.phrase)
    }
}

impl Eq for Mnemonic {}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mnemonic")
            .field("word_count", &self.word_count.words())
            .finish_non_exhaustive()
    }
}

/// Admissibility report for a candidate mnemonic
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MnemonicScore {
    pub valid: bool,
    pub word_count: usize,
    pub unique_words: usize,
    pub entropy_bits: usize,
    pub reason: Option<String>,
}

/// Generate a new mnemonic from `strength_bits` of injected entropy
pub fn generate_mnemonic(strength_bits: u32, rng: &mut dyn SecureRandom) -> DkesResult<Mnemonic> {
    let word_count = WordCount::from_strength_bits(strength_bits)?;

    let mut entropy = Zeroizing::new(vec![0u8; word_count.entropy_bytes()]);
    rng.fill(entropy.as_mut_slice())?;

    entropy_to_mnemonic(&entropy).map_err(DkesError::from)
}

/// Encode entropy as a mnemonic: ENT bits ‖ SHA-256 checksum of ENT/32 bits
pub fn entropy_to_mnemonic(entropy: &[u8]) -> Result<Mnemonic, MnemonicError> {
    if !matches!(entropy.len(), 16 | 20 | 24 | 28 | 32) {
        return Err(MnemonicError::BadEntropyLength(entropy.len()));
    }
    let encoded = bip39::Mnemonic::from_entropy(entropy)?;
    from_bip39(&encoded)
}

/// Recover the entropy behind a mnemonic
pub fn mnemonic_to_entropy(mnemonic: &Mnemonic) -> Zeroizing<Vec<u8>> {
    // A `Mnemonic` is only constructed from a verified encoding, so parsing
    // its own phrase cannot fail.
    match bip39::Mnemonic::parse_in_normalized(Language::English, &mnemonic.phrase) {
        Ok(parsed) => {
            let (mut bytes, len) = parsed.to_entropy_array();
            let entropy = Zeroizing::new(bytes[..len].to_vec());
            bytes.zeroize();
            entropy
        }
        Err(_) => Zeroizing::new(Vec::new()),
    }
}

/// Validate a user-supplied phrase (12, 18 or 24 English words)
pub fn validate_mnemonic(phrase: &str) -> Result<Mnemonic, MnemonicError> {
    let normalized = normalize_phrase(phrase);
    let count = normalized.split(' ').filter(|w| !w.is_empty()).count();

    WordCount::from_words(count)
        .ok()
        .filter(WordCount::is_standard)
        .ok_or(MnemonicError::BadWordCount(count))?;

    let parsed = bip39::Mnemonic::parse_in_normalized(Language::English, &normalized)?;
    from_bip39(&parsed)
}

fn from_bip39(mnemonic: &bip39::Mnemonic) -> Result<Mnemonic, MnemonicError> {
    let word_count = WordCount::from_words(mnemonic.word_count())
        .map_err(|_| MnemonicError::BadWordCount(mnemonic.word_count()))?;
    Ok(Mnemonic {
        phrase: mnemonic.words().collect::<Vec<_>>().join(" "),
        word_count,
    })
}

/// Validate and additionally reject phrases with heavy word reuse
pub fn validate_mnemonic_strength(phrase: &str, min_unique_ratio: f64) -> Result<Mnemonic, MnemonicError> {
    let mnemonic = validate_mnemonic(phrase)?;
    let total = mnemonic.word_count.words();
    let unique = unique_word_count(mnemonic.words());

    if (unique as f64) < min_unique_ratio * total as f64 {
        return Err(MnemonicError::WeakReuse { unique, total });
    }
    Ok(mnemonic)
}

/// Score a candidate phrase without returning it
pub fn score_mnemonic(phrase: &str) -> MnemonicScore {
    score_mnemonic_with_ratio(phrase, DEFAULT_MIN_UNIQUE_RATIO)
}

pub fn score_mnemonic_with_ratio(phrase: &str, min_unique_ratio: f64) -> MnemonicScore {
    let normalized = normalize_phrase(phrase);
    let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();
    let unique_words = unique_word_count(words.iter().copied());

    match validate_mnemonic_strength(phrase, min_unique_ratio) {
        Ok(mnemonic) => MnemonicScore {
            valid: true,
            word_count: words.len(),
            unique_words,
            entropy_bits: mnemonic.entropy_bits(),
            reason: None,
        },
        Err(e) => MnemonicScore {
            valid: false,
            word_count: words.len(),
            unique_words,
            entropy_bits: match e {
                MnemonicError::WeakReuse { .. } => words.len() * 32 / 3,
                _ => 0,
            },
            reason: Some(e.to_string()),
        },
    }
}

/// NFKD, lower-case, collapse whitespace to single spaces
pub(crate) fn normalize_phrase(phrase: &str) -> Zeroizing<String> {
    let nfkd: Zeroizing<String> = Zeroizing::new(phrase.nfkd().collect());
    let lower = Zeroizing::new(nfkd.to_lowercase());
    Zeroizing::new(lower.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn unique_word_count<'a>(words: impl Iterator<Item = &'a str>) -> usize {
    let mut seen: Vec<&str> = words.collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}
