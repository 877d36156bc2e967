//! Minimal Solidity ABI encoder
//!
//! Covers the static `address` / `uint256` words and dynamic arrays of them,
//! which is all the Safe setup hash needs.

/// An ABI value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiToken {
    Address([u8; 20]),
    Uint(u64),
    Array(Vec<AbiToken>),
}

impl AbiToken {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, AbiToken::Array(_))
    }

    /// Size of this token's head slot
    fn head_size(&self) -> usize {
        32
    }
}

/// Left-pad a `u64` to a big-endian 32-byte word
pub fn uint_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Left-pad an address to a 32-byte word
pub fn address_word(address: &[u8; 20]) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address);
    word
}

/// Encode a token sequence as an ABI tuple (function argument encoding)
pub fn encode(tokens: &[AbiToken]) -> Vec<u8> {
    let head_size: usize = tokens.iter().map(AbiToken::head_size).sum();

    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for token in tokens {
        if token.is_dynamic() {
            // Head holds the offset of the tail data
            let offset = (head_size + tail.len()) as u64;
            head.extend_from_slice(&uint_word(offset));
            tail.extend_from_slice(&encode_token(token));
        } else {
            head.extend_from_slice(&encode_token(token));
        }
    }

    head.extend_from_slice(&tail);
    head
}

fn encode_token(token: &AbiToken) -> Vec<u8> {
    match token {
        AbiToken::Address(address) => address_word(address).to_vec(),
        AbiToken::Uint(value) => uint_word(*value).to_vec(),
        AbiToken::Array(items) => {
            let mut out = uint_word(items.len() as u64).to_vec();
            out.extend(encode(items));
            out
        }
    }
}
