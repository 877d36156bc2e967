//! Redacting log facade over `tracing`
//!
//! Library code logs through `log_debug!` / `log_info!` / `log_warn!` /
//! `log_error!`. Each `key = value` field is rendered with `Display` and then
//! passed through a [`Redaction`] chosen from the key name, so a field called
//! `seed` or `password` can never reach a subscriber in clear text.
//!
//! Events use the `dkes` target. No subscriber is installed here.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Key fragments whose values are never shown
const SECRET_KEYS: &[&str] = &[
    "mnemonic", "phrase", "seed", "entropy", "secret", "private", "xprv",
    "keypair", "password", "passphrase", "plaintext",
];

/// Key fragments whose values are shown head and tail only
const ADDRESS_KEYS: &[&str] = &["address", "owner", "factory"];

const DIGEST_KEYS: &[&str] = &["hash", "script", "xpub", "salt"];

/// How a field value is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redaction {
    /// Replaced by a length marker
    Full,
    /// First 6 (8 with `0x`) and last 4 characters
    Address,
    /// First 10 (12 with `0x`) and last 6 characters
    Digest,
    None,
}

impl Redaction {
    /// Pick the redaction for a field name
    pub fn for_key(key: &str) -> Self {
        let key = key.to_ascii_lowercase();
        let matches = |fragments: &[&str]| fragments.iter().any(|f| key.contains(f));

        if matches(SECRET_KEYS) {
            Redaction::Full
        } else if matches(ADDRESS_KEYS) {
            Redaction::Address
        } else if matches(DIGEST_KEYS) {
            Redaction::Digest
        } else {
            Redaction::None
        }
    }

    pub fn apply(self, value: &str) -> String {
        let value = value.trim();
        match self {
            Redaction::Full => mask(value),
            Redaction::Address => shorten(value, 6, 4).unwrap_or_else(|| mask(value)),
            Redaction::Digest => shorten(value, 10, 6).unwrap_or_else(|| value.to_string()),
            Redaction::None => value.to_string(),
        }
    }
}

fn mask(value: &str) -> String {
    match value.chars().count() {
        0 => "[EMPTY]".to_string(),
        n if n <= 4 => "[REDACTED]".to_string(),
        n => format!("[REDACTED:{}chars]", n),
    }
}

/// `head...tail`, or `None` when the value is too short to elide anything
fn shorten(value: &str, head: usize, tail: usize) -> Option<String> {
    let head = if value.starts_with("0x") { head + 2 } else { head };
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= head + tail + 3 {
        return None;
    }
    let prefix: String = chars[..head].iter().collect();
    let suffix: String = chars[chars.len() - tail..].iter().collect();
    Some(format!("{}...{}", prefix, suffix))
}

/// One structured event, built by the logging macros
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field, redacted according to its key
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let rendered = Redaction::for_key(key).apply(&value.to_string());
        self.fields.push((key, rendered));
        self
    }

    fn rendered_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn log(self) {
        let fields = self.rendered_fields();
        let module = self.module;
        let message = self.message.as_str();

        match self.level {
            LogLevel::Debug => tracing::debug!(target: "dkes", module, fields = %fields, "{}", message),
            LogLevel::Info => tracing::info!(target: "dkes", module, fields = %fields, "{}", message),
            LogLevel::Warn => tracing::warn!(target: "dkes", module, fields = %fields, "{}", message),
            LogLevel::Error => tracing::error!(target: "dkes", module, fields = %fields, "{}", message),
        }
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __dkes_log {
    ($level:ident, $module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::$level,
            $module,
            $msg,
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($args:tt)*) => { $crate::__dkes_log!(Debug, $($args)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($args:tt)*) => { $crate::__dkes_log!(Info, $($args)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($args:tt)*) => { $crate::__dkes_log!(Warn, $($args)*) };
}

#[macro_export]
macro_rules! log_error {
    ($($args:tt)*) => { $crate::__dkes_log!(Error, $($args)*) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_classification() {
        assert_eq!(Redaction::for_key("mnemonic"), Redaction::Full);
        assert_eq!(Redaction::for_key("seed_hex"), Redaction::Full);
        assert_eq!(Redaction::for_key("Password"), Redaction::Full);
        assert_eq!(Redaction::for_key("owner"), Redaction::Address);
        assert_eq!(Redaction::for_key("init_data_hash"), Redaction::Digest);
        assert_eq!(Redaction::for_key("word_count"), Redaction::None);
        assert_eq!(Redaction::for_key("path"), Redaction::None);
    }

    #[test]
    fn test_full_redaction() {
        assert_eq!(Redaction::Full.apply(""), "[EMPTY]");
        assert_eq!(Redaction::Full.apply("abc"), "[REDACTED]");
        assert_eq!(
            Redaction::Full.apply("abandon abandon about"),
            "[REDACTED:21chars]"
        );
    }

    #[test]
    fn test_address_redaction() {
        let evm = Redaction::Address.apply("0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
        assert_eq!(evm, "0x9858Ef...da94");

        let btc = Redaction::Address.apply("1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA");
        assert_eq!(btc, "1LqBGS...eabA");

        // too short to elide: masked instead
        assert_eq!(Redaction::Address.apply("1abc"), "[REDACTED]");
    }

    #[test]
    fn test_digest_redaction() {
        let hash = "0x84fa6e4b850c90c533fa83115d0cd341a9a995518076a470b1aa0f562a5cdd7c";
        assert_eq!(Redaction::Digest.apply(hash), "0x84fa6e4b85...5cdd7c");
        assert_eq!(Redaction::Digest.apply("deadbeef"), "deadbeef");
    }

    #[test]
    fn test_entry_fields() {
        let entry = LogEntry::new(LogLevel::Info, "test", "Derived account")
            .field("path", "m/44'/60'/0'/0/0")
            .field("private_key", "4604b4b710fe91f584fff084e1a9159fe4f8408fff380596a604948474ce4fa3")
            .field("address", "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");

        assert_eq!(entry.fields[0].1, "m/44'/60'/0'/0/0");
        assert_eq!(entry.fields[1].1, "[REDACTED:64chars]");
        assert_eq!(entry.fields[2].1, "0x9858Ef...da94");

        // no subscriber installed: emitting is a no-op
        entry.log();
    }

    #[test]
    fn test_macros_expand() {
        let word_count = 12;
        crate::log_debug!("test", "no fields");
        crate::log_info!("test", "with fields", word_count = word_count, path = "m/0'");
        crate::log_warn!("test", "trailing comma", word_count = word_count,);
        crate::log_error!("test", "error");
    }
}
