//! Password strength scoring
//!
//! Additive score in 0..=100 built from length and character classes, with a
//! single penalty for well-known weak substrings. Used as the admission check
//! for envelope passwords.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DkesError, DkesResult, ErrorCode};

/// Substrings that cost 20 points (once, case-sensitive)
const COMMON_PATTERNS: [&str; 6] = ["123", "password", "qwerty", "abc", "111", "000"];

const PATTERN_PENALTY: i32 = 20;

/// Human readable strength bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthLabel {
    Weak,
    Medium,
    Strong,
    VeryStrong,
}

impl StrengthLabel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=39 => Self::Weak,
            40..=69 => Self::Medium,
            70..=89 => Self::Strong,
            _ => Self::VeryStrong,
        }
    }
}

impl fmt::Display for StrengthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weak => write!(f, "weak"),
            Self::Medium => write!(f, "medium"),
            Self::Strong => write!(f, "strong"),
            Self::VeryStrong => write!(f, "very strong"),
        }
    }
}

/// Result of scoring a password
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordStrength {
    pub score: u8,
    pub label: StrengthLabel,
    pub feedback: Vec<String>,
}

/// Score a password
pub fn score_password(password: &str) -> PasswordStrength {
    let length = password.chars().count();

    let mut has_lower = false;
    let mut has_upper = false;
    let mut has_digit = false;
    let mut has_special = false;

    for c in password.chars() {
        if c.is_ascii_lowercase() {
            has_lower = true;
        } else if c.is_ascii_uppercase() {
            has_upper = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else {
            has_special = true;
        }
    }

    let mut score: i32 = 0;
    let mut feedback = Vec::new();

    if length >= 12 {
        score += 25;
    } else {
        feedback.push("Use at least 12 characters".to_string());
    }
    if length >= 16 {
        score += 10;
    }
    if has_lower { score += 15; } else { feedback.push("Add lowercase letters".to_string()); }
    if has_upper { score += 15; } else { feedback.push("Add uppercase letters".to_string()); }
    if has_digit { score += 15; } else { feedback.push("Add numbers".to_string()); }
    if has_special { score += 20; } else { feedback.push("Add special characters".to_string()); }

    if COMMON_PATTERNS.iter().any(|pattern| password.contains(pattern)) {
        score -= PATTERN_PENALTY;
        feedback.push("Avoid common sequences such as 123, abc or password".to_string());
    }

    let score = score.clamp(0, 100) as u8;
    PasswordStrength {
        score,
        label: StrengthLabel::from_score(score),
        feedback,
    }
}

/// Reject passwords scoring below `min_score`
pub fn check_password_policy(password: &str, min_score: u8) -> DkesResult<PasswordStrength> {
    let strength = score_password(password);
    if strength.score < min_score {
        let mut err = DkesError::policy(
            ErrorCode::WeakPassword,
            format!(
                "Password is too weak (score: {}, minimum: {})",
                strength.score, min_score
            ),
        );
        if !strength.feedback.is_empty() {
            err = err.with_details(strength.feedback.join("; "));
        }
        return Err(err);
    }
    Ok(strength)
}
