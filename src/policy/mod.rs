//! Policy Module
//!
//! Admission checks: password strength and multisig thresholds.

pub mod password;
pub mod threshold;

pub use password::{check_password_policy, score_password, PasswordStrength, StrengthLabel};
pub use threshold::{check_threshold, recommended_threshold, threshold_warnings, MAX_SCRIPT_MEMBERS};
