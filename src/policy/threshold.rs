//! M-of-N threshold checks
//!
//! Hard limits are errors; questionable but valid setups are returned as
//! advisory warnings.

use crate::error::{DkesError, DkesResult, ErrorCode};

/// Bitcoin standardness limit for bare multisig scripts
pub const MAX_SCRIPT_MEMBERS: usize = 15;
/// A CHECKMULTISIG script needs at least two keys to be a multisig
pub const MIN_SCRIPT_MEMBERS: usize = 2;

/// Validate a threshold of `threshold` over `members` participants.
///
/// `max_members` caps N (Bitcoin scripts); `None` means unbounded.
pub fn check_threshold(threshold: u32, members: usize, max_members: Option<usize>) -> DkesResult<Vec<String>> {
    if members == 0 {
        return Err(DkesError::invalid_input("Multisig requires at least one member"));
    }
    if threshold == 0 {
        return Err(DkesError::policy(
            ErrorCode::InvalidThreshold,
            "Threshold must be at least 1",
        ));
    }
    if threshold as usize > members {
        return Err(DkesError::policy(
            ErrorCode::ThresholdExceedsMembers,
            format!("Threshold {} exceeds member count {}", threshold, members),
        ));
    }
    if let Some(max) = max_members {
        if members > max {
            return Err(DkesError::policy(
                ErrorCode::TooManyMembers,
                format!("{} members exceeds the maximum of {}", members, max),
            ));
        }
    }

    Ok(threshold_warnings(threshold, members))
}

/// Advisory warnings for an already valid threshold
pub fn threshold_warnings(threshold: u32, members: usize) -> Vec<String> {
    let mut warnings = Vec::new();
    let m = threshold as usize;

    if m == 1 && members > 1 {
        warnings.push(format!(
            "Warning: any single member out of {} can authorize alone",
            members
        ));
    }
    if m == members {
        warnings.push("Warning: losing any one key makes the funds unrecoverable".to_string());
    }
    if (m as f64) / (members as f64) < 0.5 {
        warnings.push(format!(
            "Warning: threshold {} is less than half of {} members",
            m, members
        ));
    }

    warnings
}

/// Simple-majority threshold for `members` participants
pub fn recommended_threshold(members: usize) -> u32 {
    (members / 2 + 1).min(members) as u32
}
