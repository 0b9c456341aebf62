//! Permission rules
//!
//! An expiry of 0 is the contract's "no expiry" sentinel. Every comparison
//! uses chain time (latest block timestamp).

use chrono::DateTime;
use serde::{Deserialize, Serialize};

pub const NEVER_OR_DENIED: &str = "Never/Denied";

/// Permission record for one (provider, section) pair
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub has_access: bool,
    /// Unix seconds, 0 = no expiry
    pub expires_at: u64,
}

impl Permission {
    /// Active iff access was granted and it has not lapsed
    pub fn is_active(&self, now: u64) -> bool {
        self.has_access && (self.expires_at == 0 || self.expires_at > now)
    }
}

/// `YYYY-MM-DD HH:MM:SS UTC`
pub fn format_timestamp(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{} (out of range)", timestamp))
}

/// Expiry column of the permission table
pub fn format_expiration(expires_at: u64, now: u64) -> String {
    if expires_at == 0 {
        return NEVER_OR_DENIED.to_string();
    }
    if expires_at < now {
        return format!("Expired ({})", format_timestamp(expires_at));
    }
    format_timestamp(expires_at)
}
