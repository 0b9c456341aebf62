//! Session transaction log
//!
//! Ordered record of every successful state-changing call in the current
//! interactive session. Owned by the session and passed into each action;
//! never persisted.

use crate::config::EXPLORER_TX_BASE;
use alloy_primitives::B256;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TxLogEntry {
    pub action: String,
    /// `0x`-prefixed hex
    pub tx_hash: String,
}

impl TxLogEntry {
    pub fn explorer_url(&self) -> String {
        format!("{}{}", EXPLORER_TX_BASE, self.tx_hash)
    }

    /// First 10 characters (`0x` + 8 hex digits)
    pub fn short_hash(&self) -> &str {
        self.tx_hash.get(..10).unwrap_or(&self.tx_hash)
    }
}

/// Append-only; entries stay in submission order
#[derive(Clone, Debug, Default, Serialize)]
pub struct TxLog {
    entries: Vec<TxLogEntry>,
}

impl TxLog {
    pub fn new() -> Self {
        TxLog::default()
    }

    pub fn record(&mut self, action: impl Into<String>, tx_hash: B256) -> &TxLogEntry {
        self.entries.push(TxLogEntry {
            action: action.into(),
            tx_hash: tx_hash.to_string(),
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Oldest first
    pub fn entries(&self) -> &[TxLogEntry] {
        &self.entries
    }

    /// Newest first, as the log screen shows them
    pub fn recent_first(&self) -> impl Iterator<Item = &TxLogEntry> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_submission_order() {
        let mut log = TxLog::new();
        assert!(log.is_empty());

        log.record("Register Patient", B256::repeat_byte(0x01));
        log.record("Grant Access (Imaging)", B256::repeat_byte(0x02));

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].action, "Register Patient");
        let newest: Vec<&str> = log.recent_first().map(|e| e.action.as_str()).collect();
        assert_eq!(newest, vec!["Grant Access (Imaging)", "Register Patient"]);
    }

    #[test]
    fn test_entry_links() {
        let mut log = TxLog::new();
        let entry = log.record("Register Patient", B256::repeat_byte(0xab)).clone();
        assert_eq!(entry.short_hash(), "0xabababab");
        assert_eq!(
            entry.explorer_url(),
            format!("https://sepolia.etherscan.io/tx/0x{}", "ab".repeat(32))
        );
    }
}
