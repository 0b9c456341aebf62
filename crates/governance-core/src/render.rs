//! Text rendering for the dashboard
//!
//! Every function returns the finished text; the console decides where it
//! goes. Colour follows the `colored` global switch, so callers that need
//! plain output (tests, pipes) turn it off once.

use crate::error::AccessError;
use crate::patient::{ActionReceipt, GrantReport};
use crate::provider::{AccessCheck, AccessReport};
use crate::session::TxLog;
use alloy_primitives::Address;
use colored::*;
use governance_validation::to_checksum;

const RULE_WIDTH: usize = 60;

/// Which action an error came from; selects the hint shown with it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    Register,
    GrantAccess,
    CheckAccess,
}

// =============================================================================
// Messages
// =============================================================================

pub fn rule() -> String {
    "─".repeat(RULE_WIDTH)
}

pub fn heading(title: &str) -> String {
    format!("{}\n{}\n{}", rule(), title.green().bold(), rule())
}

pub fn banner(contract: Address, client_version: &str) -> String {
    format!(
        "{}\n{} Connected via {}\n  Contract: {}",
        heading("PATIENT DATA GOVERNANCE DASHBOARD"),
        "✓".green(),
        client_version.cyan(),
        to_checksum(&contract).cyan()
    )
}

pub fn success(message: &str) -> String {
    format!("{} {}", "✓".green().bold(), message)
}

pub fn error(message: &str) -> String {
    format!("{} {}", "Error:".red().bold(), message)
}

pub fn info(message: &str) -> String {
    format!("{} {}", "Info:".blue().bold(), message)
}

pub fn warning(message: &str) -> String {
    format!("{} {}", "Warning:".yellow().bold(), message)
}

// =============================================================================
// Action results
// =============================================================================

pub fn registered(receipt: &ActionReceipt) -> String {
    success(&format!("Patient registered! Tx Hash: {}", receipt.tx_hash))
}

pub fn grant_report(report: &GrantReport) -> String {
    let mut lines = Vec::new();

    if !report.granted.is_empty() {
        let labels: Vec<&str> = report.granted.iter().map(|g| g.section.label()).collect();
        let last = report
            .last_tx_hash()
            .map(|h| h.to_string())
            .unwrap_or_default();
        lines.push(success(&format!(
            "Access granted to {}! Last Tx Hash: {}",
            labels.join(", "),
            last
        )));
    }

    if let Some((section, err)) = &report.failure {
        lines.push(error(&format!("{} was not granted: {}", section, err)));
        if !report.granted.is_empty() {
            lines.push(warning("grants confirmed before the failure remain in effect"));
        }
        if !report.skipped.is_empty() {
            let labels: Vec<&str> = report.skipped.iter().map(|s| s.label()).collect();
            lines.push(info(&format!("Not attempted: {}", labels.join(", "))));
        }
    }

    lines.join("\n")
}

pub fn access_check(check: &AccessCheck) -> String {
    match check {
        AccessCheck::PatientNotRegistered { .. } => error(
            "Patient record is not registered on the contract. You must register the patient first.",
        ),
        AccessCheck::Report(report) => {
            let summary = if report.active_sections().is_empty() {
                info(&report.summary())
            } else {
                success(&report.summary())
            };
            format!("{}\n\n{}", summary, access_table(report))
        }
    }
}

/// Section | Has Access | Expires At, one row per section
pub fn access_table(report: &AccessReport) -> String {
    let headers = ["Section", "Has Access", "Expires At"];
    let cells: Vec<[String; 3]> = report
        .rows
        .iter()
        .map(|row| {
            [
                row.section.label().to_string(),
                if row.active { "Yes" } else { "No" }.to_string(),
                row.expires.clone(),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |row: [&str; 3]| {
        format!(
            "{:<w0$}  {:<w1$}  {}",
            row[0],
            row[1],
            row[2],
            w0 = widths[0],
            w1 = widths[1]
        )
    };

    let mut lines = vec![
        format_row(headers).bold().to_string(),
        "─".repeat(widths.iter().sum::<usize>() + 4),
    ];
    for row in &cells {
        lines.push(format_row([row[0].as_str(), row[1].as_str(), row[2].as_str()]));
    }
    lines.join("\n")
}

/// Newest first, each with its explorer link
pub fn tx_log(log: &TxLog) -> String {
    if log.is_empty() {
        return "No transactions yet.".to_string();
    }
    log.recent_first()
        .map(|entry| {
            format!(
                "- {}: {}… {}",
                entry.action,
                entry.short_hash().cyan(),
                entry.explorer_url().dimmed()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Errors
// =============================================================================

/// The error line plus whatever hint fits the action that failed.
pub fn action_error(action: ActionKind, err: &AccessError, contract: Address) -> String {
    let mut text = error(&err.to_string());
    if let Some(hint) = hint(action, err, contract) {
        text.push('\n');
        text.push_str(&hint);
    }
    text
}

fn hint(action: ActionKind, err: &AccessError, contract: Address) -> Option<String> {
    if matches!(err, AccessError::Validation(_)) {
        return None;
    }
    if action == ActionKind::CheckAccess {
        return Some(format!(
            "{} Reading permissions failed. If the contract was redeployed (now at {}), \
             earlier records are gone: on the Patient screen\n  1. Register Patient again\n  2. Grant Access again",
            "Hint:".yellow().bold(),
            to_checksum(&contract)
        ));
    }
    match err {
        AccessError::ContractCall(_) => Some(format!(
            "{} The contract rejected the call. Check the inputs and try again.",
            "Hint:".yellow().bold()
        )),
        AccessError::Timeout { .. } => Some(format!(
            "{} The transaction may still be mined; check the transaction log before resubmitting.",
            "Hint:".yellow().bold()
        )),
        _ => None,
    }
}
