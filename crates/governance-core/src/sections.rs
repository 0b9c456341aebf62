//! Patient data sections
//!
//! The index of each section is shared with the deployed contract. The
//! contract does not validate it, so a drift here silently changes which
//! data a grant covers; the assertions below pin every index at build time.

use governance_validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Section {
    PersonalInformation = 0,
    BloodResults = 1,
    Imaging = 2,
    Medications = 3,
}

const _: () = assert!(Section::PersonalInformation as u8 == 0);
const _: () = assert!(Section::BloodResults as u8 == 1);
const _: () = assert!(Section::Imaging as u8 == 2);
const _: () = assert!(Section::Medications as u8 == 3);
const _: () = assert!(Section::ALL.len() == 4);

impl Section {
    /// Every section in index order
    pub const ALL: [Section; 4] = [
        Section::PersonalInformation,
        Section::BloodResults,
        Section::Imaging,
        Section::Medications,
    ];

    /// Index passed to the contract
    pub const fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Section> {
        Section::ALL.get(index as usize).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Section::PersonalInformation => "Personal Information",
            Section::BloodResults => "Blood Results",
            Section::Imaging => "Imaging",
            Section::Medications => "Medications",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Accepts the label (any case) or the index digit
impl FromStr for Section {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(index) = trimmed.parse::<u8>() {
            return Section::from_index(index)
                .ok_or_else(|| ValidationError::UnknownSection(trimmed.to_string()));
        }
        Section::ALL
            .iter()
            .find(|section| section.label().eq_ignore_ascii_case(trimmed))
            .copied()
            .ok_or_else(|| ValidationError::UnknownSection(trimmed.to_string()))
    }
}

/// Parse a comma-separated selection such as `"2, Medications"`.
/// Duplicates collapse onto the first occurrence.
pub fn parse_selection(raw: &str) -> Result<Vec<Section>, ValidationError> {
    let mut selected = Vec::new();
    for part in raw.split(',').filter(|p| !p.trim().is_empty()) {
        let section: Section = part.parse()?;
        if !selected.contains(&section) {
            selected.push(section);
        }
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_match_contract_order() {
        let indices: Vec<u8> = Section::ALL.iter().map(|s| s.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(Section::from_index(2), Some(Section::Imaging));
        assert_eq!(Section::from_index(4), None);
    }

    #[test]
    fn test_parse_label_and_index() {
        assert_eq!("blood results".parse::<Section>(), Ok(Section::BloodResults));
        assert_eq!(" 3 ".parse::<Section>(), Ok(Section::Medications));
        assert_eq!(
            "X-Ray".parse::<Section>(),
            Err(ValidationError::UnknownSection("X-Ray".to_string()))
        );
        assert!("9".parse::<Section>().is_err());
    }

    #[test]
    fn test_parse_selection_keeps_order_and_dedupes() {
        assert_eq!(
            parse_selection("Medications, 2, medications").unwrap(),
            vec![Section::Medications, Section::Imaging]
        );
        assert!(parse_selection("  ").unwrap().is_empty());
    }
}
