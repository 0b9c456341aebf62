//! Patient registration form validation
//!
//! Every text field is required; age must be a non-negative whole number.
//! All blank fields are reported at once so the form can flag each of them.

use crate::ValidationError;
use serde::{Deserialize, Serialize};

/// The seven fields of the registration form, in form order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrationField {
    PatientId,
    Name,
    Age,
    Gender,
    PhysicalAddress,
    Phone,
    Email,
}

impl RegistrationField {
    pub const ALL: [RegistrationField; 7] = [
        RegistrationField::PatientId,
        RegistrationField::Name,
        RegistrationField::Age,
        RegistrationField::Gender,
        RegistrationField::PhysicalAddress,
        RegistrationField::Phone,
        RegistrationField::Email,
    ];

    /// Label shown next to the input
    pub fn label(&self) -> &'static str {
        match self {
            RegistrationField::PatientId => "Patient ID / MRN",
            RegistrationField::Name => "Name",
            RegistrationField::Age => "Age",
            RegistrationField::Gender => "Gender",
            RegistrationField::PhysicalAddress => "Physical Address",
            RegistrationField::Phone => "Phone",
            RegistrationField::Email => "Email",
        }
    }
}

impl std::fmt::Display for RegistrationField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Raw form input as entered by the patient
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationInput {
    pub patient_id: String,
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub physical_address: String,
    pub phone: String,
    pub email: String,
}

/// A registration that passed local validation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub patient_id: String,
    pub name: String,
    pub age: u64,
    pub gender: String,
    pub physical_address: String,
    pub phone: String,
    pub email: String,
}

/// Validate a registration form.
///
/// Blank text fields are checked first and reported together; the age check
/// only runs once every text field is present. Values are passed through as
/// entered (no trimming) so the stored record matches what the patient typed.
pub fn validate_registration(input: &RegistrationInput) -> Result<Registration, ValidationError> {
    let text_fields = [
        (RegistrationField::PatientId, &input.patient_id),
        (RegistrationField::Name, &input.name),
        (RegistrationField::Gender, &input.gender),
        (RegistrationField::PhysicalAddress, &input.physical_address),
        (RegistrationField::Phone, &input.phone),
        (RegistrationField::Email, &input.email),
    ];

    let blank: Vec<RegistrationField> = text_fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| *field)
        .collect();

    if !blank.is_empty() {
        return Err(ValidationError::BlankFields(blank));
    }

    if input.age < 0 {
        return Err(ValidationError::NegativeAge(input.age));
    }

    Ok(Registration {
        patient_id: input.patient_id.clone(),
        name: input.name.clone(),
        age: input.age as u64,
        gender: input.gender.clone(),
        physical_address: input.physical_address.clone(),
        phone: input.phone.clone(),
        email: input.email.clone(),
    })
}

/// Parse the age box of a text-entry form. Sign is kept so that a negative
/// value reaches `validate_registration` and is reported as such.
pub fn parse_age(raw: &str) -> Result<i64, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankFields(vec![RegistrationField::Age]));
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| ValidationError::AgeNotANumber(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn jane_doe() -> RegistrationInput {
        RegistrationInput {
            patient_id: "MRN001".to_string(),
            name: "Jane Doe".to_string(),
            age: 40,
            gender: "Female".to_string(),
            physical_address: "12 Elm Street".to_string(),
            phone: "+1-555-0100".to_string(),
            email: "jane@example.com".to_string(),
        }
    }

    #[test]
    fn test_complete_form_is_accepted() {
        let registration = validate_registration(&jane_doe()).unwrap();
        assert_eq!(registration.patient_id, "MRN001");
        assert_eq!(registration.age, 40);
    }

    #[test]
    fn test_age_zero_is_accepted() {
        let mut input = jane_doe();
        input.age = 0;
        assert_eq!(validate_registration(&input).unwrap().age, 0);
    }

    #[test]
    fn test_every_blank_field_is_reported() {
        let mut input = jane_doe();
        input.name = "   ".to_string();
        input.email = String::new();
        input.age = -3;

        // Blank fields win over the age problem
        assert_eq!(
            validate_registration(&input),
            Err(ValidationError::BlankFields(vec![
                RegistrationField::Name,
                RegistrationField::Email,
            ]))
        );
    }

    #[test]
    fn test_negative_age_rejected() {
        let mut input = jane_doe();
        input.age = -1;
        assert_eq!(validate_registration(&input), Err(ValidationError::NegativeAge(-1)));
    }

    #[test]
    fn test_parse_age() {
        assert_eq!(parse_age(" 40 "), Ok(40));
        assert_eq!(parse_age("-2"), Ok(-2));
        assert_eq!(
            parse_age("forty"),
            Err(ValidationError::AgeNotANumber("forty".to_string()))
        );
        assert_eq!(
            parse_age(""),
            Err(ValidationError::BlankFields(vec![RegistrationField::Age]))
        );
    }

    #[test]
    fn test_field_labels_in_form_order() {
        let labels: Vec<&str> = RegistrationField::ALL.iter().map(|f| f.label()).collect();
        assert_eq!(labels[0], "Patient ID / MRN");
        assert_eq!(labels[6], "Email");
    }

    proptest! {
        #[test]
        fn prop_whitespace_field_always_rejected(
            which in 0usize..6,
            blank in "[ \t\n]{0,8}",
        ) {
            let mut input = jane_doe();
            let field = match which {
                0 => { input.patient_id = blank; RegistrationField::PatientId }
                1 => { input.name = blank; RegistrationField::Name }
                2 => { input.gender = blank; RegistrationField::Gender }
                3 => { input.physical_address = blank; RegistrationField::PhysicalAddress }
                4 => { input.phone = blank; RegistrationField::Phone }
                _ => { input.email = blank; RegistrationField::Email }
            };
            prop_assert_eq!(
                validate_registration(&input),
                Err(ValidationError::BlankFields(vec![field]))
            );
        }

        #[test]
        fn prop_negative_age_always_rejected(age in i64::MIN..0) {
            let mut input = jane_doe();
            input.age = age;
            prop_assert_eq!(validate_registration(&input), Err(ValidationError::NegativeAge(age)));
        }

        #[test]
        fn prop_non_negative_age_accepted(age in 0i64..=200) {
            let mut input = jane_doe();
            input.age = age;
            prop_assert_eq!(validate_registration(&input).unwrap().age, age as u64);
        }
    }
}
