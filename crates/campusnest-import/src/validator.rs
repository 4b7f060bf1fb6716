//! Per-row field rules. Pure and synchronous, no store access.

use campusnest_models::imports::{RawRow, StudentColumn, ValidationError};
use campusnest_models::value_types::IdNumber;
use validator::ValidateEmail;

/// Parses a `funded` cell: `Yes`/`No`, case-insensitive.
pub fn parse_funded(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("yes") {
        Some(true)
    } else if value.eq_ignore_ascii_case("no") {
        Some(false)
    } else {
        None
    }
}

/// Checks every rule against `row` and returns all defects found.
///
/// An empty result means the row is valid.
pub fn validate_row(row: &RawRow) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let at = row.row_index;

    match row.value(StudentColumn::IdNumber) {
        None => errors.push(ValidationError::new(
            at,
            StudentColumn::IdNumber,
            "ID number is required",
        )),
        Some(id_number) => {
            if !IdNumber::has_valid_length(id_number) {
                errors.push(ValidationError::new(
                    at,
                    StudentColumn::IdNumber,
                    format!("ID number must be exactly {} digits", IdNumber::LENGTH),
                ));
            }
            if !IdNumber::is_all_digits(id_number) {
                errors.push(ValidationError::new(
                    at,
                    StudentColumn::IdNumber,
                    "ID number must contain digits only",
                ));
            }
        }
    }

    if row.value(StudentColumn::FirstNames).is_none() {
        errors.push(ValidationError::new(
            at,
            StudentColumn::FirstNames,
            "First names are required",
        ));
    }

    if row.value(StudentColumn::Surname).is_none() {
        errors.push(ValidationError::new(
            at,
            StudentColumn::Surname,
            "Surname is required",
        ));
    }

    if let Some(email) = row.value(StudentColumn::Email)
        && !email.validate_email()
    {
        errors.push(ValidationError::new(
            at,
            StudentColumn::Email,
            format!("'{}' is not a valid email address", email),
        ));
    }

    if let Some(funded) = row.value(StudentColumn::Funded)
        && parse_funded(funded).is_none()
    {
        errors.push(ValidationError::new(
            at,
            StudentColumn::Funded,
            "Funded must be Yes or No",
        ));
    }

    if let Some(year) = row.value(StudentColumn::YearOfStudy)
        && !matches!(year.parse::<u32>(), Ok(y) if y > 0)
    {
        errors.push(ValidationError::new(
            at,
            StudentColumn::YearOfStudy,
            "Year of study must be a positive whole number",
        ));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn row(cells: &[(&str, &str)]) -> RawRow {
        let values: BTreeMap<String, String> = cells
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RawRow::new(7, values)
    }

    fn fields(errors: &[ValidationError]) -> Vec<StudentColumn> {
        errors.iter().map(|e| e.field).collect()
    }

    #[test]
    fn test_valid_row_has_no_errors() {
        let errors = validate_row(&row(&[
            ("idNumber", "9001015009087"),
            ("firstNames", "Naledi"),
            ("surname", "Khumalo"),
            ("email", "naledi@example.com"),
            ("funded", "yes"),
            ("yearOfStudy", "3"),
        ]));
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_missing_required_fields_all_reported() {
        let errors = validate_row(&row(&[("email", "")]));
        assert_eq!(
            fields(&errors),
            vec![
                StudentColumn::IdNumber,
                StudentColumn::FirstNames,
                StudentColumn::Surname
            ]
        );
        assert!(errors.iter().all(|e| e.row_index == 7));
    }

    #[test]
    fn test_whitespace_only_names_are_missing() {
        let errors = validate_row(&row(&[
            ("idNumber", "9001015009087"),
            ("firstNames", "   "),
            ("surname", "\t"),
        ]));
        assert_eq!(
            fields(&errors),
            vec![StudentColumn::FirstNames, StudentColumn::Surname]
        );
    }

    #[test]
    fn test_id_number_length_and_digits_reported_separately() {
        let errors = validate_row(&row(&[
            ("idNumber", "90A1"),
            ("firstNames", "Naledi"),
            ("surname", "Khumalo"),
        ]));
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("13 digits"));
        assert!(errors[1].message.contains("digits only"));
    }

    #[test]
    fn test_optional_field_rules() {
        let errors = validate_row(&row(&[
            ("idNumber", "9001015009087"),
            ("firstNames", "Naledi"),
            ("surname", "Khumalo"),
            ("email", "not-an-email"),
            ("funded", "maybe"),
            ("yearOfStudy", "0"),
        ]));
        assert_eq!(
            fields(&errors),
            vec![
                StudentColumn::Email,
                StudentColumn::Funded,
                StudentColumn::YearOfStudy
            ]
        );
    }

    #[test]
    fn test_blank_optional_fields_are_ignored() {
        let errors = validate_row(&row(&[
            ("idNumber", "9001015009087"),
            ("firstNames", "Naledi"),
            ("surname", "Khumalo"),
            ("email", " "),
            ("funded", ""),
            ("yearOfStudy", ""),
        ]));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_parse_funded() {
        assert_eq!(parse_funded("YES"), Some(true));
        assert_eq!(parse_funded(" no "), Some(false));
        assert_eq!(parse_funded("true"), None);
    }
}
