use campusnest_models::imports::{ErrorMap, RawRow, StudentColumn};
use campusnest_models::students::{StudentStatus, ValidatedStudent};
use campusnest_models::value_types::IdNumber;

use crate::validator::parse_funded;

/// Maps every row without validation errors into a [`ValidatedStudent`],
/// preserving row order.
pub fn convert_to_validated_students(data: &[RawRow], errors: &ErrorMap) -> Vec<ValidatedStudent> {
    data.iter()
        .filter(|row| !errors.contains_key(&row.row_index))
        .map(convert_row)
        .collect()
}

fn convert_row(row: &RawRow) -> ValidatedStudent {
    let text = |column| row.value(column).map(str::to_string);

    ValidatedStudent {
        row_index: row.row_index,
        // Validation guarantees 13 digits here
        id_number: IdNumber::new_unchecked(row.value(StudentColumn::IdNumber).unwrap_or_default()),
        first_names: text(StudentColumn::FirstNames).unwrap_or_default(),
        surname: text(StudentColumn::Surname).unwrap_or_default(),
        email: text(StudentColumn::Email),
        phone_number: text(StudentColumn::PhoneNumber),
        institution: text(StudentColumn::Institution),
        student_number: text(StudentColumn::StudentNumber),
        program: text(StudentColumn::Program),
        year_of_study: row
            .value(StudentColumn::YearOfStudy)
            .and_then(|v| v.parse::<u32>().ok()),
        funded: row
            .value(StudentColumn::Funded)
            .and_then(parse_funded)
            .unwrap_or(false),
        funded_amount: row
            .value(StudentColumn::FundedAmount)
            .and_then(parse_amount),
        nsfas_number: text(StudentColumn::NsfasNumber),
        status: StudentStatus::Pending,
    }
}

fn parse_amount(value: &str) -> Option<f64> {
    value
        .replace([' ', ','], "")
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusnest_models::imports::ValidationError;
    use std::collections::BTreeMap;

    fn row(row_index: usize, cells: &[(&str, &str)]) -> RawRow {
        RawRow::new(
            row_index,
            cells
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn valid(row_index: usize, id: &str) -> RawRow {
        row(
            row_index,
            &[("idNumber", id), ("firstNames", "Naledi"), ("surname", "Khumalo")],
        )
    }

    #[test]
    fn test_drops_error_rows_and_preserves_order() {
        let data = vec![
            valid(0, "9001015009087"),
            valid(1, "9202025009086"),
            valid(2, "9303035009085"),
            valid(3, "9404045009084"),
        ];
        let mut errors = ErrorMap::new();
        errors.insert(
            1,
            vec![ValidationError::new(1, StudentColumn::Email, "bad")],
        );

        let students = convert_to_validated_students(&data, &errors);
        let indices: Vec<usize> = students.iter().map(|s| s.row_index).collect();
        assert_eq!(indices, vec![0, 2, 3]);
        assert_eq!(students[1].id_number.as_str(), "9303035009085");
    }

    #[test]
    fn test_trims_and_coerces_fields() {
        let data = vec![row(
            0,
            &[
                ("idNumber", " 9001015009087 "),
                ("firstNames", "  Naledi "),
                ("surname", "Khumalo"),
                ("email", "   "),
                ("institution", " Wits "),
                ("funded", "YES"),
                ("fundedAmount", "45 000.50"),
                ("yearOfStudy", "2"),
            ],
        )];

        let student = &convert_to_validated_students(&data, &ErrorMap::new())[0];
        assert_eq!(student.id_number.as_str(), "9001015009087");
        assert_eq!(student.first_names, "Naledi");
        assert_eq!(student.email, None);
        assert_eq!(student.institution.as_deref(), Some("Wits"));
        assert!(student.funded);
        assert_eq!(student.funded_amount, Some(45000.5));
        assert_eq!(student.year_of_study, Some(2));
        assert_eq!(student.status, StudentStatus::Pending);
    }

    #[test]
    fn test_absent_or_unparseable_numbers_become_none() {
        let mut base = valid(0, "9001015009087");
        base.values.insert("fundedAmount".into(), "lots".into());
        let mut nan = valid(1, "9202025009086");
        nan.values.insert("fundedAmount".into(), "NaN".into());

        let students = convert_to_validated_students(&[base, nan], &ErrorMap::new());
        assert_eq!(students[0].funded_amount, None);
        assert_eq!(students[1].funded_amount, None);
        assert_eq!(students[0].year_of_study, None);
        assert!(!students[0].funded);
    }
}
