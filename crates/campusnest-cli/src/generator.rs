//! Fake student CSV generation.
//!
//! Produces files in the import template layout with Luhn-valid 13-digit ID
//! numbers, optionally salted with duplicate and invalid rows so the whole
//! pipeline can be exercised at volume.

use campusnest_models::imports::StudentColumn;
use chrono::{Datelike, Days, NaiveDate};
use fake::faker::internet::en::FreeEmailProvider;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::CellNumber;
use fake::{Fake, Faker};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;

const INSTITUTIONS: &[&str] = &[
    "University of Cape Town",
    "University of the Witwatersrand",
    "Stellenbosch University",
    "University of Pretoria",
    "University of Johannesburg",
    "Cape Peninsula University of Technology",
    "Tshwane University of Technology",
    "Nelson Mandela University",
];

const PROGRAMS: &[&str] = &[
    "BSc Computer Science",
    "BCom Accounting",
    "BA Psychology",
    "LLB",
    "BEng Civil Engineering",
    "Diploma in Nursing",
    "BEd Foundation Phase",
];

/// Rows per date of birth before the generator moves to the next day.
const IDS_PER_DAY: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateConfig {
    pub count: usize,
    /// Extra rows repeating the ID number of an earlier row.
    pub duplicates: usize,
    /// Extra rows that fail validation.
    pub invalid: usize,
}

impl GenerateConfig {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            duplicates: 0,
            invalid: 0,
        }
    }
}

/// One CSV row. Field order and names match the import template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub id_number: String,
    pub first_names: String,
    pub surname: String,
    pub email: String,
    pub phone_number: String,
    pub institution: String,
    pub student_number: String,
    pub program: String,
    pub year_of_study: Option<u32>,
    pub funded: String,
    pub funded_amount: Option<f64>,
    pub nsfas_number: String,
}

/// Luhn check digit for `payload`, a string of ASCII digits.
pub fn luhn_check_digit(payload: &str) -> u32 {
    let sum: u32 = payload
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    (10 - sum % 10) % 10
}

pub fn is_luhn_valid(number: &str) -> bool {
    match number.len().checked_sub(1) {
        Some(split) if number.chars().all(|c| c.is_ascii_digit()) => {
            let (payload, check) = number.split_at(split);
            check.parse::<u32>().ok() == Some(luhn_check_digit(payload))
        }
        _ => false,
    }
}

/// South African style ID number for the `index`-th generated student:
/// birth date, sequence (gender), citizenship, `8`, Luhn check digit.
/// Distinct indices give distinct numbers.
pub fn id_number_for(index: usize, male: bool) -> String {
    let base = NaiveDate::from_ymd_opt(1995, 1, 1).unwrap_or_default();
    let born = base
        .checked_add_days(Days::new((index / IDS_PER_DAY) as u64))
        .unwrap_or(base);
    let sequence = index % IDS_PER_DAY + if male { 5000 } else { 0 };

    let payload = format!(
        "{:02}{:02}{:02}{:04}08",
        born.year() % 100,
        born.month(),
        born.day(),
        sequence
    );
    format!("{}{}", payload, luhn_check_digit(&payload))
}

fn generate_row(index: usize) -> StudentRow {
    let first_names: String = FirstName().fake();
    let surname: String = LastName().fake();
    let provider: String = FreeEmailProvider().fake();
    let funded: bool = Faker.fake();
    let male: bool = Faker.fake();

    StudentRow {
        id_number: id_number_for(index, male),
        email: format!(
            "{}.{}{}@{}",
            first_names.to_lowercase(),
            surname.to_lowercase().replace(' ', ""),
            index,
            provider
        ),
        first_names,
        surname,
        phone_number: CellNumber().fake(),
        institution: INSTITUTIONS[index % INSTITUTIONS.len()].to_string(),
        student_number: format!("STU{:07}", index + 1),
        program: PROGRAMS[index % PROGRAMS.len()].to_string(),
        year_of_study: Some((1..5).fake()),
        funded: if funded { "Yes" } else { "No" }.to_string(),
        funded_amount: funded.then(|| ((20_000..90_000).fake::<u32>()) as f64),
        nsfas_number: if funded {
            format!("NSF{:08}", index + 1)
        } else {
            String::new()
        },
    }
}

/// Generates `count` valid rows in parallel, then appends the requested
/// duplicate and invalid rows.
pub fn generate_rows(config: &GenerateConfig) -> Vec<StudentRow> {
    let mut rows: Vec<StudentRow> = (0..config.count)
        .into_par_iter()
        .map(generate_row)
        .collect();

    if config.count > 0 {
        for i in 0..config.duplicates {
            let mut duplicate = generate_row(config.count + i);
            duplicate.id_number = rows[i % config.count].id_number.clone();
            rows.push(duplicate);
        }
    }

    for i in 0..config.invalid {
        let mut invalid = generate_row(config.count + config.duplicates + i);
        if i % 2 == 0 {
            invalid.id_number = String::new();
        } else {
            invalid.email = "not-an-email".to_string();
        }
        rows.push(invalid);
    }

    rows
}

/// Writes `rows` as CSV with the template header row.
pub fn write_csv(path: impl AsRef<Path>, rows: &[StudentRow]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Header names in the order [`StudentRow`] serializes them.
pub fn headers() -> Vec<&'static str> {
    StudentColumn::ALL.iter().map(|c| c.header()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_luhn_known_value() {
        assert_eq!(luhn_check_digit("900101500908"), 6);
        assert!(is_luhn_valid("9001015009086"));
        assert!(is_luhn_valid("8001015009087"));
        assert!(!is_luhn_valid("9001015009087"));
        assert!(!is_luhn_valid(""));
    }

    #[test]
    fn test_generated_ids_are_valid_and_unique() {
        let ids: Vec<String> = (0..12_000).map(|i| id_number_for(i, i % 3 == 0)).collect();
        assert!(ids.iter().all(|id| id.len() == 13 && is_luhn_valid(id)));
        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids[0].starts_with("950101"));
    }

    #[test]
    fn test_duplicates_and_invalid_rows_appended() {
        let config = GenerateConfig {
            count: 10,
            duplicates: 3,
            invalid: 2,
        };
        let rows = generate_rows(&config);

        assert_eq!(rows.len(), 15);
        assert_eq!(rows[10].id_number, rows[0].id_number);
        assert_eq!(rows[12].id_number, rows[2].id_number);
        assert!(rows[13].id_number.is_empty());
        assert_eq!(rows[14].email, "not-an-email");
    }

    #[test]
    fn test_serialized_header_matches_template() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(generate_row(0)).unwrap();
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, headers().join(","));
    }
}
