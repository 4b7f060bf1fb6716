use campusnest_models::imports::StudentColumn;
use csv::WriterBuilder;

/// File name offered for the template download.
pub const TEMPLATE_FILE_NAME: &str = "student_import_template.csv";

/// A CSV containing only the header row, for users to fill in.
pub fn student_csv_template() -> Result<String, csv::Error> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(StudentColumn::ALL.iter().map(|c| c.header()))?;
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParseLimits, UploadedFile, parse_student_csv};

    #[test]
    fn test_template_is_header_only() {
        let template = student_csv_template().unwrap();
        assert_eq!(
            template,
            "idNumber,firstNames,surname,email,phoneNumber,institution,studentNumber,program,yearOfStudy,funded,fundedAmount,nsfasNumber\n"
        );
        assert_eq!(template.lines().count(), 1);
    }

    #[test]
    fn test_template_parses_with_no_rows() {
        let file = UploadedFile::new(TEMPLATE_FILE_NAME, None, student_csv_template().unwrap());
        let parsed = parse_student_csv(&file, &ParseLimits::default()).unwrap();
        assert_eq!(parsed.headers.len(), 12);
        assert!(parsed.data.is_empty());
    }
}
