use std::io::Read;

use super::mapping::{field_for_header, ApplicantField};
use crate::domain::ApplicantDetails;

/// One data row of the export with its columns already remapped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationRow {
    /// 1-based line number in the source file, header included.
    pub line: u64,
    pub details: ApplicantDetails,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<ApplicationRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<Option<ApplicantField>> = csv_reader
        .headers()?
        .iter()
        .map(field_for_header)
        .collect();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|position| position.line()).unwrap_or(0);

        let mut details = ApplicantDetails::default();
        for (field, value) in columns.iter().zip(record.iter()) {
            if let Some(field) = field {
                apply_field(&mut details, *field, value);
            }
        }

        rows.push(ApplicationRow { line, details });
    }

    Ok(rows)
}

fn apply_field(details: &mut ApplicantDetails, field: ApplicantField, value: &str) {
    let optional = non_empty(value);
    match field {
        ApplicantField::FullName => details.full_name = value.to_string(),
        ApplicantField::Email => details.email = value.to_string(),
        ApplicantField::SubmittedTimestamp => details.submitted_timestamp = optional,
        ApplicantField::Major => details.major = optional,
        ApplicantField::ClassStanding => details.class_standing = optional,
        ApplicantField::FridayAvailability => details.friday_availability = optional,
        ApplicantField::ResumeUrl => details.resume_url = optional,
        ApplicantField::LinkedinUrl => details.linkedin_url = optional,
        ApplicantField::Response(index) => {
            if let Some(slot) = details.responses.get_mut(index) {
                *slot = optional;
            }
        }
        ApplicantField::AnythingElse => details.anything_else = optional,
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
