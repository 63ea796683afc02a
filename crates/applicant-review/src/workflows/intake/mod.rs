//! Applicant intake from spreadsheet exports.

mod mapping;
mod normalizer;
mod parser;
mod service;

pub use mapping::{field_for_header, ApplicantField};
pub use parser::ApplicationRow;
pub use service::{ApplicationStats, IntakeService, UploadReport};

use std::io::Read;
use std::path::Path;

use crate::domain::{ApplicantDetails, ApplicationId};
use crate::repository::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("failed to read application export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid application CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Reasons a single export row is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("row {line}: full name is required")]
    MissingName { line: u64 },
    #[error("row {line}: invalid email '{value}'")]
    InvalidEmail { line: u64, value: String },
    #[error("row {line}: {field} must be an http(s) URL")]
    InvalidUrl { line: u64, field: &'static str },
}

/// Reads spreadsheet exports into remapped rows.
pub struct ApplicationImporter;

impl ApplicationImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ApplicationRow>, IntakeError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ApplicationRow>, IntakeError> {
        Ok(parser::parse_rows(reader)?)
    }
}

impl ApplicationRow {
    pub fn validate(self) -> Result<ApplicantDetails, RowError> {
        let line = self.line;
        let details = self.details;

        if details.full_name.trim().is_empty() {
            return Err(RowError::MissingName { line });
        }
        if !is_valid_email(&details.email) {
            return Err(RowError::InvalidEmail {
                line,
                value: details.email,
            });
        }
        for (field, value) in [
            ("resume_url", &details.resume_url),
            ("linkedin_url", &details.linkedin_url),
        ] {
            if value.as_deref().is_some_and(|url| !is_http_url(url)) {
                return Err(RowError::InvalidUrl { line, field });
            }
        }

        Ok(details)
    }
}

pub(crate) fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .filter(|part| !part.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn is_http_url(value: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        value
            .strip_prefix(scheme)
            .is_some_and(|rest| !rest.trim().is_empty())
    })
}
