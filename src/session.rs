use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{Document, DocumentId, JobApplication, JobId, JobPayload, JobStatus};

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("invalid salary '{0}', expected a number")]
    InvalidSalary(String),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("{0}")]
    InvalidStatus(String),
    #[error("record being edited has no id")]
    MissingId,
}

/// Editable fields of the application form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    JobPosition,
    Company,
    Location,
    MaxSalary,
    JobSource,
    JobUrl,
    JobDescription,
    Status,
    DateApplied,
}

impl FormField {
    pub const ALL: [FormField; 9] = [
        FormField::JobPosition,
        FormField::Company,
        FormField::Location,
        FormField::MaxSalary,
        FormField::JobSource,
        FormField::JobUrl,
        FormField::JobDescription,
        FormField::Status,
        FormField::DateApplied,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::JobPosition => "Job Position",
            FormField::Company => "Company",
            FormField::Location => "Location",
            FormField::MaxSalary => "Max Salary",
            FormField::JobSource => "Job Source",
            FormField::JobUrl => "Job URL",
            FormField::JobDescription => "Job Description",
            FormField::Status => "Status",
            FormField::DateApplied => "Date Applied",
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, FormField::JobPosition | FormField::Company)
    }
}

/// What a save turns into on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveRequest {
    Create(JobPayload),
    Update { id: JobId, payload: JobPayload },
}

/// Working copy of one application while the form is open.
///
/// Edits only touch the buffer. Documents are the exception: they are
/// confirmed by the server first and then mirrored into the buffer, so the
/// buffer never holds an attachment the server does not know about.
#[derive(Debug, Clone)]
pub struct FormSession {
    epoch: u64,
    buffer: JobApplication,
    is_editing: bool,
}

impl FormSession {
    pub fn new_record(epoch: u64) -> Self {
        Self {
            epoch,
            buffer: JobApplication::blank(),
            is_editing: false,
        }
    }

    pub fn edit(epoch: u64, record: &JobApplication) -> Self {
        Self {
            epoch,
            buffer: record.clone(),
            is_editing: true,
        }
    }

    /// Identifies this session among all sessions opened during the run;
    /// late completions carrying another epoch are ignored.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn buffer(&self) -> &JobApplication {
        &self.buffer
    }

    pub fn is_editing(&self) -> bool {
        self.is_editing
    }

    pub fn field_value(&self, field: FormField) -> String {
        let job = &self.buffer;
        match field {
            FormField::JobPosition => job.job_position.clone(),
            FormField::Company => job.company.clone(),
            FormField::Location => job.location.clone().unwrap_or_default(),
            FormField::MaxSalary => job.max_salary.map(format_salary).unwrap_or_default(),
            FormField::JobSource => job.job_source.clone().unwrap_or_default(),
            FormField::JobUrl => job.job_url.clone().unwrap_or_default(),
            FormField::JobDescription => job.job_description.clone().unwrap_or_default(),
            FormField::Status => job.status.to_string(),
            FormField::DateApplied => match job.applied_on() {
                Some(date) => date.format("%Y-%m-%d").to_string(),
                None => job.date_applied.clone().unwrap_or_default(),
            },
        }
    }

    /// Apply raw text input to one field. Blank input clears optional fields.
    pub fn set_field(&mut self, field: FormField, input: &str) -> Result<(), SessionError> {
        let trimmed = input.trim();
        let optional = || (!trimmed.is_empty()).then(|| input.to_string());
        let job = &mut self.buffer;
        match field {
            FormField::JobPosition => job.job_position = input.to_string(),
            FormField::Company => job.company = input.to_string(),
            FormField::Location => job.location = optional(),
            FormField::JobSource => job.job_source = optional(),
            FormField::JobUrl => job.job_url = optional(),
            FormField::JobDescription => job.job_description = optional(),
            FormField::MaxSalary => {
                job.max_salary = if trimmed.is_empty() {
                    None
                } else {
                    let cleaned: String = trimmed.chars().filter(|c| *c != ',' && *c != '$').collect();
                    Some(
                        cleaned
                            .parse::<f64>()
                            .map_err(|_| SessionError::InvalidSalary(input.to_string()))?,
                    )
                };
            }
            FormField::Status => {
                job.status = trimmed
                    .parse::<JobStatus>()
                    .map_err(SessionError::InvalidStatus)?;
            }
            FormField::DateApplied => {
                job.date_applied = if trimmed.is_empty() {
                    None
                } else {
                    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                        .map_err(|_| SessionError::InvalidDate(input.to_string()))?;
                    Some(date.format("%Y-%m-%d").to_string())
                };
            }
        }
        Ok(())
    }

    pub fn cycle_status(&mut self, forward: bool) {
        self.buffer.status = if forward {
            self.buffer.status.next()
        } else {
            self.buffer.status.prev()
        };
    }

    /// The record documents can be attached to, if it exists server-side yet.
    pub fn upload_target(&self) -> Option<JobId> {
        self.buffer.id
    }

    pub fn apply_uploaded(&mut self, document: Document) {
        self.buffer.documents.push(document);
    }

    pub fn document_at(&self, index: usize) -> Option<&Document> {
        self.buffer.documents.get(index)
    }

    /// Drop a server-confirmed deletion from the buffer. Returns false when
    /// the document was already gone.
    pub fn apply_document_deleted(&mut self, document_id: DocumentId) -> bool {
        let before = self.buffer.documents.len();
        self.buffer.documents.retain(|d| d.id != document_id);
        self.buffer.documents.len() != before
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.buffer.job_position.trim().is_empty() {
            return Err(SessionError::MissingField(FormField::JobPosition.label()));
        }
        if self.buffer.company.trim().is_empty() {
            return Err(SessionError::MissingField(FormField::Company.label()));
        }
        Ok(())
    }

    pub fn save_request(&self) -> Result<SaveRequest, SessionError> {
        self.validate()?;
        let payload = JobPayload::from(&self.buffer);
        if self.is_editing {
            let id = self.buffer.id.ok_or(SessionError::MissingId)?;
            Ok(SaveRequest::Update { id, payload })
        } else {
            Ok(SaveRequest::Create(payload))
        }
    }
}

fn format_salary(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn saved_record() -> JobApplication {
        JobApplication {
            id: Some(5),
            job_position: "Engineer".into(),
            company: "Acme".into(),
            date_saved: Some("2024-01-02T00:00:00".into()),
            ..JobApplication::blank()
        }
    }

    #[test]
    fn new_record_starts_blank() {
        let session = FormSession::new_record(1);
        assert!(!session.is_editing());
        assert_eq!(session.buffer(), &JobApplication::blank());
        assert_eq!(session.upload_target(), None);
    }

    #[test]
    fn edit_buffer_is_independent_of_source() {
        let record = saved_record();
        let mut session = FormSession::edit(1, &record);
        session.set_field(FormField::Company, "Globex").unwrap();
        session.cycle_status(true);
        assert_eq!(record.company, "Acme");
        assert_eq!(record.status, JobStatus::Bookmarked);
        assert_eq!(session.buffer().company, "Globex");
        assert_eq!(session.buffer().status, JobStatus::Applying);
    }

    #[test]
    fn optional_fields_clear_on_blank_input() {
        let mut session = FormSession::edit(1, &saved_record());
        session.set_field(FormField::Location, "Remote").unwrap();
        assert_eq!(session.buffer().location.as_deref(), Some("Remote"));
        session.set_field(FormField::Location, "   ").unwrap();
        assert_eq!(session.buffer().location, None);
    }

    #[test]
    fn salary_and_date_inputs_are_checked() {
        let mut session = FormSession::new_record(1);
        session.set_field(FormField::MaxSalary, "$120,000").unwrap();
        assert_eq!(session.buffer().max_salary, Some(120000.0));
        assert_eq!(session.field_value(FormField::MaxSalary), "120000");

        let err = session.set_field(FormField::MaxSalary, "lots").unwrap_err();
        assert_eq!(err, SessionError::InvalidSalary("lots".into()));
        assert_eq!(session.buffer().max_salary, Some(120000.0));

        session.set_field(FormField::DateApplied, "2024-03-05").unwrap();
        assert_eq!(session.buffer().date_applied.as_deref(), Some("2024-03-05"));
        assert!(session.set_field(FormField::DateApplied, "05/03/2024").is_err());
    }

    #[test]
    fn create_request_has_no_id() {
        let mut session = FormSession::new_record(1);
        session.set_field(FormField::JobPosition, "Engineer").unwrap();
        session.set_field(FormField::Company, "Acme").unwrap();
        match session.save_request().unwrap() {
            SaveRequest::Create(payload) => {
                let value = serde_json::to_value(&payload).unwrap();
                assert!(value.get("id").is_none());
                assert!(value.get("documents").is_none());
                assert_eq!(value["company"], "Acme");
            }
            other => panic!("expected create, got {:?}", other),
        }
    }

    #[test]
    fn update_request_uses_original_id() {
        let mut record = saved_record();
        record.documents.push(Document {
            id: 9,
            file_name: "cv.pdf".into(),
            content_type: "application/pdf".into(),
        });
        let session = FormSession::edit(1, &record);
        match session.save_request().unwrap() {
            SaveRequest::Update { id, payload } => {
                assert_eq!(id, 5);
                let value = serde_json::to_value(&payload).unwrap();
                assert!(value.get("documents").is_none());
                assert_eq!(value["dateSaved"], "2024-01-02T00:00:00");
            }
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn save_requires_position_and_company() {
        let mut session = FormSession::new_record(1);
        assert_eq!(
            session.save_request().unwrap_err(),
            SessionError::MissingField("Job Position")
        );
        session.set_field(FormField::JobPosition, "Engineer").unwrap();
        assert_eq!(
            session.save_request().unwrap_err(),
            SessionError::MissingField("Company")
        );
    }

    #[test]
    fn documents_mirror_server_confirmations() {
        let mut session = FormSession::edit(1, &saved_record());
        assert_eq!(session.upload_target(), Some(5));
        let doc = Document {
            id: 11,
            file_name: "letter.docx".into(),
            content_type: "application/vnd.openxmlformats-officedocument.wordprocessingml.document".into(),
        };
        session.apply_uploaded(doc.clone());
        assert_eq!(session.buffer().documents, vec![doc]);
        assert!(session.apply_document_deleted(11));
        assert!(!session.apply_document_deleted(11));
        assert!(session.buffer().documents.is_empty());
    }
}
