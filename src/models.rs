use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub type JobId = i64;
pub type DocumentId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JobStatus {
    #[default]
    Bookmarked,
    Applying,
    Applied,
    Interviewing,
    Negotiating,
    Accepted,
}

impl JobStatus {
    /// Canonical pipeline order, used by the dashboard summary and the status picker.
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Bookmarked,
        JobStatus::Applying,
        JobStatus::Applied,
        JobStatus::Interviewing,
        JobStatus::Negotiating,
        JobStatus::Accepted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Bookmarked => "Bookmarked",
            JobStatus::Applying => "Applying",
            JobStatus::Applied => "Applied",
            JobStatus::Interviewing => "Interviewing",
            JobStatus::Negotiating => "Negotiating",
            JobStatus::Accepted => "Accepted",
        }
    }

    fn position(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn next(&self) -> JobStatus {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> JobStatus {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("unknown status '{}'", s))
    }
}

/// An uploaded file attached to one application. Owned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub file_name: String,
    #[serde(default)]
    pub content_type: String,
}

impl Document {
    /// Only PDFs get an inline "view" link.
    pub fn is_previewable(&self) -> bool {
        self.content_type.eq_ignore_ascii_case("application/pdf")
    }
}

/// One tracked job application as the backend returns it.
///
/// `id` is `None` only for the blank record composed in the add form; every
/// record fetched from the server carries one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    #[serde(default)]
    pub id: Option<JobId>,
    #[serde(default)]
    pub job_position: String,
    #[serde(default)]
    pub company: String,
    pub location: Option<String>,
    pub job_url: Option<String>,
    pub job_source: Option<String>,
    pub job_description: Option<String>,
    pub max_salary: Option<f64>,
    #[serde(default)]
    pub status: JobStatus,
    pub date_saved: Option<String>,
    pub date_applied: Option<String>,
    #[serde(default)]
    pub documents: Vec<Document>,
}

impl JobApplication {
    /// The blank template the add form starts from.
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn saved_at(&self) -> Option<NaiveDateTime> {
        self.date_saved.as_deref().and_then(parse_timestamp)
    }

    pub fn applied_on(&self) -> Option<NaiveDate> {
        self.date_applied
            .as_deref()
            .and_then(parse_timestamp)
            .map(|ts| ts.date())
    }
}

/// Request body for create and update. Carries neither `id` (it lives in the
/// URL, or is server-assigned) nor `documents` (managed through the document
/// endpoints).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    pub job_position: String,
    pub company: String,
    pub location: Option<String>,
    pub job_url: Option<String>,
    pub job_source: Option<String>,
    pub job_description: Option<String>,
    pub max_salary: Option<f64>,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_saved: Option<String>,
    pub date_applied: Option<String>,
}

impl From<&JobApplication> for JobPayload {
    fn from(job: &JobApplication) -> Self {
        Self {
            job_position: job.job_position.clone(),
            company: job.company.clone(),
            location: job.location.clone(),
            job_url: job.job_url.clone(),
            job_source: job.job_source.clone(),
            job_description: job.job_description.clone(),
            max_salary: job.max_salary,
            status: job.status,
            date_saved: job.date_saved.clone(),
            date_applied: job.date_applied.clone(),
        }
    }
}

/// Parse the timestamp shapes the backend is known to emit: RFC 3339, a
/// zone-less ISO datetime, or a bare `YYYY-MM-DD` date.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_server_record() {
        let json = r#"{
            "id": 7,
            "jobPosition": "Engineer",
            "company": "Acme",
            "location": null,
            "maxSalary": 120000,
            "status": "Interviewing",
            "dateSaved": "2024-01-02T09:30:00",
            "documents": [{"id": 3, "fileName": "cv.pdf", "contentType": "application/pdf"}]
        }"#;
        let job: JobApplication = serde_json::from_str(json).unwrap();
        assert_eq!(job.id, Some(7));
        assert_eq!(job.status, JobStatus::Interviewing);
        assert_eq!(job.max_salary, Some(120000.0));
        assert_eq!(job.location, None);
        assert_eq!(job.documents.len(), 1);
        assert!(job.documents[0].is_previewable());
    }

    #[test]
    fn blank_record_has_defaults() {
        let job = JobApplication::blank();
        assert_eq!(job.id, None);
        assert_eq!(job.job_position, "");
        assert_eq!(job.company, "");
        assert_eq!(job.status, JobStatus::Bookmarked);
        assert_eq!(job.max_salary, None);
        assert_eq!(job.date_applied, None);
        assert!(job.documents.is_empty());
    }

    #[test]
    fn payload_omits_id_and_documents() {
        let job = JobApplication {
            id: Some(5),
            job_position: "Engineer".into(),
            company: "Acme".into(),
            documents: vec![Document {
                id: 1,
                file_name: "cv.pdf".into(),
                content_type: "application/pdf".into(),
            }],
            ..JobApplication::blank()
        };
        let value = serde_json::to_value(JobPayload::from(&job)).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("id"));
        assert!(!obj.contains_key("documents"));
        assert_eq!(obj["jobPosition"], "Engineer");
        assert_eq!(obj["status"], "Bookmarked");
    }

    #[test]
    fn parses_timestamp_variants() {
        let date_only = parse_timestamp("2024-01-02").unwrap();
        assert_eq!(date_only.to_string(), "2024-01-02 00:00:00");

        let local = parse_timestamp("2024-01-02T10:15:30.123").unwrap();
        assert_eq!(local.date().to_string(), "2024-01-02");

        let zoned = parse_timestamp("2024-01-02T10:00:00+02:00").unwrap();
        assert_eq!(zoned.to_string(), "2024-01-02 08:00:00");

        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn status_cycles_and_parses() {
        assert_eq!(JobStatus::Accepted.next(), JobStatus::Bookmarked);
        assert_eq!(JobStatus::Bookmarked.prev(), JobStatus::Accepted);
        assert_eq!("applied".parse::<JobStatus>(), Ok(JobStatus::Applied));
        assert!("rejected".parse::<JobStatus>().is_err());
    }
}
