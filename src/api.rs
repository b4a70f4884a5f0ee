use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::models::{Document, DocumentId, JobApplication, JobId, JobPayload};

/// Every way a backend call can fail. Callers treat all of them as one
/// "operation failed" outcome; the variants exist for the log line.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file picked for upload, already read into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub async fn read(path: &Path) -> Result<Self, ApiError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self {
            content_type: guess_content_type(&file_name).to_string(),
            file_name,
            bytes,
        })
    }
}

fn guess_content_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "odt" => "application/vnd.oasis.opendocument.text",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "rtf" => "application/rtf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// The backend's record operations. Implemented over HTTP by
/// [`HttpRecordStore`]; tests substitute an in-memory store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_jobs(&self) -> Result<Vec<JobApplication>, ApiError>;
    async fn create_job(&self, payload: &JobPayload) -> Result<JobApplication, ApiError>;
    async fn update_job(&self, id: JobId, payload: &JobPayload) -> Result<JobApplication, ApiError>;
    async fn delete_job(&self, id: JobId) -> Result<(), ApiError>;
    async fn upload_document(&self, job_id: JobId, file: UploadFile) -> Result<Document, ApiError>;
    async fn delete_document(&self, id: DocumentId) -> Result<(), ApiError>;
}

/// URL layout of the REST API under one base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn jobs(&self) -> String {
        format!("{}/api/jobapplication", self.base)
    }

    pub fn job(&self, id: JobId) -> String {
        format!("{}/api/jobapplication/{}", self.base, id)
    }

    pub fn upload(&self, job_id: JobId) -> String {
        format!("{}/api/document/{}", self.base, job_id)
    }

    pub fn document(&self, id: DocumentId) -> String {
        format!("{}/api/document/{}", self.base, id)
    }

    pub fn download(&self, id: DocumentId) -> String {
        format!("{}/api/document/download/{}", self.base, id)
    }

    pub fn view(&self, id: DocumentId) -> String {
        format!("{}/api/document/view/{}", self.base, id)
    }
}

#[derive(Debug, Clone)]
pub struct HttpRecordStore {
    endpoints: Endpoints,
    client: reqwest::Client,
}

impl HttpRecordStore {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &str) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        debug!(%url, %status, "backend responded");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder, url: &str) -> Result<T, ApiError> {
        let response = self.send(request, url).await?;
        response.json::<T>().await.map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn list_jobs(&self) -> Result<Vec<JobApplication>, ApiError> {
        let url = self.endpoints.jobs();
        self.send_json(self.client.get(&url), &url).await
    }

    async fn create_job(&self, payload: &JobPayload) -> Result<JobApplication, ApiError> {
        let url = self.endpoints.jobs();
        self.send_json(self.client.post(&url).json(payload), &url).await
    }

    async fn update_job(&self, id: JobId, payload: &JobPayload) -> Result<JobApplication, ApiError> {
        let url = self.endpoints.job(id);
        self.send_json(self.client.put(&url).json(payload), &url).await
    }

    async fn delete_job(&self, id: JobId) -> Result<(), ApiError> {
        let url = self.endpoints.job(id);
        self.send(self.client.delete(&url), &url).await?;
        Ok(())
    }

    async fn upload_document(&self, job_id: JobId, file: UploadFile) -> Result<Document, ApiError> {
        let url = self.endpoints.upload(job_id);
        let part = reqwest::multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;
        let form = reqwest::multipart::Form::new().part("file", part);
        self.send_json(self.client.post(&url).multipart(form), &url).await
    }

    async fn delete_document(&self, id: DocumentId) -> Result<(), ApiError> {
        let url = self.endpoints.document(id);
        self.send(self.client.delete(&url), &url).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn endpoints_follow_backend_layout() {
        let endpoints = Endpoints::new("http://127.0.0.1:2025/");
        assert_eq!(endpoints.base(), "http://127.0.0.1:2025");
        assert_eq!(endpoints.jobs(), "http://127.0.0.1:2025/api/jobapplication");
        assert_eq!(endpoints.job(4), "http://127.0.0.1:2025/api/jobapplication/4");
        assert_eq!(endpoints.upload(5), "http://127.0.0.1:2025/api/document/5");
        assert_eq!(endpoints.document(6), "http://127.0.0.1:2025/api/document/6");
        assert_eq!(endpoints.download(6), "http://127.0.0.1:2025/api/document/download/6");
        assert_eq!(endpoints.view(6), "http://127.0.0.1:2025/api/document/view/6");
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(guess_content_type("Resume.PDF"), "application/pdf");
        assert_eq!(guess_content_type("notes.txt"), "text/plain");
        assert_eq!(guess_content_type("archive"), "application/octet-stream");
    }

    #[tokio::test]
    async fn upload_file_reads_name_and_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let file = UploadFile::read(&path).await.unwrap();
        assert_eq!(file.file_name, "cover.pdf");
        assert_eq!(file.content_type, "application/pdf");
        assert_eq!(file.bytes, b"%PDF-1.4".to_vec());
    }

    #[tokio::test]
    async fn upload_file_missing_is_io_error() {
        let err = UploadFile::read(Path::new("/definitely/not/here.pdf")).await.unwrap_err();
        assert!(matches!(err, ApiError::Io { .. }));
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let store = HttpRecordStore::new(Endpoints::new("http://127.0.0.1:9"));
        let err = store.list_jobs().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
    }
}
