use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Four-state job status as seen by the orchestration layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Submitted,
    Processing,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobStatus::Submitted => write!(f, "submitted"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(JobStatus::Submitted),
            "processing" => Ok(JobStatus::Processing),
            "succeeded" => Ok(JobStatus::Succeeded),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid job status: {}", s)),
        }
    }
}

/// Map a raw remote job state onto [`JobStatus`].
///
/// Anything not recognised as terminal counts as still processing.
pub fn map_remote_status(raw: &str) -> JobStatus {
    match raw.trim().to_ascii_uppercase().as_str() {
        "SUBMITTED" => JobStatus::Submitted,
        "COMPLETED" => JobStatus::Succeeded,
        "COMPLETED_WITH_ERROR" | "FAILED" | "STOPPED" => JobStatus::Failed,
        _ => JobStatus::Processing,
    }
}

/// Document family inferred from a key's extension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Pdf,
    Docx,
    Pptx,
    Xlsx,
    Html,
    PlainText,
    Xliff,
    Unknown,
}

impl ContentKind {
    /// Content-type hint sent at submission. `None` leaves detection to the service.
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            ContentKind::Pdf => Some("application/pdf"),
            ContentKind::Docx => Some(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            ),
            ContentKind::Pptx => Some(
                "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            ),
            ContentKind::Xlsx => {
                Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
            }
            ContentKind::Html => Some("text/html"),
            ContentKind::PlainText => Some("text/plain"),
            ContentKind::Xliff => Some("application/x-xliff+xml"),
            ContentKind::Unknown => None,
        }
    }
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ContentKind::Pdf => write!(f, "pdf"),
            ContentKind::Docx => write!(f, "docx"),
            ContentKind::Pptx => write!(f, "pptx"),
            ContentKind::Xlsx => write!(f, "xlsx"),
            ContentKind::Html => write!(f, "html"),
            ContentKind::PlainText => write!(f, "plain_text"),
            ContentKind::Xliff => write!(f, "xliff"),
            ContentKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Infer the content kind from the file extension of `key`.
pub fn content_kind_for(key: &str) -> ContentKind {
    let file_name = crate::keys::file_name_of(key);
    let extension = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => return ContentKind::Unknown,
    };

    match extension.as_str() {
        "pdf" => ContentKind::Pdf,
        "docx" => ContentKind::Docx,
        "pptx" => ContentKind::Pptx,
        "xlsx" => ContentKind::Xlsx,
        "html" | "htm" => ContentKind::Html,
        "txt" | "text" => ContentKind::PlainText,
        "xlf" | "xliff" => ContentKind::Xliff,
        _ => ContentKind::Unknown,
    }
}

/// One submitted unit of work.
///
/// `source_key`, `target_language` and `content_kind` are fixed at submission.
/// `status` only moves forward and `output_key` is only set once the job
/// has succeeded and its output was located.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslationJob {
    job_id: String,
    source_key: String,
    target_language: String,
    content_kind: ContentKind,
    status: JobStatus,
    output_key: Option<String>,
    submitted_at: DateTime<Utc>,
}

impl TranslationJob {
    pub fn new(job_id: impl Into<String>, source_key: impl Into<String>, target_language: impl Into<String>) -> Self {
        let source_key = source_key.into();
        let content_kind = content_kind_for(&source_key);
        Self {
            job_id: job_id.into(),
            source_key,
            target_language: target_language.into(),
            content_kind,
            status: JobStatus::Submitted,
            output_key: None,
            submitted_at: Utc::now(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn source_key(&self) -> &str {
        &self.source_key
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    pub fn content_kind(&self) -> ContentKind {
        self.content_kind
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn output_key(&self) -> Option<&str> {
        self.output_key.as_deref()
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Record an observed status. Returns false if the update was ignored
    /// because the job already reached a terminal status.
    pub fn observe_status(&mut self, status: JobStatus) -> bool {
        if self.status.is_terminal() {
            return status == self.status;
        }
        if status == JobStatus::Submitted && self.status == JobStatus::Processing {
            return false;
        }
        self.status = status;
        true
    }

    /// Attach a confirmed output key. Only valid once the job succeeded.
    pub fn set_output_key(&mut self, key: impl Into<String>) -> bool {
        if self.status != JobStatus::Succeeded {
            return false;
        }
        self.output_key = Some(key.into());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_states_map_to_four_states() {
        assert_eq!(map_remote_status("SUBMITTED"), JobStatus::Submitted);
        assert_eq!(map_remote_status("IN_PROGRESS"), JobStatus::Processing);
        assert_eq!(map_remote_status("STOP_REQUESTED"), JobStatus::Processing);
        assert_eq!(map_remote_status("COMPLETED"), JobStatus::Succeeded);
        assert_eq!(map_remote_status("COMPLETED_WITH_ERROR"), JobStatus::Failed);
        assert_eq!(map_remote_status("FAILED"), JobStatus::Failed);
        assert_eq!(map_remote_status("STOPPED"), JobStatus::Failed);
        assert_eq!(map_remote_status("completed"), JobStatus::Succeeded);
    }

    #[test]
    fn unknown_remote_state_is_processing() {
        assert_eq!(map_remote_status("QUEUED_FOR_REVIEW"), JobStatus::Processing);
        assert_eq!(map_remote_status(""), JobStatus::Processing);
    }

    #[test]
    fn content_kind_from_extension() {
        assert_eq!(content_kind_for("uploads/1-report.pdf"), ContentKind::Pdf);
        assert_eq!(content_kind_for("uploads/1-report.DOCX"), ContentKind::Docx);
        assert_eq!(content_kind_for("uploads/1-notes.txt"), ContentKind::PlainText);
        assert_eq!(content_kind_for("uploads/1-page.htm"), ContentKind::Html);
        assert_eq!(content_kind_for("uploads/1-archive.zip"), ContentKind::Unknown);
        assert_eq!(content_kind_for("uploads/no-extension"), ContentKind::Unknown);
        assert_eq!(content_kind_for("uploads/.hidden"), ContentKind::Unknown);
        assert_eq!(content_kind_for("dir.v2/README"), ContentKind::Unknown);
    }

    #[test]
    fn unknown_kind_has_no_content_type() {
        assert_eq!(ContentKind::Unknown.content_type(), None);
        assert_eq!(ContentKind::PlainText.content_type(), Some("text/plain"));
    }

    #[test]
    fn job_infers_content_kind_once() {
        let job = TranslationJob::new("J1", "uploads/1700000000-report.pdf", "de");
        assert_eq!(job.content_kind(), ContentKind::Pdf);
        assert_eq!(job.status(), JobStatus::Submitted);
        assert_eq!(job.output_key(), None);
    }

    #[test]
    fn terminal_status_never_regresses() {
        let mut job = TranslationJob::new("J1", "uploads/a.pdf", "de");
        assert!(job.observe_status(JobStatus::Processing));
        assert!(job.observe_status(JobStatus::Failed));
        assert!(!job.observe_status(JobStatus::Processing));
        assert!(!job.observe_status(JobStatus::Succeeded));
        assert_eq!(job.status(), JobStatus::Failed);
    }

    #[test]
    fn output_key_requires_success() {
        let mut job = TranslationJob::new("J1", "uploads/a.pdf", "de");
        assert!(!job.set_output_key("translated/x"));
        job.observe_status(JobStatus::Succeeded);
        assert!(job.set_output_key("translated/x"));
        assert_eq!(job.output_key(), Some("translated/x"));
    }
}
