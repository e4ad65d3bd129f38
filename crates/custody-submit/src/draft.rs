use std::path::{Path, PathBuf};

use custody_types::SubmitterType;

/// The evidence a draft points at. A draft holds at most one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvidencePayload {
    File(PathBuf),
    Text(String),
}

/// User-editable submission input, not yet validated.
///
/// File and text selection are mutually exclusive: setting one clears
/// the other, so a draft can never carry both.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmissionDraft {
    case_id: String,
    payload: Option<EvidencePayload>,
    submitter: SubmitterType,
    key_ref: String,
}

impl SubmissionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    pub fn set_case_id(&mut self, case_id: impl Into<String>) {
        self.case_id = case_id.into();
    }

    pub fn payload(&self) -> Option<&EvidencePayload> {
        self.payload.as_ref()
    }

    pub fn set_file(&mut self, path: impl Into<PathBuf>) {
        self.payload = Some(EvidencePayload::File(path.into()));
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.payload = Some(EvidencePayload::Text(text.into()));
    }

    pub fn clear_payload(&mut self) {
        self.payload = None;
    }

    pub fn file(&self) -> Option<&Path> {
        match &self.payload {
            Some(EvidencePayload::File(path)) => Some(path),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            Some(EvidencePayload::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn submitter(&self) -> SubmitterType {
        self.submitter
    }

    pub fn set_submitter(&mut self, submitter: SubmitterType) {
        self.submitter = submitter;
    }

    pub fn key_ref(&self) -> &str {
        &self.key_ref
    }

    pub fn set_key_ref(&mut self, key_ref: impl Into<String>) {
        self.key_ref = key_ref.into();
    }
}
