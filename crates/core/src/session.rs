use crate::collision::CollisionError;
use crate::format::{CaseFormat, SpaceReplacement};
use crate::history::{HistoryEntry, HistoryStore};
use crate::pipeline::{execute, RenameOutcome, RenameRequest};
use crate::sanitize::{suggest_name_with_fallback, DEFAULT_FALLBACK_BASE};
use crate::summary::FileSummary;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no file has been uploaded")]
    NoUpload,
    #[error("the new file name is empty")]
    EmptyName,
    #[error(transparent)]
    Collision(#[from] CollisionError),
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub original_name: String,
    pub mime_type: String,
    pub payload: Arc<[u8]>,
}

#[derive(Debug, Clone, Default)]
pub struct RenameOptions {
    pub name: String,
    pub case_format: CaseFormat,
    pub space_replacement: SpaceReplacement,
}

/// State for one user working through uploads: the current file, the last
/// rename and the restore history.
#[derive(Debug, Clone)]
pub struct RenameSession {
    fallback_base: String,
    upload: Option<Upload>,
    last: Option<RenameOutcome>,
    history: HistoryStore,
}

impl Default for RenameSession {
    fn default() -> Self {
        Self::new(HistoryStore::new())
    }
}

impl RenameSession {
    pub fn new(history: HistoryStore) -> Self {
        Self {
            fallback_base: DEFAULT_FALLBACK_BASE.to_string(),
            upload: None,
            last: None,
            history,
        }
    }

    pub fn with_fallback_base(mut self, fallback_base: impl Into<String>) -> Self {
        self.fallback_base = fallback_base.into();
        self
    }

    /// Replaces the current upload and returns the suggested name for it.
    pub fn upload(
        &mut self,
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        payload: impl Into<Arc<[u8]>>,
    ) -> String {
        let upload = Upload {
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            payload: payload.into(),
        };
        let suggestion = suggest_name_with_fallback(&upload.original_name, &self.fallback_base);
        self.upload = Some(upload);
        self.last = None;
        suggestion
    }

    pub fn current_upload(&self) -> Option<&Upload> {
        self.upload.as_ref()
    }

    pub fn summary(&self) -> Option<FileSummary> {
        self.upload
            .as_ref()
            .map(|u| FileSummary::describe(&u.original_name, &u.mime_type, &u.payload))
    }

    /// Renames the current upload and records it in the history. Only an
    /// empty name is refused; whitespace is a name like any other.
    pub fn process(
        &mut self,
        options: &RenameOptions,
        exists: impl FnMut(&str) -> bool,
    ) -> Result<RenameOutcome, SessionError> {
        let upload = self.upload.as_ref().ok_or(SessionError::NoUpload)?;
        if options.name.is_empty() {
            return Err(SessionError::EmptyName);
        }

        let request = RenameRequest::new(
            upload.original_name.clone(),
            upload.mime_type.clone(),
            upload.payload.len() as u64,
        )
        .with_candidate(options.name.clone())
        .with_case_format(options.case_format)
        .with_space_replacement(options.space_replacement);

        let outcome = execute(&request, exists)?;
        info!(original = %upload.original_name, final_name = %outcome.final_name, "renamed upload");

        self.history.append(HistoryEntry::new(
            upload.original_name.clone(),
            outcome.final_name.clone(),
            upload.mime_type.clone(),
            Arc::clone(&upload.payload),
        ));
        self.last = Some(outcome.clone());
        Ok(outcome)
    }

    pub fn last_result(&self) -> Option<&RenameOutcome> {
        self.last.as_ref()
    }

    /// 1-based, newest first.
    pub fn restore(&self, index: usize) -> Option<&HistoryEntry> {
        self.history.get(index)
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn into_history(self) -> HistoryStore {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::DirectoryListing;

    fn options(name: &str) -> RenameOptions {
        RenameOptions {
            name: name.to_string(),
            ..RenameOptions::default()
        }
    }

    #[test]
    fn process_requires_an_upload() {
        let mut session = RenameSession::default();
        let err = session.process(&options("a.txt"), |_| false).expect_err("no upload");
        assert_eq!(err, SessionError::NoUpload);
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut session = RenameSession::default();
        session.upload("a.txt", "text/plain", b"x".to_vec());
        let err = session.process(&options(""), |_| false).expect_err("empty");
        assert_eq!(err, SessionError::EmptyName);
        assert!(session.history().is_empty());
    }

    #[test]
    fn whitespace_name_is_processed() {
        let mut session = RenameSession::default();
        session.upload("a.txt", "text/plain", b"x".to_vec());
        let outcome = session.process(&options("  "), |_| false).expect("process");
        assert!(outcome.final_name.starts_with("  "));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn exhausted_names_leave_history_untouched() {
        let mut session = RenameSession::default();
        session.upload("a.txt", "text/plain", b"x".to_vec());
        let err = session.process(&options("a.txt"), |_| true).expect_err("all taken");
        assert!(matches!(err, SessionError::Collision(CollisionError::Exhausted { .. })));
        assert!(session.history().is_empty());
        assert!(session.last_result().is_none());
    }

    #[test]
    fn upload_then_process_records_history() {
        let mut session = RenameSession::default().with_fallback_base("upload");
        let suggestion = session.upload("IMG_20230101_123456.jpg", "image/jpeg", b"jpeg".to_vec());
        assert_eq!(suggestion, "upload.jpg");

        let taken = DirectoryListing::from_names(["upload.jpg"]);
        let outcome = session
            .process(&options(&suggestion), |n| taken.contains(n))
            .expect("process");
        assert_eq!(outcome.final_name, "upload(1).jpg");
        assert_eq!(session.last_result(), Some(&outcome));

        let entry = session.restore(1).expect("history entry");
        assert_eq!(entry.original_name, "IMG_20230101_123456.jpg");
        assert_eq!(entry.final_name, "upload(1).jpg");
        assert_eq!(&entry.payload[..], b"jpeg");
    }

    #[test]
    fn new_upload_clears_last_result_but_keeps_history() {
        let mut session = RenameSession::default();
        session.upload("a.txt", "text/plain", b"a".to_vec());
        session.process(&options("a.txt"), |_| false).expect("process");
        session.upload("b.txt", "text/plain", b"b".to_vec());

        assert!(session.last_result().is_none());
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.current_upload().map(|u| u.original_name.as_str()), Some("b.txt"));
    }

    #[test]
    fn summary_describes_current_upload() {
        let mut session = RenameSession::default();
        assert!(session.summary().is_none());
        session.upload("a.txt", "text/plain", vec![0u8; 2048]);
        let summary = session.summary().expect("summary");
        assert_eq!(summary.size_kb(), "2.00 KB");
    }
}
