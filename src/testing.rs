use crate::analysis::{Action, AnalysisService, AnalyzeReply, ArtifactRef, FileHandle, WorkflowError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted stand-in for the remote service. Replies are returned on every
/// call; unscripted calls fail as transport errors.
#[derive(Default)]
pub struct FakeService {
    analyze_reply: Mutex<Option<Result<AnalyzeReply, WorkflowError>>>,
    sheets_reply: Mutex<Option<Result<Vec<String>, WorkflowError>>>,
    download_reply: Mutex<Option<Result<Vec<u8>, WorkflowError>>>,
    last_sheet: Mutex<Option<String>>,
    analyze_calls: AtomicUsize,
    download_calls: AtomicUsize,
}

impl FakeService {
    pub fn with_analyze_reply(self, reply: Result<AnalyzeReply, WorkflowError>) -> Self {
        *self.analyze_reply.lock().unwrap() = Some(reply);
        self
    }

    pub fn with_sheets_reply(self, reply: Result<Vec<String>, WorkflowError>) -> Self {
        *self.sheets_reply.lock().unwrap() = Some(reply);
        self
    }

    pub fn with_download_reply(self, reply: Result<Vec<u8>, WorkflowError>) -> Self {
        *self.download_reply.lock().unwrap() = Some(reply);
        self
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    /// Sheet name sent with the most recent analysis.
    pub fn last_sheet(&self) -> Option<String> {
        self.last_sheet.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisService for FakeService {
    async fn analyze(
        &self,
        _file: &FileHandle,
        _action: Action,
        sheet: Option<&str>,
    ) -> Result<AnalyzeReply, WorkflowError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_sheet.lock().unwrap() = sheet.map(str::to_string);
        self.analyze_reply
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(WorkflowError::Transport("no scripted reply".to_string())))
    }

    async fn list_sheets(&self, _file: &FileHandle) -> Result<Vec<String>, WorkflowError> {
        self.sheets_reply
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(WorkflowError::Transport("no scripted reply".to_string())))
    }

    async fn download(&self, _artifact: &ArtifactRef) -> Result<Vec<u8>, WorkflowError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        self.download_reply
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(WorkflowError::Download("no scripted reply".to_string())))
    }
}
