use crate::analysis::error::WorkflowError;
use crate::analysis::service::AnalysisService;
use crate::analysis::session::FileSession;
use crate::analysis::status::{Severity, StatusChannel};
use crate::analysis::types::{
    Action, AnalysisResponse, AnalysisResult, AnalyzeReply, DuplicateRecord, ErrorRecord,
    FileHandle,
};
use crate::analysis::worker::{spawn_worker, RequestToken, WorkerEvent};
use derivative::Derivative;
use serde_json::Value;
use std::sync::mpsc::Sender;
use std::sync::Arc;

pub const NO_ISSUES_MESSAGE: &str = "Aucun problème détecté";

#[derive(Derivative)]
#[derivative(Debug)]
pub struct AnalysisDispatcher {
    #[derivative(Debug = "ignore")]
    service: Arc<dyn AnalysisService>,
    events: Sender<WorkerEvent>,
}

impl AnalysisDispatcher {
    pub fn new(service: Arc<dyn AnalysisService>, events: Sender<WorkerEvent>) -> Self {
        Self { service, events }
    }

    /// Starts an analysis of the held file. The Loading notice is set before
    /// the worker is spawned; the reply arrives later as a
    /// `WorkerEvent::Analysis` tagged with `token`.
    pub fn run(
        &self,
        session: &FileSession,
        action: Action,
        sheet: Option<String>,
        token: RequestToken,
        status: &mut StatusChannel,
    ) -> Result<RequestToken, WorkflowError> {
        let Some(file) = session.file() else {
            let err = WorkflowError::NoFileSelected;
            log::warn!("Analysis '{}' requested without a selected file", action);
            status.set(err.to_string(), Severity::Error);
            return Err(err);
        };

        status.set("Analyse en cours...", Severity::Loading);
        log::info!(
            "Dispatching '{}' for '{}' sheet {:?} ({:?})",
            action,
            file.name,
            sheet,
            token
        );

        let service = Arc::clone(&self.service);
        let file = file.clone();
        spawn_worker(
            self.events.clone(),
            move || async move {
                let outcome = analyze(service.as_ref(), &file, action, sheet.as_deref()).await;
                WorkerEvent::Analysis { token, outcome }
            },
            move |msg| WorkerEvent::Analysis {
                token,
                outcome: Err(WorkflowError::Transport(msg)),
            },
        );
        Ok(token)
    }

    /// Asks the service for the worksheet names of `file`. No notice is
    /// emitted; the reply arrives as `WorkerEvent::Sheets`.
    pub fn load_sheets(&self, file: &FileHandle, token: RequestToken) -> RequestToken {
        log::debug!("Loading sheet names of '{}' ({:?})", file.name, token);
        let service = Arc::clone(&self.service);
        let file = file.clone();
        spawn_worker(
            self.events.clone(),
            move || async move {
                let outcome = service.list_sheets(&file).await;
                WorkerEvent::Sheets { token, outcome }
            },
            move |msg| WorkerEvent::Sheets {
                token,
                outcome: Err(WorkflowError::Transport(msg)),
            },
        );
        token
    }
}

/// Issues exactly one request and interprets the reply.
pub async fn analyze(
    service: &dyn AnalysisService,
    file: &FileHandle,
    action: Action,
    sheet: Option<&str>,
) -> Result<AnalysisResponse, WorkflowError> {
    let reply = service.analyze(file, action, sheet).await?;
    interpret(reply, action)
}

/// Maps a raw service reply to a result. An `error` field wins over
/// everything, then a `message`, then the action's record list.
pub fn interpret(reply: AnalyzeReply, action: Action) -> Result<AnalysisResponse, WorkflowError> {
    if let Some(error) = reply.error {
        return Err(WorkflowError::Service(error));
    }

    if let Some(message) = reply.message {
        return Ok(AnalysisResponse {
            result: AnalysisResult::Empty { message },
            artifact: None,
        });
    }

    let results = reply
        .results
        .ok_or_else(|| WorkflowError::InvalidResponse("champ 'results' absent".to_string()))?;

    let result = match action {
        Action::DetectErrors => {
            let errors: Vec<ErrorRecord> = records(results, "errors")?;
            if errors.is_empty() {
                no_issues()
            } else {
                AnalysisResult::ErrorReport { errors }
            }
        }
        Action::DetectDuplicates => {
            let duplicates: Vec<DuplicateRecord> = records(results, "doublons")?;
            if duplicates.is_empty() {
                no_issues()
            } else {
                AnalysisResult::DuplicateReport { duplicates }
            }
        }
    };

    let artifact = match result {
        AnalysisResult::Empty { .. } => None,
        _ => reply.file,
    };
    Ok(AnalysisResponse { result, artifact })
}

fn no_issues() -> AnalysisResult {
    AnalysisResult::Empty {
        message: NO_ISSUES_MESSAGE.to_string(),
    }
}

fn records<T: serde::de::DeserializeOwned>(
    mut results: Value,
    key: &str,
) -> Result<Vec<T>, WorkflowError> {
    match results.get_mut(key).map(Value::take) {
        Some(list) => Ok(serde_json::from_value(list)?),
        None => Err(WorkflowError::InvalidResponse(format!(
            "champ 'results.{}' absent",
            key
        ))),
    }
}
