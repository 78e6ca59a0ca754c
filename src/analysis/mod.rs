mod dispatcher;
mod download;
mod error;
mod normalizer;
mod service;
mod session;
mod status;
mod types;
mod validator;
mod worker;

pub use dispatcher::AnalysisDispatcher;
pub use download::DownloadCoordinator;
pub use error::WorkflowError;
pub use normalizer::{normalize, CardTone, DisplayModel};
pub use service::{AnalysisService, HttpAnalysisService};
pub use session::FileSession;
pub use status::{Severity, StatusChannel, StatusNotice};
pub use types::{Action, AnalysisResponse, ArtifactRef, FileHandle};
#[cfg(test)]
pub use types::{AnalysisResult, AnalyzeReply, ErrorRecord};
pub use validator::FileValidator;
pub use worker::{Generation, RequestToken, WorkerEvent};
