use crate::analysis::error::WorkflowError;
use crate::analysis::service::AnalysisService;
use crate::analysis::status::{Severity, StatusChannel};
use crate::analysis::types::{Action, ArtifactRef};
use crate::analysis::worker::{spawn_worker, RequestToken, WorkerEvent};
use chrono::{NaiveDate, Utc};
use derivative::Derivative;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

const MAX_NAME_ATTEMPTS: u32 = 1000;

#[derive(Derivative)]
#[derivative(Debug)]
pub struct DownloadCoordinator {
    #[derivative(Debug = "ignore")]
    service: Arc<dyn AnalysisService>,
    events: Sender<WorkerEvent>,
    download_dir: PathBuf,
}

impl DownloadCoordinator {
    pub fn new(
        service: Arc<dyn AnalysisService>,
        events: Sender<WorkerEvent>,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            service,
            events,
            download_dir,
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Fetches the processed workbook for `artifact` and saves it under the
    /// download directory. Fails immediately, without a request, when there is
    /// nothing to download.
    pub fn download(
        &self,
        artifact: Option<&ArtifactRef>,
        action: Action,
        token: RequestToken,
        status: &mut StatusChannel,
    ) -> Result<RequestToken, WorkflowError> {
        let Some(artifact) = artifact else {
            let err = WorkflowError::NoArtifact;
            log::warn!("Download requested without a processed file");
            status.set(err.to_string(), Severity::Error);
            return Err(err);
        };

        status.set("Préparation du téléchargement...", Severity::Loading);

        let target = self
            .download_dir
            .join(download_file_name(action, Utc::now().date_naive()));
        log::info!("Downloading '{}' result to {:?} ({:?})", action, target, token);

        let service = Arc::clone(&self.service);
        let artifact = artifact.clone();
        spawn_worker(
            self.events.clone(),
            move || async move {
                let outcome = fetch_and_save(service.as_ref(), &artifact, &target).await;
                WorkerEvent::Download { token, outcome }
            },
            move |msg| WorkerEvent::Download {
                token,
                outcome: Err(WorkflowError::Download(msg)),
            },
        );
        Ok(token)
    }
}

pub fn download_file_name(action: Action, date: NaiveDate) -> String {
    format!("resultats_{}_{}.xlsx", action.as_str(), date.format("%Y-%m-%d"))
}

/// Downloads the workbook and saves it at `target`, or at the first free
/// `name (n).xlsx` sibling when `target` already exists. Earlier downloads are
/// never overwritten.
pub async fn fetch_and_save(
    service: &dyn AnalysisService,
    artifact: &ArtifactRef,
    target: &Path,
) -> Result<PathBuf, WorkflowError> {
    let bytes = service.download(artifact).await?;

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| WorkflowError::Download(e.to_string()))?;
    }

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let candidate = numbered_path(target, attempt);
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(WorkflowError::Download(e.to_string())),
        };
        file.write_all(&bytes)
            .await
            .map_err(|e| WorkflowError::Download(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| WorkflowError::Download(e.to_string()))?;

        log::info!("Saved {} bytes to {:?}", bytes.len(), candidate);
        return Ok(candidate);
    }

    log::warn!("No free file name next to {:?}", target);
    Err(WorkflowError::Download(format!(
        "Aucun nom de fichier disponible pour {}",
        target.display()
    )))
}

/// `target` itself for attempt 0, then `stem (n).ext`.
fn numbered_path(target: &Path, attempt: u32) -> PathBuf {
    if attempt == 0 {
        return target.to_path_buf();
    }
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = match target.extension() {
        Some(ext) => format!("{} ({}).{}", stem, attempt, ext.to_string_lossy()),
        None => format!("{} ({})", stem, attempt),
    };
    target.with_file_name(name)
}
