use crate::analysis::error::WorkflowError;
use crate::analysis::types::{
    Action, AnalyzeReply, ArtifactRef, FileHandle, FileKind, SheetsReply, XLSX_MIME, XLS_MIME,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::json;
use std::time::Duration;

/// Transport to the remote analysis service.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Uploads the file with the chosen action and returns the decoded reply.
    /// Only transport-level failures are errors here; an `error` field in the
    /// reply is left for the caller to interpret. `sheet` is sent as
    /// `sheet_name` when present.
    async fn analyze(
        &self,
        file: &FileHandle,
        action: Action,
        sheet: Option<&str>,
    ) -> Result<AnalyzeReply, WorkflowError>;

    /// Worksheet names of the workbook, in workbook order.
    async fn list_sheets(&self, file: &FileHandle) -> Result<Vec<String>, WorkflowError>;

    async fn download(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, WorkflowError>;
}

#[derive(Clone)]
pub struct HttpAnalysisService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAnalysisService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, WorkflowError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn file_part(file: &FileHandle) -> Result<Part, WorkflowError> {
        let content = tokio::fs::read(&file.path)
            .await
            .map_err(|e| WorkflowError::FileRead(e.to_string()))?;

        let mime = match file.kind() {
            FileKind::SpreadsheetXls => XLS_MIME,
            _ => XLSX_MIME,
        };
        Ok(Part::bytes(content)
            .file_name(file.name.clone())
            .mime_str(mime)?)
    }

    async fn post_form(&self, path: &str, form: Form) -> Result<String, WorkflowError> {
        let url = self.endpoint(path);
        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("POST {} failed with status {}", url, status);
            return Err(WorkflowError::Transport(format!("statut {}", status)));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn analyze(
        &self,
        file: &FileHandle,
        action: Action,
        sheet: Option<&str>,
    ) -> Result<AnalyzeReply, WorkflowError> {
        let mut form = Form::new()
            .part("file", Self::file_part(file).await?)
            .text("action", action.as_str());
        if let Some(sheet) = sheet {
            form = form.text("sheet_name", sheet.to_string());
        }

        log::debug!(
            "Analyze action={} file='{}' sheet={:?}",
            action,
            file.name,
            sheet
        );
        let body = self.post_form("process", form).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn list_sheets(&self, file: &FileHandle) -> Result<Vec<String>, WorkflowError> {
        let form = Form::new().part("file", Self::file_part(file).await?);
        log::debug!("Listing sheets of '{}'", file.name);

        let body = self.post_form("get_sheets", form).await?;
        let reply: SheetsReply = serde_json::from_str(&body)?;
        match reply.error {
            Some(error) => Err(WorkflowError::Service(error)),
            None => Ok(reply.sheets),
        }
    }

    async fn download(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, WorkflowError> {
        let url = self.endpoint("download");
        log::debug!("POST {} ({} byte reference)", url, artifact.as_str().len());

        let response = self
            .client
            .post(&url)
            .json(&json!({ "file": artifact }))
            .send()
            .await
            .map_err(|e| WorkflowError::Download(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Download request failed with status {}", status);
            return Err(WorkflowError::Download(
                "Erreur lors du téléchargement".to_string(),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| WorkflowError::Download(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
