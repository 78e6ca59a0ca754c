use thiserror::Error;

/// Failures of the analyze/download workflow. The `Display` text is what the
/// status line shows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Type de fichier non pris en charge")]
    ValidationRejected,
    #[error("Veuillez d'abord sélectionner un fichier")]
    NoFileSelected,
    #[error("Erreur lors du traitement: {0}")]
    Transport(String),
    #[error("{0}")]
    Service(String),
    #[error("Réponse du service invalide: {0}")]
    InvalidResponse(String),
    #[error("Impossible de lire le fichier: {0}")]
    FileRead(String),
    #[error("Aucune donnée à télécharger")]
    NoArtifact,
    #[error("{0}")]
    Download(String),
}

impl From<reqwest::Error> for WorkflowError {
    fn from(err: reqwest::Error) -> Self {
        WorkflowError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for WorkflowError {
    fn from(err: serde_json::Error) -> Self {
        WorkflowError::InvalidResponse(err.to_string())
    }
}
