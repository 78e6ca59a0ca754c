use crate::analysis::status::{Severity, StatusChannel};
use crate::analysis::types::FileHandle;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum FileSession {
    #[default]
    Empty,
    Holding(FileHandle),
}

impl FileSession {
    /// Takes ownership of an already validated file, replacing any held one.
    pub fn select(&mut self, file: FileHandle, status: &mut StatusChannel) {
        if let FileSession::Holding(previous) = self {
            log::info!("Replacing selected file '{}' with '{}'", previous.name, file.name);
        } else {
            log::info!("Selected file '{}' ({} bytes)", file.name, file.size_bytes);
        }
        *self = FileSession::Holding(file);
        status.set("Fichier prêt pour analyse", Severity::Success);
    }

    pub fn clear(&mut self, status: &mut StatusChannel) {
        if let FileSession::Holding(file) = self {
            log::info!("Cleared selected file '{}'", file.name);
        }
        *self = FileSession::Empty;
        status.set("", Severity::Idle);
    }

    pub fn file(&self) -> Option<&FileHandle> {
        match self {
            FileSession::Holding(file) => Some(file),
            FileSession::Empty => None,
        }
    }
}
