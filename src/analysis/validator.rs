use crate::analysis::types::{FileHandle, XLSX_MIME, XLS_MIME};

pub struct FileValidator;

impl FileValidator {
    /// Accepts a spreadsheet by MIME type, falling back to a case-sensitive
    /// `.xlsx`/`.xls` suffix for sources that omit the type.
    pub fn validate(file: &FileHandle) -> bool {
        let mime_ok = matches!(file.mime_type.as_deref(), Some(XLSX_MIME) | Some(XLS_MIME));
        mime_ok || file.name.ends_with(".xlsx") || file.name.ends_with(".xls")
    }
}
