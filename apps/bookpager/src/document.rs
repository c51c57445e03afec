use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::errors::AppError;

/// Reads a UTF-8 document and normalizes CRLF / lone CR line endings to `\n`.
///
/// A missing file and an unreadable file are distinct errors so the operator
/// sees which one happened.
pub async fn load_document(path: &Path) -> Result<String, AppError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => AppError::InputNotFound(path.to_path_buf()),
        _ => AppError::InputUnreadable {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let text = String::from_utf8(bytes).map_err(|e| AppError::InputUnreadable {
        path: path.to_path_buf(),
        source: std::io::Error::new(ErrorKind::InvalidData, e),
    })?;

    debug!(path = %path.display(), bytes = text.len(), "Loaded input document");
    Ok(normalize_line_endings(&text))
}

/// Strips a leading BOM and folds `\r\n` and bare `\r` into `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_normalize_crlf_and_cr() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
        assert_eq!(normalize_line_endings("plain"), "plain");
    }

    #[test]
    fn test_normalize_strips_bom() {
        assert_eq!(normalize_line_endings("\u{FEFF}第一行"), "第一行");
    }

    #[tokio::test]
    async fn test_load_document_reads_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "标题\r\n正文").unwrap();
        let text = load_document(file.path()).await.unwrap();
        assert_eq!(text, "标题\n正文");
    }

    #[tokio::test]
    async fn test_missing_file_is_input_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        let err = load_document(&missing).await.unwrap_err();
        assert!(matches!(err, AppError::InputNotFound(p) if p == missing));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_unreadable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00, 0x41]).unwrap();
        let err = load_document(file.path()).await.unwrap_err();
        assert!(matches!(err, AppError::InputUnreadable { .. }));
    }

    #[tokio::test]
    async fn test_directory_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(dir.path()).await.unwrap_err();
        assert!(matches!(err, AppError::InputUnreadable { .. }));
    }
}
