//! Local file to base64 data-URL conversion for embedded attachments.
//!
//! # Invariants
//! - Output is `data:<mime>;base64,<payload>` with standard padding.
//! - Empty files are rejected; an empty payload is not a valid data URL.

use crate::model::file_ref::FileRef;
use base64::engine::general_purpose;
use base64::Engine;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const FALLBACK_MIME: &str = "application/octet-stream";

/// A file read into memory and encoded for storage inside a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedFile {
    pub file_name: String,
    pub data_url: String,
}

impl From<EmbeddedFile> for FileRef {
    fn from(value: EmbeddedFile) -> Self {
        FileRef::Embedded {
            file_name: value.file_name,
            data_url: value.data_url,
        }
    }
}

#[derive(Debug)]
pub enum AttachmentError {
    Read { path: PathBuf, source: std::io::Error },
    Empty(PathBuf),
}

impl Display for AttachmentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read `{}`: {source}", path.display())
            }
            Self::Empty(path) => write!(f, "attachment `{}` is empty", path.display()),
        }
    }
}

impl Error for AttachmentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Empty(_) => None,
        }
    }
}

/// Reads `path` and encodes it as a data URL.
pub fn read_as_data_url(path: impl AsRef<Path>) -> Result<EmbeddedFile, AttachmentError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| {
        warn!(
            "event=attachment_read module=attachment status=error kind={:?}",
            source.kind()
        );
        AttachmentError::Read {
            path: path.to_path_buf(),
            source,
        }
    })?;
    if bytes.is_empty() {
        return Err(AttachmentError::Empty(path.to_path_buf()));
    }

    let mime = mime_for_path(path);
    let payload = general_purpose::STANDARD.encode(&bytes);
    debug!(
        "event=attachment_read module=attachment status=ok mime={} bytes={}",
        mime,
        bytes.len()
    );

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());
    Ok(EmbeddedFile {
        file_name,
        data_url: format!("data:{mime};base64,{payload}"),
    })
}

/// Mime type guessed from the file extension, case-insensitive.
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => FALLBACK_MIME,
    }
}

#[cfg(test)]
mod tests {
    use super::{mime_for_path, read_as_data_url, AttachmentError};
    use crate::model::file_ref::FileRef;
    use std::io::Write;
    use std::path::Path;

    #[test]
    fn encodes_file_with_mime_from_extension() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("invoice.PDF");
        let mut file = std::fs::File::create(&path).expect("create file");
        file.write_all(b"hello").expect("write file");

        let embedded = read_as_data_url(&path).expect("encode file");
        assert_eq!(embedded.file_name, "invoice.PDF");
        assert_eq!(embedded.data_url, "data:application/pdf;base64,aGVsbG8=");

        let file_ref = FileRef::from(embedded);
        file_ref.validate("invoice").expect("embedded ref is valid");
    }

    #[test]
    fn unknown_extension_falls_back_to_octet_stream() {
        assert_eq!(
            mime_for_path(Path::new("scan.bin")),
            "application/octet-stream"
        );
        assert_eq!(mime_for_path(Path::new("README")), "application/octet-stream");
        assert_eq!(mime_for_path(Path::new("photo.jpeg")), "image/jpeg");
    }

    #[test]
    fn missing_and_empty_files_are_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("nope.pdf");
        assert!(matches!(
            read_as_data_url(&missing),
            Err(AttachmentError::Read { .. })
        ));

        let empty = dir.path().join("empty.txt");
        std::fs::File::create(&empty).expect("create file");
        assert!(matches!(
            read_as_data_url(&empty),
            Err(AttachmentError::Empty(_))
        ));
    }
}
