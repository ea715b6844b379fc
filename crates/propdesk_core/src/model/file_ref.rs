//! Reference to an invoice or document file.

use crate::model::validation::{require_data_url, require_text, require_url, ValidationResult};
use serde::{Deserialize, Serialize};

/// File either linked by URL or embedded as a base64 data URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FileRef {
    Link { url: String },
    Embedded { file_name: String, data_url: String },
}

impl FileRef {
    pub fn validate(&self, field: &'static str) -> ValidationResult {
        match self {
            Self::Link { url } => require_url(field, url),
            Self::Embedded {
                file_name,
                data_url,
            } => {
                require_text(field, file_name)?;
                require_data_url(field, data_url)
            }
        }
    }

    /// Name shown next to the file in lists.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Link { url } => url.rsplit('/').find(|part| !part.is_empty()).unwrap_or(url),
            Self::Embedded { file_name, .. } => file_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FileRef;

    #[test]
    fn display_name_uses_last_url_segment() {
        let link = FileRef::Link {
            url: "https://files.example.com/2024/inv-7.pdf".to_string(),
        };
        assert_eq!(link.display_name(), "inv-7.pdf");

        let embedded = FileRef::Embedded {
            file_name: "receipt.png".to_string(),
            data_url: "data:image/png;base64,iVBORw0=".to_string(),
        };
        assert_eq!(embedded.display_name(), "receipt.png");
        assert!(embedded.validate("invoice").is_ok());
    }

    #[test]
    fn embedded_file_requires_name_and_data_url() {
        let missing_name = FileRef::Embedded {
            file_name: String::new(),
            data_url: "data:image/png;base64,iVBORw0=".to_string(),
        };
        assert!(missing_name.validate("invoice").is_err());

        let not_base64 = FileRef::Embedded {
            file_name: "a.txt".to_string(),
            data_url: "hello".to_string(),
        };
        assert!(not_base64.validate("invoice").is_err());
    }
}
