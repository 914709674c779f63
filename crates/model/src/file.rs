use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, ProviderName, Result};

/// A file stored on a provider's side.
///
/// The identifier is only meaningful to the provider that issued it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct File {
    /// The provider-assigned identifier.
    pub id: String,
    /// The provider that owns the file.
    pub provider: ProviderName,
    /// The original filename.
    pub filename: String,
    /// Size in bytes.
    pub bytes: u64,
    /// The media type, as reported by the provider or guessed at upload.
    pub mime_type: String,
    /// A resource URI, for providers that address files by URI.
    pub uri: Option<String>,
    /// When the provider accepted the upload.
    pub created_at: DateTime<Utc>,
}

impl File {
    /// Fails unless this file belongs to `provider`.
    pub fn ensure_owned_by(&self, provider: ProviderName) -> Result<()> {
        if self.provider == provider {
            return Ok(());
        }
        Err(Error::validation(
            "File",
            format!(
                "file `{}` was uploaded to {} and cannot be used with {provider}",
                self.id, self.provider
            ),
        ))
    }
}

/// The content of a file about to be uploaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileUpload {
    /// The filename reported to the provider.
    pub filename: String,
    /// The media type.
    pub mime_type: String,
    /// The raw content.
    pub data: Bytes,
}

impl FileUpload {
    /// Creates an upload from in-memory bytes. The media type is guessed
    /// from the filename.
    pub fn from_bytes<N: Into<String>, B: Into<Bytes>>(
        filename: N,
        data: B,
    ) -> Self {
        let filename = filename.into();
        let mime_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .essence_str()
            .to_owned();
        Self {
            filename,
            mime_type,
            data: data.into(),
        }
    }

    /// Reads an upload from disk.
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|err| Error::request("read file", err))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_owned());
        Ok(Self::from_bytes(filename, data))
    }

    /// Overrides the guessed media type.
    #[inline]
    pub fn with_mime_type<S: Into<String>>(mut self, mime_type: S) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Fails if there is nothing to upload.
    pub fn validate(&self) -> Result<()> {
        if self.data.is_empty() {
            return Err(Error::validation("File", "file is empty"));
        }
        if self.mime_type.parse::<mime::Mime>().is_err() {
            return Err(Error::validation(
                "File",
                format!("invalid media type `{}`", self.mime_type),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_mime_guess() {
        let upload = FileUpload::from_bytes("report.pdf", b"%PDF".to_vec());
        assert_eq!(upload.mime_type, "application/pdf");
        let upload = FileUpload::from_bytes("blob", b"xx".to_vec());
        assert_eq!(upload.mime_type, "application/octet-stream");
    }

    #[test]
    fn test_validate() {
        assert!(FileUpload::from_bytes("a.txt", Vec::new()).validate().is_err());
        let upload =
            FileUpload::from_bytes("a.txt", b"hi".to_vec()).with_mime_type("??");
        assert!(upload.validate().is_err());
    }

    #[test]
    fn test_ownership() {
        let file = File {
            id: "file-1".to_owned(),
            provider: ProviderName::OpenAI,
            filename: "a.txt".to_owned(),
            bytes: 2,
            mime_type: "text/plain".to_owned(),
            uri: None,
            created_at: Utc::now(),
        };
        assert!(file.ensure_owned_by(ProviderName::OpenAI).is_ok());
        let err = file.ensure_owned_by(ProviderName::Grok).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_from_missing_path() {
        let err = FileUpload::from_path("/definitely/not/here.txt")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Request);
    }
}
