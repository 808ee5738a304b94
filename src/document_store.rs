use chrono::Utc;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::errors::QuizError;
use crate::log_storage_operation;

const DEFAULT_FILE_NAME: &str = "upload.pdf";

/// Name of a stored upload, relative to the store root.
///
/// Generated as `<unix-millis>-<original file name>`. Two uploads of the same
/// file name within one millisecond collide; nothing guards against that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle(String);

impl DocumentHandle {
    /// Validate a caller-supplied handle: exactly one normal path component
    pub fn parse(raw: &str) -> Result<Self, QuizError> {
        let invalid = || QuizError::CallerInput(format!("Invalid document handle '{}'", raw));

        if raw.is_empty() || raw.contains(['/', '\\', '\0']) {
            return Err(invalid());
        }

        let mut components = Path::new(raw).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(Self(raw.to_string())),
            _ => Err(invalid()),
        }
    }

    fn generate(original_name: Option<&str>) -> Self {
        let file_name = original_name
            .map(|name| name.rsplit(['/', '\\']).next().unwrap_or_default().trim())
            .filter(|name| !name.is_empty() && *name != "." && *name != "..")
            .unwrap_or(DEFAULT_FILE_NAME);

        Self(format!("{}-{}", Utc::now().timestamp_millis(), file_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Temporary upload area shared by the upload and quiz steps
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory if it does not exist yet
    pub async fn init(&self) -> Result<(), QuizError> {
        fs::create_dir_all(&self.root).await?;
        log_storage_operation!(
            info,
            "init",
            handle = self.root.display(),
            "upload directory ready"
        );
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, handle: &DocumentHandle) -> PathBuf {
        self.root.join(handle.as_str())
    }

    pub async fn save(&self, original_name: Option<&str>, bytes: &[u8]) -> Result<DocumentHandle, QuizError> {
        let handle = DocumentHandle::generate(original_name);
        fs::write(self.resolve(&handle), bytes).await?;
        log_storage_operation!(debug, "save", handle = handle, bytes = bytes.len());
        Ok(handle)
    }

    pub async fn exists(&self, handle: &DocumentHandle) -> Result<bool, QuizError> {
        Ok(fs::try_exists(self.resolve(handle)).await?)
    }

    pub async fn read(&self, handle: &DocumentHandle) -> Result<Vec<u8>, QuizError> {
        match fs::read(self.resolve(handle)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(QuizError::DocumentNotFound(handle.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a stored document; a document that is already gone is not an error
    pub async fn remove(&self, handle: &DocumentHandle) -> Result<(), QuizError> {
        match fs::remove_file(self.resolve(handle)).await {
            Ok(()) => {
                log_storage_operation!(info, "remove", handle = handle, "document removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                log_storage_operation!(error, "remove", handle = handle, error = e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_rejects_traversal() {
        for raw in [
            "", ".", "..", "../secret.pdf", "a/b.pdf", "/etc/passwd", "..\\x.pdf", "dir\\x.pdf",
            "nul\0.pdf",
        ] {
            assert!(
                matches!(DocumentHandle::parse(raw), Err(QuizError::CallerInput(_))),
                "{:?} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_handle_accepts_plain_names() {
        let handle = DocumentHandle::parse("1700000000000-notes v2.pdf").unwrap();
        assert_eq!(handle.as_str(), "1700000000000-notes v2.pdf");
        assert!(DocumentHandle::parse("..notes.pdf").is_ok());
    }

    #[test]
    fn test_generated_handle_keeps_only_file_name() {
        let handle = DocumentHandle::generate(Some("../../home/user/notes.pdf"));
        let (millis, name) = handle.as_str().split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(name, "notes.pdf");
        assert!(DocumentHandle::parse(handle.as_str()).is_ok());

        let handle = DocumentHandle::generate(Some("C:\\Users\\me\\slides.pdf"));
        assert!(handle.as_str().ends_with("-slides.pdf"));

        for name in [None, Some(""), Some("dir/"), Some("..")] {
            let handle = DocumentHandle::generate(name);
            assert!(handle.as_str().ends_with("-upload.pdf"), "{:?}", name);
        }
    }

    #[tokio::test]
    async fn test_save_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("uploads"));
        store.init().await.unwrap();

        let handle = store.save(Some("notes.pdf"), b"%PDF").await.unwrap();
        assert!(store.resolve(&handle).starts_with(store.root()));
        assert!(store.exists(&handle).await.unwrap());
        assert_eq!(store.read(&handle).await.unwrap(), b"%PDF");

        store.remove(&handle).await.unwrap();
        assert!(!store.exists(&handle).await.unwrap());
        store.remove(&handle).await.unwrap();

        assert!(matches!(
            store.read(&handle).await,
            Err(QuizError::DocumentNotFound(_))
        ));
    }
}
