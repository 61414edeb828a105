//! Resume marker: the last-known email of an unfinished session.
//!
//! Set when step 1 resolves, cleared on final submission or sign-out. The
//! wizard receives the marker at construction instead of reaching for
//! ambient storage.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[async_trait]
pub trait ResumeMarker: Send + Sync {
    async fn get(&self) -> Option<String>;

    async fn set(&self, email: &str);

    async fn clear(&self);
}

/// Marker that lives for the process.
#[derive(Debug, Default)]
pub struct MemoryResumeMarker {
    email: Mutex<Option<String>>,
}

impl MemoryResumeMarker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: Mutex::new(Some(email.into())),
        }
    }
}

#[async_trait]
impl ResumeMarker for MemoryResumeMarker {
    async fn get(&self) -> Option<String> {
        self.email.lock().ok().and_then(|guard| guard.clone())
    }

    async fn set(&self, email: &str) {
        if let Ok(mut guard) = self.email.lock() {
            *guard = Some(email.to_string());
        }
    }

    async fn clear(&self) {
        if let Ok(mut guard) = self.email.lock() {
            *guard = None;
        }
    }
}

#[derive(Serialize, Deserialize)]
struct MarkerFile {
    user_email: String,
}

/// Marker persisted as a small JSON file, for hosts that restart between
/// sessions. IO failures are logged and treated as "no marker".
#[derive(Debug, Clone)]
pub struct FileResumeMarker {
    path: PathBuf,
}

impl FileResumeMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ResumeMarker for FileResumeMarker {
    async fn get(&self) -> Option<String> {
        let raw = tokio::fs::read_to_string(&self.path).await.ok()?;
        match serde_json::from_str::<MarkerFile>(&raw) {
            Ok(marker) => Some(marker.user_email),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable resume marker");
                None
            }
        }
    }

    async fn set(&self, email: &str) {
        let body = match serde_json::to_string(&MarkerFile {
            user_email: email.to_string(),
        }) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to serialize resume marker");
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                warn!(
                    path = %parent.display(),
                    error = %e,
                    "Failed to create resume marker directory"
                );
                return;
            }
        }
        if let Err(e) = tokio::fs::write(&self.path, body).await {
            warn!(path = %self.path.display(), error = %e, "Failed to write resume marker");
        }
    }

    async fn clear(&self) {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to remove resume marker");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_marker_lifecycle() {
        let marker = MemoryResumeMarker::new();
        assert_eq!(marker.get().await, None);
        marker.set("a@b.co").await;
        assert_eq!(marker.get().await.as_deref(), Some("a@b.co"));
        marker.clear().await;
        assert_eq!(marker.get().await, None);
    }

    #[tokio::test]
    async fn file_marker_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("resume.json");

        FileResumeMarker::new(&path).set("a@b.co").await;
        let reopened = FileResumeMarker::new(&path);
        assert_eq!(reopened.get().await.as_deref(), Some("a@b.co"));

        reopened.clear().await;
        assert_eq!(reopened.get().await, None);
        // Clearing twice is fine.
        reopened.clear().await;
    }

    #[tokio::test]
    async fn garbage_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(FileResumeMarker::new(&path).get().await, None);
    }
}
