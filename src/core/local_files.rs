use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::core::VideoSource;

pub const LOCAL_SCHEME: &str = "local-file:";

/// Session-scoped references to local files, handed out in place of raw paths.
///
/// Clones share the same table, so the form can revoke references that media
/// elements resolve later on.
#[derive(Debug, Clone, Default)]
pub struct LocalFileRegistry {
    entries: Arc<Mutex<HashMap<String, PathBuf>>>,
}

impl LocalFileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_local_url(url: &str) -> bool {
        url.starts_with(LOCAL_SCHEME)
    }

    pub fn create_object_url(&self, path: &Path) -> String {
        let url = format!("{}{}", LOCAL_SCHEME, uuid::Uuid::new_v4());
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(url.clone(), path.to_path_buf());
        }
        log::debug!("Created local reference {} for {}", url, path.display());
        url
    }

    /// Release a reference. Unknown or already revoked references are ignored.
    pub fn revoke_object_url(&self, url: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            if entries.remove(url).is_some() {
                log::debug!("Revoked local reference {}", url);
            }
        }
    }

    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        self.entries.lock().ok()?.get(url).cloned()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Swap the current file selection: the previous references are revoked
    /// and new ones are created, labelled with the file name.
    pub fn replace_selection(&self, previous: &[VideoSource], paths: &[PathBuf]) -> Vec<VideoSource> {
        for source in previous {
            self.revoke_object_url(&source.url);
        }

        paths
            .iter()
            .map(|path| {
                let label = path
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_else(|| path.display().to_string());
                VideoSource::new(self.create_object_url(path), label)
            })
            .collect()
    }
}
