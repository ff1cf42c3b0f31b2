// src/services/storage.rs

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::common::error::AppError;

const MAX_FILE_NAME_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
    pub size_bytes: i64,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Grava em `<prefix>/<uuid>-<nome>` e devolve a chave e a URL pública.
    async fn put(&self, prefix: &str, file_name: &str, data: Bytes) -> Result<StoredObject, AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

// Nome de arquivo seguro: só [A-Za-z0-9._-], sem pontos no início.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        return "file".to_string();
    }
    trimmed.chars().take(MAX_FILE_NAME_LEN).collect()
}

fn sanitize_prefix(prefix: &str) -> String {
    prefix
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != "." && *seg != "..")
        .map(sanitize_file_name)
        .collect::<Vec<_>>()
        .join("/")
}

pub struct LocalDiskStorage {
    root: PathBuf,
    public_url: String,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>, public_url: &str) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        key.split('/').fold(self.root.clone(), |path, seg| path.join(seg))
    }
}

#[async_trait]
impl ObjectStorage for LocalDiskStorage {
    async fn put(&self, prefix: &str, file_name: &str, data: Bytes) -> Result<StoredObject, AppError> {
        let prefix = sanitize_prefix(prefix);
        let name = format!("{}-{}", Uuid::new_v4().simple(), sanitize_file_name(file_name));
        let key = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };

        let path = self.path_for(&key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::StorageError(e.to_string()))?;
        }
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| AppError::StorageError(e.to_string()))?;

        Ok(StoredObject {
            url: format!("{}/{}", self.public_url, key),
            size_bytes: data.len() as i64,
            key,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        match tokio::fs::remove_file(self.path_for(&sanitize_prefix(key))).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::StorageError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_file_names() {
        assert_eq!(sanitize_file_name("KTP Ahmad.pdf"), "KTP_Ahmad.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("..hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "file");
        assert_eq!(sanitize_file_name(&"a".repeat(300)).len(), MAX_FILE_NAME_LEN);
    }

    #[test]
    fn prefix_drops_traversal_segments() {
        assert_eq!(sanitize_prefix("profiles/../secret/./x"), "profiles/secret/x");
    }

    #[tokio::test]
    async fn put_writes_file_under_prefix_and_delete_removes_it() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path(), "/uploads/");

        let stored = storage
            .put("profiles/abc", "ijazah.pdf", Bytes::from_static(b"%PDF-1.4"))
            .await
            .unwrap();

        assert!(stored.key.starts_with("profiles/abc/"));
        assert!(stored.key.ends_with("-ijazah.pdf"));
        assert_eq!(stored.url, format!("/uploads/{}", stored.key));
        assert_eq!(stored.size_bytes, 8);

        let on_disk = storage.path_for(&stored.key);
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), b"%PDF-1.4");

        storage.delete(&stored.key).await.unwrap();
        assert!(!on_disk.exists());
        // apagar de novo não é erro
        storage.delete(&stored.key).await.unwrap();
    }
}
