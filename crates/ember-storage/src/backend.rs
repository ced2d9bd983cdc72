//! Pluggable key-value persistence
//!
//! Each storage tier owns a disjoint namespace so a blanket clear of one
//! tier can never touch another. Writes are durable before the call
//! returns.

use crate::{Error, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Storage tier namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Secret-tier records (encrypted seed phrases, private keys)
    Secret,
    /// Descriptor-tier records (wallet/account metadata, session, preferences)
    Descriptor,
    /// Cache-tier records (volatile, re-derivable data)
    Cache,
}

impl Namespace {
    /// Stable on-disk prefix for this namespace
    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Secret => "secret",
            Namespace::Descriptor => "descriptor",
            Namespace::Cache => "cache",
        }
    }
}

/// Asynchronous key-value backend used by all three tiers
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write a record. Durable before returning.
    async fn put(&self, ns: Namespace, key: &str, value: Vec<u8>) -> Result<()>;

    /// Read a record, `None` if absent.
    async fn get(&self, ns: Namespace, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a record. Deleting an absent key is not an error.
    async fn delete(&self, ns: Namespace, key: &str) -> Result<()>;

    /// List all keys in a namespace.
    async fn list_keys(&self, ns: Namespace) -> Result<Vec<String>>;

    /// Remove every record in a namespace. Other namespaces are untouched.
    async fn clear(&self, ns: Namespace) -> Result<()>;
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.len() > 128 {
        return Err(Error::Backend(format!("Invalid key length: {}", key.len())));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(Error::Backend(format!("Invalid key: {key}")));
    }
    Ok(())
}

/// In-memory backend for tests
#[derive(Default)]
pub struct MemoryBackend {
    records: RwLock<HashMap<(Namespace, String), Vec<u8>>>,
}

impl MemoryBackend {
    /// Create empty backend
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn put(&self, ns: Namespace, key: &str, value: Vec<u8>) -> Result<()> {
        validate_key(key)?;
        self.records.write().insert((ns, key.to_string()), value);
        Ok(())
    }

    async fn get(&self, ns: Namespace, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.records.read().get(&(ns, key.to_string())).cloned())
    }

    async fn delete(&self, ns: Namespace, key: &str) -> Result<()> {
        validate_key(key)?;
        self.records.write().remove(&(ns, key.to_string()));
        Ok(())
    }

    async fn list_keys(&self, ns: Namespace) -> Result<Vec<String>> {
        Ok(self
            .records
            .read()
            .keys()
            .filter(|(n, _)| *n == ns)
            .map(|(_, k)| k.clone())
            .collect())
    }

    async fn clear(&self, ns: Namespace) -> Result<()> {
        self.records.write().retain(|(n, _), _| *n != ns);
        Ok(())
    }
}

/// File-backed backend: one file per record under per-namespace directories
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Open (and create if needed) a backend rooted at `root`
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        for ns in [Namespace::Secret, Namespace::Descriptor, Namespace::Cache] {
            std::fs::create_dir_all(root.join(ns.prefix()))?;
        }
        Ok(Self { root })
    }

    fn record_path(&self, ns: Namespace, key: &str) -> PathBuf {
        self.root.join(ns.prefix()).join(key)
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn put(&self, ns: Namespace, key: &str, value: Vec<u8>) -> Result<()> {
        validate_key(key)?;
        let path = self.record_path(ns, key);
        let tmp = path.with_extension("tmp");

        // Write-to-temp, fsync, rename: the record is either the old or the
        // new bytes, never a torn write.
        let mut file = tokio::fs::File::create(&tmp).await?;
        tokio::io::AsyncWriteExt::write_all(&mut file, &value).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn get(&self, ns: Namespace, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        match tokio::fs::read(self.record_path(ns, key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, ns: Namespace, key: &str) -> Result<()> {
        validate_key(key)?;
        match tokio::fs::remove_file(self.record_path(ns, key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_keys(&self, ns: Namespace) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(self.root.join(ns.prefix())).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.ends_with(".tmp") {
                continue;
            }
            keys.push(name.into_owned());
        }
        Ok(keys)
    }

    async fn clear(&self, ns: Namespace) -> Result<()> {
        for key in self.list_keys(ns).await? {
            self.delete(ns, &key).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_roundtrip() {
        let backend = MemoryBackend::new();
        backend
            .put(Namespace::Descriptor, "wallet-1", b"hello".to_vec())
            .await
            .unwrap();

        let value = backend.get(Namespace::Descriptor, "wallet-1").await.unwrap();
        assert_eq!(value, Some(b"hello".to_vec()));

        // Same key in another namespace is a different record
        let other = backend.get(Namespace::Secret, "wallet-1").await.unwrap();
        assert_eq!(other, None);
    }

    #[tokio::test]
    async fn test_namespaces_are_disjoint_on_clear() {
        let backend = MemoryBackend::new();
        backend
            .put(Namespace::Secret, "k", b"s".to_vec())
            .await
            .unwrap();
        backend
            .put(Namespace::Cache, "k", b"c".to_vec())
            .await
            .unwrap();

        backend.clear(Namespace::Cache).await.unwrap();

        assert!(backend.get(Namespace::Secret, "k").await.unwrap().is_some());
        assert!(backend.get(Namespace::Cache, "k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let backend = MemoryBackend::new();
        assert!(backend
            .put(Namespace::Cache, "../escape", b"x".to_vec())
            .await
            .is_err());
        assert!(backend.put(Namespace::Cache, "", b"x".to_vec()).await.is_err());
    }

    #[tokio::test]
    async fn test_file_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend
            .put(Namespace::Secret, "wallet-1", b"sealed".to_vec())
            .await
            .unwrap();
        assert_eq!(
            backend.get(Namespace::Secret, "wallet-1").await.unwrap(),
            Some(b"sealed".to_vec())
        );

        backend.delete(Namespace::Secret, "wallet-1").await.unwrap();
        assert_eq!(backend.get(Namespace::Secret, "wallet-1").await.unwrap(), None);

        // Deleting again is fine
        backend.delete(Namespace::Secret, "wallet-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_backend_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let backend = FileBackend::open(dir.path()).unwrap();
            backend
                .put(Namespace::Descriptor, "session", b"state".to_vec())
                .await
                .unwrap();
        }

        let backend = FileBackend::open(dir.path()).unwrap();
        assert_eq!(
            backend.get(Namespace::Descriptor, "session").await.unwrap(),
            Some(b"state".to_vec())
        );
        assert_eq!(
            backend.list_keys(Namespace::Descriptor).await.unwrap(),
            vec!["session".to_string()]
        );
    }
}
