//! Filesystem backend for the matric document store.
//!
//! Bytes live under `<root>/<storage-key>`, one file per upload; no binary
//! data lives in the database. Keys are opaque UUIDs allocated by the
//! upload service, so filenames never derive from user input.

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
};

use matric_core::{Error, Result, store::DocumentStore};
use uuid::Uuid;

/// Map an I/O failure to the generic storage error after logging the full
/// context for operators.
fn io_err(path: &Path, e: std::io::Error) -> Error {
  tracing::error!(path = %path.display(), error = %e, "document store failure");
  Error::Storage(e.to_string())
}

/// A document store rooted at a single local directory.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
  root: PathBuf,
}

impl FsDocumentStore {
  /// Open a store rooted at `root`, creating the directory if needed.
  pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
    let root = root.into();
    tokio::fs::create_dir_all(&root)
      .await
      .map_err(|e| io_err(&root, e))?;
    Ok(Self { root })
  }

  fn path_for(&self, key: Uuid) -> PathBuf {
    self.root.join(key.hyphenated().to_string())
  }
}

impl DocumentStore for FsDocumentStore {
  async fn save(&self, key: Uuid, bytes: Vec<u8>) -> Result<()> {
    let path = self.path_for(key);
    tokio::fs::write(&path, bytes)
      .await
      .map_err(|e| io_err(&path, e))
  }

  async fn read(&self, key: Uuid) -> Result<Option<Vec<u8>>> {
    let path = self.path_for(key);
    match tokio::fs::read(&path).await {
      Ok(bytes) => Ok(Some(bytes)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(io_err(&path, e)),
    }
  }

  async fn delete(&self, key: Uuid) -> Result<()> {
    let path = self.path_for(key);
    match tokio::fs::remove_file(&path).await {
      Ok(()) => Ok(()),
      // Deleting an already-gone blob is the expected outcome of a retried
      // compensating delete.
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(io_err(&path, e)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn temp_store() -> (FsDocumentStore, PathBuf) {
    let root = std::env::temp_dir().join(format!("matric-files-{}", Uuid::new_v4()));
    let store = FsDocumentStore::open(&root).await.unwrap();
    (store, root)
  }

  #[tokio::test]
  async fn save_read_delete_roundtrip() {
    let (store, root) = temp_store().await;
    let key = Uuid::new_v4();

    store.save(key, b"%PDF-1.4 scan".to_vec()).await.unwrap();
    assert_eq!(
      store.read(key).await.unwrap().as_deref(),
      Some(b"%PDF-1.4 scan".as_slice())
    );

    store.delete(key).await.unwrap();
    assert!(store.read(key).await.unwrap().is_none());

    tokio::fs::remove_dir_all(root).await.unwrap();
  }

  #[tokio::test]
  async fn read_of_unknown_key_is_none() {
    let (store, root) = temp_store().await;
    assert!(store.read(Uuid::new_v4()).await.unwrap().is_none());
    tokio::fs::remove_dir_all(root).await.unwrap();
  }

  #[tokio::test]
  async fn delete_of_unknown_key_is_ok() {
    let (store, root) = temp_store().await;
    store.delete(Uuid::new_v4()).await.unwrap();
    tokio::fs::remove_dir_all(root).await.unwrap();
  }

  #[tokio::test]
  async fn open_creates_nested_roots() {
    let root = std::env::temp_dir()
      .join(format!("matric-files-{}", Uuid::new_v4()))
      .join("nested")
      .join("uploads");
    let store = FsDocumentStore::open(&root).await.unwrap();

    let key = Uuid::new_v4();
    store.save(key, vec![0u8; 16]).await.unwrap();
    assert!(store.read(key).await.unwrap().is_some());

    tokio::fs::remove_dir_all(root.parent().unwrap().parent().unwrap())
      .await
      .unwrap();
  }
}
