use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use tokio::{fs, time::sleep};

use crate::error::Result;

use super::{remote_segments, Storage};

#[derive(Debug)]
pub struct LocalStorage {
    path: PathBuf,
    latency: Option<Duration>,
}

impl LocalStorage {
    pub fn new(path: PathBuf, latency: Option<Duration>) -> Self {
        LocalStorage { path, latency }
    }

    fn object_path(&self, remote_path: &str) -> PathBuf {
        remote_segments(remote_path).fold(self.path.clone(), |path, segment| path.join(segment))
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            sleep(latency).await;
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn ensure_dir(&self, path: &str) -> Result<()> {
        self.simulate_latency().await;

        fs::create_dir_all(self.object_path(path)).await?;
        Ok(())
    }

    async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<()> {
        self.simulate_latency().await;

        let path = self.object_path(remote_path);
        fs::copy(local_path, path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;
    use tokio::fs;

    use crate::storage::Storage;

    use super::LocalStorage;

    #[tokio::test]
    async fn ensure_dir_is_idempotent() {
        let root = tempdir().unwrap();
        let storage = LocalStorage::new(root.path().to_owned(), None);

        storage.ensure_dir("backup/2024-01-01_03-00-00/docs").await.unwrap();
        storage.ensure_dir("backup/2024-01-01_03-00-00/docs").await.unwrap();

        assert!(root.path().join("backup/2024-01-01_03-00-00/docs").is_dir());
    }

    #[tokio::test]
    async fn upload_copies_file() {
        let root = tempdir().unwrap();
        let source = tempdir().unwrap();
        let local_path = source.path().join("docs.tar.zst.0001");
        fs::write(&local_path, b"volume").await.unwrap();

        let storage = LocalStorage::new(root.path().to_owned(), None);
        storage.ensure_dir("backup/docs").await.unwrap();
        storage
            .upload(&local_path, "backup/docs/docs.tar.zst.0001")
            .await
            .unwrap();

        let uploaded = fs::read(root.path().join("backup/docs/docs.tar.zst.0001"))
            .await
            .unwrap();
        assert_eq!(uploaded, b"volume");
    }

    #[tokio::test]
    async fn upload_without_directory_fails() {
        let root = tempdir().unwrap();
        let source = tempdir().unwrap();
        let local_path = source.path().join("part");
        fs::write(&local_path, b"volume").await.unwrap();

        let storage = LocalStorage::new(root.path().to_owned(), None);
        assert!(storage.upload(&local_path, "missing/part").await.is_err());
    }
}
