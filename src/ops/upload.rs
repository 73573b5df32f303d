use std::{collections::HashMap, sync::Arc};

use log::{debug, warn};
use tokio::{sync::Semaphore, task::JoinSet};

use crate::{
    archive::ArchiveVolume,
    error::Result,
    notify::Notifications,
    storage::{join_remote, BoxedStorage},
};

#[derive(Debug, Clone)]
pub struct UploadResult {
    pub volume: ArchiveVolume,
    pub error: Option<String>,
}

impl UploadResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Uploads volumes with at most `worker_count` puts in flight. Every volume is
/// attempted exactly once and a failed put never cancels the others.
#[derive(Debug, Clone)]
pub struct UploadDispatcher {
    storage: Arc<BoxedStorage>,
    notifications: Notifications,
}

impl UploadDispatcher {
    pub fn new(storage: Arc<BoxedStorage>, notifications: Notifications) -> Self {
        UploadDispatcher {
            storage,
            notifications,
        }
    }

    /// Returns one result per volume, in the same order as `volumes`.
    pub async fn upload_all(
        &self,
        volumes: &[ArchiveVolume],
        destination_base: &str,
        worker_count: usize,
    ) -> Vec<UploadResult> {
        self.ensure_remote_dirs(volumes, destination_base).await;

        let total = volumes.len();
        let semaphore = Arc::new(Semaphore::new(worker_count.max(1)));
        let mut tasks = JoinSet::new();
        let mut task_slots = HashMap::with_capacity(total);
        let mut slots: Vec<Option<Result<()>>> = (0..total).map(|_| None).collect();
        let mut completed = 0;

        for (index, volume) in volumes.iter().enumerate() {
            let storage = self.storage.clone();
            let semaphore = semaphore.clone();
            let local_path = volume.path.clone();
            let remote_path = volume.remote_path(destination_base);

            let handle = tasks.spawn(async move {
                match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        debug!("uploading {remote_path}");
                        storage.upload(&local_path, &remote_path).await
                    }
                    Err(err) => Err(err.into()),
                }
            });
            task_slots.insert(handle.id(), index);
        }

        // a panicked upload only fails its own volume
        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(err) => (err.id(), Err(err.into())),
            };
            let Some(&index) = task_slots.get(&id) else {
                continue;
            };
            completed += 1;
            self.report(&volumes[index], &result, completed, total).await;
            slots[index] = Some(result);
        }

        volumes
            .iter()
            .zip(slots)
            .map(|(volume, slot)| {
                let error = match slot {
                    Some(Ok(())) => None,
                    Some(Err(err)) => Some(err.to_string()),
                    None => Some("upload did not complete".to_owned()),
                };
                UploadResult {
                    volume: volume.clone(),
                    error,
                }
            })
            .collect()
    }

    async fn ensure_remote_dirs(&self, volumes: &[ArchiveVolume], destination_base: &str) {
        let mut directory_names = volumes
            .iter()
            .map(|volume| volume.directory_name.as_str())
            .collect::<Vec<_>>();
        directory_names.dedup();

        for directory_name in directory_names {
            let remote_dir = join_remote(destination_base, directory_name);
            // uploads into a missing directory will fail and be reported on their own
            if let Err(err) = self.storage.ensure_dir(&remote_dir).await {
                warn!("failed to create remote directory {remote_dir} ({err})");
            }
        }
    }

    async fn report(
        &self,
        volume: &ArchiveVolume,
        result: &Result<()>,
        completed: usize,
        total: usize,
    ) {
        let file_name = volume.file_name();
        match result {
            Ok(()) => {
                debug!("uploaded {file_name}");
                let message = format!("✅ Uploaded {completed}/{total}: {file_name}");
                self.notifications.send(&message, true).await;
            }
            Err(err) => {
                warn!("failed to upload {file_name} ({err})");
                let message = format!("Failed to upload {file_name}: {err}");
                self.notifications.error(&message).await;
            }
        }
    }
}

pub fn failed_volume_names(results: &[UploadResult]) -> Vec<String> {
    results
        .iter()
        .filter(|result| !result.is_success())
        .map(|result| result.volume.file_name())
        .collect()
}
