mod summary;


use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use chrono::{Local, NaiveDateTime};
use log::{error, info, warn};
use tokio::{fs, sync::Mutex, task::spawn_blocking};

use crate::{
    archive::{ArchiveSplitter, ArchiveVolume, BoxedCompressor},
    config::BackupSettings,
    discover::{
        directory_size, list_source_directories, load_exclusions, ExclusionSet, SourceDirectory,
    },
    error::{Error, Result},
    format::{format_path, format_size},
    notify::Notifications,
    storage::{join_remote, BoxedStorage},
};

use super::upload::UploadDispatcher;

pub use self::summary::{DirectoryOutcome, RunSummary};

/// Name of each run's remote directory and of its scratch directory.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Runs backups: discovers directories, then compresses, uploads and cleans up
/// each one in turn. Only one run can be in progress at a time.
#[derive(Debug)]
pub struct Backup {
    settings: Arc<BackupSettings>,
    compressor: Arc<BoxedCompressor>,
    dispatcher: UploadDispatcher,
    notifications: Notifications,
    run_lock: Mutex<()>,
}

impl Backup {
    pub fn new(
        settings: BackupSettings,
        storage: BoxedStorage,
        notifications: Notifications,
    ) -> Result<Self> {
        let compressor = Box::new(ArchiveSplitter::new(settings.compression_level));
        Self::with_compressor(settings, compressor, storage, notifications)
    }

    pub fn with_compressor(
        settings: BackupSettings,
        compressor: BoxedCompressor,
        storage: BoxedStorage,
        notifications: Notifications,
    ) -> Result<Self> {
        settings.validate()?;

        let dispatcher = UploadDispatcher::new(Arc::new(storage), notifications.clone());
        Ok(Backup {
            settings: Arc::new(settings),
            compressor: Arc::new(compressor),
            dispatcher,
            notifications,
            run_lock: Mutex::new(()),
        })
    }

    /// Backs up every eligible directory once. Failures of single directories
    /// or volumes are part of the returned summary; an error means the run
    /// could not happen at all.
    pub async fn run_once(&self) -> Result<RunSummary> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            warn!("skipped backup, the previous run is still in progress");
            return Err(Error::RunInProgress);
        };

        let started = Instant::now();
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        info!("starting backup {timestamp}");
        self.notifications
            .send("🚀 Starting backup process...", true)
            .await;

        match self.run_in_scratch(&timestamp).await {
            Ok(mut summary) => {
                summary.elapsed = started.elapsed();
                info!(
                    "backup {timestamp} finished: {} directories, {} failed, {} uploaded",
                    summary.directories_processed,
                    summary.directories_failed,
                    format_size(summary.bytes_uploaded)
                );
                self.notifications
                    .send(&summary.message(), summary.is_success())
                    .await;
                Ok(summary)
            }
            Err(err) => {
                error!("backup {timestamp} failed ({err})");
                self.notifications
                    .error(&format!("Backup process error: {err}"))
                    .await;
                Err(err)
            }
        }
    }

    async fn run_in_scratch(&self, timestamp: &str) -> Result<RunSummary> {
        let work_dir = self.settings.scratch_dir.join(timestamp);
        remove_orphaned_runs(&self.settings.scratch_dir).await?;
        fs::create_dir_all(&work_dir).await?;

        let result = self.run_directories(&work_dir, timestamp).await;

        if let Err(err) = remove_dir_if_exists(&work_dir).await {
            warn!("failed to remove {} ({err})", format_path(&work_dir));
        }

        result
    }

    async fn run_directories(&self, work_dir: &Path, timestamp: &str) -> Result<RunSummary> {
        let directories = self.discover().await?;
        let mut summary = RunSummary::default();

        let total = directories.len();
        if total == 0 {
            self.notifications
                .info("No directories found for backup.")
                .await;
            return Ok(summary);
        }

        let noun = if total == 1 { "directory" } else { "directories" };
        self.notifications
            .send(&format!("📂 Found {total} {noun} for backup"), true)
            .await;

        let destination = join_remote(&self.settings.remote_path, timestamp);
        for (i, directory) in directories.iter().enumerate() {
            let outcome = self
                .backup_directory(directory, i + 1, total, work_dir, &destination)
                .await;
            summary.record(outcome);
        }

        Ok(summary)
    }

    async fn discover(&self) -> Result<Vec<SourceDirectory>> {
        let settings = self.settings.clone();
        let loaded =
            spawn_blocking(move || load_exclusions(&settings.exclusions_file, &settings.base_dir))
                .await?;

        let exclusions = match loaded {
            Ok(exclusions) => exclusions,
            Err(err) => {
                warn!("failed to read exclusion list ({err})");
                self.notifications
                    .error(&format!("Failed to read exclusion list: {err}"))
                    .await;
                ExclusionSet::new()
            }
        };

        let settings = self.settings.clone();
        spawn_blocking(move || {
            list_source_directories(&settings.base_dir, &exclusions, &settings.skip)
        })
        .await?
    }

    async fn backup_directory(
        &self,
        directory: &SourceDirectory,
        position: usize,
        total: usize,
        work_dir: &Path,
        destination: &str,
    ) -> DirectoryOutcome {
        let name = &directory.name;
        let size_path = directory.path.clone();
        let size = spawn_blocking(move || directory_size(&size_path))
            .await
            .unwrap_or_default();

        info!("compressing {} ({})", format_path(&directory.path), format_size(size));
        self.notifications
            .send(
                &format!("📦 [{position}/{total}] Compressing: {name} ({})", format_size(size)),
                true,
            )
            .await;

        let outcome = match self.compress(directory, work_dir).await {
            Ok(volumes) => self.upload(name, size, &volumes, destination).await,
            Err(err) => {
                error!("{err}");
                DirectoryOutcome::failed(name, size, err.to_string())
            }
        };

        let directory_scratch = work_dir.join(name);
        if let Err(err) = remove_dir_if_exists(&directory_scratch).await {
            warn!("failed to remove {} ({err})", format_path(&directory_scratch));
        }

        if outcome.is_success() {
            self.notifications.success(&outcome.message()).await;
        } else {
            self.notifications.error(&outcome.message()).await;
        }

        outcome
    }

    async fn compress(
        &self,
        directory: &SourceDirectory,
        work_dir: &Path,
    ) -> Result<Vec<ArchiveVolume>> {
        let compressor = self.compressor.clone();
        let source_dir = directory.path.clone();
        let scratch_dir = work_dir.to_owned();
        let max_volume_bytes = self.settings.max_volume_bytes;

        let volumes =
            spawn_blocking(move || compressor.split(&source_dir, &scratch_dir, max_volume_bytes))
                .await??;

        let total_size = volumes.iter().map(|volume| volume.size).sum::<u64>();
        self.notifications
            .send(
                &format!(
                    "✅ Compressed into {} part(s) ({} total)",
                    volumes.len(),
                    format_size(total_size)
                ),
                true,
            )
            .await;

        Ok(volumes)
    }

    async fn upload(
        &self,
        name: &str,
        size: u64,
        volumes: &[ArchiveVolume],
        destination: &str,
    ) -> DirectoryOutcome {
        self.notifications
            .progress(&format!(
                "Uploading {} part(s) for {name} in parallel...",
                volumes.len()
            ))
            .await;

        let results = self
            .dispatcher
            .upload_all(volumes, destination, self.settings.upload_workers)
            .await;

        // every result is in, so the local copies can go
        remove_volumes(volumes).await;

        DirectoryOutcome::from_results(name, size, &results)
    }
}

async fn remove_volumes(volumes: &[ArchiveVolume]) {
    for volume in volumes {
        match fs::remove_file(&volume.path).await {
            Err(err) if err.kind() != io::ErrorKind::NotFound => {
                warn!("failed to remove {} ({err})", format_path(&volume.path));
            }
            _ => {}
        }
    }
}

async fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path).await {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        result => result,
    }
}

/// Deletes scratch directories left behind by runs that were interrupted.
/// Anything not named like a run is left alone.
async fn remove_orphaned_runs(scratch_dir: &Path) -> Result<()> {
    fs::create_dir_all(scratch_dir).await?;

    let mut entries = fs::read_dir(scratch_dir).await?;
    let mut orphans: Vec<PathBuf> = vec![];
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_run = NaiveDateTime::parse_from_str(&name, TIMESTAMP_FORMAT).is_ok();
        if is_run && entry.file_type().await?.is_dir() {
            orphans.push(entry.path());
        }
    }

    for orphan in orphans {
        warn!("removing leftover scratch data in {}", format_path(&orphan));
        remove_dir_if_exists(&orphan).await?;
    }

    Ok(())
}
