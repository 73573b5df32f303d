use std::{
    ops::RangeInclusive,
    path::{self, PathBuf},
    time::Duration,
};

use chrono_tz::Tz;

use crate::{
    error::{Error, Result},
    storage::StorageUrl,
};

pub const COMPRESSION_LEVEL_RANGE: RangeInclusive<u8> = 1..=19;
pub const DEFAULT_COMPRESSION_LEVEL: u8 = 3;

pub const UPLOAD_WORKERS_RANGE: RangeInclusive<usize> = 1..=64;
pub const DEFAULT_UPLOAD_WORKERS: usize = 4;

pub const DEFAULT_MAX_VOLUME_BYTES: u64 = 1 << 30;
pub const DEFAULT_REMOTE_PATH: &str = "backup/mainserver";

pub const DEFAULT_BACKUP_HOUR: u32 = 3;
pub const DEFAULT_BACKUP_MINUTE: u32 = 0;
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;

/// Everything a backup run needs, fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageUrl,
    pub credentials: Option<Credentials>,
    pub latency: Option<Duration>,
    pub telegram: Option<TelegramConfig>,
    pub backup: BackupSettings,
    pub schedule: ScheduleSettings,
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct BackupSettings {
    pub base_dir: PathBuf,
    pub exclusions_file: PathBuf,
    pub skip: Vec<String>,
    pub scratch_dir: PathBuf,
    pub remote_path: String,
    pub max_volume_bytes: u64,
    pub upload_workers: usize,
    pub compression_level: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleSettings {
    pub hour: u32,
    pub minute: u32,
    pub timezone: Tz,
    pub run_on_startup: bool,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        ScheduleSettings {
            hour: DEFAULT_BACKUP_HOUR,
            minute: DEFAULT_BACKUP_MINUTE,
            timezone: DEFAULT_TIMEZONE,
            run_on_startup: true,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if matches!(self.storage, StorageUrl::WebDav(_)) && self.credentials.is_none() {
            return Err(config_error(
                "a username and password are required for WebDAV storage",
            ));
        }

        self.backup.validate()?;
        self.schedule.validate()
    }
}

impl BackupSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_volume_bytes == 0 {
            return Err(config_error("volume size must be positive"));
        }

        if !UPLOAD_WORKERS_RANGE.contains(&self.upload_workers) {
            return Err(config_error(format!(
                "upload workers must be in range {}-{}",
                UPLOAD_WORKERS_RANGE.start(),
                UPLOAD_WORKERS_RANGE.end()
            )));
        }

        if !COMPRESSION_LEVEL_RANGE.contains(&self.compression_level) {
            return Err(config_error(format!(
                "compression level must be in range {}-{}",
                COMPRESSION_LEVEL_RANGE.start(),
                COMPRESSION_LEVEL_RANGE.end()
            )));
        }

        if !self.base_dir.is_dir() {
            return Err(Error::FileIsNotDirectory(self.base_dir.clone()));
        }

        let base_dir = path::absolute(&self.base_dir)?;
        if path::absolute(&self.scratch_dir)?.starts_with(base_dir) {
            return Err(config_error(
                "scratch directory must not be inside the base directory",
            ));
        }

        Ok(())
    }
}

impl ScheduleSettings {
    pub fn validate(&self) -> Result<()> {
        if self.hour > 23 {
            return Err(config_error("hour must be between 0 and 23"));
        }

        if self.minute > 59 {
            return Err(config_error("minute must be between 0 and 59"));
        }

        Ok(())
    }
}

fn config_error<S: Into<String>>(message: S) -> Error {
    Error::Config(message.into())
}
