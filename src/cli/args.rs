use std::{path::PathBuf, time::Duration};

use chrono_tz::Tz;
use clap::{ArgAction, Args, ColorChoice};
use humantime::parse_duration;

use crate::{
    config::{
        COMPRESSION_LEVEL_RANGE, DEFAULT_BACKUP_HOUR, DEFAULT_BACKUP_MINUTE,
        DEFAULT_COMPRESSION_LEVEL, DEFAULT_MAX_VOLUME_BYTES, DEFAULT_REMOTE_PATH,
        DEFAULT_TIMEZONE, DEFAULT_UPLOAD_WORKERS, UPLOAD_WORKERS_RANGE,
    },
    storage::StorageUrl,
};

use super::parse::{parse_range_inclusive, parse_size, parse_timezone};

fn parse_compression_level(s: &str) -> Result<u8, String> {
    parse_range_inclusive(s, COMPRESSION_LEVEL_RANGE)
}

fn parse_volume_size(s: &str) -> Result<u64, String> {
    parse_size(s, 1..=u64::MAX)
}

fn parse_upload_workers(s: &str) -> Result<usize, String> {
    parse_range_inclusive(s, UPLOAD_WORKERS_RANGE)
}

fn parse_hour(s: &str) -> Result<u32, String> {
    parse_range_inclusive(s, 0..=23)
}

fn parse_minute(s: &str) -> Result<u32, String> {
    parse_range_inclusive(s, 0..=59)
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub backup: BackupArgs,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Hour of the daily backup, in `--timezone`
    #[arg(
        long,
        env = "BACKUP_HOUR",
        default_value_t = DEFAULT_BACKUP_HOUR,
        value_parser = parse_hour,
    )]
    pub hour: u32,

    /// Minute of the daily backup
    #[arg(
        long,
        env = "BACKUP_MINUTE",
        default_value_t = DEFAULT_BACKUP_MINUTE,
        value_parser = parse_minute,
    )]
    pub minute: u32,

    /// Time zone the schedule is kept in
    #[arg(
        long,
        env = "TIMEZONE",
        value_name = "NAME",
        default_value_t = DEFAULT_TIMEZONE,
        value_parser = parse_timezone,
    )]
    pub timezone: Tz,

    /// Run a backup right away before waiting for the first scheduled time
    #[arg(
        long,
        env = "RUN_ON_STARTUP",
        value_name = "BOOL",
        default_value_t = true,
        action = ArgAction::Set,
    )]
    pub run_on_startup: bool,

    #[command(flatten)]
    pub backup: BackupArgs,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug)]
pub struct BackupArgs {
    /// Directory whose subdirectories are backed up
    #[arg(short = 'd', long, env = "BACKUP_BASE_DIR", default_value = ".")]
    pub base_dir: PathBuf,

    /// File listing directories to leave out, one per line
    #[arg(short = 'x', long, env = "FORBIDDEN_DIRS_FILE", default_value = "forbidden")]
    pub exclusions: PathBuf,

    /// Name of a subdirectory to leave out (repeatable)
    #[arg(long, value_name = "NAME")]
    pub skip: Vec<String>,

    /// Where volumes are kept until they are uploaded
    #[arg(long, env = "STOWAWAY_SCRATCH_DIR", value_name = "PATH")]
    pub scratch_dir: Option<PathBuf>,

    /// Remote directory that receives one timestamped directory per run
    #[arg(
        short = 'r',
        long,
        env = "NEXTCLOUD_BACKUP_PATH",
        default_value = DEFAULT_REMOTE_PATH,
    )]
    pub remote_path: String,

    /// Maximum size of each archive volume (bytes, or with a K/M/G/T suffix)
    #[arg(
        short = 'b',
        long,
        env = "MAX_VOLUME_SIZE",
        value_name = "SIZE",
        default_value_t = DEFAULT_MAX_VOLUME_BYTES,
        value_parser = parse_volume_size,
    )]
    pub volume_size: u64,

    /// Number of concurrent uploads
    #[arg(
        short = 'j',
        long,
        env = "MAX_UPLOAD_WORKERS",
        value_name = "NUM",
        default_value_t = DEFAULT_UPLOAD_WORKERS,
        value_parser = parse_upload_workers,
    )]
    pub jobs: usize,

    /// Compression level (1-19)
    #[arg(
        short = 'l',
        long,
        env = "COMPRESSION_PRESET",
        value_name = "NUM",
        default_value_t = DEFAULT_COMPRESSION_LEVEL,
        value_parser = parse_compression_level,
    )]
    pub compression_level: u8,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    #[command(flatten)]
    pub storage: StorageArgs,

    #[command(flatten)]
    pub notify: NotifyArgs,

    #[command(flatten)]
    pub logger: LoggerArgs,
}

#[derive(Args, Debug)]
pub struct StorageArgs {
    /// Storage backend (e.g. 'https://<nextcloud>', 's3://<bucket>' or 'file://<path>')
    #[arg(short, long, env = "STOWAWAY_STORAGE", value_name = "URL")]
    pub storage: StorageUrl,

    /// WebDAV user name
    #[arg(short, long, env = "NEXTCLOUD_USERNAME")]
    pub username: Option<String>,

    /// WebDAV password
    #[arg(long, env = "NEXTCLOUD_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Add latency when using local storage
    #[arg(short = 'L', long, value_parser = parse_duration)]
    pub latency: Option<Duration>,
}

#[derive(Args, Debug)]
pub struct NotifyArgs {
    /// Telegram bot token for progress messages
    #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
    pub telegram_token: Option<String>,

    /// Telegram chat or channel that receives progress messages
    #[arg(long, env = "TELEGRAM_CHANNEL_ID", value_name = "ID")]
    pub telegram_chat: Option<String>,
}

#[derive(Args, Debug)]
pub struct LoggerArgs {
    /// When to use color in output
    #[arg(short, long, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Print more output
    #[arg(short, long, action = ArgAction::Count, group = "verbosity")]
    pub verbose: u8,

    /// Print less output
    #[arg(short, long, action = ArgAction::Count, group = "verbosity")]
    pub quiet: u8,
}
