use std::env;

use crate::{
    config::{BackupSettings, Config, Credentials, ScheduleSettings, TelegramConfig},
    error::{Error, Result},
    notify::{LogNotifier, Notifications, TelegramNotifier},
    ops::Backup,
    storage::{BoxedStorage, LocalStorage, S3Storage, StorageUrl, WebDavStorage},
};

use super::args::{BackupArgs, GlobalArgs, NotifyArgs, StorageArgs};

const SCRATCH_DIR_NAME: &str = "stowaway";

/// Builds the configuration, sets up notifications from it and validates the
/// rest. A validation error is reported through the freshly created
/// notifications before it is returned.
pub async fn prepare(
    backup: BackupArgs,
    schedule: ScheduleSettings,
    global: GlobalArgs,
) -> Result<(Config, Notifications)> {
    let config = build_config(backup, schedule, global)?;
    let notifications = create_notifications(&config)?;

    match config.validate() {
        Ok(()) => Ok((config, notifications)),
        Err(err) => {
            notifications.error(&format!("Fatal error: {err}")).await;
            Err(err)
        }
    }
}

pub async fn create_backup(config: &Config, notifications: Notifications) -> Result<Backup> {
    let storage = create_storage(config).await?;
    Backup::new(config.backup.clone(), storage, notifications)
}

pub async fn create_storage(config: &Config) -> Result<BoxedStorage> {
    match &config.storage {
        StorageUrl::S3(bucket) => {
            let s3_storage = S3Storage::new(bucket.clone()).await;
            Ok(Box::new(s3_storage))
        }
        StorageUrl::Local(path) => {
            let local_storage = LocalStorage::new(path.clone(), config.latency);
            Ok(Box::new(local_storage))
        }
        StorageUrl::WebDav(base_url) => {
            let Some(Credentials { username, password }) = config.credentials.clone() else {
                return Err(Error::Config(
                    "a username and password are required for WebDAV storage".to_owned(),
                ));
            };
            let webdav_storage = WebDavStorage::new(base_url, username, password)?;
            Ok(Box::new(webdav_storage))
        }
    }
}

pub fn create_notifications(config: &Config) -> Result<Notifications> {
    match &config.telegram {
        Some(TelegramConfig { token, chat_id }) => {
            let notifier = TelegramNotifier::new(token, chat_id.clone())?;
            Ok(Notifications::new(Box::new(notifier)))
        }
        None => Ok(Notifications::new(Box::new(LogNotifier))),
    }
}

fn build_config(
    backup: BackupArgs,
    schedule: ScheduleSettings,
    global: GlobalArgs,
) -> Result<Config> {
    let GlobalArgs {
        storage:
            StorageArgs {
                storage,
                username,
                password,
                latency,
            },
        notify,
        ..
    } = global;

    let credentials = match (username, password) {
        (Some(username), Some(password)) => Some(Credentials { username, password }),
        _ => None,
    };

    let scratch_dir = backup
        .scratch_dir
        .unwrap_or_else(|| env::temp_dir().join(SCRATCH_DIR_NAME));

    Ok(Config {
        storage,
        credentials,
        latency,
        telegram: telegram_config(&notify)?,
        backup: BackupSettings {
            base_dir: backup.base_dir,
            exclusions_file: backup.exclusions,
            skip: backup.skip,
            scratch_dir,
            remote_path: backup.remote_path,
            max_volume_bytes: backup.volume_size,
            upload_workers: backup.jobs,
            compression_level: backup.compression_level,
        },
        schedule,
    })
}

fn telegram_config(args: &NotifyArgs) -> Result<Option<TelegramConfig>> {
    match (&args.telegram_token, &args.telegram_chat) {
        (Some(token), Some(chat_id)) => Ok(Some(TelegramConfig {
            token: token.clone(),
            chat_id: chat_id.clone(),
        })),
        (None, None) => Ok(None),
        _ => Err(Error::Config(
            "a Telegram token and chat ID must be given together".to_owned(),
        )),
    }
}
