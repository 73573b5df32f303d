use log::{error, info};
use tokio::{select, signal};

use crate::{
    config::ScheduleSettings, error::Result, notify::Notifications, ops::Backup,
    schedule::run_daily,
};

use super::{
    args::ScheduleArgs,
    common::{create_backup, prepare},
};

pub async fn main(args: ScheduleArgs) -> Result<()> {
    let settings = ScheduleSettings {
        hour: args.hour,
        minute: args.minute,
        timezone: args.timezone,
        run_on_startup: args.run_on_startup,
    };
    let (config, notifications) = prepare(args.backup, settings, args.global).await?;
    let backup = match create_backup(&config, notifications.clone()).await {
        Ok(backup) => backup,
        Err(err) => {
            notifications.error(&format!("Fatal error: {err}")).await;
            return Err(err);
        }
    };

    notifications
        .send("🔄 Backuper started and scheduler initialized.", true)
        .await;
    notifications
        .send(
            &format!(
                "⏰ Scheduled daily backup at {:02}:{:02} ({})",
                settings.hour, settings.minute, settings.timezone
            ),
            true,
        )
        .await;

    let scheduled = async {
        if settings.run_on_startup {
            run_startup_backup(&backup, &notifications).await;
        }
        run_daily(&backup, settings).await
    };

    select! {
        result = scheduled => {
            if let Err(err) = &result {
                notifications.error(&format!("Fatal error: {err}")).await;
            }
            result
        }
        signal = signal::ctrl_c() => {
            signal?;
            info!("interrupted, shutting down");
            notifications.send("⏹️ Backuper stopped by user", false).await;
            Ok(())
        }
    }
}

async fn run_startup_backup(backup: &Backup, notifications: &Notifications) {
    notifications
        .send("▶️ Running immediate backup on startup...", true)
        .await;

    match backup.run_once().await {
        Ok(_) => {
            notifications
                .send(
                    "✅ Initial backup completed. Scheduler will now take over.",
                    true,
                )
                .await;
        }
        Err(err) => error!("{err}"),
    }
}
