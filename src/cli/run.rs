use log::warn;

use crate::{
    config::ScheduleSettings,
    error::{Error, Result},
};

use super::{
    args::RunArgs,
    common::{create_backup, prepare},
};

pub async fn main(args: RunArgs) -> Result<()> {
    let (config, notifications) =
        prepare(args.backup, ScheduleSettings::default(), args.global).await?;
    let backup = create_backup(&config, notifications).await?;

    let summary = backup.run_once().await?;
    if summary.is_success() {
        return Ok(());
    }

    for volume in summary.failed_volumes() {
        warn!("{volume} was not uploaded");
    }

    Err(Error::IncompleteBackup {
        failed: summary.directories_failed,
        total: summary.directories_processed,
    })
}
