use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use log::{error, info};
use tokio::time::sleep;

use crate::{
    config::ScheduleSettings,
    error::{Error, Result},
    format::format_duration,
    ops::Backup,
};

/// The first `hour:minute` strictly after `now`. Skips days where that time
/// doesn't exist because of a DST change.
pub fn next_run<Tz: TimeZone>(now: &DateTime<Tz>, hour: u32, minute: u32) -> Option<DateTime<Tz>> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let today = now.date_naive();
    (0..=2)
        .filter_map(|days| today.checked_add_days(Days::new(days)))
        .filter_map(|date| {
            date.and_time(time)
                .and_local_timezone(now.timezone())
                .earliest()
        })
        .find(|candidate| candidate > now)
}

/// Runs a backup every day at the configured time in the configured time
/// zone. Never returns unless the schedule itself is invalid.
pub async fn run_daily(backup: &Backup, schedule: ScheduleSettings) -> Result<()> {
    loop {
        let now = Utc::now().with_timezone(&schedule.timezone);
        let next = next_run(&now, schedule.hour, schedule.minute).ok_or_else(|| {
            Error::Config(format!(
                "no valid time for {:02}:{:02}",
                schedule.hour, schedule.minute
            ))
        })?;

        let wait = (next - now).to_std().unwrap_or_default();
        info!(
            "next backup at {} (in {})",
            next.format("%Y-%m-%d %H:%M %Z"),
            format_duration(wait)
        );
        sleep(wait).await;

        if let Err(err) = backup.run_once().await {
            error!("{err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use chrono_tz::America::New_York;

    use super::next_run;

    #[test]
    fn later_today() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 1, 30, 0).unwrap();
        let next = next_run(&now, 3, 0).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 3, 10, 3, 0, 0).unwrap());
    }

    #[test]
    fn already_passed_means_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 4, 0, 0).unwrap();
        let next = next_run(&now, 3, 0).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 3, 11, 3, 0, 0).unwrap());
    }

    #[test]
    fn exactly_now_means_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 3, 0, 0).unwrap();
        let next = next_run(&now, 3, 0).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 1, 1, 3, 0, 0).unwrap());
    }

    #[test]
    fn invalid_time_has_no_next_run() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 4, 0, 0).unwrap();
        assert!(next_run(&now, 24, 0).is_none());
    }

    #[test]
    fn missing_local_time_moves_to_next_day() {
        // 02:30 doesn't exist on the day clocks spring forward
        let now = New_York.with_ymd_and_hms(2024, 3, 10, 1, 0, 0).unwrap();
        let next = next_run(&now, 2, 30).unwrap();
        assert_eq!(next, New_York.with_ymd_and_hms(2024, 3, 11, 2, 30, 0).unwrap());
    }

    #[test]
    fn follows_the_zone_offset() {
        let now = New_York.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
        let next = next_run(&now, 3, 0).unwrap();
        assert_eq!(next.with_timezone(&Utc), Utc.with_ymd_and_hms(2024, 7, 2, 7, 0, 0).unwrap());
    }
}
