//! The time window a run synchronizes.

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::event::format_instant;

/// Half-open range `[start, end)` of instants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SyncWindow {
    /// Monday 00:00 of the week containing `now` (in `tz`) through `days`
    /// calendar days later.
    pub fn current_week(now: DateTime<Utc>, tz: Tz, days: u32) -> SyncResult<Self> {
        let today = now.with_timezone(&tz).date_naive();
        let monday = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
        let end_date = monday
            .checked_add_days(Days::new(u64::from(days)))
            .ok_or_else(|| SyncError::InvalidSetting {
                key: "sync_next_x_days",
                reason: format!("{days} days from {monday} is out of range"),
            })?;

        Ok(SyncWindow {
            start: start_of_day(monday, tz),
            end: start_of_day(end_date, tz),
        })
    }
}

impl std::fmt::Display for SyncWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", format_instant(&self.start), format_instant(&self.end))
    }
}

/// First instant of `date` in `tz`. Zones that skip midnight start the day
/// at the first valid local time.
fn start_of_day(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let mut local = date.and_time(chrono::NaiveTime::MIN);
    loop {
        if let Some(dt) = tz.from_local_datetime(&local).earliest() {
            return dt.with_timezone(&Utc);
        }
        local += chrono::Duration::minutes(15);
    }
}
