//! Sweep scheduling.
//!
//! Court APIs are quietest overnight, so production runs a daily sweep at
//! a fixed UTC hour; `every@<secs>` exists for staging and local runs.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};

/// When the next sweep should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepSchedule {
    /// Once a day at the given UTC hour.
    DailyAt { hour: u32 },
    /// At a fixed interval.
    Every { interval: Duration },
}

impl SweepSchedule {
    /// Daily schedule at an UTC hour, wrapped into 0..24.
    pub fn daily_at(hour: u32) -> Self {
        SweepSchedule::DailyAt { hour: hour % 24 }
    }

    /// Fixed-interval schedule.
    pub fn every(interval: Duration) -> Self {
        SweepSchedule::Every { interval }
    }

    /// The first run time strictly after `now`.
    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            SweepSchedule::DailyAt { hour } => {
                let at = NaiveTime::from_hms_opt(hour % 24, 0, 0).unwrap_or_default();
                let today = Utc.from_utc_datetime(&now.date_naive().and_time(at));
                if today > now {
                    today
                } else {
                    Utc.from_utc_datetime(
                        &now.date_naive()
                            .checked_add_days(Days::new(1))
                            .unwrap_or(now.date_naive())
                            .and_time(at),
                    )
                }
            }
            SweepSchedule::Every { interval } => now + interval,
        }
    }
}

impl std::fmt::Display for SweepSchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SweepSchedule::DailyAt { hour } => write!(f, "daily@{hour}"),
            SweepSchedule::Every { interval } => write!(f, "every@{}", interval.as_secs()),
        }
    }
}

impl FromStr for SweepSchedule {
    type Err = String;

    /// Parses `daily@<utc hour>` or `every@<seconds>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, value) = s
            .trim()
            .split_once('@')
            .ok_or_else(|| format!("Invalid sweep schedule: {s}"))?;
        match kind {
            "daily" => {
                let hour: u32 = value
                    .parse()
                    .map_err(|_| format!("Invalid sweep hour: {value}"))?;
                if hour >= 24 {
                    return Err(format!("Sweep hour out of range: {hour}"));
                }
                Ok(SweepSchedule::DailyAt { hour })
            }
            "every" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| format!("Invalid sweep interval: {value}"))?;
                if secs == 0 {
                    return Err("Sweep interval must be positive".to_string());
                }
                Ok(SweepSchedule::Every {
                    interval: Duration::from_secs(secs),
                })
            }
            _ => Err(format!("Invalid sweep schedule: {s}")),
        }
    }
}
