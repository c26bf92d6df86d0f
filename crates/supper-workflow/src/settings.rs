// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime knobs derived from [`SupperConfig`].

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use supper_config::SupperConfig;

use crate::vote::Quorum;

#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub agent_name: String,
    pub default_cuisines: Vec<String>,
    pub quorum: Quorum,
    /// Dishes per poll; user suggestions take slots first.
    pub suggestion_count: usize,
    pub default_member_count: u32,
    pub volunteer_grace: chrono::Duration,
    pub session_idle: chrono::Duration,
    pub start_hour: u32,
    pub end_hour: u32,
    pub window_minutes: u32,
    pub tick: std::time::Duration,
    /// Fixed offset for "local" time; `None` uses the host zone.
    pub utc_offset: Option<FixedOffset>,
    pub llm_timeout: std::time::Duration,
    pub transport_timeout: std::time::Duration,
}

impl WorkflowSettings {
    pub fn from_config(config: &SupperConfig) -> Self {
        let wf = &config.workflow;
        Self {
            agent_name: config.agent.name.clone(),
            default_cuisines: wf.cuisines.clone(),
            quorum: Quorum::new(wf.quorum_numerator, wf.quorum_denominator),
            suggestion_count: wf.suggestion_count,
            default_member_count: wf.default_member_count,
            volunteer_grace: chrono::Duration::minutes(i64::from(wf.volunteer_grace_mins)),
            session_idle: chrono::Duration::minutes(i64::from(wf.session_idle_mins)),
            start_hour: wf.start_hour,
            end_hour: wf.end_hour,
            window_minutes: wf.window_minutes,
            tick: std::time::Duration::from_secs(wf.tick_secs),
            utc_offset: wf
                .utc_offset_minutes
                .and_then(|m| FixedOffset::east_opt(m * 60)),
            llm_timeout: std::time::Duration::from_secs(config.openai.timeout_secs),
            transport_timeout: std::time::Duration::from_secs(config.telegram.request_timeout_secs),
        }
    }

    /// Local date and (hour, minute) of `now`.
    fn local_parts(&self, now: DateTime<Utc>) -> (NaiveDate, u32, u32) {
        match self.utc_offset {
            Some(offset) => {
                let t = now.with_timezone(&offset);
                (t.date_naive(), t.hour(), t.minute())
            }
            None => {
                let t = now.with_timezone(&Local);
                (t.date_naive(), t.hour(), t.minute())
            }
        }
    }

    fn in_window(&self, now: DateTime<Utc>, hour: u32) -> bool {
        let (_, h, m) = self.local_parts(now);
        h == hour && m < self.window_minutes
    }

    pub fn in_start_window(&self, now: DateTime<Utc>) -> bool {
        self.in_window(now, self.start_hour)
    }

    pub fn in_end_window(&self, now: DateTime<Utc>) -> bool {
        self.in_window(now, self.end_hour)
    }

    /// UTC bounds `[start, end)` of the local calendar day containing `now`.
    ///
    /// Both ends are local midnights, so a day with a DST change lasts 23
    /// or 25 hours.
    pub fn local_day_bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let (date, _, _) = self.local_parts(now);
        match self.utc_offset {
            Some(offset) => day_bounds(date, |t| earliest_utc(&offset, t)),
            None => day_bounds(date, |t| earliest_utc(&Local, t)),
        }
    }
}

fn earliest_utc<Tz: TimeZone>(tz: &Tz, local: &NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(local)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
}

/// Local midnight of `date`, in UTC. A zone that skips midnight falls back
/// to UTC midnight of the same date.
fn midnight_utc(
    date: NaiveDate,
    to_utc: &impl Fn(&NaiveDateTime) -> Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    to_utc(&midnight).unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

fn day_bounds(
    date: NaiveDate,
    to_utc: impl Fn(&NaiveDateTime) -> Option<DateTime<Utc>>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = midnight_utc(date, &to_utc);
    let end = match date.succ_opt() {
        Some(next) => midnight_utc(next, &to_utc),
        None => start + chrono::Duration::days(1),
    };
    (start, end)
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self::from_config(&SupperConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc_settings() -> WorkflowSettings {
        WorkflowSettings {
            utc_offset: FixedOffset::east_opt(0),
            ..WorkflowSettings::default()
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, h, m, 0).unwrap()
    }

    #[test]
    fn defaults_follow_config() {
        let s = WorkflowSettings::default();
        assert_eq!(s.quorum, Quorum::new(2, 3));
        assert_eq!(s.volunteer_grace, chrono::Duration::minutes(15));
        assert_eq!(s.session_idle, chrono::Duration::minutes(10));
        assert_eq!(s.suggestion_count, 4);
    }

    #[test]
    fn windows_have_minute_slack() {
        let s = utc_settings();
        assert!(s.in_start_window(at(15, 0)));
        assert!(s.in_start_window(at(15, 4)));
        assert!(!s.in_start_window(at(15, 5)));
        assert!(!s.in_start_window(at(14, 59)));
        assert!(s.in_end_window(at(21, 2)));
    }

    #[test]
    fn offset_shifts_day_bounds() {
        let s = WorkflowSettings {
            utc_offset: FixedOffset::east_opt(3 * 3600),
            ..WorkflowSettings::default()
        };
        // 22:30 UTC is already the next day at UTC+3.
        let (start, end) = s.local_day_bounds(at(22, 30));
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 14, 21, 0, 0).unwrap());
        assert_eq!(end - start, chrono::Duration::days(1));
    }

    /// Central European time: UTC+1, then UTC+2 from 02:00 local on 2026-03-29.
    fn cet_to_utc(local: &NaiveDateTime) -> Option<DateTime<Utc>> {
        let switch = NaiveDate::from_ymd_opt(2026, 3, 29)?.and_hms_opt(2, 0, 0)?;
        let hours = if *local < switch { 1 } else { 2 };
        Some(Utc.from_utc_datetime(&(*local - chrono::Duration::hours(hours))))
    }

    #[test]
    fn spring_forward_day_is_23_hours() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 29).unwrap();
        let (start, end) = day_bounds(date, cet_to_utc);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 28, 23, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 3, 29, 22, 0, 0).unwrap());
        assert_eq!(end - start, chrono::Duration::hours(23));

        // The next day starts exactly where this one ends.
        let (next_start, _) = day_bounds(date.succ_opt().unwrap(), cet_to_utc);
        assert_eq!(next_start, end);
    }
}
