//! Timestamp policy. Pure functions; callers pass the clock reading.

use chrono::{DateTime, NaiveDate, Utc};

use crate::contract::model::{Split, UserRecord};

/// Birthday format accepted for `days_alive`.
pub const BIRTHDAY_FORMAT: &str = "%Y-%m-%d";

/// Stamp a successful mutation of `split`: `created_at` once, `updated_at`
/// and the split's own timestamp every time.
pub fn stamp(record: &mut UserRecord, split: Split, now: DateTime<Utc>) {
    stamp_created(record, now);
    record.updated_at = Some(now);
    match split {
        Split::Profile => record.profile_updated_at = Some(now),
        Split::Note => record.note_updated_at = Some(now),
        Split::Screen => record.screen_updated_at = Some(now),
        Split::Command => record.command_updated_at = Some(now),
    }
}

/// Set `created_at` if the record has never been persisted.
pub fn stamp_created(record: &mut UserRecord, now: DateTime<Utc>) {
    if record.created_at.is_none() {
        record.created_at = Some(now);
    }
}

/// Whole days between `birthday` and `today`.
///
/// `None` for a missing or unparsable birthday, or one in the future.
pub fn days_alive(birthday: Option<&str>, today: NaiveDate) -> Option<i64> {
    let born = NaiveDate::parse_from_str(birthday?.trim(), BIRTHDAY_FORMAT).ok()?;
    let days = (today - born).num_days();
    (days >= 0).then_some(days)
}

/// Fill read-time derived fields.
pub fn derive(record: &mut UserRecord, today: NaiveDate) {
    record.profile.days_alive = days_alive(record.profile.birthday.as_deref(), today);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn first_stamp_sets_created_and_split() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let mut r = UserRecord::empty("Jordan");
        stamp(&mut r, Split::Profile, now);

        assert_eq!(r.created_at, Some(now));
        assert_eq!(r.updated_at, Some(now));
        assert_eq!(r.profile_updated_at, Some(now));
        assert_eq!(r.note_updated_at, None);
    }

    #[test]
    fn later_stamp_keeps_created_at() {
        let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2025, 3, 2, 8, 30, 0).unwrap();
        let mut r = UserRecord::empty("Jordan");
        stamp(&mut r, Split::Profile, t0);
        stamp(&mut r, Split::Command, t1);

        assert_eq!(r.created_at, Some(t0));
        assert_eq!(r.updated_at, Some(t1));
        assert_eq!(r.profile_updated_at, Some(t0));
        assert_eq!(r.command_updated_at, Some(t1));
    }

    #[test]
    fn days_alive_counts_whole_days() {
        assert_eq!(days_alive(Some("2000-01-01"), day(2000, 1, 11)), Some(10));
        assert_eq!(days_alive(Some("2000-01-01"), day(2000, 1, 1)), Some(0));
        // 2000 is a leap year
        assert_eq!(days_alive(Some("2000-01-01"), day(2001, 1, 1)), Some(366));
    }

    #[test]
    fn days_alive_is_none_for_bad_input() {
        let today = day(2025, 6, 1);
        assert_eq!(days_alive(None, today), None);
        assert_eq!(days_alive(Some(""), today), None);
        assert_eq!(days_alive(Some("01/02/1990"), today), None);
        assert_eq!(days_alive(Some("2030-01-01"), today), None);
    }
}
