//! DayKey: one local calendar day, the unit of export and post.

use std::fmt;

use chrono::{DateTime, Days, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};

const DIR_FORMAT: &str = "%d.%m.%Y";

/// A calendar date in the configured local offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The local day before `now`.
    pub fn yesterday_of(now: DateTime<FixedOffset>) -> Self {
        Self(now.date_naive() - Days::new(1))
    }

    /// The day `days` before this one.
    pub fn days_before(&self, days: u32) -> Self {
        Self(self.0 - Days::new(u64::from(days)))
    }

    /// `[local midnight, next local midnight)` as UTC instants.
    pub fn bounds(&self, offset: &FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
        let shift = Duration::seconds(i64::from(offset.local_minus_utc()));
        let start = (self.0.and_time(NaiveTime::MIN) - shift).and_utc();
        let end = ((self.0 + Days::new(1)).and_time(NaiveTime::MIN) - shift).and_utc();
        (start, end)
    }

    /// Artifact directory name, `DD.MM.YYYY`.
    pub fn dir_name(&self) -> String {
        self.0.format(DIR_FORMAT).to_string()
    }

    /// Parses a `DD.MM.YYYY` string (the directory name format).
    pub fn parse(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s.trim(), DIR_FORMAT).ok().map(Self)
    }

    /// `DD.MM`, used in the summary header.
    pub fn short_label(&self) -> String {
        self.0.format("%d.%m").to_string()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn msk() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    #[test]
    fn test_yesterday_uses_local_date() {
        // 01:30 local on 2 March is still 1 March in UTC; yesterday is 1 March local.
        let now = msk().with_ymd_and_hms(2025, 3, 2, 1, 30, 0).unwrap();
        assert_eq!(
            DayKey::yesterday_of(now).date(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
        );
    }

    #[test]
    fn test_yesterday_crosses_year() {
        let now = msk().with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(DayKey::yesterday_of(now).dir_name(), "31.12.2024");
    }

    #[test]
    fn test_bounds_are_local_midnights_in_utc() {
        let day = DayKey::new(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        let (start, end) = day.bounds(&msk());
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 2, 28, 21, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 1, 21, 0, 0).unwrap());
    }

    #[test]
    fn test_bounds_negative_offset() {
        let day = DayKey::new(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        let (start, _) = day.bounds(&FixedOffset::west_opt(5 * 3600).unwrap());
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 1, 5, 0, 0).unwrap());
    }

    #[test]
    fn test_dir_name_and_parse() {
        let day = DayKey::new(NaiveDate::from_ymd_opt(2025, 3, 7).unwrap());
        assert_eq!(day.dir_name(), "07.03.2025");
        assert_eq!(day.short_label(), "07.03");
        assert_eq!(DayKey::parse("07.03.2025"), Some(day));
        assert_eq!(DayKey::parse("2025-03-07"), None);
        assert_eq!(day.days_before(7).dir_name(), "28.02.2025");
    }
}
