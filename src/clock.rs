use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};

/// Wall clock pinned to the tracker's reference timezone, independent of
/// the machine's local timezone.
#[derive(Debug, Clone, Copy)]
pub struct RefClock {
    offset: FixedOffset,
}

impl RefClock {
    pub fn new(utc_offset_hours: i32) -> Option<Self> {
        FixedOffset::east_opt(utc_offset_hours * 3600).map(|offset| Self { offset })
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.at(Utc::now())
    }

    pub fn at(&self, utc: DateTime<Utc>) -> DateTime<FixedOffset> {
        utc.with_timezone(&self.offset)
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    pub fn time(&self) -> NaiveTime {
        self.now().time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_offsets() {
        assert!(RefClock::new(8).is_some());
        assert!(RefClock::new(-12).is_some());
        assert!(RefClock::new(24).is_none());
    }

    #[test]
    fn date_follows_the_reference_offset() {
        let clock = RefClock::new(8).expect("valid offset");
        let late_utc: DateTime<Utc> = "2024-03-01T20:30:00Z".parse().unwrap();
        // 20:30 UTC is already the next morning in UTC+8.
        assert_eq!(
            clock.at(late_utc).date_naive(),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
        assert_eq!(
            clock.at(late_utc).time(),
            NaiveTime::from_hms_opt(4, 30, 0).unwrap()
        );
    }
}
