//! Source of "now" for every time-dependent derivation.

use chrono::{DateTime, FixedOffset, Local, Utc};

/// Supplies the current instant together with the local UTC offset.
///
/// The offset decides which calendar day an event belongs to.
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }
}

/// The system wall clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock frozen at one instant. Can be moved by hand.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl FixedClock {
    pub fn advance(&mut self, by: chrono::Duration) {
        self.0 += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    #[test]
    fn fixed_clock_reports_and_advances() {
        let start = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 1, 23, 30, 0)
            .unwrap();
        let mut clock = FixedClock(start);
        assert_eq!(clock.now(), start);
        assert_eq!(clock.now_utc(), Utc.with_ymd_and_hms(2025, 3, 1, 22, 30, 0).unwrap());

        clock.advance(chrono::Duration::hours(1));
        assert_eq!(clock.now().date_naive(), chrono::NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
    }
}
