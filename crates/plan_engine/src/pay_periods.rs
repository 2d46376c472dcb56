use chrono::{Datelike, Duration, NaiveDate};

use models::{Bill, BillFrequency, PayPeriod};

/// Length of one pay period in days (biweekly paychecks).
pub const PERIOD_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Biweekly pay period calendar anchored to a fixed reference paycheck date.
///
/// All period math derives from the anchor, so periods are recomputable from
/// scratch for any date, past or future, and never need to be persisted.
#[derive(Debug, Clone, Copy)]
pub struct PayCalendar {
    reference: NaiveDate,
}

impl PayCalendar {
    pub fn new(reference: NaiveDate) -> Self {
        PayCalendar { reference }
    }

    /// The paycheck date at or before `date` on the biweekly schedule.
    pub fn paycheck_date_for(&self, date: NaiveDate) -> NaiveDate {
        let diff_days = (date - self.reference).num_days();
        // Floor division keeps dates before the anchor on the grid too.
        let diff_weeks = diff_days.div_euclid(7);
        let cycles = diff_weeks.div_euclid(2);

        let mut paycheck = self.reference + Duration::weeks(cycles * 2);
        if paycheck > date {
            paycheck -= Duration::weeks(2);
        }
        paycheck
    }

    /// The pay period containing `date`: an inclusive 14-day window
    /// starting on the paycheck date.
    pub fn period_for(&self, date: NaiveDate) -> PayPeriod {
        let paycheck_date = self.paycheck_date_for(date);
        PayPeriod {
            start_date: paycheck_date,
            end_date: paycheck_date + Duration::days(PERIOD_DAYS - 1),
            paycheck_date,
        }
    }

    pub fn current_period(&self, today: NaiveDate) -> PayPeriod {
        self.period_for(today)
    }

    pub fn next_period(&self, today: NaiveDate) -> PayPeriod {
        let current = self.period_for(today);
        self.period_for(current.end_date + Duration::days(1))
    }

    pub fn previous_period(&self, today: NaiveDate) -> PayPeriod {
        let current = self.period_for(today);
        self.period_for(current.start_date - Duration::weeks(1))
    }

    /// Walk `count` periods from `start`. Backward walks are returned in
    /// chronological order.
    pub fn periods_from(
        &self,
        start: NaiveDate,
        count: usize,
        direction: Direction,
    ) -> Vec<PayPeriod> {
        let mut periods = Vec::with_capacity(count);
        let mut cursor = start;

        for _ in 0..count {
            let period = self.period_for(cursor);
            cursor = match direction {
                Direction::Forward => period.end_date + Duration::days(1),
                Direction::Backward => period.start_date - Duration::weeks(1),
            };
            periods.push(period);
        }

        if direction == Direction::Backward {
            periods.reverse();
        }
        periods
    }
}

pub fn period_contains(period: &PayPeriod, date: NaiveDate) -> bool {
    date >= period.start_date && date <= period.end_date
}

/// Display label for a period, e.g. "Nov 26 - Dec 9, 2025".
pub fn format_period(period: &PayPeriod) -> String {
    format!(
        "{} - {}",
        period.start_date.format("%b %-d"),
        period.end_date.format("%b %-d, %Y")
    )
}

/// Days inside the period whose day-of-month equals `due_day`.
pub fn due_dates_in_period(due_day: u32, period: &PayPeriod) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = period.start_date;
    while current <= period.end_date {
        if current.day() == due_day {
            dates.push(current);
        }
        current += Duration::days(1);
    }
    dates
}

/// Occurrence dates of a recurring bill within `[start, end]`.
///
/// MONTHLY matches the due day-of-month; WEEKLY/BIWEEKLY anchor on the due
/// day of the range-start month and step by 7/14 days. ONCE bills have their
/// occurrence created with the bill itself, and YEARLY bills are manually
/// tracked, so both expand to nothing here.
pub fn due_dates_for_bill(bill: &Bill, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();

    if !bill.is_recurring {
        return dates;
    }

    match bill.frequency {
        BillFrequency::Once | BillFrequency::Yearly => {}
        BillFrequency::Monthly => {
            let mut current = start;
            while current <= end {
                if current.day() == bill.due_day {
                    dates.push(current);
                }
                current += Duration::days(1);
            }
        }
        BillFrequency::Weekly | BillFrequency::Biweekly => {
            let step = match bill.frequency {
                BillFrequency::Weekly => Duration::weeks(1),
                _ => Duration::weeks(2),
            };
            let mut current = month_anchor(start, bill.due_day);
            while current < start {
                current += step;
            }
            while current <= end {
                dates.push(current);
                current += step;
            }
        }
    }

    dates
}

/// The `due_day` of `date`'s month, clamped to the month's length.
fn month_anchor(date: NaiveDate, due_day: u32) -> NaiveDate {
    let mut day = due_day;
    loop {
        if let Some(anchor) = NaiveDate::from_ymd_opt(date.year(), date.month(), day) {
            return anchor;
        }
        day -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::BillCategory;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar() -> PayCalendar {
        PayCalendar::new(date(2025, 11, 26))
    }

    #[test]
    fn test_period_for_date_on_paycheck() {
        let period = calendar().period_for(date(2025, 11, 26));
        assert_eq!(period.start_date, date(2025, 11, 26));
        assert_eq!(period.end_date, date(2025, 12, 9));
        assert_eq!(period.paycheck_date, date(2025, 11, 26));
    }

    #[test]
    fn test_period_for_date_mid_period() {
        let period = calendar().period_for(date(2025, 12, 3));
        assert_eq!(period.start_date, date(2025, 11, 26));
        assert_eq!(period.end_date, date(2025, 12, 9));
    }

    #[test]
    fn test_period_for_date_before_reference() {
        let period = calendar().period_for(date(2025, 11, 20));
        assert_eq!(period.start_date, date(2025, 11, 12));
        assert_eq!(period.end_date, date(2025, 11, 25));
    }

    #[test]
    fn test_period_for_is_deterministic() {
        let cal = calendar();
        let d = date(2026, 3, 14);
        assert_eq!(cal.period_for(d), cal.period_for(d));
    }

    #[test]
    fn test_periods_are_contiguous_and_non_overlapping() {
        let cal = calendar();
        // Sweep a year of dates; the next period must always start the day
        // after the current one ends.
        let mut d = date(2025, 6, 1);
        while d < date(2026, 6, 1) {
            let current = cal.period_for(d);
            let next = cal.next_period(d);
            assert_eq!(next.start_date, current.end_date + Duration::days(1));
            assert!(period_contains(&current, d));
            assert!(!period_contains(&next, d));
            d += Duration::days(1);
        }
    }

    #[test]
    fn test_previous_period_ends_before_current_starts() {
        let cal = calendar();
        let today = date(2025, 12, 1);
        let current = cal.current_period(today);
        let previous = cal.previous_period(today);
        assert_eq!(previous.end_date + Duration::days(1), current.start_date);
    }

    #[test]
    fn test_periods_from_forward() {
        let periods = calendar().periods_from(date(2025, 11, 26), 3, Direction::Forward);
        assert_eq!(periods.len(), 3);
        assert_eq!(periods[0].start_date, date(2025, 11, 26));
        assert_eq!(periods[1].start_date, date(2025, 12, 10));
        assert_eq!(periods[2].start_date, date(2025, 12, 24));
    }

    #[test]
    fn test_periods_from_backward_is_chronological() {
        let periods = calendar().periods_from(date(2025, 11, 26), 3, Direction::Backward);
        assert_eq!(periods.len(), 3);
        assert!(periods[0].start_date < periods[1].start_date);
        assert!(periods[1].start_date < periods[2].start_date);
        assert_eq!(periods[2].start_date, date(2025, 11, 26));
    }

    #[test]
    fn test_period_contains_boundaries() {
        let period = calendar().period_for(date(2025, 11, 26));
        assert!(period_contains(&period, period.start_date));
        assert!(period_contains(&period, period.end_date));
        assert!(!period_contains(&period, period.start_date - Duration::days(1)));
        assert!(!period_contains(&period, period.end_date + Duration::days(1)));
    }

    #[test]
    fn test_due_dates_in_period() {
        // Nov 26 - Dec 9 spans two months, so due day 1 hits Dec 1 only.
        let period = calendar().period_for(date(2025, 11, 26));
        assert_eq!(due_dates_in_period(1, &period), vec![date(2025, 12, 1)]);
        assert_eq!(
            due_dates_in_period(28, &period),
            vec![date(2025, 11, 28)]
        );
        assert!(due_dates_in_period(15, &period).is_empty());
    }

    fn bill(frequency: BillFrequency, due_day: u32) -> Bill {
        Bill {
            id: "b1".to_string(),
            name: "Internet".to_string(),
            category: BillCategory::Utility,
            amount: 80.0,
            due_day,
            is_recurring: true,
            frequency,
            debt_id: None,
            bank_account_id: None,
            is_active: true,
            notes: None,
        }
    }

    #[test]
    fn test_due_dates_for_monthly_bill() {
        let dates = due_dates_for_bill(
            &bill(BillFrequency::Monthly, 15),
            date(2026, 1, 1),
            date(2026, 3, 31),
        );
        assert_eq!(
            dates,
            vec![date(2026, 1, 15), date(2026, 2, 15), date(2026, 3, 15)]
        );
    }

    #[test]
    fn test_due_dates_for_weekly_bill() {
        let dates = due_dates_for_bill(
            &bill(BillFrequency::Weekly, 5),
            date(2026, 1, 1),
            date(2026, 1, 31),
        );
        assert_eq!(
            dates,
            vec![
                date(2026, 1, 5),
                date(2026, 1, 12),
                date(2026, 1, 19),
                date(2026, 1, 26),
            ]
        );
    }

    #[test]
    fn test_due_dates_for_biweekly_bill_skips_before_range() {
        let dates = due_dates_for_bill(
            &bill(BillFrequency::Biweekly, 5),
            date(2026, 1, 10),
            date(2026, 2, 10),
        );
        assert_eq!(dates, vec![date(2026, 1, 19), date(2026, 2, 2)]);
    }

    #[test]
    fn test_due_dates_for_yearly_and_once_are_empty() {
        let start = date(2026, 1, 1);
        let end = date(2026, 12, 31);
        assert!(due_dates_for_bill(&bill(BillFrequency::Yearly, 15), start, end).is_empty());
        let mut one_time = bill(BillFrequency::Once, 15);
        one_time.is_recurring = false;
        assert!(due_dates_for_bill(&one_time, start, end).is_empty());
    }

    #[test]
    fn test_month_anchor_clamps_short_months() {
        // Due day 31 in February resolves to the last day of the month.
        assert_eq!(month_anchor(date(2026, 2, 10), 31), date(2026, 2, 28));
    }

    #[test]
    fn test_format_period() {
        let period = calendar().period_for(date(2025, 11, 26));
        assert_eq!(format_period(&period), "Nov 26 - Dec 9, 2025");
    }
}
