use chrono::NaiveDate;

use models::{PayoffProgress, UserStrategy};

/// Long-horizon payoff progress against the user's recorded baseline.
///
/// New borrowing since the baseline is absorbed into the denominator
/// (`adjusted_start_debt`) so the progress percentage only moves with
/// payments and can never exceed 100 because debt was added; the
/// `baseline_stale` flag tells the caller a baseline re-sync is due.
pub fn payoff_progress(
    strategy: &UserStrategy,
    current_debt: f64,
    today: NaiveDate,
) -> PayoffProgress {
    let (start_date, start_total, target_date) = match (
        strategy.payoff_start_date,
        strategy.payoff_start_total_debt,
        strategy.payoff_target_date,
    ) {
        (Some(s), Some(t), Some(g)) if t > 0.0 => (s, t, g),
        _ => return bare(current_debt),
    };

    let debt_paid = (start_total - current_debt).max(0.0);
    let debt_added = (current_debt - start_total).max(0.0);
    let adjusted_start = start_total + debt_added;
    let baseline_stale = debt_added > 0.0;

    let debt_progress_pct = if adjusted_start > 0.0 {
        clamp01(debt_paid / adjusted_start)
    } else {
        0.0
    };

    let total_days = (target_date - start_date).num_days();
    let elapsed_days = (today - start_date).num_days();
    let time_progress_pct = if total_days > 0 {
        Some(clamp01(elapsed_days as f64 / total_days as f64))
    } else {
        None
    };

    let remaining_days = (target_date - today).num_days().max(0);
    let months_remaining = (remaining_days as f64 / 30.0).ceil() as i64;

    let on_track = time_progress_pct.map(|t| debt_progress_pct >= t);

    PayoffProgress {
        start_date: Some(start_date),
        target_date: Some(target_date),
        start_debt: Some(start_total),
        current_debt,
        debt_paid: Some(debt_paid),
        debt_added: Some(debt_added),
        adjusted_start_debt: Some(adjusted_start),
        debt_progress_pct: Some(debt_progress_pct),
        time_progress_pct,
        on_track,
        months_remaining: Some(months_remaining),
        baseline_stale: Some(baseline_stale),
    }
}

/// Progress record when the baseline is incomplete: only the current total
/// is reportable.
fn bare(current_debt: f64) -> PayoffProgress {
    PayoffProgress {
        start_date: None,
        target_date: None,
        start_debt: None,
        current_debt,
        debt_paid: None,
        debt_added: None,
        adjusted_start_debt: None,
        debt_progress_pct: None,
        time_progress_pct: None,
        on_track: None,
        months_remaining: None,
        baseline_stale: None,
    }
}

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::PayFrequency;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn strategy() -> UserStrategy {
        UserStrategy {
            paycheck_amount: 2000.0,
            paycheck_frequency: PayFrequency::Biweekly,
            paycheck_bank_account_id: None,
            spending_bank_account_id: None,
            discretionary_budget_monthly: Some(750.0),
            emergency_fund_target: Some(1000.0),
            debt_surplus_percent: Some(0.8),
            savings_surplus_percent: Some(0.2),
            payoff_start_date: Some(date(2026, 1, 1)),
            payoff_start_total_debt: Some(10000.0),
            payoff_target_date: Some(date(2027, 1, 1)),
        }
    }

    #[test]
    fn test_incomplete_baseline_reports_current_debt_only() {
        let mut s = strategy();
        s.payoff_target_date = None;
        let p = payoff_progress(&s, 8000.0, date(2026, 6, 1));
        assert_eq!(p.current_debt, 8000.0);
        assert!(p.debt_progress_pct.is_none());
        assert!(p.on_track.is_none());
        assert!(p.baseline_stale.is_none());
    }

    #[test]
    fn test_zero_start_debt_counts_as_incomplete() {
        let mut s = strategy();
        s.payoff_start_total_debt = Some(0.0);
        let p = payoff_progress(&s, 500.0, date(2026, 6, 1));
        assert!(p.start_debt.is_none());
    }

    #[test]
    fn test_progress_midway() {
        // Paid 2500 of 10000, halfway through the year on 2026-07-02.
        let p = payoff_progress(&strategy(), 7500.0, date(2026, 7, 2));
        assert_eq!(p.debt_paid, Some(2500.0));
        assert_eq!(p.debt_added, Some(0.0));
        assert_eq!(p.adjusted_start_debt, Some(10000.0));
        assert_eq!(p.debt_progress_pct, Some(0.25));
        assert_eq!(p.baseline_stale, Some(false));
        // 182 of 365 days elapsed; debt progress trails time progress.
        assert_eq!(p.on_track, Some(false));
    }

    #[test]
    fn test_on_track_when_ahead_of_schedule() {
        let p = payoff_progress(&strategy(), 4000.0, date(2026, 7, 2));
        assert_eq!(p.debt_progress_pct, Some(0.6));
        assert_eq!(p.on_track, Some(true));
    }

    #[test]
    fn test_new_borrowing_is_insulated_by_adjusted_start() {
        let before = payoff_progress(&strategy(), 9000.0, date(2026, 3, 1));
        // Balance climbs to 11000: 1000 of new debt, nothing paid.
        let after = payoff_progress(&strategy(), 11000.0, date(2026, 3, 1));
        assert_eq!(after.debt_added, Some(1000.0));
        assert_eq!(after.adjusted_start_debt, Some(11000.0));
        assert_eq!(after.debt_progress_pct, Some(0.0));
        assert_eq!(after.baseline_stale, Some(true));
        // Progress never rises because borrowing increased the balance.
        assert!(after.debt_progress_pct.unwrap() <= before.debt_progress_pct.unwrap());
    }

    #[test]
    fn test_time_progress_clamps_past_target() {
        let p = payoff_progress(&strategy(), 5000.0, date(2027, 6, 1));
        assert_eq!(p.time_progress_pct, Some(1.0));
        assert_eq!(p.months_remaining, Some(0));
    }

    #[test]
    fn test_months_remaining_rounds_up() {
        // 2026-12-01 to 2027-01-01 is 31 days -> ceil(31/30) = 2 months.
        let p = payoff_progress(&strategy(), 5000.0, date(2026, 12, 1));
        assert_eq!(p.months_remaining, Some(2));
    }

    #[test]
    fn test_target_not_after_start_leaves_time_progress_undefined() {
        let mut s = strategy();
        s.payoff_target_date = s.payoff_start_date;
        let p = payoff_progress(&s, 5000.0, date(2026, 6, 1));
        assert!(p.time_progress_pct.is_none());
        assert!(p.on_track.is_none());
        assert!(p.debt_progress_pct.is_some());
    }
}
