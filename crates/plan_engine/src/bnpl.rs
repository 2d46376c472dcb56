use chrono::{Duration, Months, NaiveDate};

use models::{PayFrequency, PaymentSchedule, ScheduleTerms};

use crate::{EngineError, round2};

/// Average Gregorian month length, used to express weekly/biweekly
/// installment counts as an equivalent term in months.
const DAYS_PER_MONTH: f64 = 30.44;

/// Generate the installment schedule for a BNPL loan.
///
/// Every installment is the same `round2(total / n)` amount; the rounding
/// error on the final installment is deliberately not redistributed, so the
/// schedule total may drift from `total_amount` by up to half a cent per
/// installment.
pub fn generate_payment_schedule(terms: &ScheduleTerms) -> Result<PaymentSchedule, EngineError> {
    if terms.number_of_payments == 0 {
        return Err(EngineError::InvalidScheduleTerms(
            "numberOfPayments must be at least 1".to_string(),
        ));
    }
    if terms.total_amount <= 0.0 {
        return Err(EngineError::NonPositiveAmount(terms.total_amount));
    }

    let payment_amount = round2(terms.total_amount / terms.number_of_payments as f64);
    let mut payment_dates = Vec::with_capacity(terms.number_of_payments as usize);

    for i in 0..terms.number_of_payments {
        let date = installment_date(terms.first_payment_date, terms.frequency, i).ok_or_else(
            || {
                EngineError::InvalidScheduleTerms(format!(
                    "installment {} falls outside the supported date range",
                    i + 1
                ))
            },
        )?;
        payment_dates.push(date);
    }

    Ok(PaymentSchedule {
        payment_amount,
        payment_dates,
    })
}

fn installment_date(first: NaiveDate, frequency: PayFrequency, index: u32) -> Option<NaiveDate> {
    match frequency {
        PayFrequency::Weekly => Some(first + Duration::weeks(index as i64)),
        PayFrequency::Biweekly => Some(first + Duration::weeks(2 * index as i64)),
        // Calendar month stepping: day-of-month is preserved, clamped at
        // month end (Jan 31 + 1 month = Feb 28).
        PayFrequency::Monthly => first.checked_add_months(Months::new(index)),
    }
}

/// Approximate annualized finance-charge rate for an installment loan,
/// in percent.
///
/// This is a simple-interest approximation over the loan term, not an IRR
/// solve; callers must not treat it as a regulatory APR. Degenerate inputs
/// and loans whose total repayable matches the principal to the cent are
/// interest-free and report 0.
pub fn effective_apr(
    principal: f64,
    total_repayable: f64,
    number_of_payments: u32,
    frequency: PayFrequency,
) -> f64 {
    if principal <= 0.0 || total_repayable <= 0.0 || number_of_payments == 0 {
        return 0.0;
    }
    if (total_repayable - principal).abs() < 0.01 {
        return 0.0;
    }

    let finance_charge = total_repayable - principal;
    let n = number_of_payments as f64;
    let term_months = match frequency {
        PayFrequency::Weekly => n * 7.0 / DAYS_PER_MONTH,
        PayFrequency::Biweekly => n * 14.0 / DAYS_PER_MONTH,
        PayFrequency::Monthly => n,
    };
    let term_years = term_months / 12.0;

    round2(finance_charge / principal / term_years * 100.0)
}

/// Display label for a generated schedule, e.g.
/// "4 payments of $25.00 starting Mar 15".
pub fn payment_preview(number_of_payments: u32, payment_amount: f64, first: NaiveDate) -> String {
    format!(
        "{} payments of ${:.2} starting {}",
        number_of_payments,
        payment_amount,
        first.format("%b %-d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn terms(total: f64, n: u32, frequency: PayFrequency) -> ScheduleTerms {
        ScheduleTerms {
            total_amount: total,
            number_of_payments: n,
            first_payment_date: date(2026, 1, 15),
            frequency,
        }
    }

    #[test]
    fn test_schedule_equal_installments() {
        let schedule = generate_payment_schedule(&terms(100.0, 4, PayFrequency::Biweekly)).unwrap();
        assert_eq!(schedule.payment_amount, 25.0);
        assert_eq!(
            schedule.payment_dates,
            vec![
                date(2026, 1, 15),
                date(2026, 1, 29),
                date(2026, 2, 12),
                date(2026, 2, 26),
            ]
        );
    }

    #[test]
    fn test_schedule_weekly_dates() {
        let schedule = generate_payment_schedule(&terms(90.0, 3, PayFrequency::Weekly)).unwrap();
        assert_eq!(
            schedule.payment_dates,
            vec![date(2026, 1, 15), date(2026, 1, 22), date(2026, 1, 29)]
        );
    }

    #[test]
    fn test_schedule_monthly_preserves_day_of_month() {
        let mut t = terms(300.0, 3, PayFrequency::Monthly);
        t.first_payment_date = date(2026, 1, 31);
        let schedule = generate_payment_schedule(&t).unwrap();
        // Day clamps in short months rather than rolling over.
        assert_eq!(
            schedule.payment_dates,
            vec![date(2026, 1, 31), date(2026, 2, 28), date(2026, 3, 31)]
        );
    }

    #[test]
    fn test_schedule_sum_within_rounding_tolerance() {
        // 100 / 3 = 33.333... rounds to 33.33; the error is accepted, not
        // redistributed into the last installment.
        let schedule = generate_payment_schedule(&terms(100.0, 3, PayFrequency::Monthly)).unwrap();
        assert_eq!(schedule.payment_amount, 33.33);
        let total = schedule.payment_amount * schedule.payment_dates.len() as f64;
        assert!((total - 100.0).abs() <= 3.0 * 0.01);
    }

    #[test]
    fn test_schedule_rejects_zero_payments() {
        assert!(generate_payment_schedule(&terms(100.0, 0, PayFrequency::Weekly)).is_err());
    }

    #[test]
    fn test_schedule_rejects_non_positive_amount() {
        assert!(generate_payment_schedule(&terms(0.0, 4, PayFrequency::Weekly)).is_err());
        assert!(generate_payment_schedule(&terms(-25.0, 4, PayFrequency::Weekly)).is_err());
    }

    #[test]
    fn test_effective_apr_zero_when_interest_free() {
        assert_eq!(effective_apr(100.0, 100.0, 4, PayFrequency::Biweekly), 0.0);
        // Sub-cent difference counts as interest-free.
        assert_eq!(
            effective_apr(100.0, 100.005, 4, PayFrequency::Biweekly),
            0.0
        );
    }

    #[test]
    fn test_effective_apr_zero_on_degenerate_inputs() {
        assert_eq!(effective_apr(0.0, 110.0, 4, PayFrequency::Monthly), 0.0);
        assert_eq!(effective_apr(100.0, 0.0, 4, PayFrequency::Monthly), 0.0);
        assert_eq!(effective_apr(100.0, 110.0, 0, PayFrequency::Monthly), 0.0);
    }

    #[test]
    fn test_effective_apr_monthly_term() {
        // $10 finance charge on $100 over 12 months is 10% a year.
        assert_eq!(effective_apr(100.0, 110.0, 12, PayFrequency::Monthly), 10.0);
    }

    #[test]
    fn test_effective_apr_biweekly_term() {
        // 4 biweekly payments span 56/30.44 months = 0.1533 years.
        // 0.1 * 12 * 30.44 / 56 = 0.652285..., so 65.23%.
        let apr = effective_apr(100.0, 110.0, 4, PayFrequency::Biweekly);
        assert_eq!(apr, 65.23);
    }

    #[test]
    fn test_payment_preview() {
        assert_eq!(
            payment_preview(4, 25.0, date(2026, 3, 15)),
            "4 payments of $25.00 starting Mar 15"
        );
    }
}
