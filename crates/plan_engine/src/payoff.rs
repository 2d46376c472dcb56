use chrono::{Months, NaiveDate};

use models::{AmortizationRow, PayoffOutcome, PayoffProjection};

/// What-if inputs for a payoff projection.
#[derive(Debug, Clone, Copy)]
pub struct PayoffInputs {
    pub balance: f64,
    pub apr: f64,
    pub minimum_payment: f64,
    pub extra_payment: f64,
}

/// Side-by-side projection with and without the extra payment.
#[derive(Debug, Clone)]
pub struct PayoffComparison {
    pub with_minimum: PayoffOutcome,
    pub with_extra: PayoffOutcome,
    pub months_saved: i64,
    pub interest_saved: f64,
}

const MAX_MONTHS: u32 = 600;

/// Month-by-month amortization of a debt at `minimum + extra` per month.
///
/// A payment at or below the monthly interest never converges; that case
/// is reported as `NeverPaysOff` rather than an error or a runaway loop,
/// as is any schedule exceeding 50 years.
pub fn project_payoff(inputs: &PayoffInputs, today: NaiveDate) -> PayoffOutcome {
    if inputs.balance <= 0.0 {
        return PayoffOutcome::AlreadyPaid;
    }

    let monthly_payment = inputs.minimum_payment + inputs.extra_payment;
    if monthly_payment <= 0.0 {
        return PayoffOutcome::NeverPaysOff;
    }

    let monthly_rate = inputs.apr / 100.0 / 12.0;
    let mut schedule = Vec::new();
    let mut balance = inputs.balance;
    let mut total_payment = 0.0;
    let mut total_interest = 0.0;
    let mut month = 0u32;

    while balance > 0.01 && month < MAX_MONTHS {
        month += 1;
        let interest = balance * monthly_rate;

        if monthly_payment <= interest && inputs.apr > 0.0 {
            return PayoffOutcome::NeverPaysOff;
        }

        let payment = monthly_payment.min(balance + interest);
        let principal = payment - interest;
        balance = (balance - principal).max(0.0);

        total_payment += payment;
        total_interest += interest;

        schedule.push(AmortizationRow {
            month,
            payment,
            principal,
            interest,
            balance,
        });
    }

    if month >= MAX_MONTHS {
        return PayoffOutcome::NeverPaysOff;
    }

    let payoff_date = today
        .checked_add_months(Months::new(month))
        .unwrap_or(today);

    PayoffOutcome::PaidOff(PayoffProjection {
        months: month,
        total_payment,
        total_interest,
        payoff_date,
        schedule,
    })
}

/// Compare paying the minimum against adding the extra payment.
pub fn compare_payoff(inputs: &PayoffInputs, today: NaiveDate) -> PayoffComparison {
    let with_minimum = project_payoff(
        &PayoffInputs {
            extra_payment: 0.0,
            ..*inputs
        },
        today,
    );
    let with_extra = if inputs.extra_payment > 0.0 {
        project_payoff(inputs, today)
    } else {
        with_minimum.clone()
    };

    let months_saved = months_of(&with_minimum) - months_of(&with_extra);
    let interest_saved = interest_of(&with_minimum) - interest_of(&with_extra);

    PayoffComparison {
        with_minimum,
        with_extra,
        months_saved,
        interest_saved,
    }
}

fn months_of(outcome: &PayoffOutcome) -> i64 {
    match outcome {
        PayoffOutcome::PaidOff(p) => p.months as i64,
        _ => 0,
    }
}

fn interest_of(outcome: &PayoffOutcome) -> f64 {
    match outcome {
        PayoffOutcome::PaidOff(p) => p.total_interest,
        _ => 0.0,
    }
}

/// "14 months" / "2 years" / "1y 3mo".
pub fn format_months(total_months: u32) -> String {
    let years = total_months / 12;
    let months = total_months % 12;

    if years == 0 {
        format!("{} month{}", months, if months == 1 { "" } else { "s" })
    } else if months == 0 {
        format!("{} year{}", years, if years == 1 { "" } else { "s" })
    } else {
        format!("{}y {}mo", years, months)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2026, 1, 1)
    }

    #[test]
    fn test_already_paid() {
        let outcome = project_payoff(
            &PayoffInputs {
                balance: 0.0,
                apr: 24.99,
                minimum_payment: 35.0,
                extra_payment: 0.0,
            },
            today(),
        );
        assert!(matches!(outcome, PayoffOutcome::AlreadyPaid));
    }

    #[test]
    fn test_zero_rate_payoff_divides_evenly() {
        let outcome = project_payoff(
            &PayoffInputs {
                balance: 1200.0,
                apr: 0.0,
                minimum_payment: 100.0,
                extra_payment: 0.0,
            },
            today(),
        );
        match outcome {
            PayoffOutcome::PaidOff(p) => {
                assert_eq!(p.months, 12);
                assert_eq!(p.total_interest, 0.0);
                assert_eq!(p.payoff_date, date(2027, 1, 1));
                assert_eq!(p.schedule.len(), 12);
            }
            other => panic!("expected payoff, got {:?}", other),
        }
    }

    #[test]
    fn test_payment_below_interest_never_converges() {
        // $10,000 at 24% accrues $200/month; a $150 payment loses ground.
        let outcome = project_payoff(
            &PayoffInputs {
                balance: 10000.0,
                apr: 24.0,
                minimum_payment: 150.0,
                extra_payment: 0.0,
            },
            today(),
        );
        assert!(matches!(outcome, PayoffOutcome::NeverPaysOff));
    }

    #[test]
    fn test_zero_payment_never_converges() {
        let outcome = project_payoff(
            &PayoffInputs {
                balance: 100.0,
                apr: 0.0,
                minimum_payment: 0.0,
                extra_payment: 0.0,
            },
            today(),
        );
        assert!(matches!(outcome, PayoffOutcome::NeverPaysOff));
    }

    #[test]
    fn test_final_payment_is_truncated() {
        let outcome = project_payoff(
            &PayoffInputs {
                balance: 250.0,
                apr: 0.0,
                minimum_payment: 100.0,
                extra_payment: 0.0,
            },
            today(),
        );
        match outcome {
            PayoffOutcome::PaidOff(p) => {
                assert_eq!(p.months, 3);
                let last = p.schedule.last().unwrap();
                assert_eq!(last.payment, 50.0);
                assert_eq!(last.balance, 0.0);
                assert_eq!(p.total_payment, 250.0);
            }
            other => panic!("expected payoff, got {:?}", other),
        }
    }

    #[test]
    fn test_extra_payment_shortens_schedule() {
        let inputs = PayoffInputs {
            balance: 5000.0,
            apr: 19.99,
            minimum_payment: 150.0,
            extra_payment: 200.0,
        };
        let comparison = compare_payoff(&inputs, today());
        assert!(comparison.months_saved > 0);
        assert!(comparison.interest_saved > 0.0);
        match (&comparison.with_minimum, &comparison.with_extra) {
            (PayoffOutcome::PaidOff(min), PayoffOutcome::PaidOff(extra)) => {
                assert!(extra.months < min.months);
                assert!(extra.total_interest < min.total_interest);
            }
            other => panic!("expected two payoffs, got {:?}", other),
        }
    }

    #[test]
    fn test_format_months() {
        assert_eq!(format_months(1), "1 month");
        assert_eq!(format_months(7), "7 months");
        assert_eq!(format_months(24), "2 years");
        assert_eq!(format_months(15), "1y 3mo");
    }
}
