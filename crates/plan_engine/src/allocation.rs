use models::{PayFrequency, SurplusSplit};

/// Inputs to the surplus split for one pay period.
#[derive(Debug, Clone, Copy)]
pub struct SplitInputs {
    pub paycheck_amount: f64,
    pub bills_due_this_period: f64,
    pub discretionary: f64,
    pub emergency_fund_target: f64,
    pub current_emergency_amount: f64,
    pub savings_surplus_percent: f64,
}

/// Convert a monthly discretionary budget into a per-paycheck amount.
pub fn discretionary_per_paycheck(monthly: Option<f64>, frequency: PayFrequency) -> f64 {
    match monthly {
        Some(m) if m > 0.0 => m * 12.0 / frequency.paychecks_per_year() as f64,
        _ => 0.0,
    }
}

/// Split the paycheck surplus between savings and extra debt payment.
///
/// A shortfall (bills + discretionary exceed the paycheck) allocates
/// nothing. Otherwise savings takes its configured share of the surplus,
/// capped so the emergency fund never overshoots its target, and debt takes
/// the entire remainder. The configured debt-surplus percent is not
/// consulted here; see the pinning test below.
pub fn compute_surplus_split(inputs: &SplitInputs) -> SurplusSplit {
    let base_needs = inputs.bills_due_this_period + inputs.discretionary;
    let surplus = inputs.paycheck_amount - base_needs;

    if surplus <= 0.0 {
        return SurplusSplit {
            surplus,
            savings_allocation: 0.0,
            debt_allocation: 0.0,
            is_negative: true,
        };
    }

    let ef_remaining =
        (inputs.emergency_fund_target - inputs.current_emergency_amount).max(0.0);

    let savings_allocation = if ef_remaining > 0.0 {
        (surplus * inputs.savings_surplus_percent).min(ef_remaining)
    } else {
        0.0
    };

    let debt_allocation = surplus - savings_allocation;

    SurplusSplit {
        surplus,
        savings_allocation,
        debt_allocation,
        is_negative: false,
    }
}
