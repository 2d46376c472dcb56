use std::collections::BTreeMap;

use chrono::NaiveDate;

use models::{
    AccountFunding, AllocationPlan, AvalancheTarget, Bank, BankAccount, Debt, PayPeriod,
    PaymentStatus, PaymentWithBill, PlanStep, SavingsGoal, StepKind, StrategyDefaults,
    SurplusSplit, UserStrategy,
};

use crate::allocation::{SplitInputs, compute_surplus_split, discretionary_per_paycheck};
use crate::avalanche::select_target;
use crate::progress::payoff_progress;

/// Everything the assembler needs, pre-fetched. `payments` are the bill
/// payments whose due date falls inside `period` (any status); `past_due`
/// are unpaid occurrences due before the period start.
#[derive(Debug, Clone)]
pub struct PlanInputs {
    pub period: PayPeriod,
    pub today: NaiveDate,
    pub strategy: UserStrategy,
    pub defaults: StrategyDefaults,
    pub payments: Vec<PaymentWithBill>,
    pub past_due: Vec<PaymentWithBill>,
    pub debts: Vec<Debt>,
    pub bank_accounts: Vec<BankAccount>,
    pub goals: Vec<SavingsGoal>,
}

struct Funding {
    amount: f64,
    purposes: Vec<String>,
}

/// Assemble the ordered money-movement checklist for one pay period.
///
/// Step order bands: transfers 100+, bill payments 200+ (by due date),
/// the extra debt payment 300, the savings transfer 350.
pub fn assemble_plan(inputs: &PlanInputs) -> AllocationPlan {
    let strategy = &inputs.strategy;
    let paycheck_account_id = strategy.paycheck_bank_account_id.as_deref();

    let mut unpaid: Vec<&PaymentWithBill> = inputs
        .payments
        .iter()
        .filter(|p| p.payment.status == PaymentStatus::Unpaid)
        .collect();
    unpaid.sort_by_key(|p| p.payment.due_date);

    let bills_due_this_period: f64 = unpaid.iter().map(|p| p.payment.amount).sum();

    // Per-account bill totals; bills without an account fall back to the
    // paycheck account (no transfer needed) or an unknown bucket.
    let mut bills_by_account: BTreeMap<String, f64> = BTreeMap::new();
    for p in &unpaid {
        let account_id = p
            .bill
            .bank_account_id
            .clone()
            .or_else(|| strategy.paycheck_bank_account_id.clone())
            .unwrap_or_else(|| "UNKNOWN".to_string());
        *bills_by_account.entry(account_id).or_insert(0.0) += p.payment.amount;
    }

    let discretionary = discretionary_per_paycheck(
        strategy
            .discretionary_budget_monthly
            .or(Some(inputs.defaults.discretionary_monthly)),
        strategy.paycheck_frequency,
    );

    let emergency_goal = inputs.goals.iter().find(|g| g.is_emergency_fund());
    let emergency_fund_current = emergency_goal.map(|g| g.current_amount).unwrap_or(0.0);
    let emergency_fund_target = strategy
        .emergency_fund_target
        .unwrap_or(inputs.defaults.emergency_fund_target);

    let surplus_split = compute_surplus_split(&SplitInputs {
        paycheck_amount: strategy.paycheck_amount,
        bills_due_this_period,
        discretionary,
        emergency_fund_target,
        current_emergency_amount: emergency_fund_current,
        savings_surplus_percent: strategy
            .savings_surplus_percent
            .unwrap_or(inputs.defaults.savings_surplus_percent),
    });

    let avalanche_target = select_target(&inputs.debts, &inputs.bank_accounts);

    let total_debt: f64 = inputs
        .debts
        .iter()
        .filter(|d| d.is_active)
        .map(|d| d.current_balance)
        .sum();
    let payoff_progress = payoff_progress(strategy, total_debt, inputs.today);

    let required_funding = collect_required_funding(
        inputs,
        &bills_by_account,
        discretionary,
        &surplus_split,
        avalanche_target.as_ref(),
    );

    let paycheck_account = paycheck_account_id
        .and_then(|id| inputs.bank_accounts.iter().find(|ba| ba.id == id));
    let paycheck_account_name = paycheck_account
        .map(|ba| ba.name.clone())
        .unwrap_or_else(|| "Income Account".to_string());

    let mut steps = Vec::new();
    let mut transfers = Vec::new();
    let mut bill_payments = Vec::new();

    let mut transfer_order = 100u32;
    for (account_id, funding) in &required_funding {
        let target_account = inputs.bank_accounts.iter().find(|ba| &ba.id == account_id);
        let target_name = target_account
            .map(|ba| ba.name.clone())
            .unwrap_or_else(|| "Account".to_string());
        let purpose = funding.purposes.join(" & ");

        let step = PlanStep {
            id: format!("transfer-{}", account_id),
            kind: StepKind::Transfer,
            order: transfer_order,
            label: format!(
                "Transfer ${:.2} from {} to {} for {}",
                funding.amount, paycheck_account_name, target_name, purpose
            ),
            amount: funding.amount,
            from_account_id: strategy.paycheck_bank_account_id.clone(),
            from_account_name: Some(paycheck_account_name.clone()),
            to_account_id: Some(account_id.clone()),
            to_account_name: Some(target_name),
            bill_payment_id: None,
            debt_id: None,
            savings_goal_id: None,
            due_date: None,
            purpose: Some(purpose),
        };
        transfer_order += 1;

        transfers.push(step.clone());
        steps.push(step);
    }

    let mut payment_order = 200u32;
    for p in &unpaid {
        let account_note = p
            .bill
            .bank_account_id
            .as_ref()
            .and_then(|id| inputs.bank_accounts.iter().find(|ba| &ba.id == id))
            .map(|ba| format!(" (from {})", ba.name))
            .unwrap_or_default();

        let step = PlanStep {
            id: p.payment.id.clone(),
            kind: StepKind::BillPayment,
            order: payment_order,
            label: format!(
                "{} - {} - ${:.2}{}",
                p.payment.due_date.format("%b %-d"),
                p.bill.name,
                p.payment.amount,
                account_note
            ),
            amount: p.payment.amount,
            from_account_id: None,
            from_account_name: None,
            to_account_id: None,
            to_account_name: None,
            bill_payment_id: Some(p.payment.id.clone()),
            debt_id: None,
            savings_goal_id: None,
            due_date: Some(p.payment.due_date),
            purpose: None,
        };
        payment_order += 1;

        bill_payments.push(step.clone());
        steps.push(step);
    }

    let extra_debt_step = match (&avalanche_target, surplus_split.debt_allocation > 0.0) {
        (Some(target), true) => {
            let step = PlanStep {
                id: "extra-debt".to_string(),
                kind: StepKind::ExtraDebtPayment,
                order: 300,
                label: format!(
                    "Send ${:.2} extra to {} ({:.2}% APR)",
                    surplus_split.debt_allocation, target.debt_name, target.interest_rate
                ),
                amount: surplus_split.debt_allocation,
                from_account_id: None,
                from_account_name: None,
                to_account_id: None,
                to_account_name: None,
                bill_payment_id: None,
                debt_id: Some(target.debt_id.clone()),
                savings_goal_id: None,
                due_date: None,
                purpose: None,
            };
            steps.push(step.clone());
            Some(step)
        }
        _ => None,
    };

    let savings_step = if surplus_split.savings_allocation > 0.0 {
        let step = PlanStep {
            id: "savings-ef".to_string(),
            kind: StepKind::SavingsTransfer,
            order: 350,
            label: format!(
                "Move ${:.2} to Emergency Fund",
                surplus_split.savings_allocation
            ),
            amount: surplus_split.savings_allocation,
            from_account_id: None,
            from_account_name: None,
            to_account_id: None,
            to_account_name: None,
            bill_payment_id: None,
            debt_id: None,
            savings_goal_id: emergency_goal.map(|g| g.id.clone()),
            due_date: None,
            purpose: None,
        };
        steps.push(step.clone());
        Some(step)
    } else {
        None
    };

    steps.sort_by_key(|s| s.order);

    let account_summaries = required_funding
        .iter()
        .map(|(account_id, funding)| {
            let account = inputs.bank_accounts.iter().find(|ba| &ba.id == account_id);
            AccountFunding {
                id: account_id.clone(),
                name: account
                    .map(|ba| ba.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                bank: account.map(|ba| ba.bank).unwrap_or(Bank::Other),
                required_amount: funding.amount,
                purpose: funding.purposes.clone(),
            }
        })
        .collect();

    AllocationPlan {
        period: inputs.period,
        paycheck_amount: strategy.paycheck_amount,
        bills_due_this_period,
        discretionary_this_paycheck: discretionary,
        surplus_split,
        avalanche_target,
        steps,
        transfers,
        bill_payments,
        extra_debt_step,
        savings_step,
        payoff_progress,
        account_summaries,
        emergency_fund_current,
        emergency_fund_target,
        unpaid_payments: unpaid.into_iter().cloned().collect(),
        past_due: inputs.past_due.clone(),
    }
}

/// Accumulate the transfers the paycheck account must make: bills paid from
/// other accounts, the discretionary budget for the spending account, and
/// the extra debt payment for the avalanche target's account.
fn collect_required_funding(
    inputs: &PlanInputs,
    bills_by_account: &BTreeMap<String, f64>,
    discretionary: f64,
    surplus_split: &SurplusSplit,
    avalanche_target: Option<&AvalancheTarget>,
) -> BTreeMap<String, Funding> {
    let strategy = &inputs.strategy;
    let paycheck_account_id = strategy.paycheck_bank_account_id.as_deref();
    let mut required: BTreeMap<String, Funding> = BTreeMap::new();

    let mut add = |account_id: &str, amount: f64, purpose: &str| {
        let entry = required.entry(account_id.to_string()).or_insert(Funding {
            amount: 0.0,
            purposes: Vec::new(),
        });
        entry.amount += amount;
        entry.purposes.push(purpose.to_string());
    };

    for (account_id, amount) in bills_by_account {
        if Some(account_id.as_str()) != paycheck_account_id && account_id != "UNKNOWN" {
            add(account_id, *amount, "Bills");
        }
    }

    if discretionary > 0.0 {
        if let Some(spending_id) = strategy.spending_bank_account_id.as_deref() {
            if Some(spending_id) != paycheck_account_id {
                add(spending_id, discretionary, "Spending");
            }
        }
    }

    if surplus_split.debt_allocation > 0.0 {
        if let Some(target_account) = avalanche_target.and_then(|t| t.bank_account_id.as_deref()) {
            if Some(target_account) != paycheck_account_id {
                add(target_account, surplus_split.debt_allocation, "Extra Debt Payment");
            }
        }
    }

    required
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pay_periods::PayCalendar;
    use models::{
        Bill, BillCategory, BillFrequency, BillPayment, DebtStatus, DebtType, GoalStep,
        PayFrequency,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn account(id: &str, name: &str) -> BankAccount {
        BankAccount {
            id: id.to_string(),
            name: name.to_string(),
            bank: Bank::NavyFederal,
            last_four: None,
            is_default: false,
        }
    }

    fn strategy() -> UserStrategy {
        UserStrategy {
            paycheck_amount: 2000.0,
            paycheck_frequency: PayFrequency::Biweekly,
            paycheck_bank_account_id: Some("checking".to_string()),
            spending_bank_account_id: Some("spending".to_string()),
            discretionary_budget_monthly: Some(650.0),
            emergency_fund_target: Some(1000.0),
            debt_surplus_percent: Some(0.8),
            savings_surplus_percent: Some(0.2),
            payoff_start_date: Some(date(2026, 1, 1)),
            payoff_start_total_debt: Some(5000.0),
            payoff_target_date: Some(date(2027, 1, 1)),
        }
    }

    fn payment(id: &str, bill: &Bill, due: NaiveDate, amount: f64) -> PaymentWithBill {
        PaymentWithBill {
            payment: BillPayment {
                id: id.to_string(),
                bill_id: bill.id.clone(),
                due_date: due,
                amount,
                status: PaymentStatus::Unpaid,
                paid_at: None,
            },
            bill: bill.clone(),
            debt: None,
        }
    }

    fn bill(id: &str, name: &str, account_id: Option<&str>) -> Bill {
        Bill {
            id: id.to_string(),
            name: name.to_string(),
            category: BillCategory::Utility,
            amount: 100.0,
            due_day: 1,
            is_recurring: true,
            frequency: BillFrequency::Monthly,
            debt_id: None,
            bank_account_id: account_id.map(|s| s.to_string()),
            is_active: true,
            notes: None,
        }
    }

    fn debt(id: &str, rate: f64, account_id: Option<&str>) -> Debt {
        Debt {
            id: id.to_string(),
            name: id.to_string(),
            kind: DebtType::CreditCard,
            status: DebtStatus::Current,
            current_balance: 2000.0,
            original_balance: 2500.0,
            interest_rate: rate,
            effective_rate: None,
            total_repayable: None,
            minimum_payment: 50.0,
            due_day: 5,
            payment_frequency: None,
            deferred_until: None,
            bank_account_id: account_id.map(|s| s.to_string()),
            is_active: true,
            notes: None,
        }
    }

    fn goal() -> SavingsGoal {
        SavingsGoal {
            id: "goal-ef".to_string(),
            name: "Emergency Fund".to_string(),
            target_amount: 1000.0,
            current_amount: 400.0,
            deadline: None,
            step: Some(GoalStep::EmergencyFund),
            notes: None,
        }
    }

    fn inputs() -> PlanInputs {
        let calendar = PayCalendar::new(date(2025, 11, 26));
        let period = calendar.period_for(date(2025, 11, 26));
        let utilities = bill("b-util", "Electric", Some("bills"));
        let streaming = bill("b-stream", "Streaming", None);

        PlanInputs {
            period,
            today: date(2025, 11, 28),
            strategy: strategy(),
            defaults: StrategyDefaults::default(),
            payments: vec![
                payment("p-2", &streaming, date(2025, 12, 5), 30.0),
                payment("p-1", &utilities, date(2025, 11, 28), 170.0),
            ],
            past_due: Vec::new(),
            debts: vec![debt("visa", 24.99, Some("bills")), debt("auto", 6.5, None)],
            bank_accounts: vec![
                account("checking", "Main Checking"),
                account("spending", "Spending"),
                account("bills", "Bills Account"),
            ],
            goals: vec![goal()],
        }
    }

    #[test]
    fn test_plan_totals_and_split() {
        let plan = assemble_plan(&inputs());
        assert_eq!(plan.bills_due_this_period, 200.0);
        assert_eq!(plan.discretionary_this_paycheck, 300.0);
        // 2000 - 200 - 300 = 1500 surplus; savings 20% capped at the $600
        // EF remainder -> 300; debt takes the rest.
        assert_eq!(plan.surplus_split.surplus, 1500.0);
        assert_eq!(plan.surplus_split.savings_allocation, 300.0);
        assert_eq!(plan.surplus_split.debt_allocation, 1200.0);
        assert_eq!(plan.emergency_fund_current, 400.0);
        assert_eq!(plan.emergency_fund_target, 1000.0);
    }

    #[test]
    fn test_plan_step_ordering() {
        let plan = assemble_plan(&inputs());
        let orders: Vec<u32> = plan.steps.iter().map(|s| s.order).collect();
        let mut sorted = orders.clone();
        sorted.sort();
        assert_eq!(orders, sorted);

        // Transfers first, then bill payments by due date, then the extra
        // debt payment, then savings.
        assert_eq!(plan.steps.first().unwrap().kind, StepKind::Transfer);
        assert_eq!(plan.bill_payments[0].bill_payment_id.as_deref(), Some("p-1"));
        assert_eq!(plan.bill_payments[1].bill_payment_id.as_deref(), Some("p-2"));
        assert_eq!(plan.extra_debt_step.as_ref().unwrap().order, 300);
        assert_eq!(plan.savings_step.as_ref().unwrap().order, 350);
    }

    #[test]
    fn test_funding_aggregates_bills_and_extra_payment() {
        let plan = assemble_plan(&inputs());
        // "bills" account needs the $170 electric bill plus the $1200 extra
        // payment to the visa paid from it; the spending account needs the
        // discretionary budget.
        let bills_summary = plan
            .account_summaries
            .iter()
            .find(|s| s.id == "bills")
            .unwrap();
        assert_eq!(bills_summary.required_amount, 1370.0);
        assert_eq!(bills_summary.purpose, vec!["Bills", "Extra Debt Payment"]);

        let spending_summary = plan
            .account_summaries
            .iter()
            .find(|s| s.id == "spending")
            .unwrap();
        assert_eq!(spending_summary.required_amount, 300.0);
        assert_eq!(spending_summary.purpose, vec!["Spending"]);

        // No transfer to the paycheck account itself.
        assert!(plan.account_summaries.iter().all(|s| s.id != "checking"));
    }

    #[test]
    fn test_unaccounted_bills_draw_from_paycheck_account() {
        let plan = assemble_plan(&inputs());
        // The streaming bill has no account: it falls back to the paycheck
        // account and creates no transfer.
        assert!(plan.transfers.iter().all(|t| {
            t.to_account_id.as_deref() != Some("checking")
        }));
        assert_eq!(plan.bills_due_this_period, 200.0);
    }

    #[test]
    fn test_paid_payments_are_excluded() {
        let mut i = inputs();
        i.payments[0].payment.status = PaymentStatus::Paid;
        let plan = assemble_plan(&i);
        assert_eq!(plan.bills_due_this_period, 170.0);
        assert_eq!(plan.bill_payments.len(), 1);
        assert_eq!(plan.unpaid_payments.len(), 1);
    }

    #[test]
    fn test_negative_surplus_produces_no_extra_or_savings_steps() {
        let mut i = inputs();
        i.strategy.paycheck_amount = 400.0;
        let plan = assemble_plan(&i);
        assert!(plan.surplus_split.is_negative);
        assert!(plan.extra_debt_step.is_none());
        assert!(plan.savings_step.is_none());
        // Bills still need their transfers regardless of the shortfall.
        assert!(!plan.transfers.is_empty());
    }

    #[test]
    fn test_avalanche_target_picks_highest_rate() {
        let plan = assemble_plan(&inputs());
        let target = plan.avalanche_target.unwrap();
        assert_eq!(target.debt_id, "visa");
        assert_eq!(target.bank_account_name.as_deref(), Some("Bills Account"));
    }

    #[test]
    fn test_extra_debt_step_skipped_without_target() {
        let mut i = inputs();
        for d in &mut i.debts {
            d.status = DebtStatus::PaidOff;
        }
        let plan = assemble_plan(&i);
        assert!(plan.avalanche_target.is_none());
        assert!(plan.extra_debt_step.is_none());
        // The surplus split itself is unchanged; there is just nowhere to
        // send the debt share.
        assert!(plan.surplus_split.debt_allocation > 0.0);
    }

    #[test]
    fn test_defaults_fill_missing_strategy_fields() {
        let mut i = inputs();
        i.strategy.discretionary_budget_monthly = None;
        i.strategy.emergency_fund_target = None;
        i.strategy.savings_surplus_percent = None;
        let plan = assemble_plan(&i);
        // 750 a month over 26 paychecks.
        assert!((plan.discretionary_this_paycheck - 750.0 * 12.0 / 26.0).abs() < 1e-9);
        assert_eq!(plan.emergency_fund_target, 1000.0);
    }

    #[test]
    fn test_past_due_is_separate_from_period_totals() {
        let mut i = inputs();
        let old_bill = bill("b-old", "Water", None);
        i.past_due = vec![payment("p-old", &old_bill, date(2025, 11, 10), 55.0)];
        let plan = assemble_plan(&i);
        assert_eq!(plan.past_due.len(), 1);
        // The overdue $55 does not inflate the period's bill total or the
        // checklist.
        assert_eq!(plan.bills_due_this_period, 200.0);
        assert!(plan.steps.iter().all(|s| s.id != "p-old"));
    }

    #[test]
    fn test_payoff_progress_embedded() {
        let plan = assemble_plan(&inputs());
        assert_eq!(plan.payoff_progress.current_debt, 4000.0);
        assert_eq!(plan.payoff_progress.debt_paid, Some(1000.0));
    }
}
