use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::{fs, path::PathBuf};

use models::{
    AppSettings, BillPayment, PaymentStatus, PaymentWithBill, PayPeriod, StrategyDefaults,
    UserData,
};
use plan_engine::{
    assemble_plan, due_dates_for_bill, pay_periods::format_period, PayCalendar, PlanInputs,
};

#[derive(Parser, Debug)]
#[command(
    name = "print-plan",
    about = "Assemble and print the paycheck allocation plan from a UserData seed file."
)]
struct Args {
    /// Path to a UserData JSON file (the persistence-boundary shape)
    #[arg(short, long)]
    seed: PathBuf,

    /// Optional settings.json path (reference paycheck date, defaults)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// As-of date (YYYY-MM-DD); defaults to today
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Print the full plan as JSON instead of a checklist
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = settings_loader::load_settings_with_fallback(args.settings.as_ref())?
        .unwrap_or_else(default_settings);

    let raw = fs::read_to_string(&args.seed)
        .with_context(|| format!("reading {}", args.seed.display()))?;
    let data: UserData = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", args.seed.display()))?;

    let today = args.date.unwrap_or_else(|| Local::now().date_naive());
    let calendar = PayCalendar::new(settings.reference_paycheck_date);
    let period = calendar.period_for(today);

    let inputs = PlanInputs {
        period,
        today,
        strategy: data.strategy.clone(),
        defaults: settings.defaults.clone(),
        payments: payments_in_period(&data, &period),
        past_due: past_due_payments(&data, period.start_date),
        debts: data.debts.clone(),
        bank_accounts: data.bank_accounts.clone(),
        goals: data.goals.clone(),
    };
    let plan = assemble_plan(&inputs);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("Pay period: {}", format_period(&plan.period));
    println!("Paycheck: ${:.2}", plan.paycheck_amount);
    println!("Bills due: ${:.2}", plan.bills_due_this_period);
    println!("Discretionary: ${:.2}", plan.discretionary_this_paycheck);
    if plan.surplus_split.is_negative {
        println!(
            "Shortfall: ${:.2} (no savings or debt allocation this period)",
            -plan.surplus_split.surplus
        );
    } else {
        println!(
            "Surplus: ${:.2} (savings ${:.2}, extra debt ${:.2})",
            plan.surplus_split.surplus,
            plan.surplus_split.savings_allocation,
            plan.surplus_split.debt_allocation
        );
    }
    if let Some(target) = &plan.avalanche_target {
        println!(
            "Avalanche target: {} at {:.2}% (${:.2} remaining)",
            target.debt_name, target.interest_rate, target.current_balance
        );
    }
    println!();

    println!("Checklist:");
    for step in &plan.steps {
        println!("  [ ] {}", step.label);
    }

    if !plan.past_due.is_empty() {
        println!();
        println!("Past due (catch up outside the period plan):");
        for p in &plan.past_due {
            println!(
                "  [ ] {} - {} - ${:.2}",
                p.payment.due_date, p.bill.name, p.payment.amount
            );
        }
    }

    let progress = &plan.payoff_progress;
    if let (Some(pct), Some(on_track)) = (progress.debt_progress_pct, progress.on_track) {
        println!();
        println!(
            "Payoff progress: {:.1}% of ${:.2} ({})",
            pct * 100.0,
            progress.adjusted_start_debt.unwrap_or(0.0),
            if on_track { "on track" } else { "behind" }
        );
    }

    Ok(())
}

/// Bill payments due inside the period: the stored occurrences plus
/// ephemeral ones expanded from recurring bills that have no stored row
/// yet. Generated ids are deterministic so re-runs agree.
fn payments_in_period(data: &UserData, period: &PayPeriod) -> Vec<PaymentWithBill> {
    let mut payments: Vec<PaymentWithBill> = Vec::new();

    for p in &data.bill_payments {
        if p.due_date >= period.start_date && p.due_date <= period.end_date {
            if let Some(joined) = join_payment(data, p.clone()) {
                if !deferred_past(data, &joined, period.end_date) {
                    payments.push(joined);
                }
            }
        }
    }

    for bill in &data.bills {
        if !bill.is_active || !bill.is_recurring {
            continue;
        }
        for due_date in due_dates_for_bill(bill, period.start_date, period.end_date) {
            let exists = data
                .bill_payments
                .iter()
                .any(|p| p.bill_id == bill.id && p.due_date == due_date);
            if exists {
                continue;
            }
            let generated = BillPayment {
                id: format!("gen-{}-{}", bill.id, due_date),
                bill_id: bill.id.clone(),
                due_date,
                amount: bill.amount,
                status: PaymentStatus::Unpaid,
                paid_at: None,
            };
            if let Some(joined) = join_payment(data, generated) {
                if !deferred_past(data, &joined, period.end_date) {
                    payments.push(joined);
                }
            }
        }
    }

    payments.sort_by_key(|p| p.payment.due_date);
    payments
}

fn past_due_payments(data: &UserData, start: NaiveDate) -> Vec<PaymentWithBill> {
    let mut payments: Vec<PaymentWithBill> = data
        .bill_payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Unpaid && p.due_date < start)
        .filter_map(|p| join_payment(data, p.clone()))
        .collect();
    payments.sort_by_key(|p| p.payment.due_date);
    payments
}

/// Bills of debts deferred past the period end stay off the checklist.
fn deferred_past(data: &UserData, joined: &PaymentWithBill, period_end: NaiveDate) -> bool {
    let Some(debt_ref) = &joined.debt else {
        return false;
    };
    data.debts.iter().any(|d| {
        d.id == debt_ref.id
            && d.status == models::DebtStatus::Deferred
            && d.deferred_until.map_or(false, |until| until > period_end)
    })
}

fn join_payment(data: &UserData, payment: BillPayment) -> Option<PaymentWithBill> {
    let bill = data.bills.iter().find(|b| b.id == payment.bill_id)?.clone();
    let debt = bill.debt_id.as_deref().and_then(|debt_id| {
        data.debts
            .iter()
            .find(|d| d.id == debt_id)
            .map(|d| models::DebtRef {
                id: d.id.clone(),
                name: d.name.clone(),
                kind: d.kind,
                status: d.status,
            })
    });
    Some(PaymentWithBill {
        payment,
        bill,
        debt,
    })
}

/// Fallback when no settings.json is found anywhere.
fn default_settings() -> AppSettings {
    AppSettings {
        reference_paycheck_date: NaiveDate::from_ymd_opt(2025, 11, 26).unwrap(),
        host: "127.0.0.1".to_string(),
        port: 3000,
        seed_file: None,
        defaults: StrategyDefaults::default(),
    }
}
