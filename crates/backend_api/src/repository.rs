use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use models::{
    AllocationPlan, AppSettings, Bill, BillCategory, BillFrequency, BillPayment, Debt,
    DebtPayment, DebtRef, DebtStatus, DebtType, GoalStep, PayFrequency, PayPeriod,
    PaymentStatus, PaymentWithBill, PayoffOutcome, SavingsGoal, ScheduleTerms,
    ScheduledPayment, StrategyDefaults, UserData,
};
use plan_engine::{
    assemble_plan, due_dates_for_bill, effective_apr, generate_payment_schedule,
    project_payoff, split_payment, PayCalendar, PayoffInputs, PlanInputs,
};

use crate::error::{ApiError, Result};

/// Days either side of a bill's due date within which a BNPL scheduled
/// installment is considered the same payment.
const SCHEDULE_MATCH_DAYS: i64 = 3;

// Request/result shapes shared by the repository and the HTTP handlers.

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDebtInput {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DebtType,
    pub current_balance: f64,
    pub original_balance: f64,
    pub interest_rate: f64,
    pub minimum_payment: f64,
    pub due_day: u32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub number_of_payments: Option<u32>,
    #[serde(default)]
    pub first_payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_frequency: Option<PayFrequency>,
    #[serde(default)]
    pub bank_account_id: Option<String>,
    #[serde(default)]
    pub total_repayable: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillInput {
    pub name: String,
    pub amount: f64,
    pub due_day: u32,
    #[serde(default)]
    pub category: Option<BillCategory>,
    #[serde(default)]
    pub is_recurring: Option<bool>,
    #[serde(default)]
    pub frequency: Option<BillFrequency>,
    #[serde(default)]
    pub debt_id: Option<String>,
    #[serde(default)]
    pub bank_account_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalInput {
    pub name: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: Option<f64>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub step: Option<GoalStep>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtPaymentInput {
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateScheduleInput {
    pub number_of_payments: u32,
    pub first_payment_date: NaiveDate,
    pub frequency: PayFrequency,
    #[serde(default)]
    pub total_amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPaymentResult {
    pub payment: BillPayment,
    pub debt_updated: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraPaymentResult {
    pub new_balance: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineResult {
    pub previous_start_debt: Option<f64>,
    pub new_start_debt: f64,
    pub previous_start_date: Option<NaiveDate>,
    pub new_start_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtDetail {
    pub debt: Debt,
    pub payments: Vec<DebtPayment>,
    pub scheduled_payments: Vec<ScheduledPayment>,
    pub payoff: PayoffOutcome,
}

/// Repository trait over a user's financial records.
///
/// This abstraction allows swapping the in-memory reference implementation
/// for a database-backed one. Every mutating method is one transactional
/// unit: the writes it bundles (payment status + ledger row + balance +
/// schedule flags) all land together or not at all.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn plan_for(&self, user_id: &str, on: Option<NaiveDate>) -> Result<AllocationPlan>;
    async fn mark_payment(
        &self,
        user_id: &str,
        payment_id: &str,
        status: PaymentStatus,
    ) -> Result<MarkPaymentResult>;
    async fn record_extra_payment(
        &self,
        user_id: &str,
        debt_id: &str,
        amount: f64,
    ) -> Result<ExtraPaymentResult>;
    async fn record_debt_payment(
        &self,
        user_id: &str,
        debt_id: &str,
        input: DebtPaymentInput,
    ) -> Result<DebtPayment>;
    async fn update_emergency_fund(&self, user_id: &str, amount: f64) -> Result<f64>;
    async fn recalculate_baseline(
        &self,
        user_id: &str,
        preserve_start_date: bool,
    ) -> Result<BaselineResult>;
    async fn regenerate_schedule(
        &self,
        user_id: &str,
        debt_id: &str,
        input: RegenerateScheduleInput,
    ) -> Result<Debt>;
    async fn create_debt(&self, user_id: &str, input: CreateDebtInput) -> Result<Debt>;
    async fn list_debts(&self, user_id: &str) -> Result<Vec<Debt>>;
    async fn get_debt(&self, user_id: &str, debt_id: &str) -> Result<DebtDetail>;
    async fn create_bill(&self, user_id: &str, input: CreateBillInput) -> Result<Bill>;
    async fn list_bills(&self, user_id: &str) -> Result<Vec<Bill>>;
    async fn create_goal(&self, user_id: &str, input: CreateGoalInput) -> Result<SavingsGoal>;
    async fn list_goals(&self, user_id: &str) -> Result<Vec<SavingsGoal>>;
}

/// In-memory reference implementation. Each user's records live behind one
/// `RwLock`; a mutation takes the write lock once and finishes all of its
/// record writes before releasing it, which is what makes the cascades
/// atomic.
pub struct MemoryRepository {
    calendar: PayCalendar,
    defaults: StrategyDefaults,
    users: RwLock<HashMap<String, UserData>>,
}

impl MemoryRepository {
    pub fn new(reference_paycheck_date: NaiveDate, defaults: StrategyDefaults) -> Self {
        MemoryRepository {
            calendar: PayCalendar::new(reference_paycheck_date),
            defaults,
            users: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_settings(settings: &AppSettings) -> Self {
        Self::new(settings.reference_paycheck_date, settings.defaults.clone())
    }

    pub async fn seed_user(&self, user_id: &str, data: UserData) {
        let mut users = self.users.write().await;
        users.insert(user_id.to_string(), data);
    }

    /// Load a `UserData` JSON seed file for `user_id`.
    pub async fn load_seed_file(&self, user_id: &str, path: &Path) -> Result<()> {
        let raw = std::fs::read_to_string(path)?;
        let data: UserData = serde_json::from_str(&raw)?;
        self.seed_user(user_id, data).await;
        tracing::info!(user_id, path = %path.display(), "seeded user data");
        Ok(())
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// A bill is suppressed when its debt is deferred past the period end.
fn bill_deferred_past(data: &UserData, bill: &Bill, period_end: NaiveDate) -> bool {
    let Some(debt_id) = bill.debt_id.as_deref() else {
        return false;
    };
    let Some(debt) = data.debts.iter().find(|d| d.id == debt_id) else {
        return false;
    };
    debt.status == DebtStatus::Deferred
        && debt.deferred_until.map_or(false, |until| until > period_end)
}

/// Materialize missing `BillPayment` rows for recurring bills due inside the
/// period. Existing rows are left alone, so re-assembly is idempotent.
fn ensure_bill_payments_for_period(data: &mut UserData, period: &PayPeriod) -> usize {
    let mut to_create: Vec<(String, f64, NaiveDate)> = Vec::new();

    for bill in &data.bills {
        if !bill.is_active || !bill.is_recurring {
            continue;
        }
        if bill_deferred_past(data, bill, period.end_date) {
            continue;
        }
        for due_date in due_dates_for_bill(bill, period.start_date, period.end_date) {
            let exists = data
                .bill_payments
                .iter()
                .any(|p| p.bill_id == bill.id && p.due_date == due_date);
            if !exists {
                to_create.push((bill.id.clone(), bill.amount, due_date));
            }
        }
    }

    let created = to_create.len();
    for (bill_id, amount, due_date) in to_create {
        data.bill_payments.push(BillPayment {
            id: new_id(),
            bill_id,
            due_date,
            amount,
            status: PaymentStatus::Unpaid,
            paid_at: None,
        });
    }
    created
}

fn join_payment(data: &UserData, payment: &BillPayment) -> Option<PaymentWithBill> {
    let bill = data.bills.iter().find(|b| b.id == payment.bill_id)?;
    let debt = bill.debt_id.as_deref().and_then(|debt_id| {
        data.debts.iter().find(|d| d.id == debt_id).map(|d| DebtRef {
            id: d.id.clone(),
            name: d.name.clone(),
            kind: d.kind,
            status: d.status,
        })
    });
    Some(PaymentWithBill {
        payment: payment.clone(),
        bill: bill.clone(),
        debt,
    })
}

/// Joined payments due inside `[start, end]`, skipping bills of debts
/// deferred past the period, sorted by due date.
fn payments_in_range(data: &UserData, start: NaiveDate, end: NaiveDate) -> Vec<PaymentWithBill> {
    let mut payments: Vec<PaymentWithBill> = data
        .bill_payments
        .iter()
        .filter(|p| p.due_date >= start && p.due_date <= end)
        .filter_map(|p| join_payment(data, p))
        .filter(|p| !bill_deferred_past(data, &p.bill, end))
        .collect();
    payments.sort_by_key(|p| p.payment.due_date);
    payments
}

/// Unpaid occurrences that were due before `start` (the catch-up list).
fn past_due_payments(data: &UserData, start: NaiveDate) -> Vec<PaymentWithBill> {
    let mut payments: Vec<PaymentWithBill> = data
        .bill_payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Unpaid && p.due_date < start)
        .filter_map(|p| join_payment(data, p))
        .collect();
    payments.sort_by_key(|p| p.payment.due_date);
    payments
}

/// Create the per-installment bills + payments + scheduled rows for a BNPL
/// schedule: one one-time bill and one unpaid occurrence per installment,
/// one-to-one with the scheduled row.
fn create_bnpl_installments(
    data: &mut UserData,
    debt_id: &str,
    debt_name: &str,
    bank_account_id: Option<String>,
    payment_amount: f64,
    payment_dates: &[NaiveDate],
) {
    let count = payment_dates.len();
    for (i, due_date) in payment_dates.iter().enumerate() {
        let number = i + 1;

        data.scheduled_payments.push(ScheduledPayment {
            id: new_id(),
            debt_id: debt_id.to_string(),
            due_date: *due_date,
            amount: payment_amount,
            is_paid: false,
            paid_at: None,
            paid_amount: None,
            notes: Some(format!("Payment {} of {}", number, count)),
        });

        let bill_id = new_id();
        data.bills.push(Bill {
            id: bill_id.clone(),
            name: format!("{} - Payment {} of {}", debt_name, number, count),
            category: BillCategory::Bnpl,
            amount: payment_amount,
            due_day: due_date.day(),
            is_recurring: false,
            frequency: BillFrequency::Once,
            debt_id: Some(debt_id.to_string()),
            bank_account_id: bank_account_id.clone(),
            is_active: true,
            notes: Some(format!("Auto-generated installment for {}", debt_name)),
        });
        data.bill_payments.push(BillPayment {
            id: new_id(),
            bill_id,
            due_date: *due_date,
            amount: payment_amount,
            status: PaymentStatus::Unpaid,
            paid_at: None,
        });
    }
}

#[async_trait]
impl PlanRepository for MemoryRepository {
    async fn plan_for(&self, user_id: &str, on: Option<NaiveDate>) -> Result<AllocationPlan> {
        let as_of = on.unwrap_or_else(today);
        let period = self.calendar.period_for(as_of);

        // Write lock: assembling may lazily materialize bill payments.
        let mut users = self.users.write().await;
        let data = users
            .get_mut(user_id)
            .ok_or_else(|| ApiError::UserNotFound(user_id.to_string()))?;

        let created = ensure_bill_payments_for_period(data, &period);
        if created > 0 {
            tracing::debug!(user_id, created, "materialized bill payments for period");
        }

        let inputs = PlanInputs {
            period,
            today: as_of,
            strategy: data.strategy.clone(),
            defaults: self.defaults.clone(),
            payments: payments_in_range(data, period.start_date, period.end_date),
            past_due: past_due_payments(data, period.start_date),
            debts: data.debts.clone(),
            bank_accounts: data.bank_accounts.clone(),
            goals: data.goals.clone(),
        };

        Ok(assemble_plan(&inputs))
    }

    async fn mark_payment(
        &self,
        user_id: &str,
        payment_id: &str,
        status: PaymentStatus,
    ) -> Result<MarkPaymentResult> {
        match status {
            PaymentStatus::Paid => self.mark_paid(user_id, payment_id).await,
            PaymentStatus::Unpaid => self.mark_unpaid(user_id, payment_id).await,
            PaymentStatus::Skipped => Err(ApiError::Validation(
                "status must be PAID or UNPAID".to_string(),
            )),
        }
    }

    async fn record_extra_payment(
        &self,
        user_id: &str,
        debt_id: &str,
        amount: f64,
    ) -> Result<ExtraPaymentResult> {
        if amount <= 0.0 {
            return Err(ApiError::Validation(
                "Payment amount must be positive".to_string(),
            ));
        }

        let paid_on = today();
        let mut users = self.users.write().await;
        let data = users
            .get_mut(user_id)
            .ok_or_else(|| ApiError::UserNotFound(user_id.to_string()))?;

        let debt = data
            .debts
            .iter_mut()
            .find(|d| d.id == debt_id)
            .ok_or_else(|| ApiError::DebtNotFound(debt_id.to_string()))?;

        let split = split_payment(debt, amount);
        debt.current_balance = split.new_balance;
        let is_bnpl = debt.kind == DebtType::Bnpl;
        let debt_name = debt.name.clone();

        data.debt_payments.push(DebtPayment {
            id: new_id(),
            debt_id: debt_id.to_string(),
            date: paid_on,
            amount,
            principal: split.principal,
            interest: split.interest,
            new_balance: split.new_balance,
            source_payment_id: None,
            notes: Some(format!("Extra payment to {} (avalanche method)", debt_name)),
        });

        // An extra payment that covers the next BNPL installment settles it.
        if is_bnpl {
            let next = data
                .scheduled_payments
                .iter_mut()
                .filter(|sp| sp.debt_id == debt_id && !sp.is_paid && sp.due_date >= paid_on)
                .min_by_key(|sp| sp.due_date);

            if let Some(scheduled) = next {
                if amount >= scheduled.amount {
                    scheduled.is_paid = true;
                    scheduled.paid_at = Some(paid_on);
                    scheduled.paid_amount = Some(amount);

                    let bill_ids: Vec<String> = data
                        .bills
                        .iter()
                        .filter(|b| b.debt_id.as_deref() == Some(debt_id) && b.is_active)
                        .map(|b| b.id.clone())
                        .collect();
                    let earliest_unpaid = data
                        .bill_payments
                        .iter_mut()
                        .filter(|p| {
                            bill_ids.contains(&p.bill_id) && p.status == PaymentStatus::Unpaid
                        })
                        .min_by_key(|p| p.due_date);
                    if let Some(payment) = earliest_unpaid {
                        payment.status = PaymentStatus::Paid;
                        payment.paid_at = Some(paid_on);
                    }
                }
            }
        }

        tracing::info!(user_id, debt_id, amount, "recorded extra debt payment");
        Ok(ExtraPaymentResult {
            new_balance: split.new_balance,
        })
    }

    async fn record_debt_payment(
        &self,
        user_id: &str,
        debt_id: &str,
        input: DebtPaymentInput,
    ) -> Result<DebtPayment> {
        if input.amount <= 0.0 {
            return Err(ApiError::Validation(
                "Payment amount must be positive".to_string(),
            ));
        }

        let mut users = self.users.write().await;
        let data = users
            .get_mut(user_id)
            .ok_or_else(|| ApiError::UserNotFound(user_id.to_string()))?;

        let debt = data
            .debts
            .iter_mut()
            .find(|d| d.id == debt_id)
            .ok_or_else(|| ApiError::DebtNotFound(debt_id.to_string()))?;

        let split = split_payment(debt, input.amount);
        debt.current_balance = split.new_balance;

        let payment = DebtPayment {
            id: new_id(),
            debt_id: debt_id.to_string(),
            date: input.date,
            amount: input.amount,
            principal: split.principal,
            interest: split.interest,
            new_balance: split.new_balance,
            source_payment_id: None,
            notes: input.notes,
        };
        data.debt_payments.push(payment.clone());

        // A manual payment also clears the debt's bill occurrences for that
        // month; these direct status writes do not cascade back into the
        // ledger.
        let bill_ids: Vec<String> = data
            .bills
            .iter()
            .filter(|b| b.debt_id.as_deref() == Some(debt_id))
            .map(|b| b.id.clone())
            .collect();
        for p in data.bill_payments.iter_mut() {
            if bill_ids.contains(&p.bill_id)
                && p.status == PaymentStatus::Unpaid
                && p.due_date.year() == input.date.year()
                && p.due_date.month() == input.date.month()
            {
                p.status = PaymentStatus::Paid;
                p.paid_at = Some(input.date);
            }
        }

        Ok(payment)
    }

    async fn update_emergency_fund(&self, user_id: &str, amount: f64) -> Result<f64> {
        if amount <= 0.0 {
            return Err(ApiError::Validation("Amount must be positive".to_string()));
        }

        let mut users = self.users.write().await;
        let data = users
            .get_mut(user_id)
            .ok_or_else(|| ApiError::UserNotFound(user_id.to_string()))?;

        if let Some(goal) = data.goals.iter_mut().find(|g| g.is_emergency_fund()) {
            goal.current_amount += amount;
            return Ok(goal.current_amount);
        }

        data.goals.push(SavingsGoal {
            id: new_id(),
            name: "Emergency Fund".to_string(),
            target_amount: self.defaults.emergency_fund_target,
            current_amount: amount,
            deadline: None,
            step: Some(GoalStep::EmergencyFund),
            notes: None,
        });
        Ok(amount)
    }

    async fn recalculate_baseline(
        &self,
        user_id: &str,
        preserve_start_date: bool,
    ) -> Result<BaselineResult> {
        let mut users = self.users.write().await;
        let data = users
            .get_mut(user_id)
            .ok_or_else(|| ApiError::UserNotFound(user_id.to_string()))?;

        let total_debt: f64 = data
            .debts
            .iter()
            .filter(|d| d.is_active)
            .map(|d| d.current_balance)
            .sum();

        let previous_start_debt = data.strategy.payoff_start_total_debt;
        let previous_start_date = data.strategy.payoff_start_date;
        let new_start_date = if preserve_start_date {
            previous_start_date.unwrap_or_else(today)
        } else {
            today()
        };

        data.strategy.payoff_start_total_debt = Some(total_debt);
        data.strategy.payoff_start_date = Some(new_start_date);

        tracing::info!(user_id, total_debt, "re-synced payoff baseline");
        Ok(BaselineResult {
            previous_start_debt,
            new_start_debt: total_debt,
            previous_start_date,
            new_start_date,
        })
    }

    async fn regenerate_schedule(
        &self,
        user_id: &str,
        debt_id: &str,
        input: RegenerateScheduleInput,
    ) -> Result<Debt> {
        let mut users = self.users.write().await;
        let data = users
            .get_mut(user_id)
            .ok_or_else(|| ApiError::UserNotFound(user_id.to_string()))?;

        let debt_index = data
            .debts
            .iter()
            .position(|d| d.id == debt_id)
            .ok_or_else(|| ApiError::DebtNotFound(debt_id.to_string()))?;

        if data.debts[debt_index].kind != DebtType::Bnpl {
            return Err(ApiError::State(
                "Cannot regenerate a schedule for a non-BNPL debt".to_string(),
            ));
        }

        let total_amount = input
            .total_amount
            .or(data.debts[debt_index].total_repayable)
            .unwrap_or(data.debts[debt_index].current_balance);

        let schedule = generate_payment_schedule(&ScheduleTerms {
            total_amount,
            number_of_payments: input.number_of_payments,
            first_payment_date: input.first_payment_date,
            frequency: input.frequency,
        })?;

        // Drop the unpaid remainder of the old schedule. Paid installments
        // and their bill history stay.
        data.scheduled_payments
            .retain(|sp| sp.debt_id != debt_id || sp.is_paid);

        let debt_bill_ids: Vec<String> = data
            .bills
            .iter()
            .filter(|b| b.debt_id.as_deref() == Some(debt_id))
            .map(|b| b.id.clone())
            .collect();
        data.bill_payments.retain(|p| {
            !(debt_bill_ids.contains(&p.bill_id) && p.status == PaymentStatus::Unpaid)
        });
        // Installment bills with no occurrences left are orphans.
        let remaining_bill_ids: Vec<String> = data
            .bill_payments
            .iter()
            .map(|p| p.bill_id.clone())
            .collect();
        data.bills.retain(|b| {
            b.debt_id.as_deref() != Some(debt_id) || remaining_bill_ids.contains(&b.id)
        });

        let (debt_name, bank_account_id) = {
            let debt = &data.debts[debt_index];
            (debt.name.clone(), debt.bank_account_id.clone())
        };
        create_bnpl_installments(
            data,
            debt_id,
            &debt_name,
            bank_account_id,
            schedule.payment_amount,
            &schedule.payment_dates,
        );

        let debt = &mut data.debts[debt_index];
        debt.minimum_payment = schedule.payment_amount;
        debt.payment_frequency = Some(input.frequency);
        debt.effective_rate = match debt.total_repayable {
            Some(total) if (total - debt.current_balance).abs() >= 0.01 => Some(effective_apr(
                debt.current_balance,
                total,
                input.number_of_payments,
                input.frequency,
            )),
            _ => None,
        };

        tracing::info!(
            user_id,
            debt_id,
            installments = input.number_of_payments,
            "regenerated BNPL schedule"
        );
        Ok(debt.clone())
    }

    async fn create_debt(&self, user_id: &str, input: CreateDebtInput) -> Result<Debt> {
        if input.current_balance < 0.0 || input.minimum_payment < 0.0 {
            return Err(ApiError::Validation(
                "Balances and payments must be non-negative".to_string(),
            ));
        }

        let mut users = self.users.write().await;
        let data = users
            .get_mut(user_id)
            .ok_or_else(|| ApiError::UserNotFound(user_id.to_string()))?;

        if data.debts.iter().any(|d| d.name == input.name) {
            return Err(ApiError::Validation(format!(
                "A debt named \"{}\" already exists",
                input.name
            )));
        }

        if let Some(account_id) = input.bank_account_id.as_deref() {
            if !data.bank_accounts.iter().any(|ba| ba.id == account_id) {
                return Err(ApiError::InvalidReference(
                    "Invalid bank account reference".to_string(),
                ));
            }
        }

        let is_bnpl = input.kind == DebtType::Bnpl;
        if is_bnpl
            && (input.number_of_payments.is_none()
                || input.first_payment_date.is_none()
                || input.payment_frequency.is_none())
        {
            return Err(ApiError::Validation(
                "BNPL debts require numberOfPayments, firstPaymentDate, and paymentFrequency"
                    .to_string(),
            ));
        }

        let effective_rate = match (is_bnpl, input.total_repayable) {
            (true, Some(total)) if (total - input.current_balance).abs() >= 0.01 => {
                Some(effective_apr(
                    input.current_balance,
                    total,
                    input.number_of_payments.unwrap_or(0),
                    input.payment_frequency.unwrap_or(PayFrequency::Monthly),
                ))
            }
            _ => None,
        };

        let debt = Debt {
            id: new_id(),
            name: input.name.clone(),
            kind: input.kind,
            status: DebtStatus::Current,
            current_balance: input.current_balance,
            original_balance: input.original_balance,
            interest_rate: input.interest_rate,
            effective_rate,
            total_repayable: input.total_repayable,
            minimum_payment: input.minimum_payment,
            due_day: input.due_day,
            payment_frequency: if is_bnpl { input.payment_frequency } else { None },
            deferred_until: None,
            bank_account_id: input.bank_account_id.clone(),
            is_active: true,
            notes: input.notes.clone(),
        };
        data.debts.push(debt.clone());

        if is_bnpl {
            let schedule = generate_payment_schedule(&ScheduleTerms {
                total_amount: input.current_balance,
                number_of_payments: input.number_of_payments.unwrap_or(0),
                first_payment_date: input.first_payment_date.unwrap_or_else(today),
                frequency: input.payment_frequency.unwrap_or(PayFrequency::Monthly),
            })?;
            create_bnpl_installments(
                data,
                &debt.id,
                &debt.name,
                input.bank_account_id,
                schedule.payment_amount,
                &schedule.payment_dates,
            );
        } else {
            // The minimum payment shows up as a recurring monthly bill.
            data.bills.push(Bill {
                id: new_id(),
                name: format!("{} Payment", input.name),
                category: input.kind.bill_category(),
                amount: input.minimum_payment,
                due_day: input.due_day,
                is_recurring: true,
                frequency: BillFrequency::Monthly,
                debt_id: Some(debt.id.clone()),
                bank_account_id: input.bank_account_id,
                is_active: true,
                notes: Some(format!("Auto-generated bill for {}", input.name)),
            });
        }

        tracing::info!(user_id, debt_id = %debt.id, "created debt");
        Ok(debt)
    }

    async fn list_debts(&self, user_id: &str) -> Result<Vec<Debt>> {
        let users = self.users.read().await;
        let data = users
            .get(user_id)
            .ok_or_else(|| ApiError::UserNotFound(user_id.to_string()))?;

        let mut debts: Vec<Debt> = data.debts.iter().filter(|d| d.is_active).cloned().collect();
        debts.sort_by(|a, b| {
            b.ranking_rate()
                .partial_cmp(&a.ranking_rate())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(debts)
    }

    async fn get_debt(&self, user_id: &str, debt_id: &str) -> Result<DebtDetail> {
        let users = self.users.read().await;
        let data = users
            .get(user_id)
            .ok_or_else(|| ApiError::UserNotFound(user_id.to_string()))?;

        let debt = data
            .debts
            .iter()
            .find(|d| d.id == debt_id)
            .cloned()
            .ok_or_else(|| ApiError::DebtNotFound(debt_id.to_string()))?;

        let mut payments: Vec<DebtPayment> = data
            .debt_payments
            .iter()
            .filter(|p| p.debt_id == debt_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.date.cmp(&a.date));

        let mut scheduled: Vec<ScheduledPayment> = data
            .scheduled_payments
            .iter()
            .filter(|sp| sp.debt_id == debt_id)
            .cloned()
            .collect();
        scheduled.sort_by_key(|sp| sp.due_date);

        let payoff = project_payoff(
            &PayoffInputs {
                balance: debt.current_balance,
                apr: debt.interest_rate,
                minimum_payment: debt.minimum_payment,
                extra_payment: 0.0,
            },
            today(),
        );

        Ok(DebtDetail {
            debt,
            payments,
            scheduled_payments: scheduled,
            payoff,
        })
    }

    async fn create_bill(&self, user_id: &str, input: CreateBillInput) -> Result<Bill> {
        if input.amount <= 0.0 {
            return Err(ApiError::Validation(
                "Amount must be a positive number".to_string(),
            ));
        }
        if input.due_day < 1 || input.due_day > 31 {
            return Err(ApiError::Validation(
                "Due day must be between 1 and 31".to_string(),
            ));
        }

        let mut users = self.users.write().await;
        let data = users
            .get_mut(user_id)
            .ok_or_else(|| ApiError::UserNotFound(user_id.to_string()))?;

        if let Some(debt_id) = input.debt_id.as_deref() {
            if !data.debts.iter().any(|d| d.id == debt_id) {
                return Err(ApiError::InvalidReference(
                    "Invalid debt reference".to_string(),
                ));
            }
        }
        if let Some(account_id) = input.bank_account_id.as_deref() {
            if !data.bank_accounts.iter().any(|ba| ba.id == account_id) {
                return Err(ApiError::InvalidReference(
                    "Invalid bank account reference".to_string(),
                ));
            }
        }

        let bill = Bill {
            id: new_id(),
            name: input.name,
            category: input.category.unwrap_or(BillCategory::Other),
            amount: input.amount,
            due_day: input.due_day,
            is_recurring: input.is_recurring.unwrap_or(true),
            frequency: input.frequency.unwrap_or(BillFrequency::Monthly),
            debt_id: input.debt_id,
            bank_account_id: input.bank_account_id,
            is_active: true,
            notes: input.notes,
        };
        data.bills.push(bill.clone());
        Ok(bill)
    }

    async fn list_bills(&self, user_id: &str) -> Result<Vec<Bill>> {
        let users = self.users.read().await;
        let data = users
            .get(user_id)
            .ok_or_else(|| ApiError::UserNotFound(user_id.to_string()))?;

        let mut bills: Vec<Bill> = data.bills.iter().filter(|b| b.is_active).cloned().collect();
        bills.sort_by_key(|b| b.due_day);
        Ok(bills)
    }

    async fn create_goal(&self, user_id: &str, input: CreateGoalInput) -> Result<SavingsGoal> {
        if input.target_amount <= 0.0 {
            return Err(ApiError::Validation(
                "Target amount must be a positive number".to_string(),
            ));
        }

        let mut users = self.users.write().await;
        let data = users
            .get_mut(user_id)
            .ok_or_else(|| ApiError::UserNotFound(user_id.to_string()))?;

        let goal = SavingsGoal {
            id: new_id(),
            name: input.name,
            target_amount: input.target_amount,
            current_amount: input.current_amount.unwrap_or(0.0),
            deadline: input.deadline,
            step: input.step,
            notes: input.notes,
        };
        data.goals.push(goal.clone());
        Ok(goal)
    }

    async fn list_goals(&self, user_id: &str) -> Result<Vec<SavingsGoal>> {
        let users = self.users.read().await;
        let data = users
            .get(user_id)
            .ok_or_else(|| ApiError::UserNotFound(user_id.to_string()))?;
        Ok(data.goals.clone())
    }
}

impl MemoryRepository {
    /// Mark a bill payment paid and cascade: for debt-linked bills append a
    /// ledger row (back-referencing this payment), move the balance, and
    /// settle the matching BNPL installment. One lock, one transaction.
    async fn mark_paid(&self, user_id: &str, payment_id: &str) -> Result<MarkPaymentResult> {
        let paid_on = today();
        let mut users = self.users.write().await;
        let data = users
            .get_mut(user_id)
            .ok_or_else(|| ApiError::UserNotFound(user_id.to_string()))?;

        let (amount, due_date, bill_id) = {
            let payment = data
                .bill_payments
                .iter()
                .find(|p| p.id == payment_id)
                .ok_or_else(|| ApiError::PaymentNotFound(payment_id.to_string()))?;
            // Re-marking a paid payment is a no-op, not an error.
            if payment.status == PaymentStatus::Paid {
                return Ok(MarkPaymentResult {
                    payment: payment.clone(),
                    debt_updated: false,
                });
            }
            (payment.amount, payment.due_date, payment.bill_id.clone())
        };

        let bill = data
            .bills
            .iter()
            .find(|b| b.id == bill_id)
            .ok_or_else(|| ApiError::BillNotFound(bill_id.clone()))?;
        let debt_id = bill.debt_id.clone();
        let bill_name = bill.name.clone();

        let mut debt_updated = false;
        if let Some(debt_id) = debt_id {
            let debt = data
                .debts
                .iter_mut()
                .find(|d| d.id == debt_id)
                .ok_or_else(|| ApiError::DebtNotFound(debt_id.clone()))?;

            let split = split_payment(debt, amount);
            debt.current_balance = split.new_balance;
            let is_bnpl = debt.kind == DebtType::Bnpl;

            data.debt_payments.push(DebtPayment {
                id: new_id(),
                debt_id: debt_id.clone(),
                date: paid_on,
                amount,
                principal: split.principal,
                interest: split.interest,
                new_balance: split.new_balance,
                source_payment_id: Some(payment_id.to_string()),
                notes: Some(format!("Auto-logged from bill payment: {}", bill_name)),
            });

            if is_bnpl {
                // Settle the nearest unpaid installment within the match
                // window of the bill's due date.
                let nearest = data
                    .scheduled_payments
                    .iter_mut()
                    .filter(|sp| sp.debt_id == debt_id && !sp.is_paid)
                    .filter(|sp| (sp.due_date - due_date).num_days().abs() <= SCHEDULE_MATCH_DAYS)
                    .min_by_key(|sp| (sp.due_date - due_date).num_days().abs());
                if let Some(scheduled) = nearest {
                    scheduled.is_paid = true;
                    scheduled.paid_at = Some(paid_on);
                    scheduled.paid_amount = Some(amount);
                }
            }

            debt_updated = true;
        }

        let payment = data
            .bill_payments
            .iter_mut()
            .find(|p| p.id == payment_id)
            .ok_or_else(|| ApiError::PaymentNotFound(payment_id.to_string()))?;
        payment.status = PaymentStatus::Paid;
        payment.paid_at = Some(paid_on);

        tracing::info!(user_id, payment_id, debt_updated, "marked bill payment paid");
        Ok(MarkPaymentResult {
            payment: payment.clone(),
            debt_updated,
        })
    }

    /// Reverse a paid bill payment: the ledger row created by the paid
    /// toggle is found by its back-reference and deleted, the balance gets
    /// its principal back, and the settled BNPL installment is re-opened.
    async fn mark_unpaid(&self, user_id: &str, payment_id: &str) -> Result<MarkPaymentResult> {
        let mut users = self.users.write().await;
        let data = users
            .get_mut(user_id)
            .ok_or_else(|| ApiError::UserNotFound(user_id.to_string()))?;

        let was_paid = {
            let payment = data
                .bill_payments
                .iter()
                .find(|p| p.id == payment_id)
                .ok_or_else(|| ApiError::PaymentNotFound(payment_id.to_string()))?;
            payment.status == PaymentStatus::Paid
        };

        let mut debt_updated = false;
        if was_paid {
            let ledger_index = data
                .debt_payments
                .iter()
                .position(|dp| dp.source_payment_id.as_deref() == Some(payment_id));

            if let Some(index) = ledger_index {
                let row = data.debt_payments.remove(index);
                if let Some(debt) = data.debts.iter_mut().find(|d| d.id == row.debt_id) {
                    debt.current_balance =
                        plan_engine::round2(debt.current_balance + row.principal);
                    if debt.kind == DebtType::Bnpl {
                        let settled = data.scheduled_payments.iter_mut().find(|sp| {
                            sp.debt_id == row.debt_id
                                && sp.is_paid
                                && sp.paid_at == Some(row.date)
                                && sp.paid_amount == Some(row.amount)
                        });
                        if let Some(scheduled) = settled {
                            scheduled.is_paid = false;
                            scheduled.paid_at = None;
                            scheduled.paid_amount = None;
                        }
                    }
                    debt_updated = true;
                }
            }
        }

        let payment = data
            .bill_payments
            .iter_mut()
            .find(|p| p.id == payment_id)
            .ok_or_else(|| ApiError::PaymentNotFound(payment_id.to_string()))?;
        payment.status = PaymentStatus::Unpaid;
        payment.paid_at = None;

        tracing::info!(user_id, payment_id, debt_updated, "marked bill payment unpaid");
        Ok(MarkPaymentResult {
            payment: payment.clone(),
            debt_updated,
        })
    }
}
