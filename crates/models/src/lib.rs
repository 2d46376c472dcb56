use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// Shared enums (closed sets; wire values match the stored records)

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayFrequency {
	Weekly,
	Biweekly,
	Monthly,
}

impl PayFrequency {
	pub fn paychecks_per_year(&self) -> u32 {
		match self {
			PayFrequency::Weekly => 52,
			PayFrequency::Biweekly => 26,
			PayFrequency::Monthly => 12,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillFrequency {
	Once,
	Weekly,
	Biweekly,
	Monthly,
	Yearly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillCategory {
	Subscription,
	Utility,
	Loan,
	Bnpl,
	Insurance,
	CreditCard,
	Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebtType {
	CreditCard,
	AutoLoan,
	StudentLoan,
	PersonalLoan,
	Bnpl,
	Mortgage,
	Other,
}

impl DebtType {
	/// Category of the auto-created minimum-payment bill for this debt type.
	pub fn bill_category(&self) -> BillCategory {
		match self {
			DebtType::CreditCard => BillCategory::CreditCard,
			DebtType::Bnpl => BillCategory::Bnpl,
			DebtType::AutoLoan
			| DebtType::StudentLoan
			| DebtType::PersonalLoan
			| DebtType::Mortgage => BillCategory::Loan,
			DebtType::Other => BillCategory::Other,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebtStatus {
	Current,
	Deferred,
	PastDue,
	InCollections,
	PaidOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
	Unpaid,
	Paid,
	Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Bank {
	NavyFederal,
	Pnc,
	CapitalOne,
	Truist,
	Chase,
	BankOfAmerica,
	WellsFargo,
	Other,
}

/// Nine-step money-order ladder a savings goal can be pinned to.
/// The EMERGENCY_FUND step marks the goal the surplus splitter feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStep {
	DeductiblesCovered,
	EmployerMatch,
	HighInterestDebt,
	EmergencyFund,
	RothHsa,
	MaxRetirement,
	Hyperaccumulation,
	PrepayFuture,
	PrepayLowInterest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepKind {
	Transfer,
	BillPayment,
	ExtraDebtPayment,
	SavingsTransfer,
}

// Stored records

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
	pub id: String,
	pub name: String,
	pub bank: Bank,
	#[serde(default)]
	pub last_four: Option<String>,
	#[serde(default)]
	pub is_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
	pub id: String,
	pub name: String,
	pub category: BillCategory,
	pub amount: f64,
	/// Day of month the bill is due (1-31).
	pub due_day: u32,
	pub is_recurring: bool,
	pub frequency: BillFrequency,
	#[serde(default)]
	pub debt_id: Option<String>,
	#[serde(default)]
	pub bank_account_id: Option<String>,
	#[serde(default = "default_true")]
	pub is_active: bool,
	#[serde(default)]
	pub notes: Option<String>,
}

/// One concrete occurrence of a bill inside a period. Created lazily;
/// only `status` and `paid_at` mutate after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillPayment {
	pub id: String,
	pub bill_id: String,
	pub due_date: NaiveDate,
	pub amount: f64,
	pub status: PaymentStatus,
	#[serde(default)]
	pub paid_at: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
	pub id: String,
	pub name: String,
	#[serde(rename = "type")]
	pub kind: DebtType,
	pub status: DebtStatus,
	pub current_balance: f64,
	pub original_balance: f64,
	/// Nominal APR percent. 0 for interest-free loans.
	pub interest_rate: f64,
	/// Inferred APR percent for installment loans whose total repayable
	/// exceeds the principal. Only meaningful for BNPL debts.
	#[serde(default)]
	pub effective_rate: Option<f64>,
	#[serde(default)]
	pub total_repayable: Option<f64>,
	pub minimum_payment: f64,
	pub due_day: u32,
	#[serde(default)]
	pub payment_frequency: Option<PayFrequency>,
	#[serde(default)]
	pub deferred_until: Option<NaiveDate>,
	#[serde(default)]
	pub bank_account_id: Option<String>,
	#[serde(default = "default_true")]
	pub is_active: bool,
	#[serde(default)]
	pub notes: Option<String>,
}

impl Debt {
	/// The rate the avalanche ordering ranks by: whichever of the nominal
	/// and inferred rates is higher.
	pub fn ranking_rate(&self) -> f64 {
		self.effective_rate.unwrap_or(0.0).max(self.interest_rate.max(0.0))
	}
}

/// Append-only ledger row. `source_payment_id` back-references the bill
/// payment whose toggle created this row, so a reversal removes exactly
/// this row instead of matching on `(debt, date, amount)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtPayment {
	pub id: String,
	pub debt_id: String,
	pub date: NaiveDate,
	pub amount: f64,
	pub principal: f64,
	pub interest: f64,
	pub new_balance: f64,
	#[serde(default)]
	pub source_payment_id: Option<String>,
	#[serde(default)]
	pub notes: Option<String>,
}

/// A planned installment of a BNPL loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPayment {
	pub id: String,
	pub debt_id: String,
	pub due_date: NaiveDate,
	pub amount: f64,
	#[serde(default)]
	pub is_paid: bool,
	#[serde(default)]
	pub paid_at: Option<NaiveDate>,
	#[serde(default)]
	pub paid_amount: Option<f64>,
	#[serde(default)]
	pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
	pub id: String,
	pub name: String,
	pub target_amount: f64,
	pub current_amount: f64,
	#[serde(default)]
	pub deadline: Option<NaiveDate>,
	#[serde(default)]
	pub step: Option<GoalStep>,
	#[serde(default)]
	pub notes: Option<String>,
}

impl SavingsGoal {
	/// The emergency fund is the goal pinned to the EMERGENCY_FUND step,
	/// falling back to a name match for goals created before steps existed.
	pub fn is_emergency_fund(&self) -> bool {
		self.step == Some(GoalStep::EmergencyFund)
			|| self.name.to_lowercase().contains("emergency")
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStrategy {
	pub paycheck_amount: f64,
	pub paycheck_frequency: PayFrequency,
	#[serde(default)]
	pub paycheck_bank_account_id: Option<String>,
	#[serde(default)]
	pub spending_bank_account_id: Option<String>,
	#[serde(default)]
	pub discretionary_budget_monthly: Option<f64>,
	#[serde(default)]
	pub emergency_fund_target: Option<f64>,
	/// Informational: the split formula gives debt the remainder after the
	/// capped savings allocation, not `surplus * debt_surplus_percent`.
	#[serde(default)]
	pub debt_surplus_percent: Option<f64>,
	#[serde(default)]
	pub savings_surplus_percent: Option<f64>,
	#[serde(default)]
	pub payoff_start_date: Option<NaiveDate>,
	#[serde(default)]
	pub payoff_start_total_debt: Option<f64>,
	#[serde(default)]
	pub payoff_target_date: Option<NaiveDate>,
}

// Joined views

/// Slim debt reference carried alongside a joined bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtRef {
	pub id: String,
	pub name: String,
	#[serde(rename = "type")]
	pub kind: DebtType,
	pub status: DebtStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWithBill {
	pub payment: BillPayment,
	pub bill: Bill,
	#[serde(default)]
	pub debt: Option<DebtRef>,
}

// Engine inputs/outputs

/// Inclusive 14-day window anchored to a biweekly paycheck date.
/// Derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayPeriod {
	pub start_date: NaiveDate,
	pub end_date: NaiveDate,
	pub paycheck_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurplusSplit {
	pub surplus: f64,
	pub savings_allocation: f64,
	pub debt_allocation: f64,
	pub is_negative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvalancheTarget {
	pub debt_id: String,
	pub debt_name: String,
	pub bank_account_id: Option<String>,
	pub bank_account_name: Option<String>,
	pub interest_rate: f64,
	pub current_balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffProgress {
	#[serde(default)]
	pub start_date: Option<NaiveDate>,
	#[serde(default)]
	pub target_date: Option<NaiveDate>,
	#[serde(default)]
	pub start_debt: Option<f64>,
	pub current_debt: f64,
	#[serde(default)]
	pub debt_paid: Option<f64>,
	#[serde(default)]
	pub debt_added: Option<f64>,
	#[serde(default)]
	pub adjusted_start_debt: Option<f64>,
	#[serde(default)]
	pub debt_progress_pct: Option<f64>,
	#[serde(default)]
	pub time_progress_pct: Option<f64>,
	#[serde(default)]
	pub on_track: Option<bool>,
	#[serde(default)]
	pub months_remaining: Option<i64>,
	#[serde(default)]
	pub baseline_stale: Option<bool>,
}

/// One entry of the money-movement checklist. Completion state is the
/// caller's concern, keyed by period start + step id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
	pub id: String,
	#[serde(rename = "type")]
	pub kind: StepKind,
	pub order: u32,
	pub label: String,
	pub amount: f64,
	#[serde(default)]
	pub from_account_id: Option<String>,
	#[serde(default)]
	pub from_account_name: Option<String>,
	#[serde(default)]
	pub to_account_id: Option<String>,
	#[serde(default)]
	pub to_account_name: Option<String>,
	#[serde(default)]
	pub bill_payment_id: Option<String>,
	#[serde(default)]
	pub debt_id: Option<String>,
	#[serde(default)]
	pub savings_goal_id: Option<String>,
	#[serde(default)]
	pub due_date: Option<NaiveDate>,
	#[serde(default)]
	pub purpose: Option<String>,
}

/// How much a bank account must hold this period and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountFunding {
	pub id: String,
	pub name: String,
	pub bank: Bank,
	pub required_amount: f64,
	pub purpose: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPlan {
	pub period: PayPeriod,
	pub paycheck_amount: f64,
	pub bills_due_this_period: f64,
	pub discretionary_this_paycheck: f64,
	pub surplus_split: SurplusSplit,
	pub avalanche_target: Option<AvalancheTarget>,
	pub steps: Vec<PlanStep>,
	pub transfers: Vec<PlanStep>,
	pub bill_payments: Vec<PlanStep>,
	pub extra_debt_step: Option<PlanStep>,
	pub savings_step: Option<PlanStep>,
	pub payoff_progress: PayoffProgress,
	pub account_summaries: Vec<AccountFunding>,
	pub emergency_fund_current: f64,
	pub emergency_fund_target: f64,
	pub unpaid_payments: Vec<PaymentWithBill>,
	/// Unpaid occurrences due before the period start. Surfaced apart from
	/// the ordered steps so catch-up does not inflate period totals.
	pub past_due: Vec<PaymentWithBill>,
}

// BNPL schedule types

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleTerms {
	pub total_amount: f64,
	pub number_of_payments: u32,
	pub first_payment_date: NaiveDate,
	pub frequency: PayFrequency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSchedule {
	pub payment_amount: f64,
	pub payment_dates: Vec<NaiveDate>,
}

// Ledger / payoff types

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSplit {
	pub principal: f64,
	pub interest: f64,
	pub new_balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationRow {
	pub month: u32,
	pub payment: f64,
	pub principal: f64,
	pub interest: f64,
	pub balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffProjection {
	pub months: u32,
	pub total_payment: f64,
	pub total_interest: f64,
	pub payoff_date: NaiveDate,
	pub schedule: Vec<AmortizationRow>,
}

/// Payoff projections do not throw on divergence: a payment at or below
/// the monthly interest is reported as an explicit sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
	tag = "status",
	content = "projection",
	rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum PayoffOutcome {
	AlreadyPaid,
	PaidOff(PayoffProjection),
	NeverPaysOff,
}

// Persistence aggregate

/// The plain-record shape exchanged with the persistence boundary; also the
/// CLI seed-file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
	pub strategy: UserStrategy,
	#[serde(default)]
	pub bank_accounts: Vec<BankAccount>,
	#[serde(default)]
	pub bills: Vec<Bill>,
	#[serde(default)]
	pub bill_payments: Vec<BillPayment>,
	#[serde(default)]
	pub debts: Vec<Debt>,
	#[serde(default)]
	pub debt_payments: Vec<DebtPayment>,
	#[serde(default)]
	pub scheduled_payments: Vec<ScheduledPayment>,
	#[serde(default)]
	pub goals: Vec<SavingsGoal>,
}

// Settings models

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDefaults {
	#[serde(default = "default_discretionary")]
	pub discretionary_monthly: f64,
	#[serde(default = "default_emergency_target")]
	pub emergency_fund_target: f64,
	#[serde(default = "default_debt_percent")]
	pub debt_surplus_percent: f64,
	#[serde(default = "default_savings_percent")]
	pub savings_surplus_percent: f64,
}

impl Default for StrategyDefaults {
	fn default() -> Self {
		StrategyDefaults {
			discretionary_monthly: default_discretionary(),
			emergency_fund_target: default_emergency_target(),
			debt_surplus_percent: default_debt_percent(),
			savings_surplus_percent: default_savings_percent(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
	/// Anchor paycheck date every pay period derives from.
	pub reference_paycheck_date: NaiveDate,
	#[serde(default = "default_host")]
	pub host: String,
	#[serde(default = "default_port")]
	pub port: u16,
	#[serde(default)]
	pub seed_file: Option<String>,
	#[serde(default)]
	pub defaults: StrategyDefaults,
}

fn default_true() -> bool {
	true
}
fn default_host() -> String {
	"127.0.0.1".to_string()
}
fn default_port() -> u16 {
	3000
}
fn default_discretionary() -> f64 {
	750.0
}
fn default_emergency_target() -> f64 {
	1000.0
}
fn default_debt_percent() -> f64 {
	0.8
}
fn default_savings_percent() -> f64 {
	0.2
}
