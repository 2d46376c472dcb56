//! Paycheck allocation and debt payoff planning engine.
//!
//! Every function in this crate is a pure, synchronous computation over
//! already-fetched records: no I/O, no shared state, deterministic for a
//! given input. "Now" is always an explicit `today` argument. The stateful
//! parts of the system (record storage, the HTTP surface) live in
//! `backend_api` and call into this crate.

use thiserror::Error;

pub mod allocation;
pub mod avalanche;
pub mod bnpl;
pub mod ledger;
pub mod pay_periods;
pub mod payoff;
pub mod plan;
pub mod progress;

pub use allocation::{SplitInputs, compute_surplus_split, discretionary_per_paycheck};
pub use avalanche::select_target;
pub use bnpl::{effective_apr, generate_payment_schedule, payment_preview};
pub use ledger::split_payment;
pub use pay_periods::{Direction, PayCalendar, due_dates_for_bill, due_dates_in_period};
pub use payoff::{PayoffComparison, PayoffInputs, compare_payoff, project_payoff};
pub use plan::{PlanInputs, assemble_plan};
pub use progress::payoff_progress;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid schedule terms: {0}")]
    InvalidScheduleTerms(String),

    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(f64),
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
