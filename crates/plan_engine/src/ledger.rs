use models::{Debt, DebtType, LedgerSplit};

use crate::round2;

/// Split a payment into principal and interest against a debt's current
/// balance.
///
/// Interest-bearing debts accrue one month of simple interest, capped at
/// the payment amount; BNPL and zero-rate debts are all principal. The
/// resulting balance never goes below zero, so an over-payment records a
/// clamped principal equal to what was actually outstanding.
pub fn split_payment(debt: &Debt, amount: f64) -> LedgerSplit {
    let balance = debt.current_balance;

    let interest = if debt.kind != DebtType::Bnpl && debt.interest_rate > 0.0 {
        let monthly_rate = debt.interest_rate / 100.0 / 12.0;
        round2((balance * monthly_rate).min(amount))
    } else {
        0.0
    };

    let principal = round2(amount - interest);
    let new_balance = round2((balance - principal).max(0.0));

    LedgerSplit {
        principal,
        interest,
        new_balance,
    }
}
