use std::cmp::Ordering;

use models::{AvalancheTarget, BankAccount, Debt, DebtStatus};

/// Pick the debt extra payments should go to: the active, unpaid,
/// non-deferred debt with the highest effective-or-nominal rate.
///
/// The sort is stable and has no secondary key, so rate ties resolve to
/// whichever debt came first in the input.
pub fn select_target(debts: &[Debt], bank_accounts: &[BankAccount]) -> Option<AvalancheTarget> {
    let mut candidates: Vec<&Debt> = debts
        .iter()
        .filter(|d| {
            d.is_active
                && d.current_balance > 0.0
                && d.status != DebtStatus::PaidOff
                && d.status != DebtStatus::Deferred
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.ranking_rate()
            .partial_cmp(&a.ranking_rate())
            .unwrap_or(Ordering::Equal)
    });

    let top = candidates.first()?;
    let bank_account = top
        .bank_account_id
        .as_ref()
        .and_then(|id| bank_accounts.iter().find(|ba| &ba.id == id));

    Some(AvalancheTarget {
        debt_id: top.id.clone(),
        debt_name: top.name.clone(),
        bank_account_id: top.bank_account_id.clone(),
        bank_account_name: bank_account.map(|ba| ba.name.clone()),
        interest_rate: top.ranking_rate(),
        current_balance: top.current_balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::DebtType;

    fn debt(id: &str, rate: f64) -> Debt {
        Debt {
            id: id.to_string(),
            name: id.to_string(),
            kind: DebtType::CreditCard,
            status: DebtStatus::Current,
            current_balance: 1000.0,
            original_balance: 1500.0,
            interest_rate: rate,
            effective_rate: None,
            total_repayable: None,
            minimum_payment: 35.0,
            due_day: 1,
            payment_frequency: None,
            deferred_until: None,
            bank_account_id: None,
            is_active: true,
            notes: None,
        }
    }

    #[test]
    fn test_highest_rate_wins() {
        let debts = vec![debt("low", 9.99), debt("high", 24.99), debt("mid", 19.99)];
        let target = select_target(&debts, &[]).unwrap();
        assert_eq!(target.debt_id, "high");
        assert_eq!(target.interest_rate, 24.99);
    }

    #[test]
    fn test_tie_breaks_to_input_order() {
        // A:19.99, B:24.99, C:24.99 -> B (first of the tied maxima).
        let debts = vec![debt("a", 19.99), debt("b", 24.99), debt("c", 24.99)];
        let target = select_target(&debts, &[]).unwrap();
        assert_eq!(target.debt_id, "b");
    }

    #[test]
    fn test_effective_rate_outranks_nominal() {
        let mut bnpl = debt("bnpl", 0.0);
        bnpl.kind = DebtType::Bnpl;
        bnpl.effective_rate = Some(32.5);
        let debts = vec![debt("card", 24.99), bnpl];
        let target = select_target(&debts, &[]).unwrap();
        assert_eq!(target.debt_id, "bnpl");
        assert_eq!(target.interest_rate, 32.5);
    }

    #[test]
    fn test_excludes_paid_off_deferred_inactive_and_zero_balance() {
        let mut paid = debt("paid", 29.99);
        paid.status = DebtStatus::PaidOff;
        let mut deferred = debt("deferred", 29.99);
        deferred.status = DebtStatus::Deferred;
        let mut inactive = debt("inactive", 29.99);
        inactive.is_active = false;
        let mut zero = debt("zero", 29.99);
        zero.current_balance = 0.0;

        let debts = vec![paid, deferred, inactive, zero, debt("live", 5.0)];
        let target = select_target(&debts, &[]).unwrap();
        assert_eq!(target.debt_id, "live");
    }

    #[test]
    fn test_no_candidates() {
        let mut paid = debt("paid", 29.99);
        paid.status = DebtStatus::PaidOff;
        assert!(select_target(&[paid], &[]).is_none());
        assert!(select_target(&[], &[]).is_none());
    }

    #[test]
    fn test_resolves_bank_account_name() {
        use models::Bank;
        let mut d = debt("card", 24.99);
        d.bank_account_id = Some("acct-1".to_string());
        let accounts = vec![BankAccount {
            id: "acct-1".to_string(),
            name: "Rewards Checking".to_string(),
            bank: Bank::NavyFederal,
            last_four: None,
            is_default: false,
        }];
        let target = select_target(&[d], &accounts).unwrap();
        assert_eq!(target.bank_account_name.as_deref(), Some("Rewards Checking"));
    }
}
