//! Active loan record.

use peerlend_types::{AccountId, Amount, InterestRate, LoanId, Timestamp};
use serde::{Deserialize, Serialize};

/// A funded loan.
///
/// Carries the same numeric id as the request that spawned it. All fields
/// except `is_repaid` are immutable; `is_repaid` is terminal once set, by
/// either borrower repayment or liquidation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveLoan {
    pub id: LoanId,
    pub borrower: AccountId,
    pub lender: AccountId,
    /// Principal, copied from the originating request.
    pub loan_amount: Amount,
    /// Collateral, copied from the originating request; held in custody
    /// until repayment or liquidation.
    pub stake: Amount,
    /// Lender-chosen interest rate, a whole percentage of the principal.
    pub interest_rate: InterestRate,
    /// Funding time plus the request's duration.
    pub end_time: Timestamp,
    /// Settled flag, set exactly once.
    pub is_repaid: bool,
}

impl ActiveLoan {
    /// Total the borrower owes: principal plus floored interest.
    pub fn repayment_due(&self) -> Option<Amount> {
        self.interest_rate.repayment_due(self.loan_amount)
    }

    /// Whether this loan is past its term at `now` (strictly).
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.end_time.is_past(now)
    }

    /// Unrepaid and within its term.
    pub fn is_live(&self, now: Timestamp) -> bool {
        !self.is_repaid && !self.is_expired(now)
    }
}
