//! Loan status enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Observable status of an active loan.
///
/// `Repaid` takes precedence over expiry: a loan repaid after its end time
/// reports `Repaid`, never `Expired`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// Unrepaid and within its term.
    Active,
    /// Past its end time and still unrepaid — eligible for liquidation.
    Expired,
    /// Settled, either by borrower repayment or by liquidation.
    Repaid,
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoanStatus::Active => "active",
            LoanStatus::Expired => "expired",
            LoanStatus::Repaid => "repaid",
        };
        write!(f, "{s}")
    }
}
