//! Loan request record.

use peerlend_types::{AccountId, Amount, RequestId};
use serde::{Deserialize, Serialize};

/// An open or funded loan request.
///
/// All fields except `is_active` are immutable after creation. The stake is
/// held in ledger custody from creation; it either stays locked as
/// collateral for the resulting loan or, in this design, the request simply
/// remains open — there is no cancellation path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub id: RequestId,
    pub borrower: AccountId,
    /// Requested principal, in raw units.
    pub loan_amount: Amount,
    /// Loan term in days.
    pub duration_days: u64,
    /// Collateral deposited at creation, at least 2x the principal.
    pub stake: Amount,
    /// True until the request is funded, then false forever.
    pub is_active: bool,
}
