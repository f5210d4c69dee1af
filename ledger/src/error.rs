//! Ledger error taxonomy.
//!
//! Every precondition violation is a distinct variant carrying the ids and
//! amounts the caller needs to branch on cause. The ledger reports errors;
//! it never logs, retries, or suppresses them.

use crate::transfer::TransferError;
use peerlend_types::{Amount, LoanId, RequestId, Timestamp};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("loan amount must be greater than 0")]
    InvalidAmount,

    #[error("duration must be greater than 0")]
    InvalidDuration,

    #[error("insufficient collateral: need {required}, deposited {deposited}")]
    InsufficientCollateral { required: Amount, deposited: Amount },

    #[error("request {0} not found")]
    RequestNotFound(RequestId),

    #[error("request {0} is not active")]
    RequestNotActive(RequestId),

    #[error("must deposit the exact loan amount: need {required}, deposited {deposited}")]
    AmountMismatch { required: Amount, deposited: Amount },

    #[error("loan {0} not found")]
    LoanNotFound(LoanId),

    #[error("only the borrower can repay loan {0}")]
    NotBorrower(LoanId),

    #[error("loan {0} is already repaid")]
    AlreadyRepaid(LoanId),

    #[error("must deposit the full amount plus interest: need {required}, deposited {deposited}")]
    InsufficientRepayment { required: Amount, deposited: Amount },

    #[error("loan {loan_id} is not expired yet (ends at {end_time})")]
    NotExpired { loan_id: LoanId, end_time: Timestamp },

    #[error("arithmetic overflow")]
    Overflow,

    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),
}
