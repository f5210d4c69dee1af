//! Collateralized lending ledger.
//!
//! The [`LoanLedger`] owns every loan-request and active-loan record and all
//! collateral custody. Borrowers post a stake of at least twice the
//! requested principal; lenders fund a request at a chosen interest rate;
//! the borrower repays principal plus interest to reclaim the stake, or the
//! stake is forfeited to the lender once the loan expires unrepaid.
//!
//! Value enters and leaves the ledger through the [`ValueTransfer`]
//! collaborator; each operation moves value and mutates state in one atomic
//! step, so a failed transfer leaves the ledger untouched.

pub mod error;
pub mod ledger;
pub mod loan;
pub mod request;
pub mod transfer;

pub use error::LedgerError;
pub use ledger::{BorrowerPosition, LoanLedger};
pub use loan::ActiveLoan;
pub use request::LoanRequest;
pub use transfer::{MemoryBank, Movement, TransferError, ValueTransfer};
