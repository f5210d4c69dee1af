//! Fundamental types for the peerlend ledger.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: account identities, amounts, interest rates, timestamps, and
//! the loan status enum.

pub mod account;
pub mod amount;
pub mod rate;
pub mod status;
pub mod time;

pub use account::{AccountId, AccountIdError};
pub use amount::Amount;
pub use rate::InterestRate;
pub use status::LoanStatus;
pub use time::Timestamp;

/// Identifier for a loan request, assigned densely from 0 at creation.
pub type RequestId = u64;

/// Identifier for an active loan.
///
/// A loan carries the same numeric id as the request that spawned it, so
/// the loan id space is a subset of the request id space.
pub type LoanId = u64;
