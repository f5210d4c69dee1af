//! Service layer for the peerlend ledger.
//!
//! Wraps the [`peerlend_ledger::LoanLedger`] and its value-transfer backend
//! behind a single-writer lock, stamps every mutating call with the current
//! time, and carries the runtime concerns: TOML configuration and
//! structured-logging initialisation.

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DevAccount, ServiceConfig};
pub use error::ServiceError;
pub use logging::{init_logging, LogFormat};
pub use service::{LedgerStats, LendingService};
