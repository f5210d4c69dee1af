//! HTTP/JSON API for the peerlend ledger.
//!
//! Endpoints cover every ledger operation:
//! - Request creation and funding
//! - Repayment and liquidation
//! - Single-record fetches and status checks
//! - Open-request / live-loan listings and borrower positions
//! - Running counters and custody balance
//! - Balance view and dev faucet (when enabled)

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::RpcServer;
